//! Feature-lifecycle reconciliation.
//!
//! Each gaze consumer (the broadcast server, the magic-pointing engine)
//! should be subscribed to the sensor exactly when two conditions hold: a
//! tracker is attached AND the user has the feature toggled on. Rather
//! than reacting to individual edges, a [`FeatureSupervisor`] recomputes
//! the desired state from its inputs every time any of them changes. The
//! reconciliation is level-triggered, so redundant attach notifications or
//! repeated toggles are harmless.
//!
//! The supervisor owns its toggle state explicitly (one boolean per
//! feature) instead of reading process-wide globals; toggle changes and
//! device events are discrete inputs funnelled through `reconcile()`.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use tracing::debug;

use crate::infrastructure::sensor::GazeSource;

/// A feature whose gaze subscription the supervisor manages.
///
/// `activate` must be idempotent against the same source and must rebind
/// when handed a different one; `deactivate` must be safe to call when
/// already inactive. Both the broadcast server and the magic-pointing
/// engine satisfy this contract.
pub trait GazeFeature: Send + Sync {
    fn activate(&self, source: Arc<dyn GazeSource>);
    fn deactivate(&self);
}

/// Reconciles one feature's lifecycle against device presence and its
/// user-facing toggle.
pub struct FeatureSupervisor {
    name: &'static str,
    feature: Box<dyn GazeFeature>,
    enabled: AtomicBool,
    device: Mutex<Option<Arc<dyn GazeSource>>>,
}

impl FeatureSupervisor {
    pub fn new(name: &'static str, feature: Box<dyn GazeFeature>, enabled: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            feature,
            enabled: AtomicBool::new(enabled),
            device: Mutex::new(None),
        })
    }

    /// Updates the user toggle and reconciles.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        self.reconcile();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Notes that a tracker is present and reconciles. Safe to call
    /// repeatedly with the same source.
    pub fn device_attached(&self, source: Arc<dyn GazeSource>) {
        *self.device.lock().expect("device lock poisoned") = Some(source);
        self.reconcile();
    }

    /// Notes that the tracker went away and reconciles.
    pub fn device_detached(&self) {
        *self.device.lock().expect("device lock poisoned") = None;
        self.reconcile();
    }

    /// Drives the feature toward `(device present) AND (toggle on)`.
    fn reconcile(&self) {
        let source = self
            .device
            .lock()
            .expect("device lock poisoned")
            .clone();

        match (source, self.enabled.load(Ordering::Relaxed)) {
            (Some(source), true) => {
                debug!("{}: reconciling to active", self.name);
                self.feature.activate(source);
            }
            _ => {
                debug!("{}: reconciling to inactive", self.name);
                self.feature.deactivate();
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sensor::mock::MockGazeSource;
    use std::sync::atomic::AtomicUsize;

    // ── Test double ───────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingFeature {
        active: AtomicBool,
        activations: AtomicUsize,
        deactivations: AtomicUsize,
    }

    impl GazeFeature for Arc<RecordingFeature> {
        fn activate(&self, _source: Arc<dyn GazeSource>) {
            self.active.store(true, Ordering::Relaxed);
            self.activations.fetch_add(1, Ordering::Relaxed);
        }

        fn deactivate(&self) {
            self.active.store(false, Ordering::Relaxed);
            self.deactivations.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn make_supervisor(enabled: bool) -> (Arc<FeatureSupervisor>, Arc<RecordingFeature>) {
        let feature = Arc::new(RecordingFeature::default());
        let supervisor = FeatureSupervisor::new(
            "test-feature",
            Box::new(Arc::clone(&feature)),
            enabled,
        );
        (supervisor, feature)
    }

    fn source() -> Arc<MockGazeSource> {
        Arc::new(MockGazeSource::new())
    }

    #[test]
    fn test_toggle_on_without_device_stays_inactive() {
        // Arrange
        let (supervisor, feature) = make_supervisor(false);

        // Act
        supervisor.set_enabled(true);

        // Assert
        assert!(!feature.active.load(Ordering::Relaxed));
        assert_eq!(feature.activations.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_device_attach_with_toggle_on_activates() {
        // Arrange
        let (supervisor, feature) = make_supervisor(true);

        // Act
        supervisor.device_attached(source());

        // Assert
        assert!(feature.active.load(Ordering::Relaxed));
    }

    #[test]
    fn test_device_attach_with_toggle_off_stays_inactive() {
        let (supervisor, feature) = make_supervisor(false);

        supervisor.device_attached(source());

        assert!(!feature.active.load(Ordering::Relaxed));
    }

    #[test]
    fn test_toggle_on_after_attach_activates() {
        // Arrange: device first, toggle second; order must not matter
        let (supervisor, feature) = make_supervisor(false);
        supervisor.device_attached(source());

        // Act
        supervisor.set_enabled(true);

        // Assert
        assert!(feature.active.load(Ordering::Relaxed));
    }

    #[test]
    fn test_detach_deactivates() {
        // Arrange
        let (supervisor, feature) = make_supervisor(true);
        supervisor.device_attached(source());
        assert!(feature.active.load(Ordering::Relaxed));

        // Act
        supervisor.device_detached();

        // Assert
        assert!(!feature.active.load(Ordering::Relaxed));
    }

    #[test]
    fn test_toggle_off_deactivates() {
        let (supervisor, feature) = make_supervisor(true);
        supervisor.device_attached(source());

        supervisor.set_enabled(false);

        assert!(!feature.active.load(Ordering::Relaxed));
        assert!(!supervisor.is_enabled());
    }

    #[test]
    fn test_redundant_attach_notifications_are_safe() {
        // Level-triggered reconciliation: repeated identical inputs must
        // simply re-activate without flapping through deactivation
        let (supervisor, feature) = make_supervisor(true);
        let src = source();

        supervisor.device_attached(src.clone());
        supervisor.device_attached(src.clone());
        supervisor.device_attached(src);

        assert!(feature.active.load(Ordering::Relaxed));
        assert_eq!(feature.deactivations.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_redundant_detach_notifications_are_safe() {
        let (supervisor, feature) = make_supervisor(true);
        supervisor.device_attached(source());

        supervisor.device_detached();
        supervisor.device_detached();

        assert!(!feature.active.load(Ordering::Relaxed));
    }
}
