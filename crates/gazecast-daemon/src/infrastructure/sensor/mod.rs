//! Sensor seam: how gaze frames and device presence reach the daemon.
//!
//! The eye-tracker SDK pushes data at the daemon rather than the daemon
//! pulling it. Delivery happens on the SDK's own thread, so everything
//! registered here must be reentrant-safe and quick; a listener that blocks
//! stalls the shared gaze callback chain for every other consumer.
//!
//! Two independent notification streams exist:
//!
//! - **Gaze frames**: a [`GazeSource`] delivers [`GazeFrame`]s to every
//!   subscribed [`GazeListener`], synchronously, in sensor order.
//! - **Device presence**: [`DeviceEvent`]s announce tracker attach/detach.
//!   The daemon pumps these through a channel and reconciles each feature's
//!   subscription state (see `application::feature_sync`).
//!
//! # Testability
//!
//! The `GazeSource` trait lets unit tests drive the whole pipeline with
//! [`mock::MockGazeSource`] instead of tracker hardware; `synthetic`
//! provides a frame generator for running the daemon without a device.

use std::sync::Arc;

use gazecast_core::domain::fusion::GazeFrame;

pub mod mock;
pub mod synthetic;

/// A consumer of raw gaze frames.
///
/// `on_gaze` is invoked synchronously on the sensor delivery thread and
/// must not block indefinitely.
pub trait GazeListener: Send + Sync {
    fn on_gaze(&self, frame: &GazeFrame);
}

/// A source of gaze frames, usually one attached tracker.
///
/// Subscription identity is the listener object itself: `unsubscribe`
/// removes the registration whose listener is the same allocation as the
/// argument. Registering the same listener twice is a caller bug the
/// source is not required to detect.
pub trait GazeSource: Send + Sync {
    fn subscribe(&self, listener: Arc<dyn GazeListener>);
    fn unsubscribe(&self, listener: &dyn GazeListener);

    /// Enumerates the devices currently backing this source.
    fn devices(&self) -> Vec<DeviceInfo>;
}

/// Compares a stored listener registration against a candidate by object
/// identity (data pointer, ignoring the vtable).
pub fn is_same_listener(stored: &Arc<dyn GazeListener>, candidate: &dyn GazeListener) -> bool {
    std::ptr::eq(
        Arc::as_ptr(stored) as *const (),
        candidate as *const dyn GazeListener as *const (),
    )
}

/// Compares two gaze sources by object identity. Used by the rebind logic
/// to detect when the "current tracker" reference has been swapped for a
/// new instance.
pub fn is_same_source(a: &Arc<dyn GazeSource>, b: &Arc<dyn GazeSource>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Identity of one attached tracker device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Human-readable model name.
    pub name: String,
    /// Device serial, unique per unit.
    pub serial: String,
}

/// A device-presence notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Attached(DeviceInfo),
    Detached(DeviceInfo),
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use gazecast_core::domain::fusion::GazeFrame;

    struct NullListener;

    impl GazeListener for NullListener {
        fn on_gaze(&self, _frame: &GazeFrame) {}
    }

    #[test]
    fn test_is_same_listener_matches_identical_allocation() {
        // Arrange
        let listener: Arc<dyn GazeListener> = Arc::new(NullListener);

        // Act / Assert
        assert!(is_same_listener(&listener, listener.as_ref()));
    }

    #[test]
    fn test_is_same_listener_rejects_distinct_allocations() {
        let a: Arc<dyn GazeListener> = Arc::new(NullListener);
        let b: Arc<dyn GazeListener> = Arc::new(NullListener);

        assert!(!is_same_listener(&a, b.as_ref()));
    }

    #[test]
    fn test_is_same_source_tracks_arc_identity() {
        let a: Arc<dyn GazeSource> = Arc::new(mock::MockGazeSource::new());
        let also_a = Arc::clone(&a);
        let b: Arc<dyn GazeSource> = Arc::new(mock::MockGazeSource::new());

        assert!(is_same_source(&a, &also_a));
        assert!(!is_same_source(&a, &b));
    }

    #[test]
    fn test_device_event_carries_device_identity() {
        let info = DeviceInfo {
            name: "Tracker 5".to_string(),
            serial: "T5-00042".to_string(),
        };

        let event = DeviceEvent::Attached(info.clone());

        assert_eq!(event, DeviceEvent::Attached(info));
    }
}
