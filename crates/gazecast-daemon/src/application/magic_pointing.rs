//! Magic pointing: warp the cursor toward gaze while the hand is already
//! moving that way.
//!
//! The decision combines three signals per gaze frame:
//!
//! 1. **Hand activity**: the net pointer motion over the last 200 ms must
//!    exceed a small threshold, otherwise the user is not dragging and a
//!    warp would be a surprise.
//! 2. **Distance**: the fused gaze position must be far from the pointer;
//!    short hops are cheaper to finish by hand than to risk a jitter-driven
//!    jump.
//! 3. **Agreement**: the bearing from pointer to gaze must roughly match
//!    the hand's direction of travel, so the warp only ever shortcuts a
//!    movement the user already started.
//!
//! Only when all three hold does the engine move the pointer to the fused
//! position. This use case depends solely on the `PointerController` and
//! `ScreenMetrics` seams and the shared sensor traits, so the whole
//! decision path is unit-testable with recording doubles.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use gazecast_core::domain::fusion::{fuse, FusedSample, GazeFrame};
use gazecast_core::domain::geometry::{wrap_degrees, Vec2};
use gazecast_core::domain::motion::{MotionHistory, MOUSE_MEMORY};
use tracing::{debug, info, trace};

use crate::application::feature_sync::GazeFeature;
use crate::infrastructure::pointer::PointerController;
use crate::infrastructure::screen::ScreenMetrics;
use crate::infrastructure::sensor::{is_same_source, GazeListener, GazeSource};

/// Minimum recent hand motion before gaze assists at all, in pixels.
pub const MOUSE_MOV_THRESH: f64 = 20.0;

/// Minimum pointer-to-gaze distance worth warping across, in pixels.
pub const MOUSE_GAZE_THRESH: f64 = 250.0;

/// Maximum disagreement between hand direction and gaze bearing, in degrees.
pub const ANGLE_THRESH: f64 = 90.0;

/// Tunable thresholds for the warp decision.
#[derive(Debug, Clone, Copy)]
pub struct MagicTuning {
    /// Pointer-motion retention window.
    pub mouse_memory: Duration,
    /// See [`MOUSE_MOV_THRESH`].
    pub move_threshold_px: f64,
    /// See [`MOUSE_GAZE_THRESH`].
    pub gaze_threshold_px: f64,
    /// See [`ANGLE_THRESH`].
    pub angle_threshold_deg: f64,
}

impl Default for MagicTuning {
    fn default() -> Self {
        Self {
            mouse_memory: MOUSE_MEMORY,
            move_threshold_px: MOUSE_MOV_THRESH,
            gaze_threshold_px: MOUSE_GAZE_THRESH,
            angle_threshold_deg: ANGLE_THRESH,
        }
    }
}

/// The magic-pointing engine.
///
/// Holds the rolling motion history (fed by pointer-move events from
/// whatever thread drives them) and reacts to gaze frames delivered on the
/// sensor thread. Both entry points are safe to call concurrently.
pub struct MagicPointing {
    tuning: MagicTuning,
    enabled: AtomicBool,
    binding: Mutex<Option<Arc<dyn GazeSource>>>,
    history: Mutex<MotionHistory>,
    pointer: Arc<dyn PointerController>,
    screen: Arc<dyn ScreenMetrics>,
}

impl MagicPointing {
    pub fn new(
        tuning: MagicTuning,
        pointer: Arc<dyn PointerController>,
        screen: Arc<dyn ScreenMetrics>,
    ) -> Arc<Self> {
        let origin = pointer.position();
        Arc::new(Self {
            tuning,
            enabled: AtomicBool::new(false),
            binding: Mutex::new(None),
            history: Mutex::new(MotionHistory::new(tuning.mouse_memory, origin)),
            pointer,
            screen,
        })
    }

    /// Records one observed pointer-movement event.
    pub fn record_motion(&self, x: f64, y: f64) {
        self.history
            .lock()
            .expect("motion history lock poisoned")
            .record(x, y);
    }

    /// Subscribes to `source` and turns the decision engine on.
    ///
    /// Mirrors the broadcast server's rebind rules: the same source is a
    /// no-op, a swapped source is re-subscribed. Safe to call repeatedly.
    pub fn enable(self: Arc<Self>, source: Arc<dyn GazeSource>) {
        self.enabled.store(true, Ordering::Relaxed);

        let (unsubscribe_from, subscribe_to) = {
            let mut binding = self.binding.lock().expect("binding lock poisoned");
            match binding.as_ref() {
                Some(current) if is_same_source(current, &source) => (None, None),
                _ => {
                    let old = binding.take();
                    *binding = Some(Arc::clone(&source));
                    (old, Some(source))
                }
            }
        };

        if let Some(old) = unsubscribe_from {
            old.unsubscribe(self.as_ref());
        }
        if let Some(new) = subscribe_to {
            new.subscribe(Arc::clone(&self) as Arc<dyn GazeListener>);
            info!("magic pointing subscribed to sensor");
        }
    }

    /// Unsubscribes and turns the decision engine off. Safe to call when
    /// already disabled.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);

        let unsubscribe_from = {
            let mut binding = self.binding.lock().expect("binding lock poisoned");
            binding.take()
        };
        if let Some(source) = unsubscribe_from {
            source.unsubscribe(self);
            info!("magic pointing unsubscribed from sensor");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// The pure warp decision. Returns the warp target when every gate
    /// passes.
    fn warp_target(&self, sample: &FusedSample, mouse_direction: Vec2, latest: (f64, f64)) -> Option<(f64, f64)> {
        if mouse_direction.len() <= self.tuning.move_threshold_px {
            // Hand is not actively dragging; never assist from standstill.
            return None;
        }

        let delta = Vec2::new(sample.x - latest.0, sample.y - latest.1);
        let angle_delta = wrap_degrees(delta.angle_deg() - mouse_direction.angle_deg());

        if delta.len() > self.tuning.gaze_threshold_px
            && angle_delta.abs() < self.tuning.angle_threshold_deg
        {
            Some((sample.x, sample.y))
        } else {
            None
        }
    }
}

impl GazeListener for MagicPointing {
    /// Invoked synchronously on the sensor delivery thread for every frame.
    fn on_gaze(&self, frame: &GazeFrame) {
        let timestamp = match std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
        {
            Ok(d) => d.as_secs_f64(),
            Err(_) => 0.0,
        };
        let Some(sample) = fuse(frame, self.screen.size_px(), timestamp) else {
            trace!("frame with no detected eyes; no pointer decision");
            return;
        };

        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }

        let (direction, latest) = {
            let mut history = self.history.lock().expect("motion history lock poisoned");
            (history.direction(), history.latest())
        };

        if let Some((x, y)) = self.warp_target(&sample, direction, latest) {
            debug!("warping pointer to gaze at ({x:.0}, {y:.0})");
            self.pointer.move_to(x, y);
        }
    }
}

impl GazeFeature for Arc<MagicPointing> {
    fn activate(&self, source: Arc<dyn GazeSource>) {
        Arc::clone(self).enable(source);
    }

    fn deactivate(&self) {
        self.disable();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::screen::StaticScreen;
    use crate::infrastructure::sensor::mock::MockGazeSource;
    use gazecast_core::domain::fusion::EyeReading;
    use std::sync::Mutex as StdMutex;

    // ── Test doubles ──────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingPointer {
        moves: StdMutex<Vec<(f64, f64)>>,
        pos: StdMutex<(f64, f64)>,
    }

    impl PointerController for RecordingPointer {
        fn position(&self) -> (f64, f64) {
            *self.pos.lock().unwrap()
        }

        fn move_to(&self, x: f64, y: f64) {
            *self.pos.lock().unwrap() = (x, y);
            self.moves.lock().unwrap().push((x, y));
        }
    }

    /// Unit screen so normalized gaze equals pixels and tests can place the
    /// fused sample exactly.
    fn make_engine() -> (Arc<MagicPointing>, Arc<RecordingPointer>) {
        let pointer = Arc::new(RecordingPointer::default());
        let engine = MagicPointing::new(
            MagicTuning::default(),
            Arc::clone(&pointer) as Arc<dyn PointerController>,
            Arc::new(StaticScreen::new(1.0, 1.0)),
        );
        (engine, pointer)
    }

    fn both_eyes_at(x: f64, y: f64) -> GazeFrame {
        GazeFrame::new(
            EyeReading::new(true, Vec2::new(x, y)),
            EyeReading::new(true, Vec2::new(x, y)),
        )
    }

    fn sample_at(x: f64, y: f64) -> FusedSample {
        FusedSample {
            x,
            y,
            timestamp: 0.0,
        }
    }

    /// Gaze target `dist` pixels from `from`, bearing `angle_deg`.
    fn target(from: (f64, f64), dist: f64, angle_deg: f64) -> (f64, f64) {
        let rad = angle_deg.to_radians();
        (from.0 + dist * rad.cos(), from.1 + dist * rad.sin())
    }

    // ── warp_target decision table ────────────────────────────────────────────

    #[test]
    fn test_warp_fires_when_all_three_gates_pass() {
        // Arrange: hand moving 25 px along +x, gaze 300 px away at 10°
        let (engine, _) = make_engine();
        let latest = (25.0, 0.0);
        let direction = Vec2::new(25.0, 0.0);
        let (gx, gy) = target(latest, 300.0, 10.0);

        // Act
        let warp = engine.warp_target(&sample_at(gx, gy), direction, latest);

        // Assert
        assert_eq!(warp, Some((gx, gy)));
    }

    #[test]
    fn test_warp_suppressed_when_angle_disagrees() {
        // 120° off the direction of travel is behind the hand's intent
        let (engine, _) = make_engine();
        let latest = (25.0, 0.0);
        let direction = Vec2::new(25.0, 0.0);
        let (gx, gy) = target(latest, 300.0, 120.0);

        let warp = engine.warp_target(&sample_at(gx, gy), direction, latest);

        assert_eq!(warp, None);
    }

    #[test]
    fn test_warp_suppressed_when_gaze_is_near() {
        // 100 px is inside the distance threshold; finish the move by hand
        let (engine, _) = make_engine();
        let latest = (25.0, 0.0);
        let direction = Vec2::new(25.0, 0.0);
        let (gx, gy) = target(latest, 100.0, 10.0);

        let warp = engine.warp_target(&sample_at(gx, gy), direction, latest);

        assert_eq!(warp, None);
    }

    #[test]
    fn test_warp_suppressed_when_hand_is_idle() {
        // 10 px of recent motion is below the activity threshold, so even a
        // perfect far-away target must not trigger
        let (engine, _) = make_engine();
        let latest = (10.0, 0.0);
        let direction = Vec2::new(10.0, 0.0);
        let (gx, gy) = target(latest, 300.0, 0.0);

        let warp = engine.warp_target(&sample_at(gx, gy), direction, latest);

        assert_eq!(warp, None);
    }

    #[test]
    fn test_warp_threshold_boundaries_are_exclusive() {
        let (engine, _) = make_engine();
        let latest = (0.0, 0.0);

        // Exactly at the motion threshold: suppressed (strictly greater)
        let warp = engine.warp_target(
            &sample_at(300.0, 0.0),
            Vec2::new(MOUSE_MOV_THRESH, 0.0),
            latest,
        );
        assert_eq!(warp, None);

        // Exactly at the gaze distance threshold: suppressed
        let warp = engine.warp_target(
            &sample_at(MOUSE_GAZE_THRESH, 0.0),
            Vec2::new(25.0, 0.0),
            latest,
        );
        assert_eq!(warp, None);
    }

    #[test]
    fn test_angle_wraparound_counts_as_agreement() {
        // Hand heading 175°, gaze bearing -175°: only 10° apart once wrapped
        let (engine, _) = make_engine();
        let latest = (0.0, 0.0);
        let rad = 175.0_f64.to_radians();
        let direction = Vec2::new(25.0 * rad.cos(), 25.0 * rad.sin());
        let (gx, gy) = target(latest, 300.0, -175.0);

        let warp = engine.warp_target(&sample_at(gx, gy), direction, latest);

        assert_eq!(warp, Some((gx, gy)));
    }

    // ── on_gaze end to end ────────────────────────────────────────────────────

    #[test]
    fn test_on_gaze_moves_pointer_when_enabled_and_dragging() {
        // Arrange
        let (engine, pointer) = make_engine();
        let source = Arc::new(MockGazeSource::new());
        Arc::clone(&engine).enable(source.clone());

        // Simulate an active drag along +x
        engine.record_motion(0.0, 0.0);
        engine.record_motion(25.0, 0.0);

        // Act: gaze lands 300 px ahead of the pointer
        let (gx, gy) = target((25.0, 0.0), 300.0, 0.0);
        source.emit(&both_eyes_at(gx, gy));

        // Assert
        assert_eq!(pointer.moves.lock().unwrap().as_slice(), &[(gx, gy)]);
    }

    #[test]
    fn test_on_gaze_does_nothing_when_disabled() {
        // Arrange: same drag, but the feature is off
        let (engine, pointer) = make_engine();
        engine.record_motion(0.0, 0.0);
        engine.record_motion(25.0, 0.0);

        // Act: deliver the frame directly; no subscription exists
        let (gx, gy) = target((25.0, 0.0), 300.0, 0.0);
        engine.on_gaze(&both_eyes_at(gx, gy));

        // Assert
        assert!(pointer.moves.lock().unwrap().is_empty());
    }

    #[test]
    fn test_on_gaze_ignores_frames_with_no_eyes() {
        let (engine, pointer) = make_engine();
        let source = Arc::new(MockGazeSource::new());
        Arc::clone(&engine).enable(source.clone());
        engine.record_motion(0.0, 0.0);
        engine.record_motion(25.0, 0.0);

        source.emit(&GazeFrame::new(EyeReading::absent(), EyeReading::absent()));

        assert!(pointer.moves.lock().unwrap().is_empty());
    }

    // ── enable/disable lifecycle ──────────────────────────────────────────────

    #[test]
    fn test_double_enable_keeps_single_subscription() {
        let (engine, _) = make_engine();
        let source = Arc::new(MockGazeSource::new());

        Arc::clone(&engine).enable(source.clone());
        Arc::clone(&engine).enable(source.clone());

        assert_eq!(source.listener_count(), 1);
        assert!(engine.is_enabled());
    }

    #[test]
    fn test_enable_with_new_source_rebinds() {
        let (engine, _) = make_engine();
        let first = Arc::new(MockGazeSource::new());
        let second = Arc::new(MockGazeSource::new());

        Arc::clone(&engine).enable(first.clone());
        Arc::clone(&engine).enable(second.clone());

        assert_eq!(first.listener_count(), 0);
        assert_eq!(second.listener_count(), 1);
    }

    #[test]
    fn test_disable_unsubscribes_and_is_idempotent() {
        let (engine, _) = make_engine();
        let source = Arc::new(MockGazeSource::new());
        Arc::clone(&engine).enable(source.clone());

        engine.disable();
        engine.disable();

        assert_eq!(source.listener_count(), 0);
        assert!(!engine.is_enabled());
    }
}
