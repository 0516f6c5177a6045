//! Rolling window of recent pointer motion.
//!
//! Magic pointing only warps the cursor while the hand is already moving,
//! so it needs a short memory of where the pointer has been. The window is
//! time-bounded rather than count-bounded: entries older than
//! [`MOUSE_MEMORY`] are pruned, but the newest entry always survives, even
//! when it is itself stale. That survivor anchors `latest()` and makes an
//! idle hand read as a zero-length direction vector, which is exactly what
//! suppresses warping when the user stops dragging.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::domain::geometry::Vec2;

/// How long a pointer-position sample stays relevant.
pub const MOUSE_MEMORY: Duration = Duration::from_millis(200);

/// One observed pointer position.
#[derive(Debug, Clone, Copy)]
struct MotionSample {
    x: f64,
    y: f64,
    at: Instant,
}

/// Time-bounded history of pointer positions.
///
/// Invariant: never empty. The constructor seeds the current pointer
/// position and pruning always retains the newest sample.
#[derive(Debug)]
pub struct MotionHistory {
    samples: VecDeque<MotionSample>,
    memory: Duration,
}

impl MotionHistory {
    /// Creates a history seeded with the pointer's current position.
    pub fn new(memory: Duration, origin: (f64, f64)) -> Self {
        let mut samples = VecDeque::new();
        samples.push_back(MotionSample {
            x: origin.0,
            y: origin.1,
            at: Instant::now(),
        });
        Self { samples, memory }
    }

    /// Records a pointer-movement event.
    pub fn record(&mut self, x: f64, y: f64) {
        self.record_at(x, y, Instant::now());
    }

    fn record_at(&mut self, x: f64, y: f64, at: Instant) {
        self.samples.push_back(MotionSample { x, y, at });
        self.prune(at);
    }

    /// Net recent motion: the vector from the oldest retained sample to the
    /// newest. Length is a proxy for recent hand speed.
    ///
    /// Prunes first, so a hand that stopped moving more than the memory
    /// window ago collapses to a single sample and a zero vector.
    pub fn direction(&mut self) -> Vec2 {
        self.direction_at(Instant::now())
    }

    fn direction_at(&mut self, now: Instant) -> Vec2 {
        self.prune(now);
        let oldest = self.samples.front().expect("history is never empty");
        let newest = self.samples.back().expect("history is never empty");
        Vec2::new(newest.x - oldest.x, newest.y - oldest.y)
    }

    /// The most recently observed pointer position.
    pub fn latest(&self) -> (f64, f64) {
        let newest = self.samples.back().expect("history is never empty");
        (newest.x, newest.y)
    }

    /// Number of retained samples. Mostly useful for diagnostics.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        // The invariant makes this always false; provided for completeness
        // alongside `len`.
        self.samples.is_empty()
    }

    /// Drops samples older than the memory window, keeping at least the
    /// newest one.
    fn prune(&mut self, now: Instant) {
        let last = *self.samples.back().expect("history is never empty");
        self.samples
            .retain(|s| now.saturating_duration_since(s.at) < self.memory);
        if self.samples.is_empty() {
            self.samples.push_back(last);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
