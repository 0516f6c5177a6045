//! Two-eye gaze fusion.
//!
//! An eye tracker reports one noisy gaze estimate per eye per frame. This
//! module combines the pair into a single screen-space position using a
//! confidence weight derived from each eye's horizontal gaze component.
//!
//! The weighting intentionally favors "crossed" geometry: an eye looking
//! across the sensor (left eye gazing rightward, right eye gazing leftward)
//! tends to produce the more accurate estimate, so the left eye's weight
//! grows with its x component while the right eye's weight shrinks with its
//! own.
//!
//! TODO: factor in eye position relative to the sensor; ideal is the eye
//! looking across the sensor, not just across the screen midline.

use crate::domain::geometry::Vec2;

/// One eye's contribution to a [`GazeFrame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeReading {
    /// Whether the tracker detected this eye during the frame.
    pub present: bool,
    /// Normalized gaze position, roughly in `[0, 1] x [0, 1]`.
    pub gaze: Vec2,
}

impl EyeReading {
    pub fn new(present: bool, gaze: Vec2) -> Self {
        Self { present, gaze }
    }

    /// A reading for an eye the tracker did not see this frame.
    pub fn absent() -> Self {
        Self {
            present: false,
            gaze: Vec2::ZERO,
        }
    }
}

/// One raw per-callback payload from the tracker. Ephemeral: frames are
/// borrowed by listeners for the duration of a single delivery and never
/// stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeFrame {
    pub left: EyeReading,
    pub right: EyeReading,
}

impl GazeFrame {
    pub fn new(left: EyeReading, right: EyeReading) -> Self {
        Self { left, right }
    }
}

/// One fused gaze estimate in screen pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedSample {
    pub x: f64,
    pub y: f64,
    /// Wall-clock seconds since the Unix epoch, captured at the start of
    /// the sensor callback that produced this sample.
    pub timestamp: f64,
}

/// Confidence weight for one eye from its horizontal gaze component.
///
/// `clamp(0.25 + max(x, 0)^1.8 / 2, 0.25, 0.75)`: monotonically
/// non-decreasing for `x >= 0`, pinned to 0.25 for negative `x`, and never
/// outside `[0.25, 0.75]`, so neither eye can fully dominate or vanish.
pub fn confidence_weight(x: f64) -> f64 {
    (0.25 + x.max(0.0).powf(1.8) / 2.0).clamp(0.25, 0.75)
}

/// Fuses one frame into a screen-space sample.
///
/// Both eyes present: weighted average with `lw = weight(left.x)` and
/// `rw = 1 - weight(right.x)`. Exactly one eye present: that eye's raw
/// gaze, unweighted. The normalized result is scaled by `screen_px` and
/// stamped with `timestamp`.
///
/// Returns `None` when neither eye was detected; there is nothing to fuse
/// and callers skip the sample entirely.
pub fn fuse(frame: &GazeFrame, screen_px: (f64, f64), timestamp: f64) -> Option<FusedSample> {
    let GazeFrame { left, right } = *frame;

    let pos = match (left.present, right.present) {
        (false, false) => return None,
        (true, false) => left.gaze,
        (false, true) => right.gaze,
        (true, true) => {
            let lw = confidence_weight(left.gaze.x);
            let rw = 1.0 - confidence_weight(right.gaze.x);
            (left.gaze * lw + right.gaze * rw) / (lw + rw)
        }
    };

    let px = pos.scale(screen_px.0, screen_px.1);
    Some(FusedSample {
        x: px.x,
        y: px.y,
        timestamp,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
