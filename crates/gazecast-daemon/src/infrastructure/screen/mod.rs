//! Screen geometry seam.
//!
//! Fusion produces positions in normalized gaze space; scaling to pixels
//! needs the current screen size. Real backends would query the windowing
//! system; [`StaticScreen`] serves configured dimensions, which is enough
//! for a single fixed display and for tests.

/// Provides the current screen size in pixels.
pub trait ScreenMetrics: Send + Sync {
    fn size_px(&self) -> (f64, f64);
}

/// A fixed screen size taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct StaticScreen {
    width: f64,
    height: f64,
}

impl StaticScreen {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl ScreenMetrics for StaticScreen {
    fn size_px(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
