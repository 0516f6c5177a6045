//! Pointer control seam.
//!
//! Magic pointing needs two things from the host: where the pointer is and
//! the ability to teleport it. Platform injection backends live behind the
//! [`PointerController`] trait; tests use recording doubles and headless
//! runs use [`VirtualPointer`].

use std::sync::Mutex;

use tracing::debug;

/// Trait for reading and warping the host pointer.
///
/// Implementations must be callable from the sensor delivery thread and
/// return quickly.
pub trait PointerController: Send + Sync {
    /// Current pointer position in screen pixels.
    fn position(&self) -> (f64, f64);

    /// Teleports the pointer to `(x, y)` in screen pixels.
    fn move_to(&self, x: f64, y: f64);
}

/// An in-process pointer with no OS backing.
///
/// Tracks the position it was last moved to, which is all the decision
/// engine needs when running the daemon without a desktop session.
pub struct VirtualPointer {
    pos: Mutex<(f64, f64)>,
}

impl VirtualPointer {
    pub fn new(initial: (f64, f64)) -> Self {
        Self {
            pos: Mutex::new(initial),
        }
    }
}

impl Default for VirtualPointer {
    fn default() -> Self {
        Self::new((0.0, 0.0))
    }
}

impl PointerController for VirtualPointer {
    fn position(&self) -> (f64, f64) {
        *self.pos.lock().expect("pointer position lock poisoned")
    }

    fn move_to(&self, x: f64, y: f64) {
        debug!("virtual pointer warped to ({x:.1}, {y:.1})");
        *self.pos.lock().expect("pointer position lock poisoned") = (x, y);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_pointer_starts_at_initial_position() {
        // Arrange / Act
        let pointer = VirtualPointer::new((100.0, 200.0));

        // Assert
        assert_eq!(pointer.position(), (100.0, 200.0));
    }

    #[test]
    fn test_virtual_pointer_tracks_moves() {
        // Arrange
        let pointer = VirtualPointer::default();

        // Act
        pointer.move_to(640.0, 360.0);

        // Assert
        assert_eq!(pointer.position(), (640.0, 360.0));
    }
}
