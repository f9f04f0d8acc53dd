//! Source of the display's current rotation.

use super::Orientation;
use std::sync::atomic::{AtomicU8, Ordering};

/// A display whose rotation the detector reads on every sensor event.
///
/// Implementations are queried from the sensor delivery thread and must
/// answer without blocking.
pub trait Display: Send + Sync {
    /// Current rotation of the display content.
    fn rotation(&self) -> Orientation;
}

/// In-memory display whose rotation is set by the host or a test.
#[derive(Debug, Default)]
pub struct SimulatedDisplay {
    quarter_turns: AtomicU8,
}

impl SimulatedDisplay {
    /// Creates a display currently showing `rotation`.
    pub fn new(rotation: Orientation) -> Self {
        let display = Self::default();
        display.set_rotation(rotation);
        display
    }

    /// Rotates the display. Takes effect on the next sensor event.
    pub fn set_rotation(&self, rotation: Orientation) {
        self.quarter_turns
            .store((rotation.degrees() / 90) as u8, Ordering::Release);
    }
}

impl Display for SimulatedDisplay {
    fn rotation(&self) -> Orientation {
        Orientation::from_surface_rotation(self.quarter_turns.load(Ordering::Acquire))
    }
}
