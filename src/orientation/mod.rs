//! Display orientation tracking.
//!
//! Raw rotation-sensor readings and the display's own rotation are
//! folded into a single canonical [`Orientation`] stream by the
//! [`OrientationDetector`], which pushes changes to one registered
//! handler.

mod detector;
mod display;

pub use detector::OrientationDetector;
pub use display::{Display, SimulatedDisplay};

use crate::capture::FacingMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Raw sensor value meaning "device is lying flat, orientation unknown".
pub const ORIENTATION_UNKNOWN: i32 = -1;

/// Rotation relative to the natural device orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Orientation {
    /// Natural orientation.
    #[default]
    Deg0,
    /// A quarter turn clockwise.
    Deg90,
    /// Upside down.
    Deg180,
    /// Three quarter turns clockwise.
    Deg270,
}

/// Degrees that are not a multiple of 90 in 0..360.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid orientation: {0} degrees")]
pub struct InvalidOrientation(pub u16);

impl Orientation {
    /// All orientations in clockwise order.
    pub const ALL: [Orientation; 4] = [
        Orientation::Deg0,
        Orientation::Deg90,
        Orientation::Deg180,
        Orientation::Deg270,
    ];

    /// Rotation in degrees: 0, 90, 180 or 270.
    pub fn degrees(self) -> u16 {
        match self {
            Orientation::Deg0 => 0,
            Orientation::Deg90 => 90,
            Orientation::Deg180 => 180,
            Orientation::Deg270 => 270,
        }
    }

    /// Maps a display surface rotation index (0-3) to an orientation.
    /// Indices wrap, so 4 is 0 again.
    pub fn from_surface_rotation(index: u8) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    fn quarter_turns(self) -> i32 {
        i32::from(self.degrees() / 90)
    }

    fn from_quarter_turns(turns: i32) -> Self {
        Self::ALL[turns.rem_euclid(4) as usize]
    }

    /// Clockwise rotation to apply to a captured image so it appears
    /// upright on a display rotated by `display`.
    ///
    /// The front sensor is mirrored, so its display offset adds to the
    /// sensor mounting angle instead of subtracting from it.
    pub fn image_rotation(sensor: Orientation, display: Orientation, facing: FacingMode) -> Self {
        match facing {
            FacingMode::Back => {
                Self::from_quarter_turns(sensor.quarter_turns() - display.quarter_turns())
            }
            FacingMode::Front => {
                Self::from_quarter_turns(sensor.quarter_turns() + display.quarter_turns())
            }
        }
    }
}

impl TryFrom<u16> for Orientation {
    type Error = InvalidOrientation;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Orientation::Deg0),
            90 => Ok(Orientation::Deg90),
            180 => Ok(Orientation::Deg180),
            270 => Ok(Orientation::Deg270),
            other => Err(InvalidOrientation(other)),
        }
    }
}

impl From<Orientation> for u16 {
    fn from(orientation: Orientation) -> Self {
        orientation.degrees()
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}
