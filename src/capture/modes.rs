//! Enumerated camera settings shared by the facade and the backends.
//!
//! Each setting also has a stable integer code so hosts that persisted
//! the raw constants can convert them back. Unknown codes are rejected
//! at the conversion boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Raw code for [`FacingMode::Back`].
pub const FACING_BACK: i32 = 0;
/// Raw code for [`FacingMode::Front`].
pub const FACING_FRONT: i32 = 1;

/// Raw code for [`FlashMode::Off`].
pub const FLASH_OFF: i32 = 0;
/// Raw code for [`FlashMode::On`].
pub const FLASH_ON: i32 = 1;
/// Raw code for [`FlashMode::Auto`].
pub const FLASH_AUTO: i32 = 2;

/// Raw code for [`PictureMode::Quality`].
pub const PICTURE_MODE_QUALITY: i32 = 0;
/// Raw code for [`PictureMode::Speed`].
pub const PICTURE_MODE_SPEED: i32 = 1;

/// A raw integer that does not name any known mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} code: {code}")]
pub struct UnknownModeCode {
    /// Which setting was being decoded.
    pub kind: &'static str,
    /// The rejected value.
    pub code: i32,
}

/// Which physical sensor a backend binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// The rear sensor. Every device has one.
    #[default]
    Back,
    /// The user-facing sensor.
    Front,
}

impl FacingMode {
    /// Back becomes Front and Front becomes Back.
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::Back => FacingMode::Front,
            FacingMode::Front => FacingMode::Back,
        }
    }

    /// Returns the stable integer code.
    pub fn code(self) -> i32 {
        match self {
            FacingMode::Back => FACING_BACK,
            FacingMode::Front => FACING_FRONT,
        }
    }
}

impl TryFrom<i32> for FacingMode {
    type Error = UnknownModeCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            FACING_BACK => Ok(FacingMode::Back),
            FACING_FRONT => Ok(FacingMode::Front),
            _ => Err(UnknownModeCode {
                kind: "facing",
                code,
            }),
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingMode::Back => write!(f, "back"),
            FacingMode::Front => write!(f, "front"),
        }
    }
}

/// Flash unit behavior during capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    /// Never fire.
    #[default]
    Off,
    /// Fire on every capture.
    On,
    /// Let the device decide from the scene.
    Auto,
}

impl FlashMode {
    /// Cycles Off -> On -> Auto -> Off.
    pub fn next(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Auto,
            FlashMode::Auto => FlashMode::Off,
        }
    }

    /// Returns the stable integer code.
    pub fn code(self) -> i32 {
        match self {
            FlashMode::Off => FLASH_OFF,
            FlashMode::On => FLASH_ON,
            FlashMode::Auto => FLASH_AUTO,
        }
    }
}

impl TryFrom<i32> for FlashMode {
    type Error = UnknownModeCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            FLASH_OFF => Ok(FlashMode::Off),
            FLASH_ON => Ok(FlashMode::On),
            FLASH_AUTO => Ok(FlashMode::Auto),
            _ => Err(UnknownModeCode {
                kind: "flash",
                code,
            }),
        }
    }
}

impl fmt::Display for FlashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlashMode::Off => write!(f, "off"),
            FlashMode::On => write!(f, "on"),
            FlashMode::Auto => write!(f, "auto"),
        }
    }
}

/// Which capture path the facade invokes.
///
/// Never passed to a backend; it only selects between the full still
/// pipeline and the fast preview-frame snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PictureMode {
    /// Full still capture through the session.
    Quality,
    /// Snapshot of the latest preview frame.
    Speed,
}

impl PictureMode {
    /// Returns the stable integer code.
    pub fn code(self) -> i32 {
        match self {
            PictureMode::Quality => PICTURE_MODE_QUALITY,
            PictureMode::Speed => PICTURE_MODE_SPEED,
        }
    }
}

impl TryFrom<i32> for PictureMode {
    type Error = UnknownModeCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            PICTURE_MODE_QUALITY => Ok(PictureMode::Quality),
            PICTURE_MODE_SPEED => Ok(PictureMode::Speed),
            _ => Err(UnknownModeCode {
                kind: "picture mode",
                code,
            }),
        }
    }
}

impl fmt::Display for PictureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PictureMode::Quality => write!(f, "quality"),
            PictureMode::Speed => write!(f, "speed"),
        }
    }
}
