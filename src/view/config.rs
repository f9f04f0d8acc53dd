//! Facade construction settings.

use crate::capture::{FacingMode, FlashMode, PictureMode};
use serde::{Deserialize, Serialize};

/// Initial state and lifecycle policy for a [`super::CameraView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Facing forwarded at construction when no saved state is supplied.
    pub default_facing: FacingMode,
    /// Flash forwarded at construction when no saved state is supplied.
    pub default_flash: FlashMode,
    /// Initial capture path. `None` leaves the mode uninitialized, which
    /// turns `capture_picture` into a no-op until a mode is set. Written
    /// as `"none"` in config files.
    #[serde(with = "picture_mode_setting")]
    pub picture_mode: Option<PictureMode>,
    /// Stop a running backend when the host detaches the view.
    pub stop_on_detach: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_facing: FacingMode::Back,
            default_flash: FlashMode::Off,
            picture_mode: Some(PictureMode::Quality),
            stop_on_detach: true,
        }
    }
}

/// TOML has no null, so an unset picture mode gets its own name.
mod picture_mode_setting {
    use crate::capture::PictureMode;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Setting {
        Quality,
        Speed,
        None,
    }

    pub fn serialize<S: Serializer>(
        mode: &Option<PictureMode>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let setting = match mode {
            Some(PictureMode::Quality) => Setting::Quality,
            Some(PictureMode::Speed) => Setting::Speed,
            None => Setting::None,
        };
        setting.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<PictureMode>, D::Error> {
        Ok(match Setting::deserialize(deserializer)? {
            Setting::Quality => Some(PictureMode::Quality),
            Setting::Speed => Some(PictureMode::Speed),
            Setting::None => None,
        })
    }
}
