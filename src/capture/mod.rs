//! Camera devices, frames and capture settings.
//!
//! This is the device layer beneath the session backends: a [`Camera`]
//! opens one sensor at a time and produces raw RGB [`Frame`]s. The mode
//! enums here are shared with the facade.

mod camera;
mod config;
mod frame;
mod modes;
#[cfg(feature = "camera")]
mod webcam;

pub use camera::{Camera, CameraError, MockCamera};
pub use config::{CaptureConfig, ConfigError, FileConfig, OutputConfig};
pub use frame::{Frame, BYTES_PER_PIXEL};
pub use modes::{
    FacingMode, FlashMode, PictureMode, UnknownModeCode, FACING_BACK, FACING_FRONT, FLASH_AUTO,
    FLASH_OFF, FLASH_ON, PICTURE_MODE_QUALITY, PICTURE_MODE_SPEED,
};
#[cfg(feature = "camera")]
pub use webcam::{list_webcams, WebcamCamera};
