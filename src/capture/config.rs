//! Camera capture configuration.
//!
//! Covers the device layer (resolutions, JPEG quality per capture path,
//! device indices per facing) and the file format that bundles it with
//! the facade and demo settings.

use crate::view::ViewConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a camera device and the session that drives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Device index bound for the back facing.
    pub back_device: u32,
    /// Device index bound for the front facing, if the host has one.
    pub front_device: Option<u32>,
    /// Full still width in pixels.
    pub width: u32,
    /// Full still height in pixels.
    pub height: u32,
    /// Preview frame width in pixels (used by the speed path).
    pub preview_width: u32,
    /// Preview frame height in pixels.
    pub preview_height: u32,
    /// JPEG quality for the quality path (1-100).
    pub jpeg_quality: u8,
    /// JPEG quality for the speed path (1-100).
    pub still_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            back_device: 0,
            front_device: None,
            width: 640,
            height: 480,
            preview_width: 320,
            preview_height: 240,
            jpeg_quality: 90,
            still_quality: 70,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified still dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Returns the device index bound for `facing`, if any.
    pub fn device_for(&self, facing: super::FacingMode) -> Option<u32> {
        match facing {
            super::FacingMode::Back => Some(self.back_device),
            super::FacingMode::Front => self.front_device,
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.preview_width == 0 || self.preview_height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        for quality in [self.jpeg_quality, self.still_quality] {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::InvalidQuality(quality));
            }
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// A still or preview dimension is zero.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// A JPEG quality outside 1-100.
    #[error("invalid JPEG quality {0} (must be 1-100)")]
    InvalidQuality(u8),
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The config file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Device and session settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Facade defaults.
    #[serde(default)]
    pub view: ViewConfig,
    /// Demo binary settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration for the demo binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory captured JPEGs are written to.
    pub directory: PathBuf,
    /// Number of pictures to take if not continuous.
    pub captures: u32,
    /// Keep capturing until interrupted.
    pub continuous: bool,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("captures"),
            captures: 3,
            continuous: false,
            metrics_port: 9090,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.capture.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{FacingMode, FlashMode, PictureMode};
    use std::io::Write;

    #[test]
    fn test_default_config_valid() {
        let config = CaptureConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_dimensions_invalid() {
        let mut config = CaptureConfig::default();
        config.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDimensions)
        ));
    }

    #[test]
    fn test_quality_out_of_range() {
        let mut config = CaptureConfig::default();
        config.still_quality = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidQuality(0))
        ));
    }

    #[test]
    fn test_device_for_facing() {
        let mut config = CaptureConfig::default();
        assert_eq!(config.device_for(FacingMode::Back), Some(0));
        assert_eq!(config.device_for(FacingMode::Front), None);

        config.front_device = Some(2);
        assert_eq!(config.device_for(FacingMode::Front), Some(2));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = FileConfig::from_toml(
            r#"
            [capture]
            width = 320
            height = 240

            [view]
            default_facing = "front"
            default_flash = "auto"
            picture_mode = "speed"
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.width, 320);
        assert_eq!(config.capture.jpeg_quality, 90);
        assert_eq!(config.view.default_facing, FacingMode::Front);
        assert_eq!(config.view.default_flash, FlashMode::Auto);
        assert_eq!(config.view.picture_mode, Some(PictureMode::Speed));
        assert!(config.view.stop_on_detach);
        assert_eq!(config.output.metrics_port, 9090);
    }

    #[test]
    fn test_file_can_leave_picture_mode_unset() {
        use crate::backend::RecordingBackend;
        use crate::view::CameraView;

        let config = FileConfig::from_toml("[view]\npicture_mode = \"none\"\n").unwrap();
        assert_eq!(config.view.picture_mode, None);

        let backend = RecordingBackend::new();
        let mut view = CameraView::new(backend.clone(), config.view);
        backend.clear();
        view.on_attach(None);
        view.capture_picture();
        assert_eq!(backend.calls(), vec![]);

        // Omitting the key keeps the quality default.
        let config = FileConfig::from_toml("[view]\ndefault_facing = \"front\"\n").unwrap();
        assert_eq!(config.view.picture_mode, Some(PictureMode::Quality));
    }

    #[test]
    fn test_invalid_file_rejected() {
        let result = FileConfig::from_toml("[capture]\njpeg_quality = 101\n");
        assert!(matches!(result, Err(ConfigError::InvalidQuality(101))));

        let result = FileConfig::from_toml("[view]\ndefault_flash = \"strobe\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\ncaptures = 7").unwrap();

        let config = FileConfig::from_file(file.path()).unwrap();
        assert_eq!(config.output.captures, 7);
        assert_eq!(config.capture, CaptureConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let result = FileConfig::from_file("/nonexistent/camera-view.toml");
        assert!(matches!(result, Err(ConfigError::FileReadError(_))));
    }
}
