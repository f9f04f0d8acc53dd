//! Camera device abstraction.
//!
//! A [`Camera`] is the low-level device a session backend drives: it opens
//! one sensor at a time, hands back RGB frames and reports what the
//! hardware can do. It knows nothing about listeners, orientation
//! tracking or encoding.

use super::{CaptureConfig, FacingMode, FlashMode, Frame, BYTES_PER_PIXEL};
use crate::orientation::Orientation;
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// No sensor is bound to the facing.
    #[error("no camera for {0} facing")]
    DeviceNotFound(FacingMode),
    /// The device refused to open.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// The device rejected the requested format.
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    /// The device failed to deliver a frame.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// The open sensor has no flash unit.
    #[error("flash mode {0} not supported by the active sensor")]
    FlashUnsupported(FlashMode),
    /// An operation needed an open sensor.
    #[error("camera not initialized")]
    NotInitialized,
}

/// Trait for camera device implementations.
///
/// This abstraction allows swapping between real camera hardware
/// and mock implementations for testing.
pub trait Camera {
    /// Returns true if a sensor exists for `facing`.
    fn has_facing(&self, facing: FacingMode) -> bool;

    /// Opens the sensor for `facing` with the given configuration.
    /// An already open sensor is closed first.
    fn open(&mut self, facing: FacingMode, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Captures a full-resolution frame.
    fn capture(&mut self) -> Result<Frame, CameraError>;

    /// Captures a preview-resolution frame. Devices without a separate
    /// preview stream fall back to a full capture.
    fn capture_preview(&mut self) -> Result<Frame, CameraError> {
        self.capture()
    }

    /// Applies a flash mode to the open sensor.
    fn set_flash(&mut self, flash: FlashMode) -> Result<(), CameraError>;

    /// Mounting angle of the open sensor relative to the natural device
    /// orientation.
    fn sensor_orientation(&self) -> Orientation {
        Orientation::Deg0
    }

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self);
}

/// Mock camera that generates synthetic RGB frames.
///
/// By default it has a back sensor with a flash unit and a front sensor
/// without one, both mounted at 0°.
#[derive(Debug)]
pub struct MockCamera {
    facings: Vec<FacingMode>,
    flash_unit: bool,
    sensor_orientation: Orientation,
    open: Option<OpenSensor>,
    sequence: u64,
}

#[derive(Debug)]
struct OpenSensor {
    facing: FacingMode,
    config: CaptureConfig,
    flash: FlashMode,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self {
            facings: vec![FacingMode::Back, FacingMode::Front],
            flash_unit: true,
            sensor_orientation: Orientation::Deg0,
            open: None,
            sequence: 0,
        }
    }
}

impl MockCamera {
    /// Creates the default two-sensor mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the sensors this device exposes.
    pub fn with_facings(mut self, facings: &[FacingMode]) -> Self {
        self.facings = facings.to_vec();
        self
    }

    /// Removes the flash unit from the back sensor.
    pub fn without_flash(mut self) -> Self {
        self.flash_unit = false;
        self
    }

    /// Sets the mounting rotation reported for every sensor.
    pub fn with_sensor_orientation(mut self, orientation: Orientation) -> Self {
        self.sensor_orientation = orientation;
        self
    }

    /// Facing of the open sensor, if any.
    pub fn active_facing(&self) -> Option<FacingMode> {
        self.open.as_ref().map(|s| s.facing)
    }

    /// Flash mode applied to the open sensor, if any.
    pub fn active_flash(&self) -> Option<FlashMode> {
        self.open.as_ref().map(|s| s.flash)
    }

    fn synthesize(&mut self, width: u32, height: u32) -> Result<Frame, CameraError> {
        let sensor = self.open.as_ref().ok_or(CameraError::NotInitialized)?;
        let facing = sensor.facing;
        let lit = matches!(sensor.flash, FlashMode::On);

        // Horizontal red ramp, vertical green ramp, blue marks the facing.
        let blue = match facing {
            FacingMode::Back => 64u8,
            FacingMode::Front => 192u8,
        };
        let boost = if lit { 32u8 } else { 0 };
        let mut pixels = Vec::with_capacity((width * height) as usize * BYTES_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                let r = ((x * 255) / width.max(1)) as u8;
                let g = ((y * 255) / height.max(1)) as u8;
                pixels.push(r.saturating_add(boost));
                pixels.push(g.saturating_add(boost));
                pixels.push(blue ^ (self.sequence as u8));
            }
        }

        self.sequence += 1;
        Ok(Frame::new(pixels, width, height, facing, self.sequence))
    }
}

impl Camera for MockCamera {
    fn has_facing(&self, facing: FacingMode) -> bool {
        self.facings.contains(&facing)
    }

    fn open(&mut self, facing: FacingMode, config: &CaptureConfig) -> Result<(), CameraError> {
        if !self.has_facing(facing) {
            return Err(CameraError::DeviceNotFound(facing));
        }
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;

        self.open = Some(OpenSensor {
            facing,
            config: config.clone(),
            flash: FlashMode::Off,
        });
        tracing::info!(%facing, width = config.width, height = config.height, "MockCamera opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let (width, height) = {
            let sensor = self.open.as_ref().ok_or(CameraError::NotInitialized)?;
            (sensor.config.width, sensor.config.height)
        };
        self.synthesize(width, height)
    }

    fn capture_preview(&mut self) -> Result<Frame, CameraError> {
        let (width, height) = {
            let sensor = self.open.as_ref().ok_or(CameraError::NotInitialized)?;
            (sensor.config.preview_width, sensor.config.preview_height)
        };
        self.synthesize(width, height)
    }

    fn set_flash(&mut self, flash: FlashMode) -> Result<(), CameraError> {
        let flash_unit = self.flash_unit;
        let sensor = self.open.as_mut().ok_or(CameraError::NotInitialized)?;
        // Only the back sensor carries a flash unit; Off is always honored.
        if flash != FlashMode::Off && (!flash_unit || sensor.facing == FacingMode::Front) {
            return Err(CameraError::FlashUnsupported(flash));
        }
        sensor.flash = flash;
        Ok(())
    }

    fn sensor_orientation(&self) -> Orientation {
        self.sensor_orientation
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn close(&mut self) {
        if self.open.take().is_some() {
            tracing::info!("MockCamera closed");
        }
    }
}
