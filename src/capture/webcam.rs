//! Desktop webcam device backed by nokhwa.
//!
//! Webcams carry no facing metadata, so each facing is bound to a device
//! index through [`CaptureConfig::back_device`] and
//! [`CaptureConfig::front_device`]. They also have no flash unit.

use super::{Camera, CameraError, CaptureConfig, FacingMode, FlashMode, Frame};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};

/// Names of the webcams visible to the native capture API.
pub fn list_webcams() -> Result<Vec<String>, CameraError> {
    let devices = nokhwa::query(ApiBackend::Auto)
        .map_err(|e| CameraError::OpenFailed(format!("failed to query cameras: {e}")))?;

    Ok(devices
        .iter()
        .map(|info| format!("{}: {}", info.index(), info.human_name()))
        .collect())
}

/// A [`Camera`] over a native webcam stream.
///
/// The nokhwa handle is not `Send`; construct this on the thread that
/// will drive it (the session backend's factory closure does so).
pub struct WebcamCamera {
    config: CaptureConfig,
    open: Option<(FacingMode, nokhwa::Camera)>,
    sequence: u64,
}

impl WebcamCamera {
    /// Creates a closed camera. Nothing is opened until `open`.
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            open: None,
            sequence: 0,
        }
    }
}

impl Camera for WebcamCamera {
    fn has_facing(&self, facing: FacingMode) -> bool {
        self.config.device_for(facing).is_some()
    }

    fn open(&mut self, facing: FacingMode, config: &CaptureConfig) -> Result<(), CameraError> {
        self.close();
        self.config = config.clone();

        let index = config
            .device_for(facing)
            .ok_or(CameraError::DeviceNotFound(facing))?;

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(config.width, config.height),
                FrameFormat::MJPEG,
                30,
            ),
        ));

        let mut camera = nokhwa::Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| CameraError::OpenFailed(format!("failed to open stream: {e}")))?;

        tracing::info!(%facing, index, "Webcam opened");
        self.open = Some((facing, camera));
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let (facing, camera) = self.open.as_mut().ok_or(CameraError::NotInitialized)?;

        let buffer = camera
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        let image = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::CaptureFailed(format!("failed to decode frame: {e}")))?;

        let (width, height) = (image.width(), image.height());
        self.sequence += 1;
        Ok(Frame::new(
            image.into_raw(),
            width,
            height,
            *facing,
            self.sequence,
        ))
    }

    fn set_flash(&mut self, flash: FlashMode) -> Result<(), CameraError> {
        match flash {
            FlashMode::Off => Ok(()),
            other => Err(CameraError::FlashUnsupported(other)),
        }
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn close(&mut self) {
        if let Some((facing, mut camera)) = self.open.take() {
            if let Err(e) = camera.stop_stream() {
                tracing::warn!(%facing, error = %e, "Error stopping webcam stream");
            }
            tracing::info!(%facing, "Webcam closed");
        }
    }
}

impl Drop for WebcamCamera {
    fn drop(&mut self) {
        self.close();
    }
}
