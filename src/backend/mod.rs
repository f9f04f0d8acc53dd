//! Capture backend contract.
//!
//! A [`CaptureBackend`] is what the facade drives. Every request is
//! fire-and-forget: the call returns once the request is accepted, and
//! outcomes (session opened or closed, picture bytes, failures) arrive
//! later on the single registered [`CameraListener`].
//!
//! Unsupported configuration is absorbed by the backend: a missing
//! facing falls back to [`FacingMode::Back`], an unsupported flash mode
//! is ignored. Neither is reported as an error.
//!
//! Two implementations ship with the crate:
//!
//! - [`SessionBackend`] runs any [`crate::capture::Camera`] on a
//!   dedicated session thread and encodes stills as JPEG.
//! - [`RecordingBackend`] only logs the requests it receives, for
//!   testing hosts.

mod encode;
mod recording;
mod session;

pub use encode::encode_jpeg;
pub use recording::{BackendCall, RecordingBackend};
pub use session::{BackendError, SessionBackend};

use crate::capture::{FacingMode, FlashMode};
use crate::orientation::Orientation;
use std::sync::mpsc;
use std::sync::Arc;
use thiserror::Error;

/// Failures delivered asynchronously through [`CameraListener::on_error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Neither the requested sensor nor the back fallback could be found.
    #[error("no camera available for {requested} facing or the fallback")]
    NoCameraAvailable {
        /// The facing the session asked for.
        requested: FacingMode,
    },
    /// The sensor exists but refused to open.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// A capture arrived before `start`.
    #[error("capture requested while the session is stopped")]
    NotStarted,
    /// The device failed to deliver a frame.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// The frame could not be turned into a JPEG.
    #[error("failed to encode picture: {0}")]
    EncodeFailed(String),
}

/// Receives asynchronous session outcomes.
///
/// Callbacks run on the backend's own thread. All methods default to
/// doing nothing.
pub trait CameraListener: Send + Sync {
    /// The sensor opened and the session is running.
    fn on_camera_opened(&self) {}

    /// The sensor closed after `stop` or a facing change.
    fn on_camera_closed(&self) {}

    /// A still was captured; `jpeg` holds the encoded image.
    fn on_picture_taken(&self, jpeg: Vec<u8>) {
        let _ = jpeg;
    }

    /// A session operation failed.
    fn on_error(&self, error: CaptureError) {
        let _ = error;
    }
}

/// The capability set every backend variant provides.
///
/// Methods take `&self`: a backend is shared between the facade and the
/// orientation handler running on the sensor thread, so it serializes
/// internally. In particular `set_display_orientation` must be safe to
/// call while a facing change is restarting the session.
pub trait CaptureBackend: Send + Sync {
    /// Begins a capture session. No effect if already started.
    fn start(&self);

    /// Ends the session and releases the sensor. No effect if stopped.
    fn stop(&self);

    /// Selects the sensor, restarting a running session if needed.
    fn set_facing(&self, facing: FacingMode);

    /// Applies a flash mode if the active sensor supports it.
    fn set_flash(&self, flash: FlashMode);

    /// Orientation applied to every subsequently captured image.
    fn set_display_orientation(&self, orientation: Orientation);

    /// Full-quality still capture.
    fn capture_picture(&self);

    /// Low-latency capture from the preview stream.
    fn capture_still(&self);

    /// Replaces the registered listener. `None` unregisters.
    fn set_camera_listener(&self, listener: Option<Arc<dyn CameraListener>>);
}

impl<T: CaptureBackend + ?Sized> CaptureBackend for Box<T> {
    fn start(&self) {
        (**self).start()
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn set_facing(&self, facing: FacingMode) {
        (**self).set_facing(facing)
    }

    fn set_flash(&self, flash: FlashMode) {
        (**self).set_flash(flash)
    }

    fn set_display_orientation(&self, orientation: Orientation) {
        (**self).set_display_orientation(orientation)
    }

    fn capture_picture(&self) {
        (**self).capture_picture()
    }

    fn capture_still(&self) {
        (**self).capture_still()
    }

    fn set_camera_listener(&self, listener: Option<Arc<dyn CameraListener>>) {
        (**self).set_camera_listener(listener)
    }
}

/// A listener callback as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraEvent {
    /// Mirrors [`CameraListener::on_camera_opened`].
    Opened,
    /// Mirrors [`CameraListener::on_camera_closed`].
    Closed,
    /// JPEG bytes of a finished capture.
    PictureTaken(Vec<u8>),
    /// Mirrors [`CameraListener::on_error`].
    Error(CaptureError),
}

/// Listener that forwards every callback into a channel.
#[derive(Debug)]
pub struct ChannelListener {
    sender: mpsc::Sender<CameraEvent>,
}

impl ChannelListener {
    /// Creates a listener and the receiver its events arrive on.
    pub fn new() -> (Arc<Self>, mpsc::Receiver<CameraEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Arc::new(Self { sender }), receiver)
    }

    fn send(&self, event: CameraEvent) {
        // Receiver gone means nobody is listening anymore.
        let _ = self.sender.send(event);
    }
}

impl CameraListener for ChannelListener {
    fn on_camera_opened(&self) {
        self.send(CameraEvent::Opened);
    }

    fn on_camera_closed(&self) {
        self.send(CameraEvent::Closed);
    }

    fn on_picture_taken(&self, jpeg: Vec<u8>) {
        self.send(CameraEvent::PictureTaken(jpeg));
    }

    fn on_error(&self, error: CaptureError) {
        self.send(CameraEvent::Error(error));
    }
}
