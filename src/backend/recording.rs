//! Backend that records requests instead of touching hardware.

use super::{CameraListener, CaptureBackend};
use crate::capture::{FacingMode, FlashMode};
use crate::orientation::Orientation;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One request received by a [`RecordingBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    /// [`CaptureBackend::start`].
    Start,
    /// [`CaptureBackend::stop`].
    Stop,
    /// Facing forwarded by the facade.
    SetFacing(FacingMode),
    /// Flash forwarded by the facade.
    SetFlash(FlashMode),
    /// Display rotation pushed by the facade or its detector.
    SetDisplayOrientation(Orientation),
    /// Quality-path capture.
    CapturePicture,
    /// Speed-path capture.
    CaptureStill,
    /// Listener registered or cleared.
    SetCameraListener {
        /// `false` when the listener was cleared.
        registered: bool,
    },
}

#[derive(Default)]
struct Log {
    calls: Vec<BackendCall>,
    listener: Option<Arc<dyn CameraListener>>,
}

/// Records every request in order. Clones share one log, so a test can
/// keep a handle after moving the backend into a facade.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    log: Arc<Mutex<Log>>,
}

impl RecordingBackend {
    /// Creates a backend with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests received so far, oldest first.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded requests equal to `call`.
    pub fn count(&self, call: BackendCall) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// Forgets the recorded requests. The listener stays registered.
    pub fn clear(&self) {
        self.lock().calls.clear();
    }

    /// The currently registered listener.
    pub fn listener(&self) -> Option<Arc<dyn CameraListener>> {
        self.lock().listener.clone()
    }

    fn record(&self, call: BackendCall) {
        tracing::trace!(?call, "Backend request recorded");
        self.lock().calls.push(call);
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CaptureBackend for RecordingBackend {
    fn start(&self) {
        self.record(BackendCall::Start);
    }

    fn stop(&self) {
        self.record(BackendCall::Stop);
    }

    fn set_facing(&self, facing: FacingMode) {
        self.record(BackendCall::SetFacing(facing));
    }

    fn set_flash(&self, flash: FlashMode) {
        self.record(BackendCall::SetFlash(flash));
    }

    fn set_display_orientation(&self, orientation: Orientation) {
        self.record(BackendCall::SetDisplayOrientation(orientation));
    }

    fn capture_picture(&self) {
        self.record(BackendCall::CapturePicture);
    }

    fn capture_still(&self) {
        self.record(BackendCall::CaptureStill);
    }

    fn set_camera_listener(&self, listener: Option<Arc<dyn CameraListener>>) {
        let registered = listener.is_some();
        self.lock().listener = listener;
        self.record(BackendCall::SetCameraListener { registered });
    }
}

impl std::fmt::Debug for RecordingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let log = self.lock();
        f.debug_struct("RecordingBackend")
            .field("calls", &log.calls)
            .field("listener", &log.listener.is_some())
            .finish()
    }
}
