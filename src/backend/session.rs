//! Session backend: one camera device driven by a dedicated thread.
//!
//! Requests are queued on a channel and applied in arrival order by the
//! session thread, which exclusively owns the [`Camera`]. This gives the
//! serialization the backend contract asks for: an orientation update
//! arriving from the sensor thread while a facing change restarts the
//! sensor simply waits its turn.
//!
//! A `stop` queued behind an outstanding capture runs after that capture
//! has been delivered. Captures queued after a `stop` fail with
//! [`CaptureError::NotStarted`].

use super::{encode_jpeg, CameraListener, CaptureBackend, CaptureError};
use crate::capture::{
    Camera, CameraError, CaptureConfig, ConfigError, FacingMode, FlashMode, MockCamera,
};
use crate::orientation::Orientation;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Errors that can occur while creating a session backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The capture configuration failed validation.
    #[error("invalid capture configuration: {0}")]
    Config(#[from] ConfigError),
    /// The session thread could not be started.
    #[error("failed to spawn session thread: {0}")]
    Spawn(#[from] std::io::Error),
}

enum Command {
    Start,
    Stop,
    SetFacing(FacingMode),
    SetFlash(FlashMode),
    SetOrientation(Orientation),
    Capture(CapturePath),
    SetListener(Option<Arc<dyn CameraListener>>),
    Flush(mpsc::Sender<()>),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CapturePath {
    Quality,
    Speed,
}

/// A [`CaptureBackend`] running any [`Camera`] on its own thread.
pub struct SessionBackend {
    commands: mpsc::Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl SessionBackend {
    /// Spawns the session thread.
    ///
    /// `make_camera` runs on the session thread, so the device itself
    /// never crosses threads and need not be `Send`.
    pub fn spawn<C, F>(config: CaptureConfig, make_camera: F) -> Result<Self, BackendError>
    where
        C: Camera + 'static,
        F: FnOnce() -> C + Send + 'static,
    {
        config.validate()?;

        let (commands, queue) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("camera-session".to_string())
            .spawn(move || {
                let mut session = Session::new(make_camera(), config);
                session.run(queue);
            })?;

        Ok(Self {
            commands,
            worker: Some(worker),
        })
    }

    /// Session backend over a [`MockCamera`] with both facings.
    pub fn simulated(config: CaptureConfig) -> Result<Self, BackendError> {
        Self::spawn(config, MockCamera::new)
    }

    /// Blocks until every request queued so far has been applied and its
    /// listener callbacks delivered.
    pub fn flush(&self) {
        let (done, wait) = mpsc::channel();
        if self.commands.send(Command::Flush(done)).is_ok() {
            let _ = wait.recv();
        }
    }

    fn submit(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Camera session thread has exited; request dropped");
        }
    }
}

impl CaptureBackend for SessionBackend {
    fn start(&self) {
        self.submit(Command::Start);
    }

    fn stop(&self) {
        self.submit(Command::Stop);
    }

    fn set_facing(&self, facing: FacingMode) {
        self.submit(Command::SetFacing(facing));
    }

    fn set_flash(&self, flash: FlashMode) {
        self.submit(Command::SetFlash(flash));
    }

    fn set_display_orientation(&self, orientation: Orientation) {
        self.submit(Command::SetOrientation(orientation));
    }

    fn capture_picture(&self) {
        self.submit(Command::Capture(CapturePath::Quality));
    }

    fn capture_still(&self) {
        self.submit(Command::Capture(CapturePath::Speed));
    }

    fn set_camera_listener(&self, listener: Option<Arc<dyn CameraListener>>) {
        self.submit(Command::SetListener(listener));
    }
}

impl Drop for SessionBackend {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);

        if let Some(worker) = self.worker.take() {
            // Dropped from a listener callback: the thread exits on its own.
            if worker.thread().id() == thread::current().id() {
                return;
            }
            if worker.join().is_err() {
                tracing::warn!("Camera session thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for SessionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBackend")
            .field("running", &self.worker.is_some())
            .finish()
    }
}

/// State owned by the session thread.
struct Session<C: Camera> {
    camera: C,
    config: CaptureConfig,
    /// Facing last requested by the host.
    facing: FacingMode,
    /// Facing of the open sensor; `Some` while started.
    active: Option<FacingMode>,
    flash: FlashMode,
    orientation: Orientation,
    listener: Option<Arc<dyn CameraListener>>,
}

impl<C: Camera> Session<C> {
    fn new(camera: C, config: CaptureConfig) -> Self {
        Self {
            camera,
            config,
            facing: FacingMode::default(),
            active: None,
            flash: FlashMode::default(),
            orientation: Orientation::default(),
            listener: None,
        }
    }

    fn run(&mut self, queue: mpsc::Receiver<Command>) {
        while let Ok(command) = queue.recv() {
            match command {
                Command::Start => self.start(),
                Command::Stop => self.stop(),
                Command::SetFacing(facing) => self.set_facing(facing),
                Command::SetFlash(flash) => self.set_flash(flash),
                Command::SetOrientation(orientation) => {
                    let degrees = orientation.degrees();
                    tracing::debug!(degrees, "Display orientation applied");
                    self.orientation = orientation;
                }
                Command::Capture(path) => self.capture(path),
                Command::SetListener(listener) => self.listener = listener,
                Command::Flush(done) => {
                    let _ = done.send(());
                }
                Command::Shutdown => break,
            }
        }

        if self.active.take().is_some() {
            self.camera.close();
            tracing::info!("Camera session released on shutdown");
        }
    }

    /// Requested facing if present, else the back sensor.
    fn resolve_facing(&self) -> Option<FacingMode> {
        if self.camera.has_facing(self.facing) {
            return Some(self.facing);
        }
        if self.camera.has_facing(FacingMode::Back) {
            tracing::info!(requested = %self.facing, "No camera for facing; falling back to back");
            return Some(FacingMode::Back);
        }
        None
    }

    fn start(&mut self) {
        if self.active.is_some() {
            return;
        }
        self.open_sensor();
    }

    fn open_sensor(&mut self) {
        let Some(facing) = self.resolve_facing() else {
            tracing::warn!(requested = %self.facing, "No camera available");
            self.notify_error(CaptureError::NoCameraAvailable {
                requested: self.facing,
            });
            return;
        };

        if let Err(e) = self.camera.open(facing, &self.config) {
            tracing::warn!(%facing, error = %e, "Failed to open camera");
            self.notify_error(CaptureError::OpenFailed(e.to_string()));
            return;
        }

        self.active = Some(facing);
        self.apply_flash();
        tracing::info!(%facing, "Camera session started");

        if let Some(listener) = &self.listener {
            listener.on_camera_opened();
        }
    }

    fn stop(&mut self) {
        if self.active.take().is_none() {
            return;
        }
        self.camera.close();
        tracing::info!("Camera session stopped");

        if let Some(listener) = &self.listener {
            listener.on_camera_closed();
        }
    }

    fn set_facing(&mut self, facing: FacingMode) {
        self.facing = facing;

        let Some(active) = self.active else {
            return;
        };
        if self.resolve_facing() == Some(active) {
            return;
        }

        tracing::info!(from = %active, to = %facing, "Restarting session for facing change");
        self.stop();
        self.open_sensor();
    }

    fn set_flash(&mut self, flash: FlashMode) {
        self.flash = flash;
        self.apply_flash();
    }

    fn apply_flash(&mut self) {
        if self.active.is_none() {
            return;
        }
        match self.camera.set_flash(self.flash) {
            Ok(()) => tracing::debug!(flash = %self.flash, "Flash applied"),
            Err(CameraError::FlashUnsupported(flash)) => {
                tracing::debug!(%flash, "Flash mode unsupported by active sensor; ignored")
            }
            Err(e) => tracing::warn!(error = %e, "Failed to apply flash"),
        }
    }

    fn capture(&mut self, path: CapturePath) {
        let Some(facing) = self.active else {
            self.notify_error(CaptureError::NotStarted);
            return;
        };

        let (frame, quality) = match path {
            CapturePath::Quality => (self.camera.capture(), self.config.jpeg_quality),
            CapturePath::Speed => (self.camera.capture_preview(), self.config.still_quality),
        };
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(?path, error = %e, "Capture failed");
                self.notify_error(CaptureError::CaptureFailed(e.to_string()));
                return;
            }
        };

        let rotation =
            Orientation::image_rotation(self.camera.sensor_orientation(), self.orientation, facing);

        let sequence = frame.sequence();
        let captured_at = frame.timestamp();

        match encode_jpeg(frame, rotation, quality) {
            Ok(jpeg) => {
                tracing::debug!(
                    ?path,
                    sequence,
                    rotation = rotation.degrees(),
                    latency_ms = captured_at.elapsed().as_millis() as u64,
                    bytes = jpeg.len(),
                    "Picture taken"
                );
                if let Some(listener) = &self.listener {
                    listener.on_picture_taken(jpeg);
                }
            }
            Err(e) => {
                tracing::warn!(?path, error = %e, "Encoding failed");
                self.notify_error(e);
            }
        }
    }

    fn notify_error(&self, error: CaptureError) {
        if let Some(listener) = &self.listener {
            listener.on_error(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CameraEvent, ChannelListener};
    use image::GenericImageView;

    fn small_config() -> CaptureConfig {
        CaptureConfig {
            width: 32,
            height: 16,
            preview_width: 8,
            preview_height: 4,
            ..Default::default()
        }
    }

    fn backend_with(camera: MockCamera) -> (SessionBackend, mpsc::Receiver<CameraEvent>) {
        let backend = SessionBackend::spawn(small_config(), move || camera).unwrap();
        let (listener, events) = ChannelListener::new();
        backend.set_camera_listener(Some(listener));
        (backend, events)
    }

    fn drain(backend: &SessionBackend, events: &mpsc::Receiver<CameraEvent>) -> Vec<CameraEvent> {
        backend.flush();
        events.try_iter().collect()
    }

    fn picture_dimensions(event: &CameraEvent) -> (u32, u32) {
        match event {
            CameraEvent::PictureTaken(jpeg) => image::load_from_memory(jpeg).unwrap().dimensions(),
            other => panic!("expected picture, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CaptureConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(
            SessionBackend::simulated(config),
            Err(BackendError::Config(ConfigError::InvalidDimensions))
        ));
    }

    #[test]
    fn test_start_stop_idempotent() {
        let (backend, events) = backend_with(MockCamera::new());

        backend.start();
        backend.start();
        backend.stop();
        backend.stop();

        assert_eq!(
            drain(&backend, &events),
            vec![CameraEvent::Opened, CameraEvent::Closed]
        );
    }

    #[test]
    fn test_capture_paths() {
        let (backend, events) = backend_with(MockCamera::new());
        backend.start();
        backend.capture_picture();
        backend.capture_still();

        let received = drain(&backend, &events);
        assert_eq!(received.len(), 3);
        assert_eq!(picture_dimensions(&received[1]), (32, 16));
        assert_eq!(picture_dimensions(&received[2]), (8, 4));
    }

    #[test]
    fn test_capture_while_stopped_reports_error() {
        let (backend, events) = backend_with(MockCamera::new());
        backend.capture_picture();

        assert_eq!(
            drain(&backend, &events),
            vec![CameraEvent::Error(CaptureError::NotStarted)]
        );
    }

    #[test]
    fn test_orientation_applies_without_restart() {
        let (backend, events) = backend_with(MockCamera::new());
        backend.start();
        backend.set_display_orientation(Orientation::Deg90);
        backend.capture_picture();

        let received = drain(&backend, &events);
        assert_eq!(received.len(), 2, "no close/reopen expected: {received:?}");
        assert_eq!(picture_dimensions(&received[1]), (16, 32));
    }

    #[test]
    fn test_facing_change_restarts_running_session() {
        let (backend, events) = backend_with(MockCamera::new());
        backend.set_facing(FacingMode::Front);
        backend.start();
        backend.set_facing(FacingMode::Back);
        backend.set_facing(FacingMode::Back);

        assert_eq!(
            drain(&backend, &events),
            vec![CameraEvent::Opened, CameraEvent::Closed, CameraEvent::Opened]
        );
    }

    #[test]
    fn test_missing_facing_falls_back_without_error() {
        let camera = MockCamera::new().with_facings(&[FacingMode::Back]);
        let (backend, events) = backend_with(camera);

        backend.start();
        // Front resolves to the already open back sensor: no restart.
        backend.set_facing(FacingMode::Front);
        backend.capture_picture();

        let received = drain(&backend, &events);
        assert_eq!(received[0], CameraEvent::Opened);
        assert!(matches!(received[1], CameraEvent::PictureTaken(_)));
        assert_eq!(received.len(), 2);
    }

    #[test]
    fn test_no_camera_reported_through_listener() {
        let camera = MockCamera::new().with_facings(&[]);
        let (backend, events) = backend_with(camera);

        backend.set_facing(FacingMode::Front);
        backend.start();

        assert_eq!(
            drain(&backend, &events),
            vec![CameraEvent::Error(CaptureError::NoCameraAvailable {
                requested: FacingMode::Front
            })]
        );
    }

    #[test]
    fn test_unsupported_flash_is_silent() {
        let (backend, events) = backend_with(MockCamera::new().without_flash());
        backend.start();
        backend.set_flash(FlashMode::On);
        backend.set_flash(FlashMode::Auto);

        assert_eq!(drain(&backend, &events), vec![CameraEvent::Opened]);
    }

    #[test]
    fn test_listener_replacement_discards_previous() {
        let (backend, first) = backend_with(MockCamera::new());
        let (second_listener, second) = ChannelListener::new();

        backend.start();
        backend.set_camera_listener(Some(second_listener));
        backend.stop();
        backend.flush();

        let first: Vec<_> = first.try_iter().collect();
        let second: Vec<_> = second.try_iter().collect();
        assert_eq!(first, vec![CameraEvent::Opened]);
        assert_eq!(second, vec![CameraEvent::Closed]);
    }

    #[test]
    fn test_concurrent_orientation_during_restarts() {
        let (backend, events) = backend_with(MockCamera::new());
        let backend = Arc::new(backend);
        backend.start();

        let sensor = {
            let backend = Arc::clone(&backend);
            thread::spawn(move || {
                for turn in 0..200u8 {
                    backend.set_display_orientation(Orientation::from_surface_rotation(turn));
                }
            })
        };
        for _ in 0..20 {
            backend.set_facing(FacingMode::Front);
            backend.set_facing(FacingMode::Back);
        }
        sensor.join().unwrap();

        backend.set_display_orientation(Orientation::Deg0);
        backend.capture_picture();
        let received = drain(&backend, &events);
        assert_eq!(picture_dimensions(received.last().unwrap()), (32, 16));
    }

    /// Red and green at (1, 1) of the delivered picture. The mock's
    /// gradient is dark at the source origin and bright at the far corner.
    fn near_origin(event: &CameraEvent) -> (u8, u8) {
        match event {
            CameraEvent::PictureTaken(jpeg) => {
                let image = image::load_from_memory(jpeg).unwrap().to_rgb8();
                let pixel = image.get_pixel(1, 1);
                (pixel[0], pixel[1])
            }
            other => panic!("expected picture, got {other:?}"),
        }
    }

    #[test]
    fn test_front_rotation_adds_sensor_and_display() {
        let camera = MockCamera::new().with_sensor_orientation(Orientation::Deg90);
        let (backend, events) = backend_with(camera);

        backend.set_facing(FacingMode::Front);
        backend.set_display_orientation(Orientation::Deg90);
        backend.start();
        backend.capture_picture();

        // 90 + 90: a half turn brings the bright corner to the origin.
        let received = drain(&backend, &events);
        assert_eq!(received.len(), 2, "{received:?}");
        assert_eq!(picture_dimensions(&received[1]), (32, 16));
        let (red, green) = near_origin(&received[1]);
        assert!(
            red > 180 && green > 160,
            "expected bright corner, got ({red}, {green})"
        );
    }

    #[test]
    fn test_back_rotation_subtracts_display() {
        let camera = MockCamera::new().with_sensor_orientation(Orientation::Deg90);
        let (backend, events) = backend_with(camera);

        backend.set_display_orientation(Orientation::Deg90);
        backend.start();
        backend.capture_picture();

        // 90 - 90: no rotation.
        let received = drain(&backend, &events);
        let (red, green) = near_origin(&received[1]);
        assert!(
            red < 70 && green < 70,
            "expected dark corner, got ({red}, {green})"
        );
    }

    #[test]
    fn test_rotation_follows_active_sensor_after_fallback() {
        let camera = MockCamera::new()
            .with_facings(&[FacingMode::Back])
            .with_sensor_orientation(Orientation::Deg90);
        let (backend, events) = backend_with(camera);

        // Front is requested but the back sensor is what opens.
        backend.set_facing(FacingMode::Front);
        backend.set_display_orientation(Orientation::Deg90);
        backend.start();
        backend.capture_picture();

        let received = drain(&backend, &events);
        assert_eq!(received[0], CameraEvent::Opened);
        let (red, green) = near_origin(&received[1]);
        assert!(
            red < 70 && green < 70,
            "expected dark corner, got ({red}, {green})"
        );
    }
}
