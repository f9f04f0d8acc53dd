//! Camera facade.
//!
//! [`CameraView`] is what a host UI embeds. It holds the facing, flash and
//! picture mode, owns exactly one [`CaptureBackend`] and one
//! [`OrientationDetector`], and wires orientation changes straight into
//! the backend.
//!
//! # Lifecycle
//!
//! ```text
//!            on_attach            start
//! Detached ───────────▶ Attached ──────▶ Attached
//!    ▲                  Stopped ◀────── Started
//!    │                     │       stop     │
//!    └──── on_detach ──────┴────────────────┘
//! ```
//!
//! Attaching enables the detector on the host display but never starts
//! the backend. Detaching disables the detector and, unless
//! [`ViewConfig::stop_on_detach`] is off, stops a running backend.
//!
//! Nothing here returns an error. Backend failures reach the registered
//! [`CameraListener`]; calls that make no sense in the current state are
//! ignored.

mod config;
mod state;

pub use config::ViewConfig;
pub use state::{SavedState, StateError, ENCODED_LEN};

use crate::backend::{CameraListener, CaptureBackend};
use crate::capture::{FacingMode, FlashMode, PictureMode};
use crate::orientation::{Display, Orientation, OrientationDetector};
use std::sync::Arc;

/// Where the facade is in its host lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Not attached to a host, or detached since.
    Detached,
    /// Attached with no session requested.
    AttachedStopped,
    /// Attached with a running session.
    AttachedStarted,
}

/// Whether the facade has asked its backend to run a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session requested.
    #[default]
    Stopped,
    /// `start` was forwarded and not yet undone.
    Started,
}

/// Counters and current settings, for diagnostics and metrics export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewStats {
    /// Current facing.
    pub facing: FacingMode,
    /// Current flash mode.
    pub flash: FlashMode,
    /// Current session state.
    pub session: SessionState,
    /// Whether a host currently shows the view.
    pub attached: bool,
    /// Facing changes forwarded to the backend, construction included.
    pub facing_forwards: u64,
    /// Flash changes forwarded to the backend, construction included.
    pub flash_forwards: u64,
    /// `start` calls forwarded.
    pub session_starts: u64,
    /// `stop` calls forwarded, detach included.
    pub session_stops: u64,
    /// Captures routed to the quality path.
    pub quality_captures: u64,
    /// Captures routed to the speed path.
    pub speed_captures: u64,
    /// Orientation notifications pushed to the backend.
    pub orientation_changes: u64,
    /// Orientation last pushed while attached.
    pub display_orientation: Option<Orientation>,
}

/// Backend-agnostic camera control surface.
pub struct CameraView<B: CaptureBackend + 'static> {
    backend: Arc<B>,
    detector: OrientationDetector,
    config: ViewConfig,
    facing: FacingMode,
    flash: FlashMode,
    picture_mode: Option<PictureMode>,
    listener: Option<Arc<dyn CameraListener>>,
    attached: bool,
    session: SessionState,
    stats: ViewStats,
}

impl<B: CaptureBackend + 'static> CameraView<B> {
    /// Creates a detached view and forwards the configured default
    /// facing and flash to `backend`.
    pub fn new(backend: B, config: ViewConfig) -> Self {
        Self::with_saved_state(backend, config, None)
    }

    /// Creates a detached view, forwarding `saved` facing and flash if
    /// present and the configured defaults otherwise.
    pub fn with_saved_state(backend: B, config: ViewConfig, saved: Option<SavedState>) -> Self {
        let backend = Arc::new(backend);

        let detector = OrientationDetector::new();
        let forward = Arc::clone(&backend);
        detector.set_handler(move |orientation| forward.set_display_orientation(orientation));

        let initial =
            saved.unwrap_or_else(|| SavedState::new(config.default_facing, config.default_flash));

        let mut view = Self {
            backend,
            detector,
            picture_mode: config.picture_mode,
            config,
            facing: initial.facing,
            flash: initial.flash,
            listener: None,
            attached: false,
            session: SessionState::Stopped,
            stats: ViewStats::default(),
        };

        view.set_facing(initial.facing);
        view.set_flash(initial.flash);
        view
    }

    /// Host attached the view to a window showing `host_display`.
    ///
    /// Without a display the detector stays inert and the backend keeps
    /// whatever orientation it last received.
    pub fn on_attach(&mut self, host_display: Option<Arc<dyn Display>>) {
        self.attached = true;
        let has_display = host_display.is_some();
        tracing::info!(has_display, "Camera view attached");
        self.detector.enable(host_display);
    }

    /// Host detached the view.
    pub fn on_detach(&mut self) {
        self.detector.disable();
        self.attached = false;
        tracing::info!("Camera view detached");

        if self.session == SessionState::Started {
            if self.config.stop_on_detach {
                self.stop();
            } else {
                tracing::debug!("Backend left running after detach");
            }
        }
    }

    /// Starts the backend session. Ignored while detached or already
    /// started.
    pub fn start(&mut self) {
        if !self.attached {
            tracing::debug!("Ignoring start while detached");
            return;
        }
        if self.session == SessionState::Started {
            return;
        }

        self.backend.start();
        self.session = SessionState::Started;
        self.stats.session_starts += 1;
        tracing::info!(facing = %self.facing, flash = %self.flash, "Camera session requested");
    }

    /// Stops the backend session. Ignored unless started.
    pub fn stop(&mut self) {
        if self.session != SessionState::Started {
            return;
        }

        self.backend.stop();
        self.session = SessionState::Stopped;
        self.stats.session_stops += 1;
        tracing::info!("Camera session stop requested");
    }

    /// Sets the facing and forwards it, in any state.
    pub fn set_facing(&mut self, facing: FacingMode) {
        self.facing = facing;
        self.backend.set_facing(facing);
        self.stats.facing_forwards += 1;
        tracing::debug!(%facing, "Facing forwarded");
    }

    /// Switches Back <-> Front and returns the new facing.
    pub fn toggle_facing(&mut self) -> FacingMode {
        self.set_facing(self.facing.toggled());
        self.facing
    }

    /// Sets the flash mode and forwards it, in any state.
    pub fn set_flash(&mut self, flash: FlashMode) {
        self.flash = flash;
        self.backend.set_flash(flash);
        self.stats.flash_forwards += 1;
        tracing::debug!(%flash, "Flash forwarded");
    }

    /// Cycles Off -> On -> Auto -> Off and returns the new mode.
    pub fn toggle_flash(&mut self) -> FlashMode {
        self.set_flash(self.flash.next());
        self.flash
    }

    /// Selects the capture path. Held here only; never forwarded.
    pub fn set_picture_mode(&mut self, mode: PictureMode) {
        self.picture_mode = Some(mode);
    }

    /// Registers the single listener, replacing any previous one.
    pub fn set_camera_listener(&mut self, listener: Arc<dyn CameraListener>) {
        self.listener = Some(Arc::clone(&listener));
        self.backend.set_camera_listener(Some(listener));
    }

    /// Unregisters the listener from the facade and the backend.
    pub fn clear_camera_listener(&mut self) {
        self.listener = None;
        self.backend.set_camera_listener(None);
    }

    /// Takes a picture through the path the picture mode selects.
    /// Does nothing while the mode is unset.
    pub fn capture_picture(&mut self) {
        match self.picture_mode {
            Some(PictureMode::Quality) => {
                self.backend.capture_picture();
                self.stats.quality_captures += 1;
            }
            Some(PictureMode::Speed) => {
                self.backend.capture_still();
                self.stats.speed_captures += 1;
            }
            None => tracing::debug!("Picture mode unset; capture ignored"),
        }
    }

    /// Snapshot of the persisted settings.
    pub fn save_state(&self) -> SavedState {
        SavedState::new(self.facing, self.flash)
    }

    /// Replays facing then flash through the live setters. `None` keeps
    /// the current settings.
    pub fn restore_state(&mut self, snapshot: Option<SavedState>) {
        let Some(snapshot) = snapshot else {
            tracing::debug!("No saved state to restore");
            return;
        };
        self.set_facing(snapshot.facing);
        self.set_flash(snapshot.flash);
    }

    /// Restores from [`SavedState::encode`] text. Text that does not
    /// decode to a snapshot is ignored.
    pub fn restore_encoded(&mut self, text: &str) {
        match SavedState::decode(text) {
            Ok(snapshot) => self.restore_state(Some(snapshot)),
            Err(e) => tracing::warn!(error = %e, "Ignoring unrecognized saved state"),
        }
    }

    /// Returns the current facing.
    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    /// Returns the current flash mode.
    pub fn flash(&self) -> FlashMode {
        self.flash
    }

    /// `None` while the picture mode is uninitialized.
    pub fn picture_mode(&self) -> Option<PictureMode> {
        self.picture_mode
    }

    /// Returns the session state.
    pub fn session_state(&self) -> SessionState {
        self.session
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> ViewState {
        match (self.attached, self.session) {
            (false, _) => ViewState::Detached,
            (true, SessionState::Stopped) => ViewState::AttachedStopped,
            (true, SessionState::Started) => ViewState::AttachedStarted,
        }
    }

    /// Returns the registered listener.
    pub fn listener(&self) -> Option<&Arc<dyn CameraListener>> {
        self.listener.as_ref()
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The detector the platform feeds rotation-sensor readings into.
    /// Clone it to hand a handle to the sensor thread.
    pub fn orientation_detector(&self) -> &OrientationDetector {
        &self.detector
    }

    /// Returns a snapshot of the counters and current settings.
    pub fn stats(&self) -> ViewStats {
        ViewStats {
            facing: self.facing,
            flash: self.flash,
            session: self.session,
            attached: self.attached,
            orientation_changes: self.detector.notifications(),
            display_orientation: self.detector.current(),
            ..self.stats.clone()
        }
    }
}

impl<B: CaptureBackend + 'static> Drop for CameraView<B> {
    fn drop(&mut self) {
        // The handler holds a backend reference; cut it loose.
        self.detector.disable();
        self.detector.clear_handler();
    }
}

impl<B: CaptureBackend + 'static> std::fmt::Debug for CameraView<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraView")
            .field("state", &self.state())
            .field("facing", &self.facing)
            .field("flash", &self.flash)
            .field("picture_mode", &self.picture_mode)
            .field("listener", &self.listener.is_some())
            .field("detector", &self.detector)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, ChannelListener, RecordingBackend};
    use crate::orientation::SimulatedDisplay;

    fn view() -> (CameraView<RecordingBackend>, RecordingBackend) {
        let backend = RecordingBackend::new();
        let view = CameraView::new(backend.clone(), ViewConfig::default());
        backend.clear();
        (view, backend)
    }

    fn display() -> Option<Arc<dyn Display>> {
        Some(Arc::new(SimulatedDisplay::default()))
    }

    #[test]
    fn test_construction_forwards_defaults_once() {
        let backend = RecordingBackend::new();
        let config = ViewConfig {
            default_facing: FacingMode::Front,
            default_flash: FlashMode::Auto,
            ..Default::default()
        };
        let view = CameraView::new(backend.clone(), config);

        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::SetFacing(FacingMode::Front),
                BackendCall::SetFlash(FlashMode::Auto)
            ]
        );
        assert_eq!(view.state(), ViewState::Detached);
        assert_eq!(view.picture_mode(), Some(PictureMode::Quality));
    }

    #[test]
    fn test_saved_state_replaces_defaults() {
        let backend = RecordingBackend::new();
        let saved = SavedState::new(FacingMode::Front, FlashMode::On);
        let view =
            CameraView::with_saved_state(backend.clone(), ViewConfig::default(), Some(saved));

        assert_eq!(view.save_state(), saved);
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::SetFacing(FacingMode::Front),
                BackendCall::SetFlash(FlashMode::On)
            ]
        );
    }

    #[test]
    fn test_start_requires_attach() {
        let (mut view, backend) = view();

        view.start();
        assert_eq!(backend.count(BackendCall::Start), 0);
        assert_eq!(view.session_state(), SessionState::Stopped);

        view.on_attach(display());
        assert_eq!(view.state(), ViewState::AttachedStopped);
        assert_eq!(backend.count(BackendCall::Start), 0, "attach must not start");

        view.start();
        view.start();
        assert_eq!(backend.count(BackendCall::Start), 1);
        assert_eq!(view.state(), ViewState::AttachedStarted);
    }

    #[test]
    fn test_stop_only_when_started() {
        let (mut view, backend) = view();
        view.on_attach(None);

        view.stop();
        assert_eq!(backend.count(BackendCall::Stop), 0);

        view.start();
        view.stop();
        view.stop();
        assert_eq!(backend.count(BackendCall::Stop), 1);
        assert_eq!(view.state(), ViewState::AttachedStopped);
    }

    #[test]
    fn test_detach_stops_by_default() {
        let (mut view, backend) = view();
        view.on_attach(display());
        view.start();

        view.on_detach();

        assert_eq!(backend.count(BackendCall::Stop), 1);
        assert_eq!(view.state(), ViewState::Detached);
        assert_eq!(view.session_state(), SessionState::Stopped);
        assert!(!view.orientation_detector().is_enabled());
    }

    #[test]
    fn test_detach_can_leave_backend_running() {
        let backend = RecordingBackend::new();
        let config = ViewConfig {
            stop_on_detach: false,
            ..Default::default()
        };
        let mut view = CameraView::new(backend.clone(), config);
        view.on_attach(display());
        view.start();

        view.on_detach();
        assert_eq!(backend.count(BackendCall::Stop), 0);
        assert_eq!(view.state(), ViewState::Detached);
        assert_eq!(view.session_state(), SessionState::Started);

        // Still stoppable once detached.
        view.stop();
        assert_eq!(backend.count(BackendCall::Stop), 1);
    }

    #[test]
    fn test_setters_forward_in_every_state() {
        let (mut view, backend) = view();

        view.set_facing(FacingMode::Front);
        view.on_attach(display());
        view.set_flash(FlashMode::On);
        view.start();
        view.set_facing(FacingMode::Front);
        view.on_detach();
        view.set_flash(FlashMode::On);

        assert_eq!(backend.count(BackendCall::SetFacing(FacingMode::Front)), 2);
        assert_eq!(backend.count(BackendCall::SetFlash(FlashMode::On)), 2);
    }

    #[test]
    fn test_toggles_forward_and_return_new_value() {
        let (mut view, backend) = view();

        assert_eq!(view.toggle_facing(), FacingMode::Front);
        assert_eq!(view.toggle_facing(), FacingMode::Back);
        assert_eq!(view.toggle_flash(), FlashMode::On);
        assert_eq!(view.toggle_flash(), FlashMode::Auto);
        assert_eq!(view.toggle_flash(), FlashMode::Off);

        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::SetFacing(FacingMode::Front),
                BackendCall::SetFacing(FacingMode::Back),
                BackendCall::SetFlash(FlashMode::On),
                BackendCall::SetFlash(FlashMode::Auto),
                BackendCall::SetFlash(FlashMode::Off),
            ]
        );
    }

    #[test]
    fn test_capture_dispatch_by_picture_mode() {
        let (mut view, backend) = view();

        view.capture_picture();
        view.set_picture_mode(PictureMode::Speed);
        view.capture_picture();

        assert_eq!(
            backend.calls(),
            vec![BackendCall::CapturePicture, BackendCall::CaptureStill]
        );
        let stats = view.stats();
        assert_eq!((stats.quality_captures, stats.speed_captures), (1, 1));
    }

    #[test]
    fn test_unset_picture_mode_is_noop() {
        let backend = RecordingBackend::new();
        let config = ViewConfig {
            picture_mode: None,
            ..Default::default()
        };
        let mut view = CameraView::new(backend.clone(), config);
        backend.clear();

        view.capture_picture();
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_listener_registration_replaces() {
        let (mut view, backend) = view();
        let (first, _first_events) = ChannelListener::new();
        let (second, _second_events) = ChannelListener::new();

        view.set_camera_listener(first);
        view.set_camera_listener(second.clone());

        let registered = backend.listener().unwrap();
        let expected: Arc<dyn CameraListener> = second;
        assert!(Arc::ptr_eq(&registered, &expected));
        assert!(view.listener().is_some());

        view.clear_camera_listener();
        assert!(backend.listener().is_none());
        assert!(view.listener().is_none());
    }

    #[test]
    fn test_restore_replays_facing_then_flash() {
        let (mut view, backend) = view();

        view.restore_state(Some(SavedState::new(FacingMode::Front, FlashMode::Auto)));
        view.restore_state(None);

        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::SetFacing(FacingMode::Front),
                BackendCall::SetFlash(FlashMode::Auto)
            ]
        );
    }

    #[test]
    fn test_restore_encoded_ignores_garbage() {
        let (mut view, backend) = view();

        view.restore_encoded("not a snapshot");
        assert!(backend.calls().is_empty());
        assert_eq!(view.facing(), FacingMode::Back);

        let text = SavedState::new(FacingMode::Front, FlashMode::On)
            .encode()
            .unwrap();
        view.restore_encoded(&text);
        assert_eq!(
            view.save_state(),
            SavedState::new(FacingMode::Front, FlashMode::On)
        );
    }

    #[test]
    fn test_attach_pushes_orientation() {
        let (mut view, backend) = view();
        let display = Arc::new(SimulatedDisplay::new(Orientation::Deg180));

        view.on_attach(Some(display));

        assert_eq!(
            backend.calls(),
            vec![BackendCall::SetDisplayOrientation(Orientation::Deg180)]
        );
        assert_eq!(view.stats().display_orientation, Some(Orientation::Deg180));
    }

    #[test]
    fn test_attach_without_display_is_inert() {
        let (mut view, backend) = view();

        view.on_attach(None);
        view.orientation_detector().on_sensor_changed(90);

        assert_eq!(view.state(), ViewState::AttachedStopped);
        assert!(!view.orientation_detector().is_enabled());
        assert_eq!(backend.calls(), vec![]);
        assert_eq!(view.stats().display_orientation, None);
    }

    #[test]
    fn test_stats_track_forwards() {
        let (mut view, _backend) = view();
        view.on_attach(display());
        view.start();
        view.toggle_flash();
        view.stop();

        let stats = view.stats();
        assert_eq!(stats.facing_forwards, 1);
        assert_eq!(stats.flash_forwards, 2);
        assert_eq!(stats.session_starts, 1);
        assert_eq!(stats.session_stops, 1);
        assert_eq!(stats.orientation_changes, 1);
        assert_eq!(stats.flash, FlashMode::On);
        assert!(stats.attached);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Attach,
            Detach,
            Start,
            Stop,
            SetFacing(FacingMode),
            ToggleFacing,
            SetFlash(FlashMode),
            ToggleFlash,
            Capture,
        }

        fn facing() -> impl Strategy<Value = FacingMode> {
            prop_oneof![Just(FacingMode::Back), Just(FacingMode::Front)]
        }

        fn flash() -> impl Strategy<Value = FlashMode> {
            prop_oneof![
                Just(FlashMode::Off),
                Just(FlashMode::On),
                Just(FlashMode::Auto)
            ]
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::Attach),
                Just(Op::Detach),
                Just(Op::Start),
                Just(Op::Stop),
                facing().prop_map(Op::SetFacing),
                Just(Op::ToggleFacing),
                flash().prop_map(Op::SetFlash),
                Just(Op::ToggleFlash),
                Just(Op::Capture),
            ]
        }

        proptest! {
            #[test]
            fn toggles_cycle(start_facing in facing(), start_flash in flash()) {
                let (mut view, _backend) = view();
                view.set_facing(start_facing);
                view.set_flash(start_flash);

                view.toggle_facing();
                prop_assert_ne!(view.facing(), start_facing);
                view.toggle_facing();
                prop_assert_eq!(view.facing(), start_facing);

                view.toggle_flash();
                view.toggle_flash();
                prop_assert_ne!(view.flash(), start_flash);
                view.toggle_flash();
                prop_assert_eq!(view.flash(), start_flash);
            }

            #[test]
            fn save_then_restore_is_identity(f in facing(), fl in flash()) {
                let (mut source, _) = view();
                source.set_facing(f);
                source.set_flash(fl);

                let (mut target, _) = view();
                target.restore_state(Some(source.save_state()));
                prop_assert_eq!(target.save_state(), SavedState::new(f, fl));
            }

            #[test]
            fn every_setter_forwards_exactly_once(ops in proptest::collection::vec(op(), 0..40)) {
                let (mut view, backend) = view();
                let mut facing_calls = 0;
                let mut flash_calls = 0;

                for op in &ops {
                    match op {
                        Op::Attach => view.on_attach(display()),
                        Op::Detach => view.on_detach(),
                        Op::Start => view.start(),
                        Op::Stop => view.stop(),
                        Op::SetFacing(f) => {
                            view.set_facing(*f);
                            facing_calls += 1;
                        }
                        Op::ToggleFacing => {
                            view.toggle_facing();
                            facing_calls += 1;
                        }
                        Op::SetFlash(f) => {
                            view.set_flash(*f);
                            flash_calls += 1;
                        }
                        Op::ToggleFlash => {
                            view.toggle_flash();
                            flash_calls += 1;
                        }
                        Op::Capture => view.capture_picture(),
                    }
                }

                let calls = backend.calls();
                let forwarded_facing = calls
                    .iter()
                    .filter(|c| matches!(c, BackendCall::SetFacing(_)))
                    .count();
                let forwarded_flash = calls
                    .iter()
                    .filter(|c| matches!(c, BackendCall::SetFlash(_)))
                    .count();
                prop_assert_eq!(forwarded_facing, facing_calls);
                prop_assert_eq!(forwarded_flash, flash_calls);

                // Starts and stops alternate, beginning with a start.
                let mut running = false;
                for call in &calls {
                    match call {
                        BackendCall::Start => {
                            prop_assert!(!running);
                            running = true;
                        }
                        BackendCall::Stop => {
                            prop_assert!(running);
                            running = false;
                        }
                        _ => {}
                    }
                }
                prop_assert_eq!(running, view.session_state() == SessionState::Started);

                if view.state() == ViewState::Detached {
                    prop_assert_eq!(view.session_state(), SessionState::Stopped);
                }
            }
        }
    }
}
