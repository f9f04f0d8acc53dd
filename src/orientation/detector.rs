//! Canonical orientation stream with a single push observer.
//!
//! The platform calls [`OrientationDetector::on_sensor_changed`] from its
//! sensor thread. Each reading triggers a fresh look at the bound
//! display's rotation, and the handler fires only when that rotation
//! differs from the last one pushed.
//!
//! # Delivery guarantees
//!
//! The handler runs while the detector's state lock is held. This
//! serializes notifications against [`OrientationDetector::disable`]:
//! once `disable` returns, an event already in flight has either been
//! delivered or will observe the disabled state and be dropped. The
//! handler must therefore stay cheap and must not call back into the
//! detector.

use super::{Display, Orientation};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Handler = Box<dyn Fn(Orientation) + Send + Sync>;

#[derive(Default)]
struct DetectorState {
    handler: Option<Handler>,
    display: Option<Arc<dyn Display>>,
    last: Option<Orientation>,
    notifications: u64,
}

impl DetectorState {
    fn dispatch_if_changed(&mut self) {
        let Some(display) = self.display.as_ref() else {
            return;
        };

        let rotation = display.rotation();
        if self.last == Some(rotation) {
            return;
        }

        self.last = Some(rotation);
        self.notifications += 1;

        tracing::debug!(
            degrees = rotation.degrees(),
            notifications = self.notifications,
            "Display orientation changed"
        );

        if let Some(handler) = self.handler.as_ref() {
            handler(rotation);
        }
    }
}

/// Folds sensor and display rotation into change notifications.
///
/// Cloning yields another handle to the same detector, which is how the
/// platform's sensor thread gets something to push readings into.
#[derive(Clone, Default)]
pub struct OrientationDetector {
    state: Arc<Mutex<DetectorState>>,
}

impl OrientationDetector {
    /// Creates a disabled detector with no handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the observer, replacing any previous one.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(Orientation) + Send + Sync + 'static,
    {
        self.lock().handler = Some(Box::new(handler));
    }

    /// Drops the observer. Readings are still tracked.
    pub fn clear_handler(&self) {
        self.lock().handler = None;
    }

    /// Starts observing `display`.
    ///
    /// The current rotation is pushed immediately, since it was unknown
    /// until now. Without a display the detector stays inert: no
    /// notifications until a later `enable` supplies one.
    pub fn enable(&self, display: Option<Arc<dyn Display>>) {
        let mut state = self.lock();
        state.last = None;
        state.display = display;

        if state.display.is_none() {
            tracing::debug!("Orientation detector enabled without a display; staying inert");
            return;
        }

        tracing::debug!("Orientation detector enabled");
        state.dispatch_if_changed();
    }

    /// Stops observing. Safe to call at any time, including before any
    /// `enable`. No notification is delivered after this returns.
    pub fn disable(&self) {
        let mut state = self.lock();
        if state.display.take().is_some() {
            tracing::debug!("Orientation detector disabled");
        }
        state.last = None;
    }

    /// Returns true while a display is bound.
    pub fn is_enabled(&self) -> bool {
        self.lock().display.is_some()
    }

    /// Feeds one raw rotation-sensor reading in degrees.
    ///
    /// Negative readings (see [`super::ORIENTATION_UNKNOWN`]) mean the
    /// device is flat and are ignored.
    pub fn on_sensor_changed(&self, raw_degrees: i32) {
        if raw_degrees < 0 {
            return;
        }
        self.lock().dispatch_if_changed();
    }

    /// Last orientation pushed since the detector was enabled.
    pub fn current(&self) -> Option<Orientation> {
        self.lock().last
    }

    /// Total change notifications emitted over the detector's lifetime.
    pub fn notifications(&self) -> u64 {
        self.lock().notifications
    }

    fn lock(&self) -> MutexGuard<'_, DetectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for OrientationDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("OrientationDetector")
            .field("enabled", &state.display.is_some())
            .field("last", &state.last)
            .field("notifications", &state.notifications)
            .finish()
    }
}
