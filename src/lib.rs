//! Camera View
//!
//! A view-layer facade for controlling a device camera (facing, flash,
//! still-capture mode) without depending on a specific capture backend,
//! while keeping the sensor orientation in step with the display.
//!
//! # Architecture
//!
//! ```text
//! host lifecycle ──▶ view::CameraView ──▶ backend::CaptureBackend ──▶ capture::Camera
//!                         │    ▲                    │
//!                  enable │    │ orientation        └──▶ CameraListener
//!                         ▼    │                         (opened, closed,
//!               orientation::OrientationDetector          picture, error)
//! ```
//!
//! # Design Principles
//!
//! - **Request/acknowledge**: no call blocks on hardware; outcomes arrive
//!   on the listener
//! - **Absorb, don't raise**: missing facings fall back, unsupported flash
//!   is ignored, and the facade never returns an error
//! - **One of each**: a view owns exactly one backend and one detector
//!
//! # Example
//!
//! ```no_run
//! use camera_view::{
//!     backend::{ChannelListener, SessionBackend},
//!     capture::{CaptureConfig, FlashMode},
//!     orientation::{Orientation, SimulatedDisplay},
//!     view::{CameraView, ViewConfig},
//! };
//! use std::sync::Arc;
//!
//! let backend = SessionBackend::simulated(CaptureConfig::default()).unwrap();
//! let mut view = CameraView::new(backend, ViewConfig::default());
//!
//! let (listener, events) = ChannelListener::new();
//! view.set_camera_listener(listener);
//!
//! let display = Arc::new(SimulatedDisplay::new(Orientation::Deg0));
//! view.on_attach(Some(display.clone()));
//! view.start();
//!
//! assert_eq!(view.toggle_flash(), FlashMode::On);
//!
//! // The platform sensor thread reports a rotation.
//! display.set_rotation(Orientation::Deg90);
//! view.orientation_detector().on_sensor_changed(90);
//!
//! view.capture_picture();
//! view.backend().flush();
//! for event in events.try_iter() {
//!     println!("{event:?}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod backend;
pub mod capture;
pub mod metrics;
pub mod orientation;
pub mod view;

// Re-export commonly used types at crate root
pub use backend::{CameraEvent, CameraListener, CaptureBackend, CaptureError, SessionBackend};
pub use capture::{Camera, CaptureConfig, FacingMode, FlashMode, MockCamera, PictureMode};
pub use orientation::{Display, Orientation, OrientationDetector};
pub use view::{CameraView, SavedState, ViewConfig, ViewState};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
