//! Prometheus metrics exporter for camera facade monitoring.
//!
//! Metrics are fed from [`crate::view::ViewStats`] snapshots and can be
//! served over HTTP with the `metrics` feature.
//!
//! # Metrics Exposed
//!
//! ## Session Metrics
//! - `camera_view_session_started` - Session requested (1=started, 0=stopped)
//! - `camera_view_attached` - View attached to a host window
//! - `camera_view_session_starts_total` - Start requests sent to the backend
//! - `camera_view_session_stops_total` - Stop requests sent to the backend
//!
//! ## Configuration Metrics
//! - `camera_view_facing` - Current facing code
//! - `camera_view_flash` - Current flash code
//! - `camera_view_facing_forwards_total` - Facing changes forwarded
//! - `camera_view_flash_forwards_total` - Flash changes forwarded
//!
//! ## Capture Metrics
//! - `camera_view_captures_total{path}` - Capture requests by path (`quality`, `speed`)
//!
//! ## Orientation Metrics
//! - `camera_view_orientation_changes_total` - Orientation notifications pushed
//! - `camera_view_display_orientation_degrees` - Last pushed orientation
//!
//! # Example
//!
//! ```no_run
//! use camera_view::backend::RecordingBackend;
//! use camera_view::metrics::MetricsRegistry;
//! use camera_view::view::{CameraView, ViewConfig};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let view = CameraView::new(RecordingBackend::new(), ViewConfig::default());
//!
//! registry.update(&view.stats());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
