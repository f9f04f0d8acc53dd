//! Metrics collection and registry.

use crate::view::{SessionState, ViewStats};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registering or encoding a metric failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    /// The encoder produced invalid text.
    #[error("metrics output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Prometheus metrics registry for camera facade monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Session metrics
    session_started: IntGauge,
    attached: IntGauge,
    session_starts: IntCounter,
    session_stops: IntCounter,

    // Configuration metrics
    facing: IntGauge,
    flash: IntGauge,
    facing_forwards: IntCounter,
    flash_forwards: IntCounter,

    // Capture metrics
    captures: IntCounterVec,

    // Orientation metrics
    orientation_changes: IntCounter,
    display_orientation: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all camera metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let session_started = IntGauge::new(
            "camera_view_session_started",
            "Whether a capture session is requested (1=started, 0=stopped)",
        )?;
        let attached = IntGauge::new(
            "camera_view_attached",
            "Whether the view is attached to a host window (1=attached)",
        )?;
        let session_starts = IntCounter::new(
            "camera_view_session_starts_total",
            "Total session start requests sent to the backend",
        )?;
        let session_stops = IntCounter::new(
            "camera_view_session_stops_total",
            "Total session stop requests sent to the backend",
        )?;

        let facing = IntGauge::new(
            "camera_view_facing",
            "Current facing code (0=back, 1=front)",
        )?;
        let flash = IntGauge::new(
            "camera_view_flash",
            "Current flash code (0=off, 1=on, 2=auto)",
        )?;
        let facing_forwards = IntCounter::new(
            "camera_view_facing_forwards_total",
            "Total facing changes forwarded to the backend",
        )?;
        let flash_forwards = IntCounter::new(
            "camera_view_flash_forwards_total",
            "Total flash changes forwarded to the backend",
        )?;

        let captures = IntCounterVec::new(
            Opts::new(
                "camera_view_captures_total",
                "Total capture requests by path",
            ),
            &["path"],
        )?;

        let orientation_changes = IntCounter::new(
            "camera_view_orientation_changes_total",
            "Total display orientation notifications pushed to the backend",
        )?;
        let display_orientation = IntGauge::new(
            "camera_view_display_orientation_degrees",
            "Last pushed display orientation in degrees (-1 when unknown)",
        )?;

        registry.register(Box::new(session_started.clone()))?;
        registry.register(Box::new(attached.clone()))?;
        registry.register(Box::new(session_starts.clone()))?;
        registry.register(Box::new(session_stops.clone()))?;
        registry.register(Box::new(facing.clone()))?;
        registry.register(Box::new(flash.clone()))?;
        registry.register(Box::new(facing_forwards.clone()))?;
        registry.register(Box::new(flash_forwards.clone()))?;
        registry.register(Box::new(captures.clone()))?;
        registry.register(Box::new(orientation_changes.clone()))?;
        registry.register(Box::new(display_orientation.clone()))?;

        Ok(Self {
            registry,
            session_started,
            attached,
            session_starts,
            session_stops,
            facing,
            flash,
            facing_forwards,
            flash_forwards,
            captures,
            orientation_changes,
            display_orientation,
        })
    }

    /// Updates all metrics from a facade stats snapshot.
    pub fn update(&self, stats: &ViewStats) {
        self.session_started
            .set(i64::from(stats.session == SessionState::Started));
        self.attached.set(i64::from(stats.attached));
        self.facing.set(i64::from(stats.facing.code()));
        self.flash.set(i64::from(stats.flash.code()));
        self.display_orientation.set(
            stats
                .display_orientation
                .map_or(-1, |o| i64::from(o.degrees())),
        );

        // Counters only move forward: add the difference.
        advance(&self.session_starts, stats.session_starts);
        advance(&self.session_stops, stats.session_stops);
        advance(&self.facing_forwards, stats.facing_forwards);
        advance(&self.flash_forwards, stats.flash_forwards);
        advance(&self.orientation_changes, stats.orientation_changes);
        advance(
            &self.captures.with_label_values(&["quality"]),
            stats.quality_captures,
        );
        advance(
            &self.captures.with_label_values(&["speed"]),
            stats.speed_captures,
        );
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}
