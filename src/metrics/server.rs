//! HTTP exporter for the facade's metrics and health.
//!
//! `/metrics` serves the Prometheus text format. `/health` answers 503
//! until the first view snapshot arrives, then 200 with a short summary
//! of the view's lifecycle and settings.

use crate::metrics::MetricsRegistry;
use crate::view::{SessionState, ViewStats};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Errors that can occur while serving metrics.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    /// The server stopped with an error after starting.
    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the metrics server.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(9090)
    }
}

impl MetricsServerConfig {
    /// Binds all interfaces on `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// Latest view snapshot and the registry it feeds.
pub struct MetricsState {
    registry: MetricsRegistry,
    latest: Option<ViewStats>,
}

impl MetricsState {
    /// Records a facade snapshot and pushes it into the registry.
    pub fn update(&mut self, stats: &ViewStats) {
        self.registry.update(stats);
        self.latest = Some(stats.clone());
    }

    /// The most recent snapshot, if any view has reported yet.
    pub fn latest(&self) -> Option<&ViewStats> {
        self.latest.as_ref()
    }
}

/// HTTP server for the `/metrics` and `/health` endpoints.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: Arc<RwLock<MetricsState>>,
}

impl MetricsServer {
    /// Creates a server around `registry`. Nothing is bound until
    /// [`MetricsServer::run`].
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(MetricsState {
                registry,
                latest: None,
            })),
        }
    }

    /// Shared state for pushing view snapshots.
    pub fn state(&self) -> Arc<RwLock<MetricsState>> {
        Arc::clone(&self.state)
    }

    /// Binds and serves until the server fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Metrics server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| ServerError::Server(e.to_string()))
    }
}

fn router(state: Arc<RwLock<MetricsState>>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn metrics_handler(State(state): State<Arc<RwLock<MetricsState>>>) -> impl IntoResponse {
    let state = state.read().await;

    match state.registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

async fn health_handler(State(state): State<Arc<RwLock<MetricsState>>>) -> impl IntoResponse {
    let state = state.read().await;

    match state.latest() {
        Some(stats) => (StatusCode::OK, health_report(stats)),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "waiting for the first view snapshot\n".to_string(),
        ),
    }
}

fn health_report(stats: &ViewStats) -> String {
    let session = match stats.session {
        SessionState::Started => "started",
        SessionState::Stopped => "stopped",
    };
    let orientation = stats
        .display_orientation
        .map_or_else(|| "unknown".to_string(), |o| o.to_string());

    let mut report = String::from("OK\n");
    let _ = writeln!(report, "attached: {}", stats.attached);
    let _ = writeln!(report, "session: {}", session);
    let _ = writeln!(report, "facing: {}", stats.facing);
    let _ = writeln!(report, "flash: {}", stats.flash);
    let _ = writeln!(report, "display orientation: {}", orientation);
    report
}
