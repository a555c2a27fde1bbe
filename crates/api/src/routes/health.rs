use axum::extract::State;
use axum::{routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "columbia-quote-submitter";

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub active_workers: usize,
    pub max_workers: usize,
    pub queue_size: usize,
}

/// GET /health -- liveness plus worker and queue counters.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.dispatcher.stats();

    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        active_workers: stats.active_workers,
        max_workers: stats.max_workers,
        queue_size: stats.queue_size,
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
