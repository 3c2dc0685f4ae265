//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Module name ("platebook")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Short commit hash embedded at build time
    pub commit: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Whether the parse endpoint has an inference credential
    pub inference_configured: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "platebook".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: crate::GIT_HASH.to_string(),
        uptime_seconds,
        inference_configured: state.inference.is_some(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
