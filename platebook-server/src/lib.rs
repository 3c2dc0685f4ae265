//! platebook-server library interface
//!
//! Exposes the router and state for the binary and for integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use crate::error::{ApiError, ApiResult};

/// Commit the binary was built from, or "unknown" outside a git checkout
pub const GIT_HASH: &str = env!("GIT_HASH");

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::parse::PARSE_TIMEOUT;
use crate::services::import_pipeline::DEFAULT_POLL_INTERVAL;
use crate::services::{AuthContext, InferenceClient};
use crate::storage::ObjectStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Object storage for images and Beli uploads
    pub storage: Arc<dyn ObjectStore>,
    /// Inference client; `None` when no API key is configured
    pub inference: Option<Arc<dyn InferenceClient>>,
    /// Admin allowlist and token verifier
    pub auth: AuthContext,
    /// Directory served at `/files`, when objects live on local disk
    pub files_dir: Option<PathBuf>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Delay between video processing status checks
    pub poll_interval: Duration,
    /// Budget for one screenshot/video import
    pub parse_timeout: Duration,
}

impl AppState {
    pub fn new(db: SqlitePool, storage: Arc<dyn ObjectStore>, auth: AuthContext) -> Self {
        Self {
            db,
            storage,
            inference: None,
            auth,
            files_dir: None,
            startup_time: Utc::now(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            parse_timeout: PARSE_TIMEOUT,
        }
    }

    pub fn with_inference(mut self, inference: Arc<dyn InferenceClient>) -> Self {
        self.inference = Some(inference);
        self
    }

    pub fn with_files_dir(mut self, files_dir: impl Into<PathBuf>) -> Self {
        self.files_dir = Some(files_dir.into());
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_parse_timeout(mut self, parse_timeout: Duration) -> Self {
        self.parse_timeout = parse_timeout;
        self
    }
}

/// Build application router
///
/// Admin and ingest routes require an allowlisted identity; reads, health
/// and stored files are public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    // Protected routes (require admin authentication)
    let protected = Router::new()
        .merge(api::session_routes())
        .merge(api::ingest_routes())
        .merge(api::parse_routes())
        .merge(api::ratings_admin_routes())
        .merge(api::review_admin_routes())
        .merge(api::list_admin_routes())
        .merge(api::settings_admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_admin,
        ));

    // Public routes (no authentication)
    let mut public = Router::new()
        .merge(api::health_routes())
        .merge(api::review_public_routes())
        .merge(api::list_public_routes())
        .merge(api::settings_public_routes());

    if let Some(dir) = &state.files_dir {
        public = public.nest_service("/files", ServeDir::new(dir));
    }

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
