//! HTTP API handlers for platebook-server
//!
//! Public read routes, admin routes behind [`auth::require_admin`], and the
//! two Beli ingest routes (bulk JSON and screenshot/video parse).

pub mod auth;
pub mod extract;
pub mod health;
pub mod lists;
pub mod parse;
pub mod ratings;
pub mod reviews;
pub mod settings;
pub mod uploads;

pub use auth::{require_admin, session_routes};
pub use extract::ApiJson;
pub use health::health_routes;
pub use lists::{list_admin_routes, list_public_routes};
pub use parse::parse_routes;
pub use ratings::{ingest_routes, ratings_admin_routes};
pub use reviews::{review_admin_routes, review_public_routes};
pub use settings::{settings_admin_routes, settings_public_routes};
