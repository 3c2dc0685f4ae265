//! Site settings endpoints
//!
//! `GET /api/settings` is public (about page, header link). Updates and the
//! profile image upload are admin-only.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post, put},
    Json, Router,
};
use platebook_common::models::{SiteSettings, SiteSettingsPatch};
use tracing::info;

use crate::api::extract::ApiJson;
use crate::api::uploads::{image_extension, require_single_file, store_file, MAX_UPLOAD_BYTES};
use crate::db::settings;
use crate::error::{ApiError, ApiResult};
use crate::storage::{paths, StoredObject};
use crate::AppState;

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<SiteSettings>> {
    Ok(Json(settings::get_site_settings(&state.db).await?))
}

/// PUT /api/admin/settings
///
/// Partial merge: absent fields are left as they are.
pub async fn update_settings(
    State(state): State<AppState>,
    ApiJson(patch): ApiJson<SiteSettingsPatch>,
) -> ApiResult<Json<SiteSettings>> {
    if let Some(link) = &patch.beli_link {
        let link = link.trim();
        if !link.is_empty() && !link.starts_with("http://") && !link.starts_with("https://") {
            return Err(ApiError::bad_request("beliLink must be an http(s) URL"));
        }
    }

    let updated = settings::update_site_settings(&state.db, patch).await?;
    info!("Site settings updated");
    Ok(Json(updated))
}

/// POST /api/admin/settings/profile-image
///
/// Returns the stored object; saving its URL into the settings is a
/// separate `PUT`.
pub async fn upload_profile_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<StoredObject>> {
    let file = require_single_file(multipart).await?;
    let path = paths::profile_image(&image_extension(&file));
    Ok(Json(store_file(&state, &path, &file).await?))
}

pub fn settings_public_routes() -> Router<AppState> {
    Router::new().route("/api/settings", get(get_settings))
}

pub fn settings_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/settings", put(update_settings))
        .route("/api/admin/settings/profile-image", post(upload_profile_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
