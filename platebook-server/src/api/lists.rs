//! Curated list endpoints

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use platebook_common::models::{FoodList, ListInput, ListPatch};
use serde_json::{json, Value};

use crate::api::extract::ApiJson;
use crate::api::uploads::{image_extension, require_single_file, store_file, MAX_UPLOAD_BYTES};
use crate::db::lists::{self, ResolvedList};
use crate::error::{ApiError, ApiResult};
use crate::storage::{paths, StoredObject};
use crate::AppState;

/// GET /api/lists
pub async fn list_lists(State(state): State<AppState>) -> ApiResult<Json<Vec<FoodList>>> {
    Ok(Json(lists::list_lists(&state.db).await?))
}

/// GET /api/lists/:id
///
/// The list plus every referenced review that still exists.
pub async fn get_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResolvedList>> {
    lists::resolve_list(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("List not found: {}", id)))
}

/// POST /api/admin/lists
pub async fn create_list(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ListInput>,
) -> ApiResult<(StatusCode, Json<FoodList>)> {
    let list = lists::create_list(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// PUT /api/admin/lists/:id
pub async fn update_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ListPatch>,
) -> ApiResult<Json<FoodList>> {
    Ok(Json(lists::update_list(&state.db, &id, patch).await?))
}

/// DELETE /api/admin/lists/:id
pub async fn delete_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let deleted = lists::delete_list(&state.db, &id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// POST /api/admin/lists/:id/cover
pub async fn upload_cover(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<StoredObject>> {
    let file = require_single_file(multipart).await?;
    let path = paths::list_cover(&id, &image_extension(&file));
    Ok(Json(store_file(&state, &path, &file).await?))
}

pub fn list_public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/lists", get(list_lists))
        .route("/api/lists/:id", get(get_list))
}

pub fn list_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/lists", post(create_list))
        .route("/api/admin/lists/:id", put(update_list).delete(delete_list))
        .route("/api/admin/lists/:id/cover", post(upload_cover))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
