//! Review endpoints

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use platebook_common::models::{Review, ReviewInput, ReviewPatch};
use platebook_common::time;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::extract::ApiJson;
use crate::api::uploads::{
    collect_files, files_under, image_extension, require_single_file, store_file, FILE_FIELDS,
    MAX_UPLOAD_BYTES,
};
use crate::db::reviews;
use crate::error::{ApiError, ApiResult};
use crate::services::AdminSession;
use crate::storage::{paths, StoredObject};
use crate::AppState;

/// Reviews shown on the home page when no count is given
pub const DEFAULT_LATEST_COUNT: i64 = 6;

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub count: Option<i64>,
}

/// GET /api/reviews
pub async fn list_reviews(State(state): State<AppState>) -> ApiResult<Json<Vec<Review>>> {
    Ok(Json(reviews::list_reviews(&state.db).await?))
}

/// GET /api/reviews/latest?count=n
pub async fn latest_reviews(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> ApiResult<Json<Vec<Review>>> {
    let count = query.count.unwrap_or(DEFAULT_LATEST_COUNT);
    Ok(Json(reviews::latest_reviews(&state.db, count).await?))
}

/// GET /api/reviews/:slug
pub async fn get_review(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Review>> {
    reviews::get_review(&state.db, &slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Review not found: {}", slug)))
}

/// POST /api/admin/reviews
pub async fn create_review(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    let review = reviews::create_review(&state.db, input).await?;
    tracing::info!(slug = %review.slug, admin = %session.email, "Review published");
    Ok((StatusCode::CREATED, Json(review)))
}

/// PUT /api/admin/reviews/:slug
pub async fn update_review(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ApiJson(patch): ApiJson<ReviewPatch>,
) -> ApiResult<Json<Review>> {
    Ok(Json(reviews::update_review(&state.db, &slug, patch).await?))
}

/// DELETE /api/admin/reviews/:slug
pub async fn delete_review(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Value>> {
    let deleted = reviews::delete_review(&state.db, &slug).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// POST /api/admin/reviews/:slug/cover
///
/// Stores the cover image and returns its URL; the review itself is not
/// modified (the form may upload before the review exists).
pub async fn upload_cover(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<StoredObject>> {
    let file = require_single_file(multipart).await?;
    let path = paths::review_cover(&slug, &image_extension(&file));
    Ok(Json(store_file(&state, &path, &file).await?))
}

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub uploads: Vec<StoredObject>,
}

/// POST /api/admin/reviews/:slug/gallery
///
/// Every file part under `image` or `file` becomes one gallery object.
pub async fn upload_gallery(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<GalleryResponse>> {
    let files = files_under(collect_files(multipart).await?, &FILE_FIELDS);
    if files.is_empty() {
        return Err(ApiError::bad_request(
            r#"Missing file. Use form-data key "image" (or "file") and set it to File."#,
        ));
    }

    let timestamp = time::unix_millis();
    let mut uploads = Vec::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        if file.bytes.is_empty() {
            return Err(ApiError::bad_request("Uploaded file is empty (size 0)"));
        }
        let path = paths::review_gallery(&slug, timestamp, index, &image_extension(file));
        uploads.push(store_file(&state, &path, file).await?);
    }

    Ok(Json(GalleryResponse { uploads }))
}

pub fn review_public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/reviews", get(list_reviews))
        .route("/api/reviews/latest", get(latest_reviews))
        .route("/api/reviews/:slug", get(get_review))
}

pub fn review_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/reviews", post(create_review))
        .route("/api/admin/reviews/:slug", put(update_review).delete(delete_review))
        .route("/api/admin/reviews/:slug/cover", post(upload_cover))
        .route("/api/admin/reviews/:slug/gallery", post(upload_gallery))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
