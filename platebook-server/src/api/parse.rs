//! Screenshot/video parse endpoint
//!
//! `POST /api/parse-beli` takes a multipart upload under `image` (or `file`)
//! and runs the Beli import pipeline on it.

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::header,
    routing::post,
    Json, Router,
};
use platebook_common::PlaceDraft;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

use crate::api::uploads::{collect_files, pick_file, FILE_FIELDS, MAX_UPLOAD_BYTES};
use crate::error::{ApiError, ApiResult};
use crate::services::ImportPipeline;
use crate::AppState;

/// Overall budget for upload, video processing and generation
pub const PARSE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub places: Vec<PlaceDraft>,
}

/// POST /api/parse-beli
pub async fn parse_beli(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<Json<ParseResponse>> {
    let Some(inference) = state.inference.clone() else {
        return Err(ApiError::NotConfigured {
            message: "Missing GEMINI_API_KEY env var".to_string(),
            tip: "Set GEMINI_API_KEY (or gemini_api_key in config.toml) and restart platebook."
                .to_string(),
        });
    };

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    tracing::debug!(content_type = %content_type, "POST /api/parse-beli");

    if !content_type.contains("multipart/form-data") {
        return Err(ApiError::bad_request_with(
            "Expected multipart/form-data",
            json!({
                "got": content_type,
                "tip": r#"Send form-data with the screenshot or video under the key "image"."#,
            }),
        ));
    }

    let multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?;

    let file = pick_file(collect_files(multipart).await?, &FILE_FIELDS).ok_or_else(|| {
        ApiError::bad_request(r#"Missing file. Use form-data key "image" (or "file") and set it to File."#)
    })?;

    if file.bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty (size 0)"));
    }

    let pipeline = ImportPipeline::new(state.db.clone(), state.storage.clone(), inference)
        .with_poll_interval(state.poll_interval);
    let outcome = tokio::time::timeout(state.parse_timeout, pipeline.run(file))
        .await
        .map_err(|_| {
            ApiError::Timeout(format!(
                "Import did not finish within {}s",
                state.parse_timeout.as_secs_f64()
            ))
        })??;

    if let Some(error) = &outcome.persist_error {
        tracing::warn!(error = %error, "Parsed places were not saved to the ratings pool");
    }

    Ok(Json(ParseResponse {
        places: outcome.places,
    }))
}

pub fn parse_routes() -> Router<AppState> {
    Router::new()
        .route("/api/parse-beli", post(parse_beli))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
