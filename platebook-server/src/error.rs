//! Error types for platebook-server
//!
//! Every handler error renders as `{ "error": <message>, "code": <CODE>, ... }`
//! where `...` carries endpoint-specific hints (`got`, `tip`, `example`,
//! `raw`, `cleaned`, `details`).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::services::{IdentityError, PipelineError};
use crate::storage::StorageError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {message}")]
    BadRequest {
        message: String,
        /// Extra top-level fields merged into the body
        extra: Option<Value>,
    },

    /// Missing or invalid credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not on the allowlist (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream produced unusable output (502)
    #[error("Bad gateway: {message}")]
    BadGateway { message: String, extra: Option<Value> },

    /// Upstream work ran past its budget (504)
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Required setup missing (500, with guidance)
    #[error("Not configured: {message}")]
    NotConfigured { message: String, tip: String },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// platebook-common error
    #[error("Common error: {0}")]
    Common(#[from] platebook_common::Error),

    /// Object storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            extra: None,
        }
    }

    pub fn bad_request_with(message: impl Into<String>, extra: Value) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            extra: Some(extra),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::MissingToken | IdentityError::InvalidToken(_) => {
                ApiError::Unauthorized(err.to_string())
            }
            IdentityError::NotAuthorized(_) => ApiError::Forbidden(err.to_string()),
            IdentityError::Verifier(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let message = err.to_string();
        match err {
            PipelineError::VideoProcessingFailed => ApiError::BadGateway {
                message,
                extra: None,
            },
            PipelineError::NoText { result_keys } => ApiError::BadGateway {
                message,
                extra: Some(json!({ "resultKeys": result_keys })),
            },
            PipelineError::InvalidJson { raw, cleaned, .. } => ApiError::BadGateway {
                message,
                extra: Some(json!({ "raw": raw, "cleaned": cleaned })),
            },
            PipelineError::Storage(_) | PipelineError::Inference(_) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, extra) = match self {
            ApiError::BadRequest { message, extra } => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message, extra)
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            ApiError::BadGateway { message, extra } => {
                (StatusCode::BAD_GATEWAY, "BAD_GATEWAY", message, extra)
            }
            ApiError::Timeout(details) => (
                StatusCode::GATEWAY_TIMEOUT,
                "GATEWAY_TIMEOUT",
                "Import timed out".to_string(),
                Some(json!({ "details": details })),
            ),
            ApiError::NotConfigured { message, tip } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "NOT_CONFIGURED",
                message,
                Some(json!({ "tip": tip })),
            ),
            ApiError::Internal(msg) => server_error(msg),
            ApiError::Storage(ref err) => server_error(err.to_string()),
            ApiError::Common(err) => match err {
                platebook_common::Error::NotFound(msg) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None)
                }
                platebook_common::Error::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None)
                }
                platebook_common::Error::Conflict(msg) => {
                    (StatusCode::CONFLICT, "CONFLICT", msg, None)
                }
                other => server_error(other.to_string()),
            },
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %message, "Request failed");
        }

        let mut body = Map::new();
        body.insert("error".into(), Value::String(message));
        body.insert("code".into(), Value::String(error_code.into()));
        if let Some(Value::Object(extra)) = extra {
            for (key, value) in extra {
                body.entry(key).or_insert(value);
            }
        }

        (status, Json(Value::Object(body))).into_response()
    }
}

fn server_error(details: String) -> (StatusCode, &'static str, String, Option<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "Server error".to_string(),
        Some(json!({ "details": details })),
    )
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_merges_extra_fields() {
        let (status, body) = render(ApiError::bad_request_with(
            "Expected application/json",
            json!({ "got": "text/plain", "tip": "send JSON", "error": "ignored" }),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Expected application/json");
        assert_eq!(body["got"], "text/plain");
        assert_eq!(body["tip"], "send JSON");
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_internal_error_carries_details() {
        let (status, body) = render(ApiError::Internal("disk on fire".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server error");
        assert_eq!(body["details"], "disk on fire");
    }

    #[tokio::test]
    async fn test_timeout_is_504_json() {
        let (status, body) = render(ApiError::Timeout("took too long".into())).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["code"], "GATEWAY_TIMEOUT");
        assert_eq!(body["error"], "Import timed out");
        assert_eq!(body["details"], "took too long");
    }

    #[tokio::test]
    async fn test_inference_error_is_500_with_details() {
        let (status, body) = render(
            PipelineError::Inference(crate::services::GeminiError::Network("connection refused".into()))
                .into(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(body["details"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_common_error_mapping() {
        let (status, _) = render(platebook_common::Error::NotFound("x".into()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = render(platebook_common::Error::Conflict("x".into()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = render(platebook_common::Error::InvalidInput("x".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = render(platebook_common::Error::Internal("x".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server error");
    }

    #[tokio::test]
    async fn test_pipeline_error_mapping() {
        let (status, body) = render(
            PipelineError::InvalidJson {
                raw: "```nope```".into(),
                cleaned: "nope".into(),
                reason: "expected value".into(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["raw"], "```nope```");
        assert_eq!(body["cleaned"], "nope");

        let (status, _) = render(PipelineError::VideoProcessingFailed.into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_identity_error_mapping() {
        let (status, _) = render(IdentityError::MissingToken.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = render(IdentityError::NotAuthorized("x@y.z".into()).into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
