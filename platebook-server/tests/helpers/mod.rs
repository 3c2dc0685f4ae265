//! Shared test helpers: stub identity and inference, app construction,
//! request builders.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use platebook_server::services::gemini_client::FileState;
use platebook_server::services::{
    AuthContext, GeminiError, IdentityError, IdentityVerifier, InferenceClient, MediaPart,
    RemoteFile, VerifiedIdentity,
};
use platebook_server::storage::LocalObjectStore;
use platebook_server::{build_router, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const STRANGER_TOKEN: &str = "stranger-token";
pub const ADMIN_EMAIL: &str = "owner@example.com";

/// Accepts two fixed tokens: one allowlisted, one not
pub struct StubVerifier;

#[async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        match token {
            ADMIN_TOKEN => Ok(VerifiedIdentity {
                email: ADMIN_EMAIL.to_string(),
                name: Some("Owner".to_string()),
            }),
            STRANGER_TOKEN => Ok(VerifiedIdentity {
                email: "someone@example.com".to_string(),
                name: None,
            }),
            _ => Err(IdentityError::InvalidToken("unknown token".to_string())),
        }
    }
}

/// Canned generation response; records the media it was sent
pub struct StubInference {
    pub response: Value,
    pub media: Mutex<Vec<MediaPart>>,
}

impl StubInference {
    pub fn returning_text(text: &str) -> Self {
        Self {
            response: json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }),
            media: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(response: Value) -> Self {
        Self {
            response,
            media: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl InferenceClient for StubInference {
    async fn upload_file(&self, _: &[u8], mime_type: &str, _: &str) -> Result<RemoteFile, GeminiError> {
        Ok(RemoteFile {
            name: "files/stub".to_string(),
            uri: "https://example.test/files/stub".to_string(),
            mime_type: mime_type.to_string(),
            state: FileState::Active,
        })
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile, GeminiError> {
        Ok(RemoteFile {
            name: name.to_string(),
            uri: "https://example.test/files/stub".to_string(),
            mime_type: "video/mp4".to_string(),
            state: FileState::Active,
        })
    }

    async fn generate(&self, _: &str, media: MediaPart) -> Result<Value, GeminiError> {
        self.media.lock().unwrap().push(media);
        Ok(self.response.clone())
    }
}

/// Accepts uploads but never answers a generation request
pub struct HangingInference;

#[async_trait]
impl InferenceClient for HangingInference {
    async fn upload_file(&self, _: &[u8], mime_type: &str, _: &str) -> Result<RemoteFile, GeminiError> {
        StubInference::returning(Value::Null).upload_file(&[], mime_type, "").await
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile, GeminiError> {
        StubInference::returning(Value::Null).get_file(name).await
    }

    async fn generate(&self, _: &str, _: MediaPart) -> Result<Value, GeminiError> {
        std::future::pending().await
    }
}

/// Router plus the handles tests need to inspect
pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub storage_dir: TempDir,
}

pub async fn test_app(inference: Option<Arc<dyn InferenceClient>>) -> TestApp {
    test_app_with(inference, |state| state).await
}

/// Like [`test_app`], with a last chance to adjust the state
pub async fn test_app_with(
    inference: Option<Arc<dyn InferenceClient>>,
    configure: impl FnOnce(AppState) -> AppState,
) -> TestApp {
    let db = platebook_server::db::connect_in_memory().await.unwrap();
    let storage_dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalObjectStore::new(storage_dir.path(), "http://localhost:5740"));
    let auth = AuthContext::new(vec![ADMIN_EMAIL.to_string()], Arc::new(StubVerifier));

    let mut state = AppState::new(db.clone(), storage, auth)
        .with_files_dir(storage_dir.path())
        .with_poll_interval(Duration::from_millis(1));
    if let Some(inference) = inference {
        state = state.with_inference(inference);
    }

    TestApp {
        router: build_router(configure(state)),
        db,
        storage_dir,
    }
}

pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn send_json(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = send(app, request).await;
    let status = response.status();
    (status, body_json(response).await)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN))
        .body(Body::empty())
        .unwrap()
}

pub fn admin_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub const BOUNDARY: &str = "platebook-test-boundary";

/// One file part per `(field, file name, content type, bytes)`
pub fn multipart_body(files: &[(&str, &str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, file_name, content_type, bytes) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn admin_multipart(uri: &str, files: &[(&str, &str, &str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(files)))
        .unwrap()
}
