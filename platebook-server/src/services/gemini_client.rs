//! Gemini inference client
//!
//! Images travel inline as base64. Videos go through the File API: a
//! resumable upload, then the caller polls [`InferenceClient::get_file`]
//! until the file leaves `PROCESSING`, then references it by URI.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini client errors
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Upload session did not return an upload URL")]
    MissingUploadUrl,
}

/// Transport failure, with the request URL dropped from the message
fn network_error(err: reqwest::Error) -> GeminiError {
    GeminiError::Network(err.without_url().to_string())
}

/// Processing state of an uploaded file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    #[default]
    StateUnspecified,
    Processing,
    Active,
    Failed,
    #[serde(other)]
    Unknown,
}

/// File handle returned by the File API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    /// Resource name, e.g. `files/abc123`
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub state: FileState,
}

/// Media attached to a generation request
#[derive(Debug, Clone, PartialEq)]
pub enum MediaPart {
    /// Raw bytes sent base64-encoded in the request body
    Inline { mime_type: String, data: Vec<u8> },
    /// Reference to a file previously uploaded to the File API
    FileUri { mime_type: String, uri: String },
}

/// Inference seam used by the import pipeline
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Upload media to the provider's file store
    async fn upload_file(
        &self,
        bytes: &[u8],
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile, GeminiError>;

    /// Current state of an uploaded file
    async fn get_file(&self, name: &str) -> Result<RemoteFile, GeminiError>;

    /// Run the prompt against the media; returns the raw response document
    async fn generate(&self, prompt: &str, media: MediaPart) -> Result<Value, GeminiError>;
}

/// Request body for `models/{model}:generateContent`
pub fn build_generate_body(prompt: &str, media: &MediaPart) -> Value {
    let media_part = match media {
        MediaPart::Inline { mime_type, data } => json!({
            "inlineData": {
                "mimeType": mime_type,
                "data": base64::engine::general_purpose::STANDARD.encode(data),
            }
        }),
        MediaPart::FileUri { mime_type, uri } => json!({
            "fileData": {
                "mimeType": mime_type,
                "fileUri": uri,
            }
        }),
    };

    json!({
        "contents": [{
            "parts": [
                { "text": prompt },
                media_part,
            ]
        }],
        "generationConfig": {
            "temperature": 0,
            "responseMimeType": "application/json",
        }
    })
}

/// Gemini REST client
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, GeminiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(network_error)?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, GeminiError> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.without_url().to_string()))
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn upload_file(
        &self,
        bytes: &[u8],
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile, GeminiError> {
        let start_url = format!("{}/upload/v1beta/files", self.base_url);

        tracing::debug!(size = bytes.len(), mime_type = %mime_type, "Starting Gemini file upload");

        let start = self
            .http_client
            .post(&start_url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await
            .map_err(network_error)?;

        let status = start.status();
        if !status.is_success() {
            let error_text = start.text().await.unwrap_or_default();
            return Err(GeminiError::Api(status.as_u16(), error_text));
        }

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(GeminiError::MissingUploadUrl)?;

        let finish = self
            .http_client
            .post(&upload_url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(network_error)?;

        let mut body = Self::read_json(finish).await?;
        let file_json = body.get_mut("file").map(Value::take).unwrap_or(Value::Null);
        let file: RemoteFile =
            serde_json::from_value(file_json).map_err(|e| GeminiError::Parse(e.to_string()))?;

        tracing::info!(file = %file.name, state = ?file.state, "Uploaded file to Gemini");
        Ok(file)
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile, GeminiError> {
        let url = format!("{}/v1beta/{}", self.base_url, name);

        let response = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(network_error)?;

        let body = Self::read_json(response).await?;
        serde_json::from_value(body).map_err(|e| GeminiError::Parse(e.to_string()))
    }

    async fn generate(&self, prompt: &str, media: MediaPart) -> Result<Value, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        tracing::debug!(model = %self.model, "Requesting Gemini generation");

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&build_generate_body(prompt, &media))
            .send()
            .await
            .map_err(network_error)?;

        Self::read_json(response).await
    }
}
