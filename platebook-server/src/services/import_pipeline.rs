//! Beli import pipeline
//!
//! Turns a screenshot or screen recording of the Beli app into place records:
//! store the upload, ask the inference API for JSON, clean and decode it,
//! normalize every entry and upsert the named ones into the ratings pool.
//!
//! Pool persistence is best-effort. Once places have been extracted a failed
//! write is logged and reported in [`ImportOutcome::persist_error`], and the
//! places are still returned.

use platebook_common::place::{extract_place_array, normalize_places, retain_named};
use platebook_common::{time, Place, PlaceDraft};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::db::ratings_pool;
use crate::models::{ImportRun, ImportStage};
use crate::services::gemini_client::{
    FileState, GeminiError, InferenceClient, MediaPart, RemoteFile,
};
use crate::storage::{extension_of, paths, ObjectStore, StorageError, StoredObject};

/// Instruction sent with every screenshot or video
pub const EXTRACTION_PROMPT: &str = "Extract every restaurant shown in this Beli screenshot or \
screen recording and return them as JSON. \
For a video, read every frame: the list may be scrolled, so collect all places that appear \
and list each place only once. \
For each place return: name; rating (the number in the green circle); price (the dollar \
signs, as a string, under the key 'price'); cuisine (a list); location (a list, neighborhood \
first and city last). \
Respond with JSON only, without markdown or code fences.";

/// Delay between File API status checks while a video is processing
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

const IMAGE_MIMES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];
const VIDEO_MIMES: [&str; 4] = ["video/mp4", "video/quicktime", "video/webm", "video/mov"];

/// Pipeline failures, each tied to the stage that produced it
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Inference(#[from] GeminiError),

    #[error("Gemini failed to process the video file")]
    VideoProcessingFailed,

    #[error("Could not extract text from Gemini response")]
    NoText { result_keys: Vec<String> },

    #[error("Gemini did not return valid JSON (after stripping fences)")]
    InvalidJson {
        raw: String,
        cleaned: String,
        reason: String,
    },
}

impl PipelineError {
    pub fn stage(&self) -> ImportStage {
        match self {
            PipelineError::Storage(_) => ImportStage::Uploading,
            PipelineError::Inference(_) | PipelineError::VideoProcessingFailed => {
                ImportStage::Inferring
            }
            PipelineError::NoText { .. } | PipelineError::InvalidJson { .. } => {
                ImportStage::Parsing
            }
        }
    }
}

/// File received from the admin upload form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    /// Declared content type; may be empty
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Every normalized place, named or not
    pub places: Vec<PlaceDraft>,
    /// Records written to the pool
    pub stored: Vec<Place>,
    /// Set when the pool write failed
    pub persist_error: Option<String>,
    pub upload: StoredObject,
    pub run: ImportRun,
}

/// MIME type sent to the inference API
///
/// The declared type wins when it is a supported image or video type;
/// otherwise the file extension decides, defaulting to JPEG.
pub fn resolve_mime(declared: &str, file_name: &str) -> String {
    if IMAGE_MIMES.contains(&declared) || VIDEO_MIMES.contains(&declared) {
        return declared.to_string();
    }

    let name = file_name.to_lowercase();
    let by_extension = if name.ends_with(".png") {
        "image/png"
    } else if name.ends_with(".webp") {
        "image/webp"
    } else if name.ends_with(".mp4") {
        "video/mp4"
    } else if name.ends_with(".mov") {
        "video/quicktime"
    } else if name.ends_with(".webm") {
        "video/webm"
    } else {
        "image/jpeg"
    };

    by_extension.to_string()
}

pub fn is_video(mime: &str) -> bool {
    mime.starts_with("video/")
}

/// Text of the first candidate's parts, joined
///
/// Falls back to a top-level `text` string.
pub fn extract_text(response: &Value) -> Option<String> {
    let joined: String = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if !joined.is_empty() {
        return Some(joined);
    }

    response
        .get("text")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Remove one surrounding ```` ``` ```` or ```` ```json ```` fence
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.len() >= 6 && trimmed.starts_with("```") && trimmed.ends_with("```") {
        let mut inner = &trimmed[3..trimmed.len() - 3];
        if inner
            .get(..4)
            .map_or(false, |tag| tag.eq_ignore_ascii_case("json"))
        {
            inner = &inner[4..];
        }

        let inner = inner.trim();
        if !inner.is_empty() {
            return inner.to_string();
        }
    }

    trimmed.to_string()
}

fn top_level_keys(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default()
}

struct Extracted {
    places: Vec<PlaceDraft>,
    stored: Vec<Place>,
    persist_error: Option<String>,
    upload: StoredObject,
}

/// Sequential upload → infer → parse → normalize → persist
pub struct ImportPipeline {
    db: SqlitePool,
    storage: Arc<dyn ObjectStore>,
    inference: Arc<dyn InferenceClient>,
    poll_interval: Duration,
}

impl ImportPipeline {
    pub fn new(
        db: SqlitePool,
        storage: Arc<dyn ObjectStore>,
        inference: Arc<dyn InferenceClient>,
    ) -> Self {
        Self {
            db,
            storage,
            inference,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn run(&self, file: UploadedFile) -> Result<ImportOutcome, PipelineError> {
        let mut run = ImportRun::new();

        tracing::info!(
            file_name = %file.file_name,
            content_type = %file.content_type,
            size = file.bytes.len(),
            "Starting Beli import"
        );

        match self.execute(&mut run, file).await {
            Ok(extracted) => {
                run.advance();
                tracing::info!(
                    places = extracted.places.len(),
                    stored = extracted.stored.len(),
                    "Beli import complete"
                );

                Ok(ImportOutcome {
                    places: extracted.places,
                    stored: extracted.stored,
                    persist_error: extracted.persist_error,
                    upload: extracted.upload,
                    run,
                })
            }
            Err(e) => {
                let stage = run.stage;
                run.fail();
                tracing::warn!(stage = %stage, error = %e, "Beli import failed");
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        run: &mut ImportRun,
        file: UploadedFile,
    ) -> Result<Extracted, PipelineError> {
        run.advance();
        let object_path = paths::beli_upload(time::unix_millis(), &extension_of(&file.file_name, "bin"));
        let content_type = if file.content_type.is_empty() {
            "application/octet-stream"
        } else {
            file.content_type.as_str()
        };
        let upload = self.storage.put(&object_path, &file.bytes, content_type).await?;

        run.advance();
        let mime = resolve_mime(&file.content_type, &file.file_name);
        tracing::debug!(mime = %mime, video = is_video(&mime), "Resolved media type");

        let media = if is_video(&mime) {
            let uploaded = self
                .inference
                .upload_file(&file.bytes, &mime, &file.file_name)
                .await?;
            let ready = self.wait_until_processed(uploaded).await?;
            let mime_type = if ready.mime_type.is_empty() { mime } else { ready.mime_type };
            MediaPart::FileUri { mime_type, uri: ready.uri }
        } else {
            MediaPart::Inline { mime_type: mime, data: file.bytes }
        };

        let response = self.inference.generate(EXTRACTION_PROMPT, media).await?;

        run.advance();
        let raw = extract_text(&response).ok_or_else(|| PipelineError::NoText {
            result_keys: top_level_keys(&response),
        })?;
        let cleaned = strip_code_fences(&raw);
        let parsed: Value = match serde_json::from_str(&cleaned) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Err(PipelineError::InvalidJson {
                    raw,
                    cleaned,
                    reason: e.to_string(),
                })
            }
        };

        run.advance();
        let places = normalize_places(extract_place_array(parsed));

        run.advance();
        let named = retain_named(places.clone());
        let (stored, persist_error) = match ratings_pool::bulk_upsert(&self.db, &named).await {
            Ok(stored) => (stored, None),
            Err(e) => {
                tracing::warn!(error = %e, count = named.len(), "Failed to save parsed places to ratings pool");
                (Vec::new(), Some(e.to_string()))
            }
        };

        Ok(Extracted {
            places,
            stored,
            persist_error,
            upload,
        })
    }

    async fn wait_until_processed(&self, mut file: RemoteFile) -> Result<RemoteFile, PipelineError> {
        while file.state == FileState::Processing {
            tracing::debug!(file = %file.name, "Waiting for video processing");
            tokio::time::sleep(self.poll_interval).await;
            file = self.inference.get_file(&file.name).await?;
        }

        if file.state == FileState::Failed {
            return Err(PipelineError::VideoProcessingFailed);
        }

        Ok(file)
    }
}
