//! Object storage for images and uploaded screenshots/videos
//!
//! Objects are addressed by slash-separated relative paths under
//! collection-scoped prefixes:
//! - `reviews/<slug>/cover.<ext>`, `reviews/<slug>/gallery-<ts>-<n>.<ext>`
//! - `lists/<slug>/cover.<ext>`
//! - `beli-uploads/<ts>.<ext>`
//! - `site/profile.<ext>`
//!
//! The local implementation keeps objects under `<root>/storage` and the HTTP
//! layer serves them at `/files/<path>`.

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Object storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a successful write
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    /// Relative object path
    pub path: String,
    /// Retrieval URL
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

/// Object storage seam
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write (or overwrite) an object
    async fn put(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;

    /// Retrieval URL for an object path
    fn public_url(&self, path: &str) -> String;
}

/// Filesystem-backed object store
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    /// `public_base_url` is the externally visible server URL; objects are
    /// served beneath `<public_base_url>/files/`.
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let well_formed = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !well_formed {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let target = self.resolve(path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        tracing::debug!(path = %path, size = bytes.len(), content_type = %content_type, "Stored object");

        Ok(StoredObject {
            path: path.to_string(),
            url: self.public_url(path),
            content_type: content_type.to_string(),
            size: bytes.len(),
        })
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/files/{}", self.public_base_url, path)
    }
}

/// File extension taken from an uploaded file name
///
/// Lowercased; falls back to `default` when the name has no usable
/// extension (no dot, empty, or non-alphanumeric).
pub fn extension_of(file_name: &str, default: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| default.to_string())
}

/// Object paths for each collection
pub mod paths {
    pub fn review_cover(slug: &str, ext: &str) -> String {
        format!("reviews/{}/cover.{}", slug, ext)
    }

    pub fn review_gallery(slug: &str, timestamp: i64, index: usize, ext: &str) -> String {
        format!("reviews/{}/gallery-{}-{}.{}", slug, timestamp, index, ext)
    }

    pub fn list_cover(slug: &str, ext: &str) -> String {
        format!("lists/{}/cover.{}", slug, ext)
    }

    pub fn beli_upload(timestamp: i64, ext: &str) -> String {
        format!("beli-uploads/{}.{}", timestamp, ext)
    }

    pub fn profile_image(ext: &str) -> String {
        format!("site/profile.{}", ext)
    }
}
