//! Multipart file handling shared by the image and parse endpoints

use axum::extract::Multipart;

use crate::error::{ApiError, ApiResult};
use crate::services::UploadedFile;
use crate::storage::{extension_of, StoredObject};
use crate::AppState;

/// Form keys accepted for a single uploaded file, in preference order
pub const FILE_FIELDS: [&str; 2] = ["image", "file"];

/// Upload bodies may carry screen recordings
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// A file part of a multipart body, tagged with its form key
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file: UploadedFile,
}

/// Read every file part of a multipart body
///
/// Plain text fields are skipped.
pub async fn collect_files(mut multipart: Multipart) -> ApiResult<Vec<FilePart>> {
    let mut parts = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let name = field.name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        tracing::debug!(field = %name, file_name = %file_name, size = bytes.len(), "Received file part");

        parts.push(FilePart {
            field: name,
            file: UploadedFile {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            },
        });
    }

    Ok(parts)
}

/// First file under the most preferred of `fields`
pub fn pick_file(parts: Vec<FilePart>, fields: &[&str]) -> Option<UploadedFile> {
    let mut parts = parts;
    for wanted in fields {
        if let Some(index) = parts.iter().position(|p| p.field == *wanted) {
            return Some(parts.swap_remove(index).file);
        }
    }
    None
}

/// Every file under any of `fields`, in body order
pub fn files_under(parts: Vec<FilePart>, fields: &[&str]) -> Vec<UploadedFile> {
    parts
        .into_iter()
        .filter(|p| fields.contains(&p.field.as_str()))
        .map(|p| p.file)
        .collect()
}

/// Single required image from an admin form
pub async fn require_single_file(multipart: Multipart) -> ApiResult<UploadedFile> {
    let file = pick_file(collect_files(multipart).await?, &FILE_FIELDS).ok_or_else(|| {
        ApiError::bad_request(r#"Missing file. Use form-data key "image" (or "file") and set it to File."#)
    })?;

    if file.bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty (size 0)"));
    }

    Ok(file)
}

/// Write an uploaded image to object storage
pub async fn store_file(
    state: &AppState,
    path: &str,
    file: &UploadedFile,
) -> ApiResult<StoredObject> {
    let content_type = if file.content_type.is_empty() {
        "application/octet-stream"
    } else {
        file.content_type.as_str()
    };

    let stored = state.storage.put(path, &file.bytes, content_type).await?;
    tracing::info!(path = %stored.path, size = stored.size, "Stored upload");
    Ok(stored)
}

/// Image extension, defaulting to `jpg` as the admin forms do
pub fn image_extension(file: &UploadedFile) -> String {
    extension_of(&file.file_name, "jpg")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(field: &str, name: &str) -> FilePart {
        FilePart {
            field: field.into(),
            file: UploadedFile {
                file_name: name.into(),
                content_type: String::new(),
                bytes: vec![1],
            },
        }
    }

    #[test]
    fn test_pick_file_prefers_image_key() {
        let parts = vec![part("file", "a.png"), part("image", "b.png"), part("image", "c.png")];
        assert_eq!(pick_file(parts, &FILE_FIELDS).unwrap().file_name, "b.png");

        let parts = vec![part("other", "x.png"), part("file", "a.png")];
        assert_eq!(pick_file(parts, &FILE_FIELDS).unwrap().file_name, "a.png");

        assert!(pick_file(vec![part("other", "x.png")], &FILE_FIELDS).is_none());
    }

    #[test]
    fn test_files_under_keeps_order() {
        let parts = vec![part("file", "1.jpg"), part("junk", "2.jpg"), part("image", "3.jpg")];
        let names: Vec<String> = files_under(parts, &FILE_FIELDS)
            .into_iter()
            .map(|f| f.file_name)
            .collect();
        assert_eq!(names, vec!["1.jpg", "3.jpg"]);
    }

    #[test]
    fn test_image_extension_default() {
        assert_eq!(image_extension(&part("file", "cover").file), "jpg");
        assert_eq!(image_extension(&part("file", "cover.WEBP").file), "webp");
    }
}
