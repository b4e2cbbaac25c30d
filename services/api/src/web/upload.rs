//! services/api/src/web/upload.rs
//!
//! Collects a `multipart/form-data` body into text fields and file parts.

use std::collections::HashMap;

use axum::extract::Multipart;
use lms_core::domain::{MediaKind, MediaUpload};

use crate::error::{ApiError, ApiResult};

/// A file part held in memory until it is handed to the media store.
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn into_media(self, kind: MediaKind) -> MediaUpload {
        MediaUpload {
            kind,
            file_name: self.file_name,
            content_type: self.content_type,
            data: self.data,
        }
    }
}

#[derive(Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    /// Drains every part. A part with a file name is a file; empty files are dropped.
    pub async fn read(multipart: &mut Multipart) -> ApiResult<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart data: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field.bytes().await.map_err(|e| {
                        ApiError::BadRequest(format!("Failed to read file bytes: {}", e))
                    })?;
                    if data.is_empty() {
                        continue;
                    }
                    form.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            content_type,
                            data: data.to_vec(),
                        },
                    );
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        ApiError::BadRequest(format!("Failed to read field '{}': {}", name, e))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    /// A trimmed, non-empty text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}
