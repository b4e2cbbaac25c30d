//! services/api/src/adapters/s3.rs
//!
//! This module contains the object storage adapter, which implements the
//! `MediaService` port for any S3-compatible store (AWS S3, Cloudflare R2, MinIO).
//!
//! Objects are written under `{folder}/{uuid}.{ext}` and the object key doubles
//! as the public reference id used for deletion.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use lms_core::domain::{MediaUpload, StoredMedia};
use lms_core::ports::{MediaService, PortError, PortResult};
use tracing::info;
use uuid::Uuid;

/// An adapter that implements the `MediaService` port over an S3 bucket.
#[derive(Clone)]
pub struct S3MediaAdapter {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3MediaAdapter {
    /// Creates a new `S3MediaAdapter` from an already configured client.
    pub fn new(client: Client, bucket: String, public_base_url: &str) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Builds the client from the standard AWS environment (credentials, region).
    /// A custom endpoint switches to path-style addressing for R2 and MinIO.
    pub async fn from_env(
        bucket: String,
        public_base_url: &str,
        endpoint_url: Option<&str>,
    ) -> Self {
        let shared = aws_config::load_from_env().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self::new(Client::from_conf(builder.build()), bucket, public_base_url)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

fn object_key(upload: &MediaUpload) -> String {
    format!(
        "{}/{}.{}",
        upload.kind.folder(),
        Uuid::new_v4(),
        upload.extension()
    )
}

#[async_trait]
impl MediaService for S3MediaAdapter {
    async fn upload(&self, upload: MediaUpload) -> PortResult<StoredMedia> {
        let key = object_key(&upload);
        let size = upload.data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(upload.content_type)
            .body(ByteStream::from(upload.data))
            .send()
            .await
            .map_err(|e| {
                PortError::Media(format!("Failed to upload object: {}", DisplayErrorContext(&e)))
            })?;

        info!(key = %key, size, "Stored media object");
        Ok(StoredMedia {
            url: self.public_url(&key),
            public_id: key,
        })
    }

    async fn delete(&self, public_id: &str) -> PortResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(public_id)
            .send()
            .await
            .map_err(|e| {
                PortError::Media(format!("Failed to delete object: {}", DisplayErrorContext(&e)))
            })?;
        info!(key = public_id, "Deleted media object");
        Ok(())
    }

    fn reference_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}
