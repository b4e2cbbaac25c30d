//! services/api/src/web/media.rs
//!
//! Direct video upload, used by the lecture editor before it saves the lecture.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use lms_core::domain::{MediaKind, StoredMedia};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::web::state::AppState;
use crate::web::upload::MultipartForm;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    /// The public URL and the reference id to store on the lecture.
    pub data: StoredMedia,
}

/// Upload a lecture video (multipart field `file`).
#[utoipa::path(
    post,
    path = "/api/media/upload-video",
    request_body(content_type = "multipart/form-data", description = "The video as field `file`."),
    responses(
        (status = 200, description = "Video stored", body = UploadResponse),
        (status = 400, description = "No file in the request")
    )
)]
pub async fn upload_video_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut form = MultipartForm::read(&mut multipart).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| ApiError::BadRequest("Multipart form must include a file".to_string()))?;

    let stored = state.media.upload(file.into_media(MediaKind::Video)).await?;
    info!(public_id = %stored.public_id, "Video uploaded");
    Ok(Json(UploadResponse {
        success: true,
        message: "File uploaded successfully".to_string(),
        data: stored,
    }))
}
