//! services/api/src/web/progress.rs
//!
//! Learner progress endpoints under `/api/progress/{course_id}`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use lms_core::domain::ProgressView;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct ProgressResponse {
    pub success: bool,
    pub data: ProgressView,
}

#[utoipa::path(
    get,
    path = "/api/progress/{course_id}",
    params(("course_id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course details and the caller's progress", body = ProgressResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Json<ProgressResponse>> {
    let data = state.progress.get_progress(user_id, course_id).await?;
    Ok(Json(ProgressResponse {
        success: true,
        data,
    }))
}

#[utoipa::path(
    post,
    path = "/api/progress/{course_id}/lecture/{lecture_id}/view",
    params(
        ("course_id" = Uuid, Path, description = "Course id"),
        ("lecture_id" = Uuid, Path, description = "Lecture id")
    ),
    responses(
        (status = 200, description = "Lecture marked viewed", body = MessageResponse),
        (status = 404, description = "Course or lecture not found")
    )
)]
pub async fn view_lecture_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path((course_id, lecture_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .progress
        .update_lecture_progress(user_id, course_id, lecture_id)
        .await?;
    Ok(Json(MessageResponse::ok("Lecture progress updated successfully")))
}

#[utoipa::path(
    post,
    path = "/api/progress/{course_id}/complete",
    params(("course_id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course marked completed", body = MessageResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn mark_complete_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.progress.mark_complete(user_id, course_id).await?;
    Ok(Json(MessageResponse::ok("Course marked as completed")))
}

#[utoipa::path(
    post,
    path = "/api/progress/{course_id}/incomplete",
    params(("course_id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course marked incomplete", body = MessageResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn mark_incomplete_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.progress.mark_incomplete(user_id, course_id).await?;
    Ok(Json(MessageResponse::ok("Course marked as incompleted")))
}
