//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, the shared message
//! payload and the health endpoint.

use axum::response::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::web::{auth, course, media, progress, purchase};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::profile_handler,
        auth::update_profile_handler,
        course::create_course_handler,
        course::creator_courses_handler,
        course::published_courses_handler,
        course::search_courses_handler,
        course::get_course_handler,
        course::update_course_handler,
        course::toggle_publish_handler,
        course::create_lecture_handler,
        course::course_lectures_handler,
        course::update_lecture_handler,
        course::remove_lecture_handler,
        course::get_lecture_handler,
        media::upload_video_handler,
        purchase::create_checkout_session_handler,
        purchase::webhook_handler,
        purchase::course_detail_with_status_handler,
        purchase::purchased_courses_handler,
        progress::get_progress_handler,
        progress::view_lecture_handler,
        progress::mark_complete_handler,
        progress::mark_incomplete_handler,
    ),
    components(
        schemas(MessageResponse, HealthResponse)
    ),
    tags(
        (name = "LMS API", description = "Courses, lectures, purchases and learner progress.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Payloads
//=========================================================================================

/// A bare acknowledgement.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
