//! services/api/src/web/purchase.rs
//!
//! Checkout, the payment provider webhook and purchase-aware course views.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Extension, Json,
};
use lms_core::domain::{CourseDetail, PurchaseWithCourse};
use lms_core::ports::PortError;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::web::state::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Deserialize, ToSchema)]
pub struct CheckoutRequest {
    #[serde(alias = "courseId")]
    pub course_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub success: bool,
    /// Hosted checkout page to redirect the browser to.
    pub url: String,
}

#[derive(Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

#[derive(Serialize, ToSchema)]
pub struct CourseStatusResponse {
    pub success: bool,
    pub course: CourseDetail,
    /// Whether the caller holds a completed purchase of the course.
    pub purchased: bool,
}

#[derive(Serialize, ToSchema)]
pub struct PurchasedCoursesResponse {
    pub success: bool,
    pub purchased_courses: Vec<PurchaseWithCourse>,
}

#[utoipa::path(
    post,
    path = "/api/purchase/checkout/create-checkout-session",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Checkout session opened", body = CheckoutResponse),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Payment provider failure")
    )
)]
pub async fn create_checkout_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<Json<CheckoutResponse>> {
    let Json(req) = payload?;
    let url = state
        .purchases
        .create_checkout_session(user_id, req.course_id)
        .await?;
    Ok(Json(CheckoutResponse { success: true, url }))
}

/// Receives signed provider events. The raw body is what gets verified.
#[utoipa::path(
    post,
    path = "/api/purchase/webhook",
    request_body(content_type = "application/json", description = "Raw provider event."),
    params(("Stripe-Signature" = String, Header, description = "t=<ts>,v1=<hmac>")),
    responses(
        (status = 200, description = "Event acknowledged", body = WebhookAck),
        (status = 400, description = "Missing or invalid signature")
    )
)]
pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| PortError::Security("Missing Stripe-Signature header".to_string()))?;

    let outcome = state.purchases.handle_webhook(&body, signature).await?;
    info!(?outcome, "Webhook processed");
    Ok(Json(WebhookAck { received: true }))
}

#[utoipa::path(
    get,
    path = "/api/purchase/course/{course_id}/detail-with-status",
    params(("course_id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course with purchase status", body = CourseStatusResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn course_detail_with_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Json<CourseStatusResponse>> {
    let status = state
        .purchases
        .course_detail_with_status(user_id, course_id)
        .await?;
    Ok(Json(CourseStatusResponse {
        success: true,
        course: status.course,
        purchased: status.purchased,
    }))
}

/// Every completed purchase with its course.
#[utoipa::path(
    get,
    path = "/api/purchase",
    responses((status = 200, description = "Completed purchases", body = PurchasedCoursesResponse))
)]
pub async fn purchased_courses_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PurchasedCoursesResponse>> {
    let purchased_courses = state.purchases.list_completed_purchases().await?;
    Ok(Json(PurchasedCoursesResponse {
        success: true,
        purchased_courses,
    }))
}
