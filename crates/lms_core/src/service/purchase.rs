//! crates/lms_core/src/service/purchase.rs
//!
//! Hosted checkout and webhook-driven purchase completion.
//!
//! A purchase is created `pending` when the checkout session is opened and is
//! only completed by a verified provider webhook; client-side claims of
//! payment are never consulted.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    CheckoutRequest, CourseDetail, NewPurchase, PurchaseStatus, PurchaseWithCourse, WebhookEvent,
};
use crate::ports::{DatabaseService, PaymentService, PortError, PortResult};
use crate::service::course_detail;

#[derive(Clone)]
pub struct PurchaseService {
    db: Arc<dyn DatabaseService>,
    payments: Arc<dyn PaymentService>,
    client_url: String,
}

/// What a verified webhook delivery did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Completed,
    /// Redelivery of an event that was already applied.
    AlreadyCompleted,
    /// No purchase carries the session id; acknowledged so the provider stops retrying.
    UnknownSession,
    Ignored,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseWithStatus {
    pub course: CourseDetail,
    pub purchased: bool,
}

/// Converts a major-unit price into the provider's smallest currency unit.
pub fn minor_units(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

impl PurchaseService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        payments: Arc<dyn PaymentService>,
        client_url: impl Into<String>,
    ) -> Self {
        Self {
            db,
            payments,
            client_url: client_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Opens a hosted checkout page for the course and returns its URL.
    pub async fn create_checkout_session(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<String> {
        let course = self.db.get_course(course_id).await?;
        let price = course
            .price
            .filter(|price| *price > 0.0)
            .ok_or_else(|| PortError::Validation("Course has no price yet".to_string()))?;

        // The purchase is only recorded once the provider has opened a session.
        let request = CheckoutRequest {
            course_id,
            user_id,
            product_name: course.title.clone(),
            image_url: course.thumbnail_url.clone(),
            unit_amount: minor_units(price),
            success_url: format!("{}/course-progress/{}", self.client_url, course_id),
            cancel_url: format!("{}/course-detail/{}", self.client_url, course_id),
        };
        let session = self.payments.create_checkout_session(&request).await?;
        let url = session
            .url
            .ok_or_else(|| PortError::Payment("Error while creating session".to_string()))?;

        let purchase = self
            .db
            .create_purchase(NewPurchase {
                course_id,
                user_id,
                amount: price,
            })
            .await?;
        self.db.set_purchase_payment_id(purchase.id, &session.id).await?;
        info!(purchase_id = %purchase.id, session_id = %session.id, "Checkout session created");
        Ok(url)
    }

    /// Verifies and applies a provider notification.
    ///
    /// The access grants (preview flags and both enrollment lists) are set-style
    /// writes applied before the status flips, so a redelivery after a partial
    /// failure finishes the job. The writes are not atomic as a group.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> PortResult<WebhookOutcome> {
        let event = self.payments.verify_webhook(payload, signature)?;

        let (session_id, amount_total) = match event {
            WebhookEvent::CheckoutCompleted {
                session_id,
                amount_total,
            } => (session_id, amount_total),
            WebhookEvent::Other { event_type } => {
                info!(event_type = %event_type, "Ignoring webhook event");
                return Ok(WebhookOutcome::Ignored);
            }
        };

        let purchase = match self.db.get_purchase_by_payment_id(&session_id).await {
            Ok(purchase) => purchase,
            Err(PortError::NotFound(_)) => {
                warn!(session_id = %session_id, "Webhook for unknown checkout session");
                return Ok(WebhookOutcome::UnknownSession);
            }
            Err(e) => return Err(e),
        };

        if purchase.status == PurchaseStatus::Completed {
            info!(purchase_id = %purchase.id, "Purchase already completed; ignoring redelivery");
            return Ok(WebhookOutcome::AlreadyCompleted);
        }

        let course = self.db.get_course(purchase.course_id).await?;
        if !course.lecture_ids.is_empty() {
            self.db.set_lectures_preview_free(&course.lecture_ids).await?;
        }
        self.db.add_enrolled_course(purchase.user_id, course.id).await?;
        self.db.add_enrolled_student(course.id, purchase.user_id).await?;

        let amount = amount_total
            .map(|total| total as f64 / 100.0)
            .unwrap_or(purchase.amount);
        if !self.db.complete_purchase(purchase.id, amount).await? {
            return Ok(WebhookOutcome::AlreadyCompleted);
        }

        info!(purchase_id = %purchase.id, user_id = %purchase.user_id, course_id = %course.id, "Purchase completed");
        Ok(WebhookOutcome::Completed)
    }

    /// The course detail plus whether the user holds a completed purchase for it.
    pub async fn course_detail_with_status(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<CourseWithStatus> {
        let course = course_detail(self.db.as_ref(), course_id).await?;
        let purchased = self.db.has_completed_purchase(user_id, course_id).await?;
        Ok(CourseWithStatus { course, purchased })
    }

    pub async fn list_completed_purchases(&self) -> PortResult<Vec<PurchaseWithCourse>> {
        let purchases = self.db.list_completed_purchases().await?;
        let mut course_ids: Vec<Uuid> = purchases.iter().map(|p| p.course_id).collect();
        course_ids.sort();
        course_ids.dedup();
        let courses = self.db.get_courses_by_ids(&course_ids).await?;

        Ok(purchases
            .into_iter()
            .map(|purchase| {
                let course = courses.iter().find(|c| c.id == purchase.course_id).cloned();
                PurchaseWithCourse { purchase, course }
            })
            .collect())
    }
}
