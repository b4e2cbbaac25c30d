//! crates/lms_core/src/service/mod.rs
//!
//! Domain services. Each one is a cheap-to-clone handle over the ports it
//! needs, built once at startup and shared by every request.

pub mod course;
pub mod profile;
pub mod progress;
pub mod purchase;

pub use course::CourseService;
pub use profile::ProfileService;
pub use progress::ProgressService;
pub use purchase::{CourseWithStatus, PurchaseService, WebhookOutcome};

use tracing::warn;
use uuid::Uuid;

use crate::domain::{CourseDetail, PublicCreator};
use crate::ports::{DatabaseService, MediaService, PortResult};

/// Loads a course with its creator and lectures resolved, in lecture-list order.
pub(crate) async fn course_detail(
    db: &dyn DatabaseService,
    course_id: Uuid,
) -> PortResult<CourseDetail> {
    let course = db.get_course(course_id).await?;
    let creator = db
        .get_users_by_ids(&[course.creator_id])
        .await?
        .first()
        .map(PublicCreator::from);
    let lectures = db.get_lectures_by_ids(&course.lecture_ids).await?;
    Ok(CourseDetail {
        course,
        creator,
        lectures,
    })
}

/// Best-effort removal of a previously stored asset. Failures are logged, never returned.
pub(crate) async fn discard_media(media: &dyn MediaService, url: &str) {
    let Some(public_id) = media.reference_from_url(url) else {
        warn!(url, "Cannot derive a media reference from the stored URL; leaving asset");
        return;
    };
    if let Err(e) = media.delete(&public_id).await {
        warn!(public_id = %public_id, error = %e, "Failed to delete replaced media asset");
    }
}
