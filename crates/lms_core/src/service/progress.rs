//! crates/lms_core/src/service/progress.rs
//!
//! Per-user, per-course lecture viewing and completion tracking.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{CourseProgress, ProgressView};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::service::course_detail;

#[derive(Clone)]
pub struct ProgressService {
    db: Arc<dyn DatabaseService>,
}

impl ProgressService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    async fn load(&self, user_id: Uuid, course_id: Uuid) -> PortResult<CourseProgress> {
        Ok(self
            .db
            .get_progress(user_id, course_id)
            .await?
            .unwrap_or_else(|| CourseProgress::new(user_id, course_id)))
    }

    /// A user with no progress yet gets an empty list and `completed = false`.
    pub async fn get_progress(&self, user_id: Uuid, course_id: Uuid) -> PortResult<ProgressView> {
        let course_details = course_detail(self.db.as_ref(), course_id).await?;
        let progress = self.load(user_id, course_id).await?;
        Ok(ProgressView {
            course_details,
            progress: progress.lecture_progress,
            completed: progress.completed,
        })
    }

    /// Marks one lecture viewed. Viewing the last unviewed lecture also marks the
    /// course completed; this path never clears the flag.
    pub async fn update_lecture_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        lecture_id: Uuid,
    ) -> PortResult<CourseProgress> {
        let course = self.db.get_course(course_id).await?;
        if !course.lecture_ids.contains(&lecture_id) {
            return Err(PortError::NotFound(format!(
                "Lecture {} not found in course {}",
                lecture_id, course_id
            )));
        }

        let mut progress = self.load(user_id, course_id).await?;
        progress.mark_viewed(lecture_id);
        if progress.covers(&course.lecture_ids) {
            progress.completed = true;
        }
        self.db.save_progress(&progress).await?;
        Ok(progress)
    }

    pub async fn mark_complete(&self, user_id: Uuid, course_id: Uuid) -> PortResult<CourseProgress> {
        self.set_completed(user_id, course_id, true).await
    }

    pub async fn mark_incomplete(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<CourseProgress> {
        self.set_completed(user_id, course_id, false).await
    }

    async fn set_completed(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        completed: bool,
    ) -> PortResult<CourseProgress> {
        self.db.get_course(course_id).await?;
        let mut progress = self.load(user_id, course_id).await?;
        progress.completed = completed;
        self.db.save_progress(&progress).await?;
        Ok(progress)
    }
}
