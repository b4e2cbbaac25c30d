//! crates/lms_core/src/service/course.rs
//!
//! Course authoring, publishing, catalog search and lecture management.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    Course, CourseDetail, CourseSummary, CourseUpdate, Lecture, LectureUpdate, MediaUpload,
    NewCourse, PublicCreator, SearchQuery,
};
use crate::ports::{DatabaseService, MediaService, PortError, PortResult};
use crate::service::{course_detail, discard_media};

#[derive(Clone)]
pub struct CourseService {
    db: Arc<dyn DatabaseService>,
    media: Arc<dyn MediaService>,
}

fn required(value: &str, message: &str) -> PortResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortError::Validation(message.to_string()));
    }
    Ok(trimmed.to_string())
}

impl CourseService {
    pub fn new(db: Arc<dyn DatabaseService>, media: Arc<dyn MediaService>) -> Self {
        Self { db, media }
    }

    pub async fn create_course(
        &self,
        title: &str,
        category: &str,
        creator_id: Uuid,
    ) -> PortResult<Course> {
        let title = required(title, "All Fields are Required")?;
        let category = required(category, "All Fields are Required")?;
        let course = self
            .db
            .create_course(NewCourse {
                title,
                category,
                creator_id,
            })
            .await?;
        info!(course_id = %course.id, %creator_id, "Course created");
        Ok(course)
    }

    pub async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        self.db.get_course(course_id).await
    }

    pub async fn course_detail(&self, course_id: Uuid) -> PortResult<CourseDetail> {
        course_detail(self.db.as_ref(), course_id).await
    }

    /// Applies a partial update. A new thumbnail is stored first; the old asset
    /// is only discarded once the new URL has been persisted.
    pub async fn update_course(
        &self,
        course_id: Uuid,
        mut update: CourseUpdate,
        thumbnail: Option<MediaUpload>,
    ) -> PortResult<Course> {
        let existing = self.db.get_course(course_id).await?;

        let Some(upload) = thumbnail else {
            return self.db.update_course(course_id, &update).await;
        };

        let stored = self.media.upload(upload).await?;
        update.thumbnail_url = Some(stored.url);
        let course = self.db.update_course(course_id, &update).await?;
        if let Some(previous) = existing.thumbnail_url {
            discard_media(self.media.as_ref(), &previous).await;
        }
        Ok(course)
    }

    /// Sets the published flag to the requested state. Publishing needs at least one lecture.
    pub async fn toggle_publish(&self, course_id: Uuid, publish: bool) -> PortResult<Course> {
        let course = self.db.get_course(course_id).await?;
        if publish && course.lecture_ids.is_empty() {
            return Err(PortError::Validation(
                "A course without lectures cannot be published".to_string(),
            ));
        }
        let course = self.db.set_course_published(course_id, publish).await?;
        info!(%course_id, published = publish, "Course publish state changed");
        Ok(course)
    }

    pub async fn list_creator_courses(&self, creator_id: Uuid) -> PortResult<Vec<Course>> {
        self.db.list_courses_by_creator(creator_id).await
    }

    pub async fn list_published(&self) -> PortResult<Vec<CourseSummary>> {
        let courses = self.db.list_published_courses().await?;
        self.with_creators(courses).await
    }

    pub async fn search(&self, query: &SearchQuery) -> PortResult<Vec<CourseSummary>> {
        let courses = self.db.search_courses(query).await?;
        self.with_creators(courses).await
    }

    async fn with_creators(&self, courses: Vec<Course>) -> PortResult<Vec<CourseSummary>> {
        let mut creator_ids: Vec<Uuid> = courses.iter().map(|c| c.creator_id).collect();
        creator_ids.sort();
        creator_ids.dedup();
        let creators = self.db.get_users_by_ids(&creator_ids).await?;

        Ok(courses
            .into_iter()
            .map(|course| {
                let creator = creators
                    .iter()
                    .find(|u| u.id == course.creator_id)
                    .map(PublicCreator::from);
                CourseSummary { course, creator }
            })
            .collect())
    }

    // --- Lectures ---

    pub async fn create_lecture(&self, title: &str, course_id: Uuid) -> PortResult<Lecture> {
        let title = required(title, "Lecture Title is required")?;
        self.db.get_course(course_id).await?;
        let lecture = self.db.create_lecture(&title).await?;
        self.db.append_course_lecture(course_id, lecture.id).await?;
        info!(%course_id, lecture_id = %lecture.id, "Lecture created");
        Ok(lecture)
    }

    /// Updates a lecture reached through `course_id`. A lecture no course lists yet
    /// is attached to it; one listed by another course is not found here.
    pub async fn update_lecture(
        &self,
        course_id: Uuid,
        lecture_id: Uuid,
        update: LectureUpdate,
    ) -> PortResult<Lecture> {
        self.db.get_course(course_id).await?;
        let owners = self.db.courses_listing_lecture(lecture_id).await?;
        if owners.iter().any(|owner| *owner != course_id) {
            return Err(PortError::NotFound(format!(
                "Lecture {} not found in course {}",
                lecture_id, course_id
            )));
        }
        let lecture = self.db.update_lecture(lecture_id, &update).await?;
        self.db.append_course_lecture(course_id, lecture.id).await?;
        Ok(lecture)
    }

    /// Deletes the lecture, then its stored video, then pulls it from its course.
    /// A failed video delete is logged and the removal still succeeds.
    pub async fn remove_lecture(&self, lecture_id: Uuid, course_id: Uuid) -> PortResult<()> {
        let lecture = self.db.delete_lecture(lecture_id).await?;
        if let Some(public_id) = lecture.public_id.as_deref() {
            if let Err(e) = self.media.delete(public_id).await {
                warn!(%lecture_id, public_id, error = %e, "Failed to delete lecture video; asset orphaned");
            }
        }
        self.db.remove_lecture_from_courses(lecture_id).await?;
        info!(%course_id, %lecture_id, "Lecture removed");
        Ok(())
    }

    pub async fn get_lectures(&self, course_id: Uuid) -> PortResult<Vec<Lecture>> {
        let course = self.db.get_course(course_id).await?;
        self.db.get_lectures_by_ids(&course.lecture_ids).await
    }

    pub async fn get_lecture(&self, lecture_id: Uuid) -> PortResult<Lecture> {
        self.db.get_lecture(lecture_id).await
    }
}
