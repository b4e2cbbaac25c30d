//! crates/lms_core/src/memory.rs
//!
//! In-process implementations of the storage ports. They back the test suites
//! and local demos; production wires the Postgres and S3 adapters instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    Course, CourseProgress, CourseUpdate, Lecture, LectureUpdate, MediaUpload, NewCourse,
    NewPurchase, NewUser, Purchase, PurchaseStatus, SearchQuery, StoredMedia, User,
    UserCredentials,
};
use crate::ports::{DatabaseService, MediaService, PortError, PortResult};

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    courses: Vec<Course>,
    lectures: Vec<Lecture>,
    purchases: Vec<Purchase>,
    progress: Vec<CourseProgress>,
}

/// A `DatabaseService` that keeps every record in memory.
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every purchase record, whatever its status.
    pub fn purchase_count(&self) -> usize {
        self.tables
            .lock()
            .map(|tables| tables.purchases.len())
            .unwrap_or(0)
    }

    fn tables(&self) -> PortResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PortError::Unexpected("in-memory store poisoned".to_string()))
    }
}

fn push_unique(ids: &mut Vec<Uuid>, id: Uuid) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

fn course_not_found(course_id: Uuid) -> PortError {
    PortError::NotFound(format!("Course {} not found", course_id))
}

fn lecture_not_found(lecture_id: Uuid) -> PortError {
    PortError::NotFound(format!("Lecture {} not found", lecture_id))
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut tables = self.tables()?;
        if tables.users.iter().any(|c| c.user.email == new_user.email) {
            return Err(PortError::Conflict(
                "User already exist with this email.".to_string(),
            ));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            role: Default::default(),
            photo_url: None,
            enrolled_courses: Vec::new(),
            created_at: Utc::now(),
        };
        tables.users.push(UserCredentials {
            user: user.clone(),
            hashed_password: new_user.hashed_password,
        });
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.tables()?
            .users
            .iter()
            .find(|c| c.user.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.tables()?
            .users
            .iter()
            .find(|c| c.user.id == user_id)
            .map(|c| c.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> PortResult<Vec<User>> {
        Ok(self
            .tables()?
            .users
            .iter()
            .filter(|c| user_ids.contains(&c.user.id))
            .map(|c| c.user.clone())
            .collect())
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        name: &str,
        photo_url: &str,
    ) -> PortResult<User> {
        let mut tables = self.tables()?;
        let creds = tables
            .users
            .iter_mut()
            .find(|c| c.user.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        creds.user.name = name.to_string();
        creds.user.photo_url = Some(photo_url.to_string());
        Ok(creds.user.clone())
    }

    async fn add_enrolled_course(&self, user_id: Uuid, course_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables()?;
        if let Some(creds) = tables.users.iter_mut().find(|c| c.user.id == user_id) {
            push_unique(&mut creds.user.enrolled_courses, course_id);
        }
        Ok(())
    }

    async fn create_course(&self, new_course: NewCourse) -> PortResult<Course> {
        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            title: new_course.title,
            subtitle: None,
            description: None,
            category: new_course.category,
            level: None,
            price: None,
            thumbnail_url: None,
            is_published: false,
            creator_id: new_course.creator_id,
            lecture_ids: Vec::new(),
            enrolled_students: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.tables()?.courses.push(course.clone());
        Ok(course)
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        self.tables()?
            .courses
            .iter()
            .find(|c| c.id == course_id)
            .cloned()
            .ok_or_else(|| course_not_found(course_id))
    }

    async fn get_courses_by_ids(&self, course_ids: &[Uuid]) -> PortResult<Vec<Course>> {
        let tables = self.tables()?;
        Ok(course_ids
            .iter()
            .filter_map(|id| tables.courses.iter().find(|c| c.id == *id).cloned())
            .collect())
    }

    async fn update_course(&self, course_id: Uuid, update: &CourseUpdate) -> PortResult<Course> {
        let mut tables = self.tables()?;
        let course = tables
            .courses
            .iter_mut()
            .find(|c| c.id == course_id)
            .ok_or_else(|| course_not_found(course_id))?;
        update.apply(course);
        course.updated_at = Utc::now();
        Ok(course.clone())
    }

    async fn set_course_published(&self, course_id: Uuid, published: bool) -> PortResult<Course> {
        let mut tables = self.tables()?;
        let course = tables
            .courses
            .iter_mut()
            .find(|c| c.id == course_id)
            .ok_or_else(|| course_not_found(course_id))?;
        course.is_published = published;
        course.updated_at = Utc::now();
        Ok(course.clone())
    }

    async fn list_courses_by_creator(&self, creator_id: Uuid) -> PortResult<Vec<Course>> {
        Ok(self
            .tables()?
            .courses
            .iter()
            .filter(|c| c.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn list_published_courses(&self) -> PortResult<Vec<Course>> {
        Ok(self
            .tables()?
            .courses
            .iter()
            .filter(|c| c.is_published)
            .cloned()
            .collect())
    }

    async fn search_courses(&self, query: &SearchQuery) -> PortResult<Vec<Course>> {
        let mut hits: Vec<Course> = self
            .tables()?
            .courses
            .iter()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        query.sort(&mut hits);
        Ok(hits)
    }

    async fn append_course_lecture(&self, course_id: Uuid, lecture_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables()?;
        if let Some(course) = tables.courses.iter_mut().find(|c| c.id == course_id) {
            push_unique(&mut course.lecture_ids, lecture_id);
        }
        Ok(())
    }

    async fn courses_listing_lecture(&self, lecture_id: Uuid) -> PortResult<Vec<Uuid>> {
        Ok(self
            .tables()?
            .courses
            .iter()
            .filter(|c| c.lecture_ids.contains(&lecture_id))
            .map(|c| c.id)
            .collect())
    }

    async fn remove_lecture_from_courses(&self, lecture_id: Uuid) -> PortResult<()> {
        for course in self.tables()?.courses.iter_mut() {
            course.lecture_ids.retain(|id| *id != lecture_id);
        }
        Ok(())
    }

    async fn add_enrolled_student(&self, course_id: Uuid, user_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables()?;
        if let Some(course) = tables.courses.iter_mut().find(|c| c.id == course_id) {
            push_unique(&mut course.enrolled_students, user_id);
        }
        Ok(())
    }

    async fn create_lecture(&self, title: &str) -> PortResult<Lecture> {
        let lecture = Lecture {
            id: Uuid::new_v4(),
            title: title.to_string(),
            video_url: None,
            public_id: None,
            is_preview_free: false,
            created_at: Utc::now(),
        };
        self.tables()?.lectures.push(lecture.clone());
        Ok(lecture)
    }

    async fn get_lecture(&self, lecture_id: Uuid) -> PortResult<Lecture> {
        self.tables()?
            .lectures
            .iter()
            .find(|l| l.id == lecture_id)
            .cloned()
            .ok_or_else(|| lecture_not_found(lecture_id))
    }

    async fn get_lectures_by_ids(&self, lecture_ids: &[Uuid]) -> PortResult<Vec<Lecture>> {
        let tables = self.tables()?;
        Ok(lecture_ids
            .iter()
            .filter_map(|id| tables.lectures.iter().find(|l| l.id == *id).cloned())
            .collect())
    }

    async fn update_lecture(&self, lecture_id: Uuid, update: &LectureUpdate) -> PortResult<Lecture> {
        let mut tables = self.tables()?;
        let lecture = tables
            .lectures
            .iter_mut()
            .find(|l| l.id == lecture_id)
            .ok_or_else(|| lecture_not_found(lecture_id))?;
        update.apply(lecture);
        Ok(lecture.clone())
    }

    async fn delete_lecture(&self, lecture_id: Uuid) -> PortResult<Lecture> {
        let mut tables = self.tables()?;
        let index = tables
            .lectures
            .iter()
            .position(|l| l.id == lecture_id)
            .ok_or_else(|| lecture_not_found(lecture_id))?;
        Ok(tables.lectures.remove(index))
    }

    async fn set_lectures_preview_free(&self, lecture_ids: &[Uuid]) -> PortResult<()> {
        for lecture in self.tables()?.lectures.iter_mut() {
            if lecture_ids.contains(&lecture.id) {
                lecture.is_preview_free = true;
            }
        }
        Ok(())
    }

    async fn create_purchase(&self, new_purchase: NewPurchase) -> PortResult<Purchase> {
        let purchase = Purchase {
            id: Uuid::new_v4(),
            course_id: new_purchase.course_id,
            user_id: new_purchase.user_id,
            amount: new_purchase.amount,
            status: PurchaseStatus::Pending,
            payment_id: None,
            created_at: Utc::now(),
        };
        self.tables()?.purchases.push(purchase.clone());
        Ok(purchase)
    }

    async fn set_purchase_payment_id(&self, purchase_id: Uuid, payment_id: &str) -> PortResult<()> {
        let mut tables = self.tables()?;
        let purchase = tables
            .purchases
            .iter_mut()
            .find(|p| p.id == purchase_id)
            .ok_or_else(|| PortError::NotFound(format!("Purchase {} not found", purchase_id)))?;
        purchase.payment_id = Some(payment_id.to_string());
        Ok(())
    }

    async fn get_purchase_by_payment_id(&self, payment_id: &str) -> PortResult<Purchase> {
        self.tables()?
            .purchases
            .iter()
            .find(|p| p.payment_id.as_deref() == Some(payment_id))
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("Purchase for session {} not found", payment_id))
            })
    }

    async fn complete_purchase(&self, purchase_id: Uuid, amount: f64) -> PortResult<bool> {
        let mut tables = self.tables()?;
        let purchase = tables
            .purchases
            .iter_mut()
            .find(|p| p.id == purchase_id)
            .ok_or_else(|| PortError::NotFound(format!("Purchase {} not found", purchase_id)))?;
        if purchase.status == PurchaseStatus::Completed {
            return Ok(false);
        }
        purchase.status = PurchaseStatus::Completed;
        purchase.amount = amount;
        Ok(true)
    }

    async fn has_completed_purchase(&self, user_id: Uuid, course_id: Uuid) -> PortResult<bool> {
        Ok(self.tables()?.purchases.iter().any(|p| {
            p.user_id == user_id && p.course_id == course_id && p.status == PurchaseStatus::Completed
        }))
    }

    async fn list_completed_purchases(&self) -> PortResult<Vec<Purchase>> {
        Ok(self
            .tables()?
            .purchases
            .iter()
            .filter(|p| p.status == PurchaseStatus::Completed)
            .cloned()
            .collect())
    }

    async fn get_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<CourseProgress>> {
        Ok(self
            .tables()?
            .progress
            .iter()
            .find(|p| p.user_id == user_id && p.course_id == course_id)
            .cloned())
    }

    async fn save_progress(&self, progress: &CourseProgress) -> PortResult<()> {
        let mut tables = self.tables()?;
        match tables
            .progress
            .iter_mut()
            .find(|p| p.user_id == progress.user_id && p.course_id == progress.course_id)
        {
            Some(existing) => *existing = progress.clone(),
            None => tables.progress.push(progress.clone()),
        }
        Ok(())
    }
}

//=========================================================================================
// Media
//=========================================================================================

const MEMORY_MEDIA_BASE: &str = "memory://media";

/// A `MediaService` that keeps uploaded bytes in a map keyed by reference id.
#[derive(Default)]
pub struct InMemoryMedia {
    objects: Mutex<HashMap<String, MediaUpload>>,
    fail_deletes: bool,
    fail_uploads: AtomicBool,
}

impl InMemoryMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose deletes always fail, for exercising best-effort cleanup.
    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    /// Makes every later upload fail until switched back.
    pub fn set_failing_uploads(&self, failing: bool) {
        self.fail_uploads.store(failing, Ordering::SeqCst);
    }

    pub fn contains(&self, public_id: &str) -> bool {
        self.objects
            .lock()
            .map(|objects| objects.contains_key(public_id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MediaService for InMemoryMedia {
    async fn upload(&self, upload: MediaUpload) -> PortResult<StoredMedia> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(PortError::Media(format!("cannot store {}", upload.file_name)));
        }
        let public_id = format!("{}/{}.{}", upload.kind.folder(), Uuid::new_v4(), upload.extension());
        let url = format!("{}/{}", MEMORY_MEDIA_BASE, public_id);
        self.objects
            .lock()
            .map_err(|_| PortError::Media("in-memory media poisoned".to_string()))?
            .insert(public_id.clone(), upload);
        Ok(StoredMedia { url, public_id })
    }

    async fn delete(&self, public_id: &str) -> PortResult<()> {
        if self.fail_deletes {
            return Err(PortError::Media(format!("cannot delete {}", public_id)));
        }
        self.objects
            .lock()
            .map_err(|_| PortError::Media("in-memory media poisoned".to_string()))?
            .remove(public_id);
        Ok(())
    }

    fn reference_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(MEMORY_MEDIA_BASE)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}
