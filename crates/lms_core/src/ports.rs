//! crates/lms_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core logic depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete database, object store and payment provider.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    CheckoutRequest, CheckoutSession, Course, CourseProgress, CourseUpdate, Lecture,
    LectureUpdate, MediaUpload, NewCourse, NewPurchase, NewUser, Purchase, SearchQuery,
    StoredMedia, User, UserCredentials, WebhookEvent,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type shared by every port and domain service.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Auth(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Security(String),
    #[error("Payment provider error: {0}")]
    Payment(String),
    #[error("Media store error: {0}")]
    Media(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> PortResult<Vec<User>>;

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        name: &str,
        photo_url: &str,
    ) -> PortResult<User>;

    /// Adds the course to the user's enrolled list unless already present.
    async fn add_enrolled_course(&self, user_id: Uuid, course_id: Uuid) -> PortResult<()>;

    // --- Courses ---
    async fn create_course(&self, new_course: NewCourse) -> PortResult<Course>;

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course>;

    async fn get_courses_by_ids(&self, course_ids: &[Uuid]) -> PortResult<Vec<Course>>;

    async fn update_course(&self, course_id: Uuid, update: &CourseUpdate) -> PortResult<Course>;

    async fn set_course_published(&self, course_id: Uuid, published: bool) -> PortResult<Course>;

    async fn list_courses_by_creator(&self, creator_id: Uuid) -> PortResult<Vec<Course>>;

    async fn list_published_courses(&self) -> PortResult<Vec<Course>>;

    async fn search_courses(&self, query: &SearchQuery) -> PortResult<Vec<Course>>;

    /// Appends the lecture to the course's list unless already present.
    /// A missing course is not an error.
    async fn append_course_lecture(&self, course_id: Uuid, lecture_id: Uuid) -> PortResult<()>;

    /// Ids of the courses whose lecture list holds the lecture.
    async fn courses_listing_lecture(&self, lecture_id: Uuid) -> PortResult<Vec<Uuid>>;

    /// Pulls the lecture id from every course list that holds it.
    async fn remove_lecture_from_courses(&self, lecture_id: Uuid) -> PortResult<()>;

    /// Adds the user to the course's enrolled students unless already present.
    async fn add_enrolled_student(&self, course_id: Uuid, user_id: Uuid) -> PortResult<()>;

    // --- Lectures ---
    async fn create_lecture(&self, title: &str) -> PortResult<Lecture>;

    async fn get_lecture(&self, lecture_id: Uuid) -> PortResult<Lecture>;

    /// Returns the lectures in the order of `lecture_ids`, skipping missing ones.
    async fn get_lectures_by_ids(&self, lecture_ids: &[Uuid]) -> PortResult<Vec<Lecture>>;

    async fn update_lecture(&self, lecture_id: Uuid, update: &LectureUpdate) -> PortResult<Lecture>;

    /// Deletes and returns the lecture; `NotFound` if it does not exist.
    async fn delete_lecture(&self, lecture_id: Uuid) -> PortResult<Lecture>;

    async fn set_lectures_preview_free(&self, lecture_ids: &[Uuid]) -> PortResult<()>;

    // --- Purchases ---
    async fn create_purchase(&self, new_purchase: NewPurchase) -> PortResult<Purchase>;

    async fn set_purchase_payment_id(&self, purchase_id: Uuid, payment_id: &str) -> PortResult<()>;

    async fn get_purchase_by_payment_id(&self, payment_id: &str) -> PortResult<Purchase>;

    /// Moves a purchase to `completed` with the reconciled amount.
    /// Returns `false` when it was already completed and nothing changed.
    async fn complete_purchase(&self, purchase_id: Uuid, amount: f64) -> PortResult<bool>;

    async fn has_completed_purchase(&self, user_id: Uuid, course_id: Uuid) -> PortResult<bool>;

    async fn list_completed_purchases(&self) -> PortResult<Vec<Purchase>>;

    // --- Progress ---
    async fn get_progress(&self, user_id: Uuid, course_id: Uuid)
        -> PortResult<Option<CourseProgress>>;

    async fn save_progress(&self, progress: &CourseProgress) -> PortResult<()>;
}

/// The external object store for images and videos.
#[async_trait]
pub trait MediaService: Send + Sync {
    async fn upload(&self, upload: MediaUpload) -> PortResult<StoredMedia>;

    async fn delete(&self, public_id: &str) -> PortResult<()>;

    /// Recovers the reference id of an asset from its public URL.
    fn reference_from_url(&self, url: &str) -> Option<String>;
}

/// The external hosted-checkout provider.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn create_checkout_session(&self, request: &CheckoutRequest)
        -> PortResult<CheckoutSession>;

    /// Verifies the signature of a raw webhook payload and parses it.
    /// Fails with `Security` when the signature does not match.
    fn verify_webhook(&self, payload: &[u8], signature: &str) -> PortResult<WebhookEvent>;
}
