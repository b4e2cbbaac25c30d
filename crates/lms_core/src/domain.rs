//! crates/lms_core/src/domain.rs
//!
//! Defines the core data structures for the learning platform.
//! These structs are independent of any database; they derive `Serialize`
//! only so the HTTP layer can return them as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Instructor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Role::Student),
            "instructor" => Some(Role::Instructor),
            _ => None,
        }
    }
}

/// A registered user. Carries no password material, so it is always safe to return.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub photo_url: Option<String>,
    pub enrolled_courses: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub hashed_password: String,
}

/// The slice of a creator's profile shown next to their courses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicCreator {
    pub id: Uuid,
    pub name: String,
    pub photo_url: Option<String>,
}

impl From<&User> for PublicCreator {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            photo_url: user.photo_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub courses: Vec<Course>,
}

//=========================================================================================
// Courses & Lectures
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CourseLevel {
    Beginner,
    Medium,
    Advance,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "Beginner",
            CourseLevel::Medium => "Medium",
            CourseLevel::Advance => "Advance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Beginner" => Some(CourseLevel::Beginner),
            "Medium" => Some(CourseLevel::Medium),
            "Advance" => Some(CourseLevel::Advance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub level: Option<CourseLevel>,
    /// Price in major currency units.
    pub price: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub is_published: bool,
    pub creator_id: Uuid,
    /// Ordered list of the course's lectures.
    pub lecture_ids: Vec<Uuid>,
    pub enrolled_students: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub category: String,
    pub creator_id: Uuid,
}

/// A partial course update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub price: Option<f64>,
    pub thumbnail_url: Option<String>,
}

impl CourseUpdate {
    pub fn apply(&self, course: &mut Course) {
        if let Some(title) = &self.title {
            course.title = title.clone();
        }
        if let Some(subtitle) = &self.subtitle {
            course.subtitle = Some(subtitle.clone());
        }
        if let Some(description) = &self.description {
            course.description = Some(description.clone());
        }
        if let Some(category) = &self.category {
            course.category = category.clone();
        }
        if let Some(level) = self.level {
            course.level = Some(level);
        }
        if let Some(price) = self.price {
            course.price = Some(price);
        }
        if let Some(url) = &self.thumbnail_url {
            course.thumbnail_url = Some(url.clone());
        }
    }
}

/// A catalog entry: a course plus its creator's public profile.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseSummary {
    #[serde(flatten)]
    pub course: Course,
    pub creator: Option<PublicCreator>,
}

/// A course with its creator and lectures resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub creator: Option<PublicCreator>,
    pub lectures: Vec<Lecture>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Lecture {
    pub id: Uuid,
    pub title: String,
    pub video_url: Option<String>,
    /// Reference id of the stored video in the media store.
    pub public_id: Option<String>,
    pub is_preview_free: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct LectureUpdate {
    pub title: Option<String>,
    pub video_url: Option<String>,
    pub public_id: Option<String>,
    pub is_preview_free: Option<bool>,
}

impl LectureUpdate {
    pub fn apply(&self, lecture: &mut Lecture) {
        if let Some(title) = &self.title {
            lecture.title = title.clone();
        }
        if let Some(url) = &self.video_url {
            lecture.video_url = Some(url.clone());
        }
        if let Some(public_id) = &self.public_id {
            lecture.public_id = Some(public_id.clone());
        }
        if let Some(free) = self.is_preview_free {
            lecture.is_preview_free = free;
        }
    }
}

//=========================================================================================
// Search
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSort {
    Low,
    High,
}

impl PriceSort {
    /// `"low"` sorts ascending, `"high"` descending; anything else means unsorted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(PriceSort::Low),
            "high" => Some(PriceSort::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub query: String,
    pub categories: Vec<String>,
    pub sort: Option<PriceSort>,
}

impl SearchQuery {
    /// Whether a course passes the search filter. Sorting is applied separately.
    pub fn matches(&self, course: &Course) -> bool {
        if !course.is_published {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&course.category) {
            return false;
        }
        let needle = self.query.to_lowercase();
        let hit = |text: &str| text.to_lowercase().contains(&needle);
        hit(&course.title)
            || course.subtitle.as_deref().is_some_and(hit)
            || hit(&course.category)
    }

    pub fn sort(&self, courses: &mut [Course]) {
        let price = |c: &Course| c.price.unwrap_or(0.0);
        match self.sort {
            Some(PriceSort::Low) => courses.sort_by(|a, b| price(a).total_cmp(&price(b))),
            Some(PriceSort::High) => courses.sort_by(|a, b| price(b).total_cmp(&price(a))),
            None => {}
        }
    }
}

//=========================================================================================
// Purchases
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Completed,
    Failed,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PurchaseStatus::Pending),
            "completed" => Some(PurchaseStatus::Completed),
            "failed" => Some(PurchaseStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Purchase {
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub status: PurchaseStatus,
    /// The payment provider's checkout session id.
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseWithCourse {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub course: Option<Course>,
}

/// What the payment provider needs to open a hosted checkout page.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub product_name: String,
    pub image_url: Option<String>,
    /// Price in the smallest currency unit.
    pub unit_amount: i64,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

/// A verified notification from the payment provider.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    CheckoutCompleted {
        session_id: String,
        /// Authoritative total in the smallest currency unit.
        amount_total: Option<i64>,
    },
    Other {
        event_type: String,
    },
}

//=========================================================================================
// Progress
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LectureProgress {
    pub lecture_id: Uuid,
    pub viewed: bool,
}

#[derive(Debug, Clone)]
pub struct CourseProgress {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub completed: bool,
    pub lecture_progress: Vec<LectureProgress>,
}

impl CourseProgress {
    pub fn new(user_id: Uuid, course_id: Uuid) -> Self {
        Self {
            user_id,
            course_id,
            completed: false,
            lecture_progress: Vec::new(),
        }
    }

    /// Records the lecture as viewed, keeping one entry per lecture.
    pub fn mark_viewed(&mut self, lecture_id: Uuid) {
        match self
            .lecture_progress
            .iter_mut()
            .find(|entry| entry.lecture_id == lecture_id)
        {
            Some(entry) => entry.viewed = true,
            None => self.lecture_progress.push(LectureProgress {
                lecture_id,
                viewed: true,
            }),
        }
    }

    pub fn has_viewed(&self, lecture_id: Uuid) -> bool {
        self.lecture_progress
            .iter()
            .any(|entry| entry.lecture_id == lecture_id && entry.viewed)
    }

    /// True when every given lecture has been viewed. An empty course is never covered.
    pub fn covers(&self, lecture_ids: &[Uuid]) -> bool {
        !lecture_ids.is_empty() && lecture_ids.iter().all(|id| self.has_viewed(*id))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProgressView {
    pub course_details: CourseDetail,
    pub progress: Vec<LectureProgress>,
    pub completed: bool,
}

//=========================================================================================
// Media
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Thumbnail,
    Avatar,
    Video,
}

impl MediaKind {
    pub fn folder(&self) -> &'static str {
        match self {
            MediaKind::Thumbnail => "thumbnails",
            MediaKind::Avatar => "avatars",
            MediaKind::Video => "videos",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub kind: MediaKind,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl MediaUpload {
    /// The file extension taken from the original file name, lowercased.
    pub fn extension(&self) -> String {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| "bin".to_string())
    }
}

/// A stored asset: its public URL and the reference id used to delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StoredMedia {
    pub url: String,
    pub public_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(title: &str, subtitle: Option<&str>, category: &str, price: f64) -> Course {
        Course {
            id: Uuid::new_v4(),
            title: title.to_string(),
            subtitle: subtitle.map(str::to_string),
            description: None,
            category: category.to_string(),
            level: None,
            price: Some(price),
            thumbnail_url: None,
            is_published: true,
            creator_id: Uuid::new_v4(),
            lecture_ids: Vec::new(),
            enrolled_students: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn search_matches_subtitle_case_insensitively() {
        let query = SearchQuery {
            query: "PYTHON".to_string(),
            ..Default::default()
        };
        assert!(query.matches(&course("Data", Some("learn python fast"), "Data Science", 10.0)));
        assert!(!query.matches(&course("Data", None, "Data Science", 10.0)));
    }

    #[test]
    fn search_skips_unpublished_and_filters_categories() {
        let query = SearchQuery {
            query: String::new(),
            categories: vec!["Backend".to_string()],
            sort: None,
        };
        let mut draft = course("Rust", None, "Backend", 5.0);
        draft.is_published = false;
        assert!(!query.matches(&draft));
        assert!(query.matches(&course("Rust", None, "Backend", 5.0)));
        assert!(!query.matches(&course("Rust", None, "Frontend", 5.0)));
    }

    #[test]
    fn sort_high_puts_priciest_first() {
        let query = SearchQuery {
            sort: Some(PriceSort::High),
            ..Default::default()
        };
        let mut courses = vec![course("a", None, "x", 1.0), course("b", None, "x", 9.0)];
        query.sort(&mut courses);
        assert_eq!(courses[0].title, "b");
    }

    #[test]
    fn mark_viewed_keeps_single_entry() {
        let mut progress = CourseProgress::new(Uuid::new_v4(), Uuid::new_v4());
        let lecture = Uuid::new_v4();
        progress.mark_viewed(lecture);
        progress.mark_viewed(lecture);
        assert_eq!(progress.lecture_progress.len(), 1);
        assert!(progress.covers(&[lecture]));
        assert!(!progress.covers(&[]));
    }

    #[test]
    fn upload_extension_falls_back_to_bin() {
        let upload = MediaUpload {
            kind: MediaKind::Video,
            file_name: "clip".to_string(),
            content_type: "video/mp4".to_string(),
            data: Vec::new(),
        };
        assert_eq!(upload.extension(), "bin");
    }
}
