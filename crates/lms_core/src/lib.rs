pub mod domain;
pub mod memory;
pub mod ports;
pub mod service;

pub use domain::{
    Course, CourseDetail, CourseLevel, CourseProgress, CourseSummary, CourseUpdate, Lecture,
    LectureProgress, LectureUpdate, MediaKind, MediaUpload, PriceSort, ProgressView, Purchase,
    PurchaseStatus, PurchaseWithCourse, Role, SearchQuery, StoredMedia, User, UserCredentials,
    UserProfile, WebhookEvent,
};
pub use ports::{DatabaseService, MediaService, PaymentService, PortError, PortResult};
pub use service::{CourseService, ProfileService, ProgressService, PurchaseService};
