//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Reference lists (a course's lectures, a user's enrolled courses) are stored
//! as `UUID[]` columns and mutated with guarded `array_append`/`array_remove`
//! so that every list behaves as an ordered set.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lms_core::domain::{
    Course, CourseLevel, CourseProgress, CourseUpdate, Lecture, LectureProgress, LectureUpdate,
    NewCourse, NewPurchase, NewUser, PriceSort, Purchase, PurchaseStatus, Role, SearchQuery, User,
    UserCredentials,
};
use lms_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

const USER_COLUMNS: &str =
    "id, name, email, hashed_password, role, photo_url, enrolled_courses, created_at";
const COURSE_COLUMNS: &str = "id, title, subtitle, description, category, level, price, \
     thumbnail_url, is_published, creator_id, lecture_ids, enrolled_students, created_at, updated_at";
const LECTURE_COLUMNS: &str = "id, title, video_url, public_id, is_preview_free, created_at";
const PURCHASE_COLUMNS: &str = "id, course_id, user_id, amount, status, payment_id, created_at";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}

fn not_found(entity: &str, id: impl std::fmt::Display) -> PortError {
    PortError::NotFound(format!("{} {} not found", entity, id))
}

/// Escapes `LIKE` metacharacters so user input is matched literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    hashed_password: String,
    role: String,
    photo_url: Option<String>,
    enrolled_courses: Vec<Uuid>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_credentials(self) -> PortResult<UserCredentials> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| PortError::Unexpected(format!("unknown role '{}'", self.role)))?;
        Ok(UserCredentials {
            user: User {
                id: self.id,
                name: self.name,
                email: self.email,
                role,
                photo_url: self.photo_url,
                enrolled_courses: self.enrolled_courses,
                created_at: self.created_at,
            },
            hashed_password: self.hashed_password,
        })
    }

    fn to_domain(self) -> PortResult<User> {
        Ok(self.to_credentials()?.user)
    }
}

#[derive(FromRow)]
struct CourseRecord {
    id: Uuid,
    title: String,
    subtitle: Option<String>,
    description: Option<String>,
    category: String,
    level: Option<String>,
    price: Option<f64>,
    thumbnail_url: Option<String>,
    is_published: bool,
    creator_id: Uuid,
    lecture_ids: Vec<Uuid>,
    enrolled_students: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl CourseRecord {
    fn to_domain(self) -> PortResult<Course> {
        let level = match self.level.as_deref() {
            Some(raw) => Some(
                CourseLevel::parse(raw)
                    .ok_or_else(|| PortError::Unexpected(format!("unknown level '{}'", raw)))?,
            ),
            None => None,
        };
        Ok(Course {
            id: self.id,
            title: self.title,
            subtitle: self.subtitle,
            description: self.description,
            category: self.category,
            level,
            price: self.price,
            thumbnail_url: self.thumbnail_url,
            is_published: self.is_published,
            creator_id: self.creator_id,
            lecture_ids: self.lecture_ids,
            enrolled_students: self.enrolled_students,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn courses_to_domain(records: Vec<CourseRecord>) -> PortResult<Vec<Course>> {
    records.into_iter().map(CourseRecord::to_domain).collect()
}

#[derive(FromRow)]
struct LectureRecord {
    id: Uuid,
    title: String,
    video_url: Option<String>,
    public_id: Option<String>,
    is_preview_free: bool,
    created_at: DateTime<Utc>,
}
impl LectureRecord {
    fn to_domain(self) -> Lecture {
        Lecture {
            id: self.id,
            title: self.title,
            video_url: self.video_url,
            public_id: self.public_id,
            is_preview_free: self.is_preview_free,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct PurchaseRecord {
    id: Uuid,
    course_id: Uuid,
    user_id: Uuid,
    amount: f64,
    status: String,
    payment_id: Option<String>,
    created_at: DateTime<Utc>,
}
impl PurchaseRecord {
    fn to_domain(self) -> PortResult<Purchase> {
        let status = PurchaseStatus::parse(&self.status)
            .ok_or_else(|| PortError::Unexpected(format!("unknown status '{}'", self.status)))?;
        Ok(Purchase {
            id: self.id,
            course_id: self.course_id,
            user_id: self.user_id,
            amount: self.amount,
            status,
            payment_id: self.payment_id,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ProgressRecord {
    completed: bool,
}

#[derive(FromRow)]
struct LectureProgressRecord {
    lecture_id: Uuid,
    viewed: bool,
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, hashed_password) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&new_user.hashed_password)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortError::Conflict("User already exist with this email.".to_string())
                } else {
                    unexpected(e)
                }
            })?;
        record.to_domain()
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| not_found("User", email))?
            .to_credentials()
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| not_found("User", user_id))?
            .to_domain()
    }

    async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> PortResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let records = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(UserRecord::to_domain).collect()
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        name: &str,
        photo_url: &str,
    ) -> PortResult<User> {
        let sql = format!(
            "UPDATE users SET name = $2, photo_url = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .bind(name)
            .bind(photo_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| not_found("User", user_id))?
            .to_domain()
    }

    async fn add_enrolled_course(&self, user_id: Uuid, course_id: Uuid) -> PortResult<()> {
        sqlx::query(
            "UPDATE users SET enrolled_courses = array_append(enrolled_courses, $2) \
             WHERE id = $1 AND NOT ($2 = ANY(enrolled_courses))",
        )
        .bind(user_id)
        .bind(course_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn create_course(&self, new_course: NewCourse) -> PortResult<Course> {
        let sql = format!(
            "INSERT INTO courses (id, title, category, creator_id) VALUES ($1, $2, $3, $4) \
             RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_course.title)
            .bind(&new_course.category)
            .bind(new_course.creator_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?
            .to_domain()
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");
        sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| not_found("Course", course_id))?
            .to_domain()
    }

    async fn get_courses_by_ids(&self, course_ids: &[Uuid]) -> PortResult<Vec<Course>> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = ANY($1) \
             ORDER BY array_position($1, id)"
        );
        let records = sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(course_ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        courses_to_domain(records)
    }

    async fn update_course(&self, course_id: Uuid, update: &CourseUpdate) -> PortResult<Course> {
        let sql = format!(
            "UPDATE courses SET \
                title = COALESCE($2, title), \
                subtitle = COALESCE($3, subtitle), \
                description = COALESCE($4, description), \
                category = COALESCE($5, category), \
                level = COALESCE($6, level), \
                price = COALESCE($7, price), \
                thumbnail_url = COALESCE($8, thumbnail_url), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(course_id)
            .bind(update.title.as_deref())
            .bind(update.subtitle.as_deref())
            .bind(update.description.as_deref())
            .bind(update.category.as_deref())
            .bind(update.level.map(|l| l.as_str()))
            .bind(update.price)
            .bind(update.thumbnail_url.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| not_found("Course", course_id))?
            .to_domain()
    }

    async fn set_course_published(&self, course_id: Uuid, published: bool) -> PortResult<Course> {
        let sql = format!(
            "UPDATE courses SET is_published = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(course_id)
            .bind(published)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| not_found("Course", course_id))?
            .to_domain()
    }

    async fn list_courses_by_creator(&self, creator_id: Uuid) -> PortResult<Vec<Course>> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE creator_id = $1 ORDER BY created_at ASC"
        );
        let records = sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(creator_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        courses_to_domain(records)
    }

    async fn list_published_courses(&self) -> PortResult<Vec<Course>> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE is_published = TRUE ORDER BY created_at ASC"
        );
        let records = sqlx::query_as::<_, CourseRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        courses_to_domain(records)
    }

    async fn search_courses(&self, query: &SearchQuery) -> PortResult<Vec<Course>> {
        let order = match query.sort {
            Some(PriceSort::Low) => "COALESCE(price, 0) ASC, created_at ASC",
            Some(PriceSort::High) => "COALESCE(price, 0) DESC, created_at ASC",
            None => "created_at ASC",
        };
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses \
             WHERE is_published = TRUE \
               AND (title ILIKE $1 OR subtitle ILIKE $1 OR category ILIKE $1) \
               AND (cardinality($2::text[]) = 0 OR category = ANY($2)) \
             ORDER BY {order}"
        );
        let records = sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(like_pattern(&query.query))
            .bind(query.categories.clone())
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        courses_to_domain(records)
    }

    async fn append_course_lecture(&self, course_id: Uuid, lecture_id: Uuid) -> PortResult<()> {
        sqlx::query(
            "UPDATE courses SET lecture_ids = array_append(lecture_ids, $2), updated_at = NOW() \
             WHERE id = $1 AND NOT ($2 = ANY(lecture_ids))",
        )
        .bind(course_id)
        .bind(lecture_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn courses_listing_lecture(&self, lecture_id: Uuid) -> PortResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT id FROM courses WHERE $1 = ANY(lecture_ids)")
            .bind(lecture_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn remove_lecture_from_courses(&self, lecture_id: Uuid) -> PortResult<()> {
        sqlx::query(
            "UPDATE courses SET lecture_ids = array_remove(lecture_ids, $1), updated_at = NOW() \
             WHERE $1 = ANY(lecture_ids)",
        )
        .bind(lecture_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn add_enrolled_student(&self, course_id: Uuid, user_id: Uuid) -> PortResult<()> {
        sqlx::query(
            "UPDATE courses SET enrolled_students = array_append(enrolled_students, $2) \
             WHERE id = $1 AND NOT ($2 = ANY(enrolled_students))",
        )
        .bind(course_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn create_lecture(&self, title: &str) -> PortResult<Lecture> {
        let sql = format!(
            "INSERT INTO lectures (id, title) VALUES ($1, $2) RETURNING {LECTURE_COLUMNS}"
        );
        let record = sqlx::query_as::<_, LectureRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(title)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_lecture(&self, lecture_id: Uuid) -> PortResult<Lecture> {
        let sql = format!("SELECT {LECTURE_COLUMNS} FROM lectures WHERE id = $1");
        let record = sqlx::query_as::<_, LectureRecord>(&sql)
            .bind(lecture_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| not_found("Lecture", lecture_id))?;
        Ok(record.to_domain())
    }

    async fn get_lectures_by_ids(&self, lecture_ids: &[Uuid]) -> PortResult<Vec<Lecture>> {
        let sql = format!(
            "SELECT {LECTURE_COLUMNS} FROM lectures WHERE id = ANY($1) \
             ORDER BY array_position($1, id)"
        );
        let records = sqlx::query_as::<_, LectureRecord>(&sql)
            .bind(lecture_ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_lecture(&self, lecture_id: Uuid, update: &LectureUpdate) -> PortResult<Lecture> {
        let sql = format!(
            "UPDATE lectures SET \
                title = COALESCE($2, title), \
                video_url = COALESCE($3, video_url), \
                public_id = COALESCE($4, public_id), \
                is_preview_free = COALESCE($5, is_preview_free) \
             WHERE id = $1 RETURNING {LECTURE_COLUMNS}"
        );
        let record = sqlx::query_as::<_, LectureRecord>(&sql)
            .bind(lecture_id)
            .bind(update.title.as_deref())
            .bind(update.video_url.as_deref())
            .bind(update.public_id.as_deref())
            .bind(update.is_preview_free)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| not_found("Lecture", lecture_id))?;
        Ok(record.to_domain())
    }

    async fn delete_lecture(&self, lecture_id: Uuid) -> PortResult<Lecture> {
        let sql = format!("DELETE FROM lectures WHERE id = $1 RETURNING {LECTURE_COLUMNS}");
        let record = sqlx::query_as::<_, LectureRecord>(&sql)
            .bind(lecture_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| not_found("Lecture", lecture_id))?;
        Ok(record.to_domain())
    }

    async fn set_lectures_preview_free(&self, lecture_ids: &[Uuid]) -> PortResult<()> {
        sqlx::query("UPDATE lectures SET is_preview_free = TRUE WHERE id = ANY($1)")
            .bind(lecture_ids.to_vec())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_purchase(&self, new_purchase: NewPurchase) -> PortResult<Purchase> {
        let sql = format!(
            "INSERT INTO purchases (id, course_id, user_id, amount, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PURCHASE_COLUMNS}"
        );
        sqlx::query_as::<_, PurchaseRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(new_purchase.course_id)
            .bind(new_purchase.user_id)
            .bind(new_purchase.amount)
            .bind(PurchaseStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?
            .to_domain()
    }

    async fn set_purchase_payment_id(&self, purchase_id: Uuid, payment_id: &str) -> PortResult<()> {
        let result = sqlx::query("UPDATE purchases SET payment_id = $2 WHERE id = $1")
            .bind(purchase_id)
            .bind(payment_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(not_found("Purchase", purchase_id));
        }
        Ok(())
    }

    async fn get_purchase_by_payment_id(&self, payment_id: &str) -> PortResult<Purchase> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE payment_id = $1");
        sqlx::query_as::<_, PurchaseRecord>(&sql)
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| not_found("Purchase for session", payment_id))?
            .to_domain()
    }

    async fn complete_purchase(&self, purchase_id: Uuid, amount: f64) -> PortResult<bool> {
        let result = sqlx::query(
            "UPDATE purchases SET status = $3, amount = $2 WHERE id = $1 AND status <> $3",
        )
        .bind(purchase_id)
        .bind(amount)
        .bind(PurchaseStatus::Completed.as_str())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM purchases WHERE id = $1)")
            .bind(purchase_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        if exists {
            Ok(false)
        } else {
            Err(not_found("Purchase", purchase_id))
        }
    }

    async fn has_completed_purchase(&self, user_id: Uuid, course_id: Uuid) -> PortResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM purchases \
             WHERE user_id = $1 AND course_id = $2 AND status = $3)",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(PurchaseStatus::Completed.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn list_completed_purchases(&self) -> PortResult<Vec<Purchase>> {
        let sql = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE status = $1 ORDER BY created_at ASC"
        );
        let records = sqlx::query_as::<_, PurchaseRecord>(&sql)
            .bind(PurchaseStatus::Completed.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(PurchaseRecord::to_domain).collect()
    }

    async fn get_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<CourseProgress>> {
        let Some(record) = sqlx::query_as::<_, ProgressRecord>(
            "SELECT completed FROM course_progress WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        else {
            return Ok(None);
        };

        let entries = sqlx::query_as::<_, LectureProgressRecord>(
            "SELECT lecture_id, viewed FROM lecture_progress \
             WHERE user_id = $1 AND course_id = $2 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(Some(CourseProgress {
            user_id,
            course_id,
            completed: record.completed,
            lecture_progress: entries
                .into_iter()
                .map(|e| LectureProgress {
                    lecture_id: e.lecture_id,
                    viewed: e.viewed,
                })
                .collect(),
        }))
    }

    async fn save_progress(&self, progress: &CourseProgress) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query(
            "INSERT INTO course_progress (user_id, course_id, completed) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, course_id) DO UPDATE SET completed = EXCLUDED.completed",
        )
        .bind(progress.user_id)
        .bind(progress.course_id)
        .bind(progress.completed)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        for entry in &progress.lecture_progress {
            sqlx::query(
                "INSERT INTO lecture_progress (user_id, course_id, lecture_id, viewed) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (user_id, course_id, lecture_id) DO UPDATE SET viewed = EXCLUDED.viewed",
            )
            .bind(progress.user_id)
            .bind(progress.course_id)
            .bind(entry.lecture_id)
            .bind(entry.viewed)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)
    }
}
