//! services/api/src/web/course.rs
//!
//! Course authoring, catalog and lecture endpoints under `/api/course`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use lms_core::domain::{
    Course, CourseDetail, CourseLevel, CourseSummary, CourseUpdate, Lecture, LectureUpdate,
    MediaKind, PriceSort, SearchQuery,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;
use crate::web::upload::MultipartForm;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    #[serde(default, alias = "courseTitle")]
    pub course_title: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring of title, subtitle or category.
    #[serde(default)]
    pub query: String,
    /// Comma separated category names.
    #[serde(default)]
    pub categories: String,
    /// `low` or `high`.
    #[serde(default, alias = "sortByPrice")]
    pub sort_by_price: String,
}

impl SearchParams {
    fn into_query(self) -> SearchQuery {
        SearchQuery {
            query: self.query.trim().to_string(),
            categories: self
                .categories
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
            sort: PriceSort::parse(self.sort_by_price.trim()),
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PublishParams {
    /// `true` to publish, `false` to unpublish.
    pub publish: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLectureRequest {
    #[serde(default, alias = "lectureTitle")]
    pub lecture_title: String,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct VideoInfo {
    #[serde(default, alias = "videoUrl")]
    pub video_url: Option<String>,
    #[serde(default, alias = "publicId")]
    pub public_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLectureRequest {
    #[serde(default, alias = "lectureTitle")]
    pub lecture_title: Option<String>,
    #[serde(default, alias = "videoInfo")]
    pub video_info: Option<VideoInfo>,
    #[serde(default, alias = "isPreviewFree")]
    pub is_preview_free: Option<bool>,
}

impl UpdateLectureRequest {
    fn into_update(self) -> LectureUpdate {
        let video = self.video_info.unwrap_or_default();
        LectureUpdate {
            title: non_blank(self.lecture_title),
            video_url: non_blank(video.video_url),
            public_id: non_blank(video.public_id),
            is_preview_free: self.is_preview_free,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Serialize, ToSchema)]
pub struct CourseResponse {
    pub success: bool,
    pub message: String,
    pub course: Course,
}

#[derive(Serialize, ToSchema)]
pub struct CourseListResponse {
    pub success: bool,
    pub courses: Vec<Course>,
}

#[derive(Serialize, ToSchema)]
pub struct CatalogResponse {
    pub success: bool,
    pub courses: Vec<CourseSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct CourseDetailResponse {
    pub success: bool,
    pub course: CourseDetail,
}

#[derive(Serialize, ToSchema)]
pub struct LectureResponse {
    pub success: bool,
    pub message: String,
    pub lecture: Lecture,
}

#[derive(Serialize, ToSchema)]
pub struct LectureListResponse {
    pub success: bool,
    pub lectures: Vec<Lecture>,
}

/// Reads the optional text fields of the course edit form.
fn course_update(form: &MultipartForm) -> ApiResult<CourseUpdate> {
    let level = form
        .text("courseLevel")
        .map(|raw| {
            CourseLevel::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid course level '{}'", raw)))
        })
        .transpose()?;
    let price = form
        .text("coursePrice")
        .map(|raw| match raw.parse::<f64>() {
            Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
            _ => Err(ApiError::BadRequest(format!("Invalid course price '{}'", raw))),
        })
        .transpose()?;

    Ok(CourseUpdate {
        title: form.text("courseTitle").map(str::to_string),
        subtitle: form.text("subTitle").map(str::to_string),
        description: form.text("description").map(str::to_string),
        category: form.text("category").map(str::to_string),
        level,
        price,
        thumbnail_url: None,
    })
}

//=========================================================================================
// Course Handlers
//=========================================================================================

/// Create a draft course owned by the signed-in user.
#[utoipa::path(
    post,
    path = "/api/course",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Title or category missing")
    )
)]
pub async fn create_course_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    payload: Result<Json<CreateCourseRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let course = state
        .courses
        .create_course(&req.course_title, &req.category, user_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CourseResponse {
            success: true,
            message: "Course Created Successfully".to_string(),
            course,
        }),
    ))
}

/// Courses created by the signed-in user.
#[utoipa::path(
    get,
    path = "/api/course",
    responses((status = 200, description = "Creator's courses", body = CourseListResponse))
)]
pub async fn creator_courses_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> ApiResult<Json<CourseListResponse>> {
    let courses = state.courses.list_creator_courses(user_id).await?;
    Ok(Json(CourseListResponse {
        success: true,
        courses,
    }))
}

/// Every published course with its creator.
#[utoipa::path(
    get,
    path = "/api/course/published-courses",
    responses((status = 200, description = "Published catalog", body = CatalogResponse))
)]
pub async fn published_courses_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CatalogResponse>> {
    let courses = state.courses.list_published().await?;
    Ok(Json(CatalogResponse {
        success: true,
        courses,
    }))
}

/// Search the published catalog.
#[utoipa::path(
    get,
    path = "/api/course/search",
    params(SearchParams),
    responses((status = 200, description = "Matching courses", body = CatalogResponse))
)]
pub async fn search_courses_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<CatalogResponse>> {
    let courses = state.courses.search(&params.into_query()).await?;
    Ok(Json(CatalogResponse {
        success: true,
        courses,
    }))
}

#[utoipa::path(
    get,
    path = "/api/course/{course_id}",
    params(("course_id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course with creator and lectures", body = CourseDetailResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_course_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Json<CourseDetailResponse>> {
    let course = state.courses.course_detail(course_id).await?;
    Ok(Json(CourseDetailResponse {
        success: true,
        course,
    }))
}

/// Partially update a course.
///
/// Multipart fields, all optional: `courseTitle`, `subTitle`, `description`,
/// `category`, `courseLevel`, `coursePrice` and the file `courseThumbnail`.
#[utoipa::path(
    put,
    path = "/api/course/{course_id}",
    params(("course_id" = Uuid, Path, description = "Course id")),
    request_body(content_type = "multipart/form-data", description = "Course fields and optional thumbnail."),
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn update_course_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<CourseResponse>> {
    let mut form = MultipartForm::read(&mut multipart).await?;
    let update = course_update(&form)?;
    let thumbnail = form
        .take_file("courseThumbnail")
        .map(|file| file.into_media(MediaKind::Thumbnail));

    let course = state
        .courses
        .update_course(course_id, update, thumbnail)
        .await?;
    Ok(Json(CourseResponse {
        success: true,
        message: "Course Updated Successfully".to_string(),
        course,
    }))
}

/// Publish or unpublish a course.
#[utoipa::path(
    patch,
    path = "/api/course/{course_id}",
    params(("course_id" = Uuid, Path, description = "Course id"), PublishParams),
    responses(
        (status = 200, description = "Publish state changed", body = MessageResponse),
        (status = 400, description = "Bad flag or no lectures"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn toggle_publish_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    Query(params): Query<PublishParams>,
) -> ApiResult<Json<MessageResponse>> {
    let publish = match params.publish.as_deref() {
        Some("true") => true,
        Some("false") => false,
        _ => {
            return Err(ApiError::BadRequest(
                "publish must be true or false".to_string(),
            ))
        }
    };
    state.courses.toggle_publish(course_id, publish).await?;
    let status = if publish { "Published" } else { "Unpublished" };
    Ok(Json(MessageResponse::ok(format!("Course is {}", status))))
}

//=========================================================================================
// Lecture Handlers
//=========================================================================================

#[utoipa::path(
    post,
    path = "/api/course/{course_id}/lecture",
    params(("course_id" = Uuid, Path, description = "Course id")),
    request_body = CreateLectureRequest,
    responses(
        (status = 201, description = "Lecture created", body = LectureResponse),
        (status = 400, description = "Title missing"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn create_lecture_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    payload: Result<Json<CreateLectureRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let lecture = state
        .courses
        .create_lecture(&req.lecture_title, course_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(LectureResponse {
            success: true,
            message: "Lecture Created Successfully".to_string(),
            lecture,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/course/{course_id}/lecture",
    params(("course_id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Lectures in course order", body = LectureListResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn course_lectures_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Json<LectureListResponse>> {
    let lectures = state.courses.get_lectures(course_id).await?;
    Ok(Json(LectureListResponse {
        success: true,
        lectures,
    }))
}

#[utoipa::path(
    post,
    path = "/api/course/{course_id}/lecture/{lecture_id}",
    params(
        ("course_id" = Uuid, Path, description = "Course id"),
        ("lecture_id" = Uuid, Path, description = "Lecture id")
    ),
    request_body = UpdateLectureRequest,
    responses(
        (status = 200, description = "Lecture updated", body = LectureResponse),
        (status = 404, description = "Lecture not found")
    )
)]
pub async fn update_lecture_handler(
    State(state): State<Arc<AppState>>,
    Path((course_id, lecture_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<UpdateLectureRequest>, JsonRejection>,
) -> ApiResult<Json<LectureResponse>> {
    let Json(req) = payload?;
    let lecture = state
        .courses
        .update_lecture(course_id, lecture_id, req.into_update())
        .await?;
    Ok(Json(LectureResponse {
        success: true,
        message: "Lecture Updated Successfully".to_string(),
        lecture,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/course/{course_id}/lecture/{lecture_id}",
    params(
        ("course_id" = Uuid, Path, description = "Course id"),
        ("lecture_id" = Uuid, Path, description = "Lecture id")
    ),
    responses(
        (status = 200, description = "Lecture removed", body = MessageResponse),
        (status = 404, description = "Lecture not found")
    )
)]
pub async fn remove_lecture_handler(
    State(state): State<Arc<AppState>>,
    Path((course_id, lecture_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    state.courses.remove_lecture(lecture_id, course_id).await?;
    Ok(Json(MessageResponse::ok("Lecture Deleted Successfully")))
}

#[utoipa::path(
    get,
    path = "/api/course/lecture/{lecture_id}",
    params(("lecture_id" = Uuid, Path, description = "Lecture id")),
    responses(
        (status = 200, description = "Lecture", body = LectureResponse),
        (status = 404, description = "Lecture not found")
    )
)]
pub async fn get_lecture_handler(
    State(state): State<Arc<AppState>>,
    Path(lecture_id): Path<Uuid>,
) -> ApiResult<Json<LectureResponse>> {
    let lecture = state.courses.get_lecture(lecture_id).await?;
    Ok(Json(LectureResponse {
        success: true,
        message: "Lecture fetched successfully".to_string(),
        lecture,
    }))
}
