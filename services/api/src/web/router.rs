//! services/api/src/web/router.rs
//!
//! Assembles the full axum application: public and protected API routes, the
//! Swagger UI, the optional client bundle and the tower-http layers.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ConfigError;
use crate::error::ApiError;
use crate::web::{
    auth, course, media, middleware::require_auth, progress, purchase, rest, state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Result<Router, ApiError> {
    let config = state.config.clone();

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/api/user/register", post(auth::register_handler))
        .route("/api/user/login", post(auth::login_handler))
        .route("/api/user/logout", get(auth::logout_handler))
        .route(
            "/api/course/published-courses",
            get(course::published_courses_handler),
        )
        .route("/api/purchase/webhook", post(purchase::webhook_handler))
        .route_layer(TimeoutLayer::new(config.http_timeout));

    // Multipart uploads stream large bodies to the media store and get the longer limit.
    let upload_routes = Router::new()
        .route("/api/user/profile/update", put(auth::update_profile_handler))
        .route("/api/course/{course_id}", put(course::update_course_handler))
        .route("/api/media/upload-video", post(media::upload_video_handler))
        .route_layer(TimeoutLayer::new(config.upload_timeout));

    let standard_routes = Router::new()
        .route("/api/user/profile", get(auth::profile_handler))
        .route(
            "/api/course",
            post(course::create_course_handler).get(course::creator_courses_handler),
        )
        .route("/api/course/search", get(course::search_courses_handler))
        .route(
            "/api/course/lecture/{lecture_id}",
            get(course::get_lecture_handler),
        )
        .route(
            "/api/course/{course_id}",
            get(course::get_course_handler).patch(course::toggle_publish_handler),
        )
        .route(
            "/api/course/{course_id}/lecture",
            post(course::create_lecture_handler).get(course::course_lectures_handler),
        )
        .route(
            "/api/course/{course_id}/lecture/{lecture_id}",
            post(course::update_lecture_handler).delete(course::remove_lecture_handler),
        )
        .route("/api/purchase", get(purchase::purchased_courses_handler))
        .route(
            "/api/purchase/checkout/create-checkout-session",
            post(purchase::create_checkout_session_handler),
        )
        .route(
            "/api/purchase/course/{course_id}/detail-with-status",
            get(purchase::course_detail_with_status_handler),
        )
        .route("/api/progress/{course_id}", get(progress::get_progress_handler))
        .route(
            "/api/progress/{course_id}/lecture/{lecture_id}/view",
            post(progress::view_lecture_handler),
        )
        .route(
            "/api/progress/{course_id}/complete",
            post(progress::mark_complete_handler),
        )
        .route(
            "/api/progress/{course_id}/incomplete",
            post(progress::mark_incomplete_handler),
        )
        .route_layer(TimeoutLayer::new(config.http_timeout));

    // Protected routes (auth required)
    let protected_routes = standard_routes
        .merge(upload_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state);

    // Merge the API router with the Swagger UI router for a complete application.
    let mut app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", rest::ApiDoc::openapi()));

    // Everything else falls through to the client bundle, with index.html for client-side routes.
    if let Some(dist) = &config.client_dist_path {
        let index = ServeFile::new(dist.join("index.html"));
        app = app.fallback_service(ServeDir::new(dist).not_found_service(index));
    }

    Ok(app.layer(cors).layer(TraceLayer::new_for_http()))
}
