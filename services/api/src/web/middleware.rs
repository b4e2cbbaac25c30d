//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use lms_core::ports::PortError;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::auth::{validate_token, TOKEN_COOKIE};
use crate::web::state::AppState;

/// Middleware that validates the session cookie and extracts the user id.
///
/// If valid, inserts the user id (`Uuid`) into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract cookie header
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or(PortError::Unauthorized)?;

    // 2. Parse the token from the cookie
    let prefix = format!("{}=", TOKEN_COOKIE);
    let token = cookie_header
        .split(';')
        .find_map(|c| c.trim().strip_prefix(prefix.as_str()))
        .filter(|t| !t.is_empty())
        .ok_or(PortError::Unauthorized)?;

    // 3. Validate signature and expiry
    let claims = validate_token(token, &state.config.jwt_secret).map_err(|e| {
        debug!("Rejected session token: {}", e);
        PortError::Unauthorized
    })?;

    // 4. Insert user_id into request extensions
    req.extensions_mut().insert(claims.sub);

    // 5. Continue to the handler
    Ok(next.run(req).await)
}
