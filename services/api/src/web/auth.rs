//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login, logout and the signed-in
//! user's profile, plus the password hashing and session token helpers they use.
//!
//! Sessions are stateless: an HS256 JWT carried in the `token` cookie.

use std::sync::{Arc, LazyLock};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lms_core::domain::{MediaKind, NewUser, User, UserProfile};
use lms_core::ports::PortError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;
use crate::web::upload::MultipartForm;

/// Name of the cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";

const CLEARED_COOKIE: &str = "token=; HttpOnly; Secure; SameSite=None; Path=/; Max-Age=0";
const BAD_CREDENTIALS: &str = "Incorrect email or password";

/// Checked against when the email is unknown, so both login failures cost one argon2 run.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$I+6AFTraUvvRiM7726RXG5mXmdrjpsEB0W8U1Nq9z1Q";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

//=========================================================================================
// Passwords
//=========================================================================================

/// Hash a plaintext password using Argon2id with a random salt (PHC string).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Returns `Ok(false)` on a mismatch; `Err` only for an unparseable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

//=========================================================================================
// Session Tokens
//=========================================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The user's id.
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(
    user_id: Uuid,
    secret: &str,
    ttl_days: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + Duration::days(ttl_days)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Checks the signature and expiry and returns the claims.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn session_cookie(token: &str, ttl_days: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=None; Path=/; Max-Age={}",
        TOKEN_COOKIE,
        token,
        Duration::days(ttl_days).num_seconds()
    )
}

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
}

#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserProfile,
}

fn all_fields_required() -> ApiError {
    PortError::Validation("All fields are required.".to_string()).into()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a new account.
#[utoipa::path(
    post,
    path = "/api/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Missing fields or email already registered")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();
    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(all_fields_required());
    }
    if !EMAIL_RE.is_match(&email) {
        return Err(PortError::Validation("Invalid email address".to_string()).into());
    }

    let hashed_password = hash_password(&req.password).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        ApiError::Internal("Failed to hash password".to_string())
    })?;
    let user = state
        .db
        .create_user(NewUser {
            name: name.to_string(),
            email,
            hashed_password,
        })
        .await?;
    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            message: "Account created successfully.".to_string(),
            user,
        }),
    ))
}

/// Log in with email and password; sets the session cookie.
#[utoipa::path(
    post,
    path = "/api/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = UserResponse),
        (status = 400, description = "Missing fields or incorrect credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(all_fields_required());
    }

    // Unknown email and wrong password must be indistinguishable.
    let credentials = match state.db.get_user_by_email(&email).await {
        Ok(credentials) => credentials,
        Err(PortError::NotFound(_)) => {
            let _ = verify_password(&req.password, DUMMY_PASSWORD_HASH);
            return Err(PortError::Auth(BAD_CREDENTIALS.to_string()).into());
        }
        Err(e) => return Err(e.into()),
    };
    let valid = verify_password(&req.password, &credentials.hashed_password).map_err(|e| {
        error!("Failed to parse stored password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;
    if !valid {
        return Err(PortError::Auth(BAD_CREDENTIALS.to_string()).into());
    }

    let user = credentials.user;
    let ttl_days = state.config.token_ttl_days;
    let token = issue_token(user.id, &state.config.jwt_secret, ttl_days).map_err(|e| {
        error!("Failed to sign session token: {:?}", e);
        ApiError::Internal("Failed to create session".to_string())
    })?;
    info!(user_id = %user.id, "User logged in");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token, ttl_days))],
        Json(UserResponse {
            success: true,
            message: format!("Welcome back {}", user.name),
            user,
        }),
    ))
}

/// Clear the session cookie.
#[utoipa::path(
    get,
    path = "/api/user/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, CLEARED_COOKIE.to_string())],
        Json(MessageResponse::ok("Logged Out Successfully")),
    )
}

/// The signed-in user with their enrolled courses.
#[utoipa::path(
    get,
    path = "/api/user/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found")
    )
)]
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state.profiles.get_profile(user_id).await?;
    Ok(Json(ProfileResponse {
        success: true,
        user,
    }))
}

/// Replace the user's name and photo.
///
/// Multipart fields: `name` and the file `profilePhoto`, both required.
#[utoipa::path(
    put,
    path = "/api/user/profile/update",
    request_body(content_type = "multipart/form-data", description = "`name` and `profilePhoto`."),
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Missing name or photo")
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<UserResponse>> {
    let mut form = MultipartForm::read(&mut multipart).await?;
    let photo = form
        .take_file("profilePhoto")
        .map(|file| file.into_media(MediaKind::Avatar));
    let name = form.text("name").unwrap_or("");

    let user = state.profiles.update_profile(user_id, name, photo).await?;
    Ok(Json(UserResponse {
        success: true,
        message: "User Updated Successfully".to_string(),
        user,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-horse", &hash).unwrap());
        assert!(!verify_password("wrong-horse", &hash).unwrap());
        assert!(verify_password("x", "not-a-phc-string").is_err());
    }

    #[test]
    fn dummy_hash_is_a_real_argon2_hash() {
        assert_eq!(verify_password("s3cret-pass", DUMMY_PASSWORD_HASH), Ok(false));
    }

    #[test]
    fn token_carries_the_user_id() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "secret", 1).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 86_400);
        assert!(validate_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: now - 600,
            exp: now - 300,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(validate_token(&token, "secret").is_err());
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc", 1);
        assert_eq!(
            cookie,
            "token=abc; HttpOnly; Secure; SameSite=None; Path=/; Max-Age=86400"
        );
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(EMAIL_RE.is_match("ada@example.com"));
        assert!(!EMAIL_RE.is_match("ada@example"));
        assert!(!EMAIL_RE.is_match("ada example@x.com"));
    }
}
