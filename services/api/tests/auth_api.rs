mod common;

use axum::http::{header, Method, StatusCode};
use common::{Multipart, TestApp};
use serde_json::json;

#[tokio::test]
async fn login_sets_session_cookie() {
    let app = TestApp::new();
    app.json(
        Method::POST,
        "/api/user/register",
        Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "pw-123456" })),
        None,
    )
    .await;

    let login = app
        .json(
            Method::POST,
            "/api/user/login",
            Some(json!({ "email": "ada@example.com", "password": "pw-123456" })),
            None,
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["message"], "Welcome back Ada");
    assert!(login.body["user"].get("hashed_password").is_none());

    let cookie = login.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=None"));
    assert!(cookie.contains("Max-Age=86400"));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = TestApp::new();
    app.login_as("Ada", "ada@example.com").await;

    let again = app
        .json(
            Method::POST,
            "/api/user/register",
            Some(json!({ "name": "Ada 2", "email": "ada@example.com", "password": "other" })),
            None,
        )
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["success"], false);
    assert_eq!(again.body["message"], "User already exist with this email.");
}

#[tokio::test]
async fn register_requires_every_field() {
    let app = TestApp::new();
    let response = app
        .json(
            Method::POST,
            "/api/user/register",
            Some(json!({ "email": "ada@example.com" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "All fields are required.");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.login_as("Ada", "ada@example.com").await;

    let unknown = app
        .json(
            Method::POST,
            "/api/user/login",
            Some(json!({ "email": "nobody@example.com", "password": "s3cret-pass" })),
            None,
        )
        .await;
    let wrong = app
        .json(
            Method::POST,
            "/api/user/login",
            Some(json!({ "email": "ada@example.com", "password": "nope" })),
            None,
        )
        .await;

    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown.status, wrong.status);
    assert_eq!(unknown.body, wrong.body);
    assert_eq!(wrong.body["message"], "Incorrect email or password");
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = TestApp::new();

    let missing = app.get("/api/user/profile", None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["success"], false);

    let forged = app.get("/api/user/profile", Some("token=not.a.jwt")).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    let (cookie, user_id) = app.login_as("Ada", "ada@example.com").await;
    let profile = app.get("/api/user/profile", Some(&cookie)).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["user"]["id"], user_id.to_string());
    assert_eq!(profile.body["user"]["courses"], json!([]));
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = TestApp::new();
    let response = app.get("/api/user/logout", None).await;
    assert_eq!(response.status, StatusCode::OK);
    let cookie = response.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn profile_update_replaces_the_photo() {
    let app = TestApp::new();
    let (cookie, _) = app.login_as("Ada", "ada@example.com").await;

    let first = app
        .multipart(
            Method::PUT,
            "/api/user/profile/update",
            Multipart::new()
                .text("name", "Ada")
                .file("profilePhoto", "me.png", "image/png", b"first"),
            &cookie,
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app
        .multipart(
            Method::PUT,
            "/api/user/profile/update",
            Multipart::new()
                .text("name", "Ada Lovelace")
                .file("profilePhoto", "me.png", "image/png", b"second"),
            &cookie,
        )
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["user"]["name"], "Ada Lovelace");
    let photo = second.body["user"]["photo_url"].as_str().unwrap();
    assert!(photo.starts_with("memory://media/avatars/"));
    assert_eq!(app.media.len(), 1);

    let missing_photo = app
        .multipart(
            Method::PUT,
            "/api/user/profile/update",
            Multipart::new().text("name", "Ada"),
            &cookie,
        )
        .await;
    assert_eq!(missing_photo.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn emails_are_matched_case_insensitively() {
    let app = TestApp::new();
    let registered = app
        .json(
            Method::POST,
            "/api/user/register",
            Some(json!({ "name": "Ada", "email": " Ada@Example.com ", "password": "pw-123456" })),
            None,
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED);
    assert_eq!(registered.body["user"]["email"], "ada@example.com");

    let duplicate = app
        .json(
            Method::POST,
            "/api/user/register",
            Some(json!({ "name": "Ada 2", "email": "ada@example.com", "password": "other" })),
            None,
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.body["message"], "User already exist with this email.");

    let login = app
        .json(
            Method::POST,
            "/api/user/login",
            Some(json!({ "email": "ADA@EXAMPLE.COM", "password": "pw-123456" })),
            None,
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}
