mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;
use uuid::Uuid;

async fn course_with_two_lectures(app: &TestApp) -> (String, Uuid, Uuid, Uuid) {
    let (cookie, _) = app.login_as("Ada", "ada@example.com").await;
    let course_id = app.create_course(&cookie, "Compilers", "Systems").await;
    let first = app.add_lecture(&cookie, course_id, "Lexing").await;
    let second = app.add_lecture(&cookie, course_id, "Parsing").await;
    (cookie, course_id, first, second)
}

async fn view(app: &TestApp, cookie: &str, course_id: Uuid, lecture_id: Uuid) -> StatusCode {
    app.json(
        Method::POST,
        &format!("/api/progress/{}/lecture/{}/view", course_id, lecture_id),
        None,
        Some(cookie),
    )
    .await
    .status
}

#[tokio::test]
async fn fresh_progress_is_empty() {
    let app = TestApp::new();
    let (cookie, course_id, _, _) = course_with_two_lectures(&app).await;

    let progress = app.get(&format!("/api/progress/{}", course_id), Some(&cookie)).await;
    assert_eq!(progress.status, StatusCode::OK);
    assert_eq!(progress.body["data"]["progress"], json!([]));
    assert_eq!(progress.body["data"]["completed"], false);
    assert_eq!(progress.body["data"]["course_details"]["title"], "Compilers");

    let missing = app
        .get(&format!("/api/progress/{}", Uuid::new_v4()), Some(&cookie))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn viewing_every_lecture_completes_the_course() {
    let app = TestApp::new();
    let (cookie, course_id, first, second) = course_with_two_lectures(&app).await;
    let uri = format!("/api/progress/{}", course_id);

    assert_eq!(view(&app, &cookie, course_id, first).await, StatusCode::OK);
    assert_eq!(view(&app, &cookie, course_id, first).await, StatusCode::OK);
    let partial = app.get(&uri, Some(&cookie)).await;
    assert_eq!(partial.body["data"]["progress"].as_array().unwrap().len(), 1);
    assert_eq!(partial.body["data"]["completed"], false);

    assert_eq!(view(&app, &cookie, course_id, second).await, StatusCode::OK);
    let done = app.get(&uri, Some(&cookie)).await;
    assert_eq!(done.body["data"]["progress"].as_array().unwrap().len(), 2);
    assert_eq!(done.body["data"]["completed"], true);
}

#[tokio::test]
async fn complete_and_incomplete_keep_lecture_entries() {
    let app = TestApp::new();
    let (cookie, course_id, first, _) = course_with_two_lectures(&app).await;
    let uri = format!("/api/progress/{}", course_id);
    view(&app, &cookie, course_id, first).await;

    let complete = app
        .json(Method::POST, &format!("{}/complete", uri), None, Some(&cookie))
        .await;
    assert_eq!(complete.status, StatusCode::OK);
    assert_eq!(app.get(&uri, Some(&cookie)).await.body["data"]["completed"], true);

    let incomplete = app
        .json(Method::POST, &format!("{}/incomplete", uri), None, Some(&cookie))
        .await;
    assert_eq!(incomplete.status, StatusCode::OK);
    let after = app.get(&uri, Some(&cookie)).await;
    assert_eq!(after.body["data"]["completed"], false);
    assert_eq!(
        after.body["data"]["progress"],
        json!([{ "lecture_id": first.to_string(), "viewed": true }])
    );
}

#[tokio::test]
async fn viewing_a_foreign_lecture_is_not_found() {
    let app = TestApp::new();
    let (cookie, course_id, _, _) = course_with_two_lectures(&app).await;
    let other_course = app.create_course(&cookie, "Databases", "Systems").await;
    let foreign = app.add_lecture(&cookie, other_course, "B-Trees").await;

    assert_eq!(
        view(&app, &cookie, course_id, foreign).await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn progress_is_per_user() {
    let app = TestApp::new();
    let (cookie, course_id, first, second) = course_with_two_lectures(&app).await;
    view(&app, &cookie, course_id, first).await;
    view(&app, &cookie, course_id, second).await;

    let (other, _) = app.login_as("Grace", "grace@example.com").await;
    let theirs = app
        .get(&format!("/api/progress/{}", course_id), Some(&other))
        .await;
    assert_eq!(theirs.body["data"]["completed"], false);
    assert_eq!(theirs.body["data"]["progress"], json!([]));
}
