mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::TestApp;
use lms_core::ports::DatabaseService;
use serde_json::{json, Value};
use uuid::Uuid;

fn completed_event(session_id: &str, amount_total: i64) -> Value {
    json!({
        "type": "checkout.session.completed",
        "data": { "object": { "id": session_id, "amount_total": amount_total } }
    })
}

/// A published, priced course owned by an instructor, plus a logged-in student.
async fn storefront(app: &TestApp) -> (Uuid, String, Uuid) {
    let (instructor, _) = app.login_as("Grace", "grace@example.com").await;
    let course_id = app.create_course(&instructor, "Compilers", "Systems").await;
    app.set_price(&instructor, course_id, "499").await;
    app.add_lecture(&instructor, course_id, "Lexing").await;
    app.add_lecture(&instructor, course_id, "Parsing").await;
    app.publish(&instructor, course_id).await;

    let (student, student_id) = app.login_as("Ada", "ada@example.com").await;
    (course_id, student, student_id)
}

async fn checkout(app: &TestApp, cookie: &str, course_id: Uuid) -> String {
    let response = app
        .json(
            Method::POST,
            "/api/purchase/checkout/create-checkout-session",
            Some(json!({ "courseId": course_id })),
            Some(cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["url"]
        .as_str()
        .unwrap()
        .starts_with("https://checkout.test/"));
    app.payments.last_session_id().unwrap()
}

#[tokio::test]
async fn checkout_describes_the_course() {
    let app = TestApp::new();
    let (course_id, student, student_id) = storefront(&app).await;
    checkout(&app, &student, course_id).await;

    let request = app.payments.last_request().unwrap();
    assert_eq!(request.product_name, "Compilers");
    assert_eq!(request.unit_amount, 49900);
    assert_eq!(request.user_id, student_id);
    assert_eq!(
        request.success_url,
        format!("http://client.test/course-progress/{}", course_id)
    );
    assert_eq!(
        request.cancel_url,
        format!("http://client.test/course-detail/{}", course_id)
    );

    let status = app
        .get(
            &format!("/api/purchase/course/{}/detail-with-status", course_id),
            Some(&student),
        )
        .await;
    assert_eq!(status.body["purchased"], false);
}

#[tokio::test]
async fn checkout_for_missing_course_is_not_found() {
    let app = TestApp::new();
    let (student, _) = app.login_as("Ada", "ada@example.com").await;
    let response = app
        .json(
            Method::POST,
            "/api/purchase/checkout/create-checkout-session",
            Some(json!({ "course_id": Uuid::new_v4() })),
            Some(&student),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn verified_webhook_grants_access_once() {
    let app = TestApp::new();
    let (course_id, student, student_id) = storefront(&app).await;
    let session_id = checkout(&app, &student, course_id).await;

    let delivered = app.deliver_webhook(&completed_event(&session_id, 45000)).await;
    assert_eq!(delivered.status, StatusCode::OK);
    assert_eq!(delivered.body["received"], true);

    let status = app
        .get(
            &format!("/api/purchase/course/{}/detail-with-status", course_id),
            Some(&student),
        )
        .await;
    assert_eq!(status.body["purchased"], true);
    let lectures = status.body["course"]["lectures"].as_array().unwrap();
    assert!(lectures.iter().all(|l| l["is_preview_free"] == true));

    let redelivered = app.deliver_webhook(&completed_event(&session_id, 45000)).await;
    assert_eq!(redelivered.status, StatusCode::OK);

    let user = app.db.get_user_by_id(student_id).await.unwrap();
    assert_eq!(user.enrolled_courses, vec![course_id]);
    let course = app.db.get_course(course_id).await.unwrap();
    assert_eq!(course.enrolled_students, vec![student_id]);

    let purchases = app.get("/api/purchase", Some(&student)).await;
    let list = purchases.body["purchased_courses"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["status"], "completed");
    assert_eq!(list[0]["amount"], 450.0);
    assert_eq!(list[0]["course"]["title"], "Compilers");
}

#[tokio::test]
async fn unsigned_or_forged_webhooks_are_rejected() {
    let app = TestApp::new();
    let (course_id, student, _) = storefront(&app).await;
    let session_id = checkout(&app, &student, course_id).await;
    let body = completed_event(&session_id, 49900).to_string();

    let unsigned = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/purchase/webhook")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.clone()))
                .unwrap(),
        )
        .await;
    assert_eq!(unsigned.status, StatusCode::BAD_REQUEST);

    let forged = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/purchase/webhook")
                .header("stripe-signature", "t=1,v1=00ff")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(forged.status, StatusCode::BAD_REQUEST);

    let status = app
        .get(
            &format!("/api/purchase/course/{}/detail-with-status", course_id),
            Some(&student),
        )
        .await;
    assert_eq!(status.body["purchased"], false);
}

#[tokio::test]
async fn unknown_sessions_and_other_events_are_acknowledged() {
    let app = TestApp::new();
    let unknown = app.deliver_webhook(&completed_event("cs_nobody", 100)).await;
    assert_eq!(unknown.status, StatusCode::OK);

    let other = app
        .deliver_webhook(&json!({ "type": "payment_intent.created", "data": { "object": {} } }))
        .await;
    assert_eq!(other.status, StatusCode::OK);
}

#[tokio::test]
async fn unpriced_course_is_not_for_sale() {
    let app = TestApp::new();
    let (instructor, _) = app.login_as("Grace", "grace@example.com").await;
    let course_id = app.create_course(&instructor, "Compilers", "Systems").await;
    let (student, _) = app.login_as("Ada", "ada@example.com").await;

    let response = app
        .json(
            Method::POST,
            "/api/purchase/checkout/create-checkout-session",
            Some(json!({ "course_id": course_id })),
            Some(&student),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.payments.last_request().is_none());
}
