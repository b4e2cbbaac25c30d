//! Shared harness for the HTTP tests: the real router over in-memory ports and
//! a payment provider fake that checks `Stripe-Signature` headers the way the
//! provider computes them.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use lms_api::config::Config;
use lms_api::web::{build_router, AppState};
use lms_core::domain::{CheckoutRequest, CheckoutSession, MediaUpload, StoredMedia, WebhookEvent};
use lms_core::memory::{InMemoryDatabase, InMemoryMedia};
use lms_core::ports::{MediaService, PaymentService, PortError, PortResult};
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "whsec_integration";
const BOUNDARY: &str = "lms-test-boundary";

pub fn test_config() -> Config {
    Config {
        bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::INFO,
        jwt_secret: "integration-secret".to_string(),
        token_ttl_days: 1,
        cors_origin: "http://localhost:5173".to_string(),
        client_url: "http://client.test/".to_string(),
        client_dist_path: None,
        stripe_secret_key: "sk_test".to_string(),
        stripe_webhook_secret: WEBHOOK_SECRET.to_string(),
        stripe_api_base: "http://stripe.invalid".to_string(),
        checkout_currency: "inr".to_string(),
        media_bucket: "lms".to_string(),
        media_public_base_url: "memory://media".to_string(),
        media_endpoint_url: None,
        http_timeout: Duration::from_secs(10),
        upload_timeout: Duration::from_secs(30),
        max_upload_bytes: 10 * 1024 * 1024,
    }
}

//=========================================================================================
// Payment Provider Fake
//=========================================================================================

fn signature_mac(payload: &[u8], timestamp: i64) -> Hmac<Sha256> {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    mac
}

/// A `Stripe-Signature` header value for `payload`, timestamped now.
pub fn sign_payload(payload: &[u8]) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let signature = signature_mac(payload, timestamp).finalize().into_bytes();
    format!("t={},v1={}", timestamp, hex::encode(signature))
}

fn verify_signature(payload: &[u8], header: &str) -> PortResult<()> {
    let forged = || PortError::Security("Webhook signature verification failed".to_string());
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signature = hex::decode(value).ok(),
            _ => {}
        }
    }
    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return Err(forged());
    };
    if (chrono::Utc::now().timestamp() - timestamp).abs() > 300 {
        return Err(forged());
    }
    signature_mac(payload, timestamp)
        .verify_slice(&signature)
        .map_err(|_| forged())
}

fn parse_event(payload: &[u8]) -> PortResult<WebhookEvent> {
    let event: Value = serde_json::from_slice(payload)
        .map_err(|e| PortError::Validation(format!("Invalid webhook payload: {}", e)))?;
    let event_type = event["type"].as_str().unwrap_or_default().to_string();
    if event_type != "checkout.session.completed" {
        return Ok(WebhookEvent::Other { event_type });
    }
    let session = &event["data"]["object"];
    Ok(WebhookEvent::CheckoutCompleted {
        session_id: session["id"].as_str().unwrap_or_default().to_string(),
        amount_total: session["amount_total"].as_i64(),
    })
}

/// Issues numbered sessions and verifies webhooks against [`WEBHOOK_SECRET`].
#[derive(Default)]
pub struct FakePayments {
    pub requests: Mutex<Vec<CheckoutRequest>>,
    pub sessions: Mutex<Vec<String>>,
}

impl FakePayments {
    pub fn last_session_id(&self) -> Option<String> {
        self.sessions.lock().unwrap().last().cloned()
    }

    pub fn last_request(&self) -> Option<CheckoutRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PaymentService for FakePayments {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> PortResult<CheckoutSession> {
        let mut sessions = self.sessions.lock().unwrap();
        let id = format!("cs_test_{}", sessions.len() + 1);
        sessions.push(id.clone());
        self.requests.lock().unwrap().push(request.clone());
        Ok(CheckoutSession {
            url: Some(format!("https://checkout.test/{}", id)),
            id,
        })
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> PortResult<WebhookEvent> {
        verify_signature(payload, signature)?;
        parse_event(payload)
    }
}

//=========================================================================================
// Media Store With Latency
//=========================================================================================

/// Delays every upload and delete before handing it to the in-memory store.
pub struct SlowMedia {
    pub inner: Arc<InMemoryMedia>,
    pub delay: Duration,
}

#[async_trait]
impl MediaService for SlowMedia {
    async fn upload(&self, upload: MediaUpload) -> PortResult<StoredMedia> {
        tokio::time::sleep(self.delay).await;
        self.inner.upload(upload).await
    }

    async fn delete(&self, public_id: &str) -> PortResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(public_id).await
    }

    fn reference_from_url(&self, url: &str) -> Option<String> {
        self.inner.reference_from_url(url)
    }
}

//=========================================================================================
// Application Harness
//=========================================================================================

pub struct TestApp {
    pub router: Router,
    pub db: Arc<InMemoryDatabase>,
    pub media: Arc<InMemoryMedia>,
    pub payments: Arc<FakePayments>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(test_config(), Duration::ZERO)
    }

    /// The app over `config`, with every media store call taking `media_delay`.
    pub fn build(config: Config, media_delay: Duration) -> Self {
        let db = Arc::new(InMemoryDatabase::new());
        let media = Arc::new(InMemoryMedia::new());
        let payments = Arc::new(FakePayments::default());
        let store: Arc<dyn MediaService> = if media_delay.is_zero() {
            media.clone()
        } else {
            Arc::new(SlowMedia {
                inner: media.clone(),
                delay: media_delay,
            })
        };
        let state = Arc::new(AppState::new(
            Arc::new(config),
            db.clone(),
            store,
            payments.clone(),
        ));
        let router = build_router(state).expect("router builds");
        Self {
            router,
            db,
            media,
            payments,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.json(Method::GET, uri, None, cookie).await
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        form: Multipart,
        cookie: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(form.finish()))
            .unwrap();
        self.send(request).await
    }

    /// Registers and logs in a user, returning the `token=...` cookie pair and the user id.
    pub async fn login_as(&self, name: &str, email: &str) -> (String, Uuid) {
        let password = "s3cret-pass";
        let registered = self
            .json(
                Method::POST,
                "/api/user/register",
                Some(json!({ "name": name, "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(registered.status, StatusCode::CREATED);

        let login = self
            .json(
                Method::POST,
                "/api/user/login",
                Some(json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(login.status, StatusCode::OK);
        let cookie = login
            .headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .unwrap()
            .to_string();
        let user_id = uuid_at(&login.body, "/user/id");
        (cookie, user_id)
    }

    pub async fn create_course(&self, cookie: &str, title: &str, category: &str) -> Uuid {
        let response = self
            .json(
                Method::POST,
                "/api/course",
                Some(json!({ "course_title": title, "category": category })),
                Some(cookie),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        uuid_at(&response.body, "/course/id")
    }

    pub async fn add_lecture(&self, cookie: &str, course_id: Uuid, title: &str) -> Uuid {
        let response = self
            .json(
                Method::POST,
                &format!("/api/course/{}/lecture", course_id),
                Some(json!({ "lecture_title": title })),
                Some(cookie),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        uuid_at(&response.body, "/lecture/id")
    }

    pub async fn set_price(&self, cookie: &str, course_id: Uuid, price: &str) {
        let response = self
            .multipart(
                Method::PUT,
                &format!("/api/course/{}", course_id),
                Multipart::new().text("coursePrice", price),
                cookie,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    pub async fn publish(&self, cookie: &str, course_id: Uuid) -> TestResponse {
        self.json(
            Method::PATCH,
            &format!("/api/course/{}?publish=true", course_id),
            None,
            Some(cookie),
        )
        .await
    }

    /// Posts a provider event signed with the webhook secret.
    pub async fn deliver_webhook(&self, payload: &Value) -> TestResponse {
        let body = payload.to_string();
        let signature = sign_payload(body.as_bytes());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/purchase/webhook")
            .header("stripe-signature", signature)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

pub fn uuid_at(body: &Value, pointer: &str) -> Uuid {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("no uuid at {} in {}", pointer, body))
}

//=========================================================================================
// Multipart Builder
//=========================================================================================

#[derive(Default)]
pub struct Multipart {
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}
