//! Shared router, fake collaborators and fixtures for the API tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{Datelike, Utc, Weekday};
use educonnect_api::app::build_router;
use educonnect_api::auth::jwt::{generate_access_token, JwtConfig};
use educonnect_api::config::{BookingConfig, ServerConfig};
use educonnect_api::matching::{MatchingError, PgTutorMatcher, TutorMatcher};
use educonnect_api::state::AppState;
use educonnect_core::slot::Slot;
use educonnect_core::types::{DbId, Timestamp};
use educonnect_db::models::profile::CreateProfile;
use educonnect_db::models::request::{CreateRequest, TutoringRequest};
use educonnect_db::models::tutor_match::{TutorCandidate, TutorMatch};
use educonnect_db::repositories::{AvailabilityRepo, MatchRepo, ProfileRepo, RequestRepo};
use educonnect_events::{
    ChatSender, DeliveryError, EmailMessage, EmailSender, Notifier, OutboxConfig, ReminderConfig,
};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

pub const CRON_SECRET: &str = "test-cron-secret";

/// Build a test `ServerConfig` with safe defaults.
///
/// Slot bands are read in UTC and the cron secret is [`CRON_SECRET`].
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        delivery_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        cron_secret: Some(CRON_SECRET.to_string()),
        booking: BookingConfig::default(),
        outbox: OutboxConfig::default(),
        reminders: ReminderConfig::default(),
    }
}

// ---------------------------------------------------------------------------
// Fake collaborators
// ---------------------------------------------------------------------------

/// Records every outgoing email and chat message.
#[derive(Default)]
pub struct RecordingTransport {
    pub emails: Mutex<Vec<EmailMessage>>,
    pub chats: Mutex<Vec<(String, String)>>,
}

impl RecordingTransport {
    pub fn email_recipients(&self) -> Vec<String> {
        let mut to: Vec<String> = self.emails.lock().unwrap().iter().map(|m| m.to.clone()).collect();
        to.sort();
        to
    }
}

#[async_trait]
impl EmailSender for RecordingTransport {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        self.emails.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[async_trait]
impl ChatSender for RecordingTransport {
    async fn send_chat(&self, to: &str, body: &str) -> Result<(), DeliveryError> {
        self.chats.lock().unwrap().push((to.to_string(), body.to_string()));
        Ok(())
    }
}

/// Matcher that always fails, as when the matching service is down.
pub struct FailingMatcher;

#[async_trait]
impl TutorMatcher for FailingMatcher {
    async fn match_tutors(&self, _request_id: DbId) -> Result<Vec<TutorCandidate>, MatchingError> {
        Err(MatchingError::Timeout(Duration::from_secs(5)))
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the full application router with all middleware layers, using the
/// given database pool, a recording transport and the SQL matcher.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Arc::new(RecordingTransport::default()), None, test_config())
}

/// Like [`build_test_app`] with explicit collaborators and config.
pub fn build_test_app_with(
    pool: PgPool,
    transport: Arc<RecordingTransport>,
    matcher: Option<Arc<dyn TutorMatcher>>,
    config: ServerConfig,
) -> Router {
    let notifier = Notifier::new(transport.clone(), transport);
    let matcher: Arc<dyn TutorMatcher> = match matcher {
        Some(matcher) => matcher,
        None => Arc::new(PgTutorMatcher::new(pool.clone(), Duration::from_secs(5))),
    };
    build_router(AppState::new(pool, config, notifier, matcher))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub fn token(user_id: DbId, role: &str) -> String {
    generate_access_token(user_id, role, &test_config().jwt).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response {
    let request = Request::get(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::POST, uri, body, None).await
}

pub async fn post_json_auth(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send_json(app, Method::POST, uri, body, Some(token)).await
}

pub async fn patch_json_auth(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send_json(app, Method::PATCH, uri, body, Some(token)).await
}

/// POST to a job endpoint with an optional `x-cron-secret`.
pub async fn post_cron(app: &Router, uri: &str, secret: Option<&str>) -> Response {
    let mut builder = Request::post(uri);
    if let Some(secret) = secret {
        builder = builder.header("x-cron-secret", secret);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn student(pool: &PgPool, name: &str, email: Option<&str>) -> DbId {
    ProfileRepo::create(
        pool,
        &CreateProfile {
            full_name: Some(name.to_string()),
            email: email.map(str::to_string),
            role: "student".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .id
}

/// A maths tutor available on each of `slots`.
pub async fn tutor(pool: &PgPool, name: &str, email: Option<&str>, slots: &[Slot]) -> DbId {
    let id = ProfileRepo::create(
        pool,
        &CreateProfile {
            full_name: Some(name.to_string()),
            email: email.map(str::to_string),
            role: "tutor".to_string(),
            subjects: vec!["mathematiques".to_string()],
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .id;
    for slot in slots {
        AvailabilityRepo::create(pool, id, *slot, true).await.unwrap();
    }
    id
}

pub async fn request_for(pool: &PgPool, student_id: DbId, slots: &[Slot]) -> TutoringRequest {
    RequestRepo::create(
        pool,
        &CreateRequest {
            student_id,
            subject: "Mathématiques".to_string(),
            subject_slug: "mathematiques".to_string(),
            mode: "visio".to_string(),
            slots: slots.to_vec(),
            request_meta: None,
        },
    )
    .await
    .unwrap()
}

pub async fn proposed(pool: &PgPool, request_id: DbId, tutor_id: DbId) -> TutorMatch {
    MatchRepo::create_proposed(pool, request_id, tutor_id)
        .await
        .unwrap()
}

/// The next `weekday` strictly after today, at `hour:00` UTC.
pub fn next_weekday_at(weekday: Weekday, hour: u32) -> Timestamp {
    let mut day = Utc::now().date_naive() + chrono::Duration::days(1);
    while day.weekday() != weekday {
        day += chrono::Duration::days(1);
    }
    day.and_hms_opt(hour, 0, 0).unwrap().and_utc()
}

pub fn ts(value: &serde_json::Value) -> Timestamp {
    value.as_str().unwrap().parse().unwrap()
}
