//! Fixtures and fake transports shared by the sweep tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use educonnect_core::notification_kinds::{KIND_SESSION_CREATED_STUDENT, KIND_SESSION_CREATED_TUTOR};
use educonnect_core::slot::{Day, Pod, Slot};
use educonnect_core::types::{DbId, Timestamp};
use educonnect_db::models::profile::{CreateProfile, Profile};
use educonnect_db::models::request::CreateRequest;
use educonnect_db::models::session::{CreateSession, Session, SessionNotice};
use educonnect_db::repositories::{MatchRepo, ProfileRepo, RequestRepo, SessionRepo};
use educonnect_events::delivery::ChatError;
use educonnect_events::{ChatSender, DeliveryError, EmailMessage, EmailSender, Notifier};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Fake transports
// ---------------------------------------------------------------------------

/// Records every message; fails for recipients listed in `reject`.
#[derive(Default)]
pub struct RecordingTransport {
    pub emails: Mutex<Vec<EmailMessage>>,
    pub chats: Mutex<Vec<(String, String)>>,
    pub reject: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn rejecting(recipients: &[&str]) -> Arc<Self> {
        let t = Self::default();
        *t.reject.lock().unwrap() = recipients.iter().map(|r| r.to_string()).collect();
        Arc::new(t)
    }

    pub fn email_recipients(&self) -> Vec<String> {
        let mut to: Vec<String> = self.emails.lock().unwrap().iter().map(|m| m.to.clone()).collect();
        to.sort();
        to
    }

    pub fn chat_recipients(&self) -> Vec<String> {
        let mut to: Vec<String> = self.chats.lock().unwrap().iter().map(|(t, _)| t.clone()).collect();
        to.sort();
        to
    }

    fn rejects(&self, to: &str) -> bool {
        self.reject.lock().unwrap().iter().any(|r| r == to)
    }
}

#[async_trait]
impl EmailSender for RecordingTransport {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        if self.rejects(&message.to) {
            return Err(DeliveryError::Timeout(std::time::Duration::from_secs(1)));
        }
        self.emails.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[async_trait]
impl ChatSender for RecordingTransport {
    async fn send_chat(&self, to: &str, body: &str) -> Result<(), DeliveryError> {
        if self.rejects(to) {
            return Err(ChatError::HttpStatus {
                status: 500,
                body: "upstream unavailable".to_string(),
            }
            .into());
        }
        self.chats.lock().unwrap().push((to.to_string(), body.to_string()));
        Ok(())
    }
}

pub fn notifier(transport: &Arc<RecordingTransport>) -> Notifier {
    Notifier::new(transport.clone(), transport.clone())
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn profile(
    pool: &PgPool,
    name: &str,
    role: &str,
    email: Option<&str>,
    phone: Option<&str>,
) -> Profile {
    ProfileRepo::create(
        pool,
        &CreateProfile {
            full_name: Some(name.to_string()),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            role: role.to_string(),
            subjects: if role == "tutor" { vec!["maths".to_string()] } else { vec![] },
        },
    )
    .await
    .unwrap()
}

pub struct Booked {
    pub student: Profile,
    pub tutor: Profile,
    pub request_id: DbId,
    pub match_id: DbId,
    pub session: Session,
}

/// Book a session for a fresh student/tutor pair starting at `starts_at`.
///
/// `delivered = false` leaves the confirmation rows for the mailer.
pub async fn book(
    pool: &PgPool,
    student: Profile,
    tutor: Profile,
    starts_at: Timestamp,
    delivered: bool,
) -> Booked {
    let request = RequestRepo::create(
        pool,
        &CreateRequest {
            student_id: student.id,
            subject: "Mathématiques".to_string(),
            subject_slug: "mathematiques".to_string(),
            mode: "visio".to_string(),
            slots: vec![Slot::new(Day::Wed, Pod::Evening)],
            request_meta: None,
        },
    )
    .await
    .unwrap();
    let m = MatchRepo::insert_accepted(pool, request.id, tutor.id)
        .await
        .unwrap()
        .unwrap();

    let notices = vec![
        SessionNotice {
            user_id: student.id,
            kind: KIND_SESSION_CREATED_STUDENT.to_string(),
            title: "Séance confirmée".to_string(),
            body: "Ta séance est prévue.".to_string(),
            meta: serde_json::json!({ "subject": "Mathématiques" }),
            delivered,
        },
        SessionNotice {
            user_id: tutor.id,
            kind: KIND_SESSION_CREATED_TUTOR.to_string(),
            title: "Nouvelle séance".to_string(),
            body: "Une séance est prévue.".to_string(),
            meta: serde_json::json!({ "subject": "Mathématiques" }),
            delivered,
        },
    ];
    let (session, created) = SessionRepo::create_scheduled(
        pool,
        &CreateSession {
            match_id: m.id,
            request_id: request.id,
            student_id: student.id,
            tutor_id: tutor.id,
            starts_at,
            ends_at: starts_at + Duration::minutes(60),
            mode: "visio".to_string(),
            meeting_link: format!("https://meet.jit.si/edu-{}-test", m.id),
            slot_code: "wed:evening".to_string(),
        },
        &notices,
    )
    .await
    .unwrap();
    assert!(created);

    Booked {
        student,
        tutor,
        request_id: request.id,
        match_id: m.id,
        session,
    }
}

pub fn in_minutes(minutes: i64) -> Timestamp {
    Utc::now() + Duration::minutes(minutes)
}
