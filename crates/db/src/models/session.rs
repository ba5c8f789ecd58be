//! Scheduled session model and DTOs.

use educonnect_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Session {
    pub id: DbId,
    pub match_id: DbId,
    pub request_id: DbId,
    pub student_id: DbId,
    pub tutor_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub mode: String,
    pub meeting_link: String,
    pub slot_code: String,
    pub reminder_sent: bool,
    pub reminder_sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Session {
    pub fn is_participant(&self, user_id: DbId) -> bool {
        self.student_id == user_id || self.tutor_id == user_id
    }
}

/// Insert DTO for a session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub match_id: DbId,
    pub request_id: DbId,
    pub student_id: DbId,
    pub tutor_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub mode: String,
    pub meeting_link: String,
    pub slot_code: String,
}

/// In-app notification written in the same transaction as a new session.
#[derive(Debug, Clone)]
pub struct SessionNotice {
    pub user_id: DbId,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub meta: serde_json::Value,
    pub delivered: bool,
}

/// Patch DTO for participant edits. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateSession {
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    pub slot_code: Option<String>,
    pub meeting_link: Option<String>,
    pub mode: Option<String>,
}

/// A session due for a reminder, joined with both participants' contacts.
#[derive(Debug, Clone, FromRow)]
pub struct ReminderCandidate {
    pub id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub meeting_link: String,
    pub subject: String,
    pub student_id: DbId,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub student_phone: Option<String>,
    pub tutor_id: DbId,
    pub tutor_name: Option<String>,
    pub tutor_email: Option<String>,
    pub tutor_phone: Option<String>,
}
