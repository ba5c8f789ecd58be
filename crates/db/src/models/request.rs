//! Tutoring request model and DTOs.

use educonnect_core::slot::Slot;
use educonnect_core::status::{RequestStatus, StatusId};
use educonnect_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TutoringRequest {
    pub id: DbId,
    pub student_id: DbId,
    pub subject: String,
    pub subject_slug: String,
    pub mode: String,
    pub slots: Json<Vec<Slot>>,
    pub request_meta: Option<serde_json::Value>,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TutoringRequest {
    pub fn status(&self) -> Option<RequestStatus> {
        RequestStatus::from_id(self.status_id)
    }
}

/// Validated insert DTO for a request.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub student_id: DbId,
    pub subject: String,
    pub subject_slug: String,
    pub mode: String,
    pub slots: Vec<Slot>,
    pub request_meta: Option<serde_json::Value>,
}
