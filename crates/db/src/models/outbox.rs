//! Notification outbox model.

use educonnect_core::status::{OutboxStatus, StatusId};
use educonnect_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notification_outbox` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OutboxEvent {
    pub id: DbId,
    pub topic: String,
    pub payload: serde_json::Value,
    pub status_id: StatusId,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OutboxEvent {
    pub fn status(&self) -> Option<OutboxStatus> {
        OutboxStatus::from_id(self.status_id)
    }
}
