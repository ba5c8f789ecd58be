//! In-app notification model and DTOs.

use educonnect_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub kind: String,
    pub title: String,
    pub body: Option<String>,
    pub session_id: Option<DbId>,
    pub meta: serde_json::Value,
    pub delivered: bool,
    pub delivered_at: Option<Timestamp>,
    pub delivery_attempts: i32,
    pub seen_at: Option<Timestamp>,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO for a notification.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: DbId,
    pub kind: String,
    pub title: String,
    pub body: Option<String>,
    pub session_id: Option<DbId>,
    pub meta: serde_json::Value,
    pub delivered: bool,
}
