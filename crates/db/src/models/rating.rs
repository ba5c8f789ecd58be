//! Session rating model.

use educonnect_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `session_ratings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SessionRating {
    pub id: DbId,
    pub session_id: DbId,
    pub student_id: DbId,
    pub tutor_id: DbId,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Upsert DTO for a rating.
#[derive(Debug, Clone)]
pub struct UpsertRating {
    pub session_id: DbId,
    pub student_id: DbId,
    pub tutor_id: DbId,
    pub rating: i16,
    pub comment: Option<String>,
}
