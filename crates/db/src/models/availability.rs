//! Tutor availability model.

use educonnect_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `tutor_availability` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TutorAvailability {
    pub id: DbId,
    pub tutor_id: DbId,
    pub day: String,
    pub pod: String,
    pub slot_code: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
