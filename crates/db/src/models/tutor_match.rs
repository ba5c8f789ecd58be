//! Match (request/tutor pairing) model.

use educonnect_core::status::{MatchStatus, StatusId};
use educonnect_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `matches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TutorMatch {
    pub id: DbId,
    pub request_id: DbId,
    pub tutor_id: DbId,
    pub status_id: StatusId,
    pub score: Option<f64>,
    pub decided_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A match joined with the parts of its request the booking flow needs.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MatchWithRequest {
    pub id: DbId,
    pub request_id: DbId,
    pub tutor_id: DbId,
    pub status_id: StatusId,
    pub student_id: DbId,
    pub subject: String,
    pub mode: String,
}

macro_rules! impl_match_status {
    ($ty:ty) => {
        impl $ty {
            /// Decoded status; `Expired` is assumed for ids outside the seed data.
            pub fn status(&self) -> MatchStatus {
                MatchStatus::from_id(self.status_id).unwrap_or(MatchStatus::Expired)
            }
        }
    };
}

impl_match_status!(TutorMatch);
impl_match_status!(MatchWithRequest);

/// A candidate tutor returned by the matching function.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TutorCandidate {
    pub tutor_id: DbId,
    pub full_name: Option<String>,
    pub subjects: Vec<String>,
    pub rating: Option<f64>,
    pub reviews_count: Option<i64>,
}
