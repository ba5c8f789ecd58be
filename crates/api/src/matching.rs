//! Tutor matching collaborator.
//!
//! Matching runs right after a request is created. It may insert `proposed`
//! matches as a side effect; the caller only consumes the candidate list and
//! carries on with an empty one when matching fails.

use std::time::Duration;

use async_trait::async_trait;
use educonnect_core::types::DbId;
use educonnect_db::models::tutor_match::TutorCandidate;
use educonnect_db::repositories::MatchRepo;
use educonnect_db::DbPool;

#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error("matching query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("matching timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait TutorMatcher: Send + Sync {
    async fn match_tutors(&self, request_id: DbId) -> Result<Vec<TutorCandidate>, MatchingError>;
}

/// Matcher backed by the `match_tutors_for_request` SQL function.
pub struct PgTutorMatcher {
    pool: DbPool,
    timeout: Duration,
}

impl PgTutorMatcher {
    pub fn new(pool: DbPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl TutorMatcher for PgTutorMatcher {
    async fn match_tutors(&self, request_id: DbId) -> Result<Vec<TutorCandidate>, MatchingError> {
        tokio::time::timeout(
            self.timeout,
            MatchRepo::match_tutors_for_request(&self.pool, request_id),
        )
        .await
        .map_err(|_| MatchingError::Timeout(self.timeout))?
        .map_err(MatchingError::from)
    }
}
