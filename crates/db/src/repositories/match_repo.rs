//! Repository for the `matches` table.
//!
//! Status changes go through [`MatchRepo::transition`], a single guarded
//! `UPDATE ... WHERE status_id = <expected>` statement. Callers treat a
//! `false` result as "someone else moved it first" and re-read.

use educonnect_core::status::MatchStatus;
use educonnect_core::types::DbId;
use sqlx::PgPool;

use crate::models::tutor_match::{MatchWithRequest, TutorCandidate, TutorMatch};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, request_id, tutor_id, status_id, score, decided_at, created_at, updated_at";

/// Provides match lookups and guarded status transitions.
pub struct MatchRepo;

impl MatchRepo {
    /// Insert a `proposed` match. Fails with `uq_matches_request_tutor` if
    /// the pair already exists.
    pub async fn create_proposed(
        pool: &PgPool,
        request_id: DbId,
        tutor_id: DbId,
    ) -> Result<TutorMatch, sqlx::Error> {
        let query = format!(
            "INSERT INTO matches (request_id, tutor_id, status_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TutorMatch>(&query)
            .bind(request_id)
            .bind(tutor_id)
            .bind(MatchStatus::Proposed.id())
            .fetch_one(pool)
            .await
    }

    /// Insert a match directly in `accepted`.
    ///
    /// Returns `None` when a match for the pair already exists (the caller
    /// re-reads it). Another accepted match on the same request surfaces as a
    /// unique violation on `uq_matches_one_accepted_per_request`.
    pub async fn insert_accepted(
        pool: &PgPool,
        request_id: DbId,
        tutor_id: DbId,
    ) -> Result<Option<TutorMatch>, sqlx::Error> {
        let query = format!(
            "INSERT INTO matches (request_id, tutor_id, status_id, decided_at)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT ON CONSTRAINT uq_matches_request_tutor DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TutorMatch>(&query)
            .bind(request_id)
            .bind(tutor_id)
            .bind(MatchStatus::Accepted.id())
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TutorMatch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM matches WHERE id = $1");
        sqlx::query_as::<_, TutorMatch>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load a match with its request's owner and subject.
    pub async fn find_with_request(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<MatchWithRequest>, sqlx::Error> {
        sqlx::query_as::<_, MatchWithRequest>(
            "SELECT m.id, m.request_id, m.tutor_id, m.status_id, \
                    r.student_id, r.subject, r.mode \
             FROM matches m \
             JOIN requests r ON r.id = m.request_id \
             WHERE m.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_request_and_tutor(
        pool: &PgPool,
        request_id: DbId,
        tutor_id: DbId,
    ) -> Result<Option<TutorMatch>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM matches WHERE request_id = $1 AND tutor_id = $2");
        sqlx::query_as::<_, TutorMatch>(&query)
            .bind(request_id)
            .bind(tutor_id)
            .fetch_optional(pool)
            .await
    }

    /// List matches of a request in a given status, oldest first.
    pub async fn list_for_request(
        pool: &PgPool,
        request_id: DbId,
        status: MatchStatus,
    ) -> Result<Vec<TutorMatch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM matches \
             WHERE request_id = $1 AND status_id = $2 \
             ORDER BY id"
        );
        sqlx::query_as::<_, TutorMatch>(&query)
            .bind(request_id)
            .bind(status.id())
            .fetch_all(pool)
            .await
    }

    /// Guarded transition `from -> to`.
    ///
    /// Returns `true` only if the row was still in `from`.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE matches SET status_id = $3, decided_at = NOW() \
             WHERE id = $1 AND status_id = $2",
        )
        .bind(id)
        .bind(from.id())
        .bind(to.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Run the matching function for a request. It may insert `proposed`
    /// matches as a side effect.
    pub async fn match_tutors_for_request(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Vec<TutorCandidate>, sqlx::Error> {
        sqlx::query_as::<_, TutorCandidate>(
            "SELECT tutor_id, full_name, subjects, rating, reviews_count \
             FROM match_tutors_for_request($1)",
        )
        .bind(request_id)
        .fetch_all(pool)
        .await
    }
}
