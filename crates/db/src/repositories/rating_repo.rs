//! Repository for the `session_ratings` table.

use educonnect_core::types::DbId;
use sqlx::PgPool;

use crate::models::rating::{SessionRating, UpsertRating};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, session_id, student_id, tutor_id, rating, comment, created_at, updated_at";

/// One overwritable rating per session.
pub struct RatingRepo;

impl RatingRepo {
    /// Insert or replace the rating for a session.
    pub async fn upsert(pool: &PgPool, input: &UpsertRating) -> Result<SessionRating, sqlx::Error> {
        let query = format!(
            "INSERT INTO session_ratings (session_id, student_id, tutor_id, rating, comment)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT uq_session_ratings_session_id DO UPDATE SET
                rating = EXCLUDED.rating,
                comment = EXCLUDED.comment
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SessionRating>(&query)
            .bind(input.session_id)
            .bind(input.student_id)
            .bind(input.tutor_id)
            .bind(input.rating)
            .bind(&input.comment)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_session(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Option<SessionRating>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM session_ratings WHERE session_id = $1");
        sqlx::query_as::<_, SessionRating>(&query)
            .bind(session_id)
            .fetch_optional(pool)
            .await
    }
}
