//! Repository for the `requests` table.

use educonnect_core::status::RequestStatus;
use educonnect_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::request::{CreateRequest, TutoringRequest};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, student_id, subject, subject_slug, mode, slots, request_meta, \
                       status_id, created_at, updated_at";

/// Provides CRUD operations for tutoring requests.
pub struct RequestRepo;

impl RequestRepo {
    /// Insert an `open` request, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRequest,
    ) -> Result<TutoringRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO requests (student_id, subject, subject_slug, mode, slots, request_meta, status_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TutoringRequest>(&query)
            .bind(input.student_id)
            .bind(&input.subject)
            .bind(&input.subject_slug)
            .bind(&input.mode)
            .bind(Json(&input.slots))
            .bind(&input.request_meta)
            .bind(RequestStatus::Open.id())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TutoringRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM requests WHERE id = $1");
        sqlx::query_as::<_, TutoringRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Move a request to `matched` unless it is already closed.
    ///
    /// Returns `true` if the row changed.
    pub async fn mark_matched(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE requests SET status_id = $2 \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(RequestStatus::Matched.id())
        .bind(RequestStatus::Open.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
