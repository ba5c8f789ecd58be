//! Repository for the `notification_outbox` table.

use educonnect_core::status::OutboxStatus;
use educonnect_core::types::DbId;
use sqlx::PgPool;

use crate::models::outbox::OutboxEvent;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, topic, payload, status_id, attempts, last_error, sent_at, created_at, updated_at";

/// Durable queue of notification intents.
pub struct OutboxRepo;

impl OutboxRepo {
    /// Enqueue a `pending` event, returning its id.
    pub async fn enqueue(
        pool: &PgPool,
        topic: &str,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notification_outbox (topic, payload, status_id) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(topic)
        .bind(payload)
        .bind(OutboxStatus::Pending.id())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<OutboxEvent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_outbox WHERE id = $1");
        sqlx::query_as::<_, OutboxEvent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Select the next batch of `pending` events still under the attempt cap,
    /// oldest first.
    ///
    /// No lock is taken: overlapping sweeps may select the same rows.
    pub async fn list_pending(
        pool: &PgPool,
        max_attempts: i32,
        limit: i64,
    ) -> Result<Vec<OutboxEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_outbox \
             WHERE status_id = $1 AND attempts < $2 \
             ORDER BY id \
             LIMIT $3"
        );
        sqlx::query_as::<_, OutboxEvent>(&query)
            .bind(OutboxStatus::Pending.id())
            .bind(max_attempts)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Retire an event as `sent`. Returns `false` if it was no longer pending.
    pub async fn mark_sent(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notification_outbox \
             SET status_id = $2, sent_at = NOW(), last_error = NULL \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(OutboxStatus::Sent.id())
        .bind(OutboxStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count a failed dispatch. The event stays `pending`.
    pub async fn record_failure(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_outbox \
             SET attempts = attempts + 1, last_error = $2 \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(error)
        .bind(OutboxStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// All events for a topic, oldest first.
    pub async fn list_by_topic(
        pool: &PgPool,
        topic: &str,
    ) -> Result<Vec<OutboxEvent>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM notification_outbox WHERE topic = $1 ORDER BY id");
        sqlx::query_as::<_, OutboxEvent>(&query)
            .bind(topic)
            .fetch_all(pool)
            .await
    }
}
