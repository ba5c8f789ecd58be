//! Repository for the `notifications` table.

use educonnect_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::notification::{CreateNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, user_id, kind, title, body, session_id, meta, delivered, \
                       delivered_at, delivery_attempts, seen_at, read_at, created_at, updated_at";

/// Provides the in-app notification centre and mailer bookkeeping.
pub struct NotificationRepo;

impl NotificationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications \
                 (user_id, kind, title, body, session_id, meta, delivered, delivered_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, CASE WHEN $7 THEN NOW() END) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.user_id)
            .bind(&input.kind)
            .bind(&input.title)
            .bind(&input.body)
            .bind(input.session_id)
            .bind(&input.meta)
            .bind(input.delivered)
            .fetch_one(pool)
            .await
    }

    /// A user's notifications created after `since`: unseen first, then
    /// newest first.
    pub async fn list_recent_for_user(
        pool: &PgPool,
        user_id: DbId,
        since: Timestamp,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 AND created_at >= $2 \
             ORDER BY (seen_at IS NULL) DESC, created_at DESC, id DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(since)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Number of unread notifications for a user.
    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Mark one notification read (and seen).
    ///
    /// Returns `true` if the notification belongs to the user. Re-reading an
    /// already read row is still `true`.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET read_at = COALESCE(read_at, NOW()), seen_at = COALESCE(seen_at, NOW()) \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark several notifications seen. Ids owned by other users are ignored.
    ///
    /// Returns the number of rows newly marked.
    pub async fn mark_seen(pool: &PgPool, user_id: DbId, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET seen_at = NOW() \
             WHERE user_id = $1 AND id = ANY($2) AND seen_at IS NULL",
        )
        .bind(user_id)
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Mailer
    // -----------------------------------------------------------------------

    /// Undelivered notifications of the given kinds still under the attempt
    /// cap, oldest first.
    pub async fn list_undelivered(
        pool: &PgPool,
        kinds: &[&str],
        max_attempts: i32,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE delivered = false AND kind = ANY($1) AND delivery_attempts < $2 \
             ORDER BY created_at, id \
             LIMIT $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(kinds)
            .bind(max_attempts)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Mark delivered and merge `meta_patch` into `meta`.
    pub async fn mark_delivered(
        pool: &PgPool,
        notification_id: DbId,
        meta_patch: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notifications \
             SET delivered = true, delivered_at = NOW(), meta = meta || $2 \
             WHERE id = $1",
        )
        .bind(notification_id)
        .bind(meta_patch)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Count a failed delivery and record the reason under `meta.email_error`.
    pub async fn record_delivery_failure(
        pool: &PgPool,
        notification_id: DbId,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notifications \
             SET delivery_attempts = delivery_attempts + 1, \
                 meta = meta || jsonb_build_object('email_error', $2::TEXT) \
             WHERE id = $1",
        )
        .bind(notification_id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// All notifications attached to a session, oldest first.
    pub async fn list_for_session(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM notifications WHERE session_id = $1 ORDER BY id");
        sqlx::query_as::<_, Notification>(&query)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }
}
