//! Repository for the `sessions` table and its reminder log.

use educonnect_core::notification_kinds::TOPIC_SESSION_CREATED;
use educonnect_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::session::{
    CreateSession, ReminderCandidate, Session, SessionNotice, UpdateSession,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, match_id, request_id, student_id, tutor_id, starts_at, ends_at, \
                       mode, meeting_link, slot_code, reminder_sent, reminder_sent_at, \
                       created_at, updated_at";

/// Provides session scheduling, edits and reminder bookkeeping.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert the session for a match together with its side-effect rows.
    ///
    /// In one transaction: the session (`ON CONFLICT (match_id) DO NOTHING`),
    /// a `session.created` outbox event, and one in-app notification per
    /// notice whose `meta` is extended with the session's id, bounds and link.
    /// If a session already exists for the match nothing is written and the
    /// existing row is returned with `created = false`.
    pub async fn create_scheduled(
        pool: &PgPool,
        input: &CreateSession,
        notices: &[SessionNotice],
    ) -> Result<(Session, bool), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO sessions (match_id, request_id, student_id, tutor_id, starts_at, ends_at,
                                   mode, meeting_link, slot_code)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT ON CONSTRAINT uq_sessions_match_id DO NOTHING
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Session>(&query)
            .bind(input.match_id)
            .bind(input.request_id)
            .bind(input.student_id)
            .bind(input.tutor_id)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(&input.mode)
            .bind(&input.meeting_link)
            .bind(&input.slot_code)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(session) = inserted else {
            tx.rollback().await?;
            let existing = Self::find_by_match_id(pool, input.match_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;
            return Ok((existing, false));
        };

        sqlx::query(
            "INSERT INTO notification_outbox (topic, payload) \
             VALUES ($1, jsonb_build_object('session_id', $2::BIGINT))",
        )
        .bind(TOPIC_SESSION_CREATED)
        .bind(session.id)
        .execute(&mut *tx)
        .await?;

        let meta = serde_json::json!({
            "session_id": session.id,
            "starts_at": session.starts_at,
            "ends_at": session.ends_at,
            "meeting_link": session.meeting_link,
        });
        for notice in notices {
            sqlx::query(
                "INSERT INTO notifications \
                     (user_id, kind, title, body, session_id, meta, delivered, delivered_at) \
                 VALUES ($1, $2, $3, $4, $5, $6::JSONB || $7::JSONB, $8, \
                         CASE WHEN $8 THEN NOW() END)",
            )
            .bind(notice.user_id)
            .bind(&notice.kind)
            .bind(&notice.title)
            .bind(&notice.body)
            .bind(session.id)
            .bind(&notice.meta)
            .bind(&meta)
            .bind(notice.delivered)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok((session, true))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_match_id(
        pool: &PgPool,
        match_id: DbId,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE match_id = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(match_id)
            .fetch_optional(pool)
            .await
    }

    /// Apply a participant edit. Returns `None` if the session does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSession,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "UPDATE sessions SET
                starts_at = COALESCE($2, starts_at),
                ends_at = COALESCE($3, ends_at),
                slot_code = COALESCE($4, slot_code),
                meeting_link = COALESCE($5, meeting_link),
                mode = COALESCE($6, mode)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(&input.slot_code)
            .bind(&input.meeting_link)
            .bind(&input.mode)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Reminders
    // -----------------------------------------------------------------------

    /// Sessions starting in `[from, to)`, or `[from, to]` when `include_end`
    /// is set, that carry neither the reminder flag nor a reminder log row,
    /// soonest first.
    pub async fn list_reminder_candidates(
        pool: &PgPool,
        from: Timestamp,
        to: Timestamp,
        include_end: bool,
        limit: i64,
    ) -> Result<Vec<ReminderCandidate>, sqlx::Error> {
        sqlx::query_as::<_, ReminderCandidate>(
            "SELECT s.id, s.starts_at, s.ends_at, s.meeting_link, r.subject, \
                    st.id AS student_id, st.full_name AS student_name, \
                    st.email AS student_email, st.phone AS student_phone, \
                    tu.id AS tutor_id, tu.full_name AS tutor_name, \
                    tu.email AS tutor_email, tu.phone AS tutor_phone \
             FROM sessions s \
             JOIN requests r ON r.id = s.request_id \
             JOIN profiles st ON st.id = s.student_id \
             JOIN profiles tu ON tu.id = s.tutor_id \
             WHERE s.starts_at >= $1 \
               AND (s.starts_at < $2 OR ($3 AND s.starts_at = $2)) \
               AND s.reminder_sent = false \
               AND NOT EXISTS ( \
                   SELECT 1 FROM session_reminder_log l WHERE l.session_id = s.id \
               ) \
             ORDER BY s.starts_at, s.id \
             LIMIT $4",
        )
        .bind(from)
        .bind(to)
        .bind(include_end)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Record that a session was reminded: set the flag and append the log
    /// row in one transaction.
    ///
    /// Returns `false` if another sweep already logged it.
    pub async fn mark_reminded(
        pool: &PgPool,
        session_id: DbId,
        channel: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE sessions SET reminder_sent = true, reminder_sent_at = NOW() \
             WHERE id = $1 AND reminder_sent = false",
        )
        .bind(session_id)
        .execute(&mut *tx)
        .await?;

        let logged = sqlx::query(
            "INSERT INTO session_reminder_log (session_id, channel) VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_session_reminder_log_session_id DO NOTHING",
        )
        .bind(session_id)
        .bind(channel)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(logged.rows_affected() > 0)
    }
}
