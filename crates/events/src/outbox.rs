//! Notification outbox processor.
//!
//! [`OutboxProcessor::run_once`] drains one batch of `pending` events from
//! `notification_outbox`, oldest first, and dispatches each by topic. A
//! successful dispatch retires the event as `sent`; any failure leaves it
//! `pending` with `attempts + 1`. Events at the attempt cap are no longer
//! selected and stay `pending`.
//!
//! Delivery is at-least-once: overlapping sweeps may both pick the same row,
//! and a `session.created` event that fails for one participant is retried
//! for both.

use std::time::Duration;

use educonnect_core::notification_kinds::{TOPIC_MATCH_PROPOSED, TOPIC_SESSION_CREATED};
use educonnect_core::types::DbId;
use educonnect_db::models::outbox::OutboxEvent;
use educonnect_db::repositories::{MatchRepo, OutboxRepo, ProfileRepo, RequestRepo, SessionRepo};
use educonnect_db::DbPool;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::delivery::{ChatOutcome, DeliveryError, Notifier};
use crate::templates::{self, Audience, SessionDetails};

/// Default number of events per run.
pub const DEFAULT_BATCH_SIZE: i64 = 50;

/// Default attempt cap per event.
pub const DEFAULT_MAX_ATTEMPTS: i32 = 5;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a single event could not be dispatched.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Malformed payload for topic '{topic}': {reason}")]
    Payload { topic: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MatchProposedPayload {
    match_id: DbId,
}

#[derive(Debug, Deserialize)]
struct SessionCreatedPayload {
    session_id: DbId,
}

/// A decoded outbox event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboxTopic {
    MatchProposed { match_id: DbId },
    SessionCreated { session_id: DbId },
    /// A topic this processor does not handle; retired without delivery.
    Unknown(String),
}

impl OutboxTopic {
    pub fn decode(topic: &str, payload: &serde_json::Value) -> Result<Self, DispatchError> {
        let malformed = |e: serde_json::Error| DispatchError::Payload {
            topic: topic.to_string(),
            reason: e.to_string(),
        };
        match topic {
            TOPIC_MATCH_PROPOSED => {
                let p: MatchProposedPayload =
                    serde_json::from_value(payload.clone()).map_err(malformed)?;
                Ok(Self::MatchProposed { match_id: p.match_id })
            }
            TOPIC_SESSION_CREATED => {
                let p: SessionCreatedPayload =
                    serde_json::from_value(payload.clone()).map_err(malformed)?;
                Ok(Self::SessionCreated { session_id: p.session_id })
            }
            other => Ok(Self::Unknown(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Config and summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct OutboxConfig {
    pub batch_size: i64,
    pub max_attempts: i32,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl OutboxConfig {
    /// | Env Var               | Default |
    /// |-----------------------|---------|
    /// | `OUTBOX_BATCH_SIZE`   | `50`    |
    /// | `OUTBOX_MAX_ATTEMPTS` | `5`     |
    pub fn from_env() -> Self {
        let batch_size = std::env::var("OUTBOX_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n: &i64| *n > 0)
            .unwrap_or(DEFAULT_BATCH_SIZE);
        let max_attempts = std::env::var("OUTBOX_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n: &i32| *n > 0)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        Self { batch_size, max_attempts }
    }
}

/// Counts reported by one outbox run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutboxRunSummary {
    pub processed: u32,
    pub sent: u32,
    pub failed: u32,
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

pub struct OutboxProcessor {
    pool: DbPool,
    notifier: Notifier,
    config: OutboxConfig,
}

impl OutboxProcessor {
    pub fn new(pool: DbPool, notifier: Notifier, config: OutboxConfig) -> Self {
        Self { pool, notifier, config }
    }

    /// Process one batch of pending events.
    ///
    /// Only the batch selection can fail the run; per-event errors are
    /// recorded on the event and counted in `failed`.
    pub async fn run_once(&self) -> Result<OutboxRunSummary, sqlx::Error> {
        let events =
            OutboxRepo::list_pending(&self.pool, self.config.max_attempts, self.config.batch_size)
                .await?;

        let mut summary = OutboxRunSummary::default();
        for event in &events {
            summary.processed += 1;
            match self.dispatch(event).await {
                Ok(()) => match OutboxRepo::mark_sent(&self.pool, event.id).await {
                    Ok(_) => summary.sent += 1,
                    Err(e) => {
                        tracing::error!(event_id = event.id, error = %e, "Failed to mark outbox event sent");
                        summary.failed += 1;
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        event_id = event.id,
                        topic = %event.topic,
                        attempt = event.attempts + 1,
                        error = %e,
                        "Outbox dispatch failed"
                    );
                    if let Err(db_err) =
                        OutboxRepo::record_failure(&self.pool, event.id, &e.to_string()).await
                    {
                        tracing::error!(event_id = event.id, error = %db_err, "Failed to record outbox failure");
                    }
                    summary.failed += 1;
                }
            }
        }

        if summary.processed > 0 {
            tracing::info!(
                processed = summary.processed,
                sent = summary.sent,
                failed = summary.failed,
                "Outbox run finished"
            );
        }
        Ok(summary)
    }

    /// Run [`Self::run_once`] every `every` until `cancel` fires.
    pub async fn run(&self, every: Duration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(every);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Outbox processor stopping");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.run_once().await {
                        tracing::error!(error = %e, "Outbox run failed");
                    }
                }
            }
        }
    }

    async fn dispatch(&self, event: &OutboxEvent) -> Result<(), DispatchError> {
        match OutboxTopic::decode(&event.topic, &event.payload)? {
            OutboxTopic::MatchProposed { match_id } => self.match_proposed(match_id).await,
            OutboxTopic::SessionCreated { session_id } => self.session_created(session_id).await,
            OutboxTopic::Unknown(topic) => {
                tracing::debug!(event_id = event.id, %topic, "Retiring outbox event with unknown topic");
                Ok(())
            }
        }
    }

    async fn match_proposed(&self, match_id: DbId) -> Result<(), DispatchError> {
        let Some(m) = MatchRepo::find_with_request(&self.pool, match_id).await? else {
            tracing::debug!(match_id, "Proposed match no longer exists, nothing to send");
            return Ok(());
        };
        let slots = RequestRepo::find_by_id(&self.pool, m.request_id)
            .await?
            .map(|r| r.slots.0)
            .unwrap_or_default();
        let phone = ProfileRepo::find_by_id(&self.pool, m.tutor_id)
            .await?
            .and_then(|p| p.phone);

        let body = templates::match_proposed_chat(&m.subject, &slots);
        if self.notifier.send_chat(phone.as_deref(), &body).await? == ChatOutcome::NoRecipient {
            tracing::debug!(match_id, tutor_id = m.tutor_id, "Tutor has no chat address");
        }
        Ok(())
    }

    async fn session_created(&self, session_id: DbId) -> Result<(), DispatchError> {
        let Some(session) = SessionRepo::find_by_id(&self.pool, session_id).await? else {
            tracing::warn!(session_id, "Session for outbox event not found, nothing to send");
            return Ok(());
        };
        let subject = RequestRepo::find_by_id(&self.pool, session.request_id)
            .await?
            .map(|r| r.subject)
            .unwrap_or_default();
        let profiles =
            ProfileRepo::find_many(&self.pool, &[session.student_id, session.tutor_id]).await?;
        let phone_of = |id: DbId| {
            profiles
                .iter()
                .find(|p| p.id == id)
                .and_then(|p| p.phone.as_deref())
        };

        let details = SessionDetails {
            subject: &subject,
            starts_at: Some(session.starts_at),
            meeting_link: Some(&session.meeting_link),
        };
        let student_body = templates::session_created_chat(Audience::Student, &details);
        let tutor_body = templates::session_created_chat(Audience::Tutor, &details);

        let (student, tutor) = futures::future::join(
            self.notifier.send_chat(phone_of(session.student_id), &student_body),
            self.notifier.send_chat(phone_of(session.tutor_id), &tutor_body),
        )
        .await;
        student?;
        tutor?;
        Ok(())
    }
}
