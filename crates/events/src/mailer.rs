//! Notification mailer.
//!
//! Emails undelivered in-app "session created" notifications. The session
//! facts come from the row's `meta` (`subject`, `starts_at`,
//! `meeting_link`), written when the session was booked. Failures stamp
//! `meta.email_error` and count a delivery attempt; rows at the attempt cap
//! are no longer selected. A failed bookkeeping write is logged and the run
//! moves on to the next row.

use std::time::Duration;

use chrono::Utc;
use educonnect_core::notification_kinds::{KIND_SESSION_CREATED_TUTOR, MAILED_KINDS};
use educonnect_core::types::Timestamp;
use educonnect_db::models::notification::Notification;
use educonnect_db::repositories::{NotificationRepo, ProfileRepo};
use educonnect_db::DbPool;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::delivery::{DeliveryError, EmailMessage, Notifier};
use crate::templates::{self, Audience, SessionDetails};

pub const DEFAULT_BATCH_SIZE: i64 = 50;
pub const DEFAULT_MAX_ATTEMPTS: i32 = 5;

/// Error codes stored in `meta.email_error` when no send was attempted.
pub const ERROR_PROFILE_NOT_FOUND: &str = "PROFILE_NOT_FOUND";
pub const ERROR_NO_EMAIL: &str = "NO_EMAIL";

/// Why a notification could not be emailed. The `Display` form is what
/// lands in `meta.email_error`.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("PROFILE_NOT_FOUND")]
    ProfileNotFound,

    #[error("NO_EMAIL")]
    NoEmail,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Counts reported by one mailer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MailerRunSummary {
    pub processed: u32,
    pub sent: u32,
    pub skipped: u32,
}

pub struct NotificationMailer {
    pool: DbPool,
    notifier: Notifier,
    batch_size: i64,
    max_attempts: i32,
}

impl NotificationMailer {
    pub fn new(pool: DbPool, notifier: Notifier) -> Self {
        Self {
            pool,
            notifier,
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_limits(mut self, batch_size: i64, max_attempts: i32) -> Self {
        self.batch_size = batch_size;
        self.max_attempts = max_attempts;
        self
    }

    pub async fn run_once(&self) -> Result<MailerRunSummary, sqlx::Error> {
        let rows = NotificationRepo::list_undelivered(
            &self.pool,
            &MAILED_KINDS,
            self.max_attempts,
            self.batch_size,
        )
        .await?;

        let mut summary = MailerRunSummary::default();
        for notification in &rows {
            summary.processed += 1;
            match self.deliver(notification).await {
                Ok(()) => {
                    summary.sent += 1;
                    let patch = serde_json::json!({ "email_sent_at": Utc::now() });
                    if let Err(e) =
                        NotificationRepo::mark_delivered(&self.pool, notification.id, &patch).await
                    {
                        tracing::error!(
                            notification_id = notification.id,
                            error = %e,
                            "Email sent but notification not marked delivered"
                        );
                    }
                }
                Err(reason) => {
                    summary.skipped += 1;
                    tracing::warn!(
                        notification_id = notification.id,
                        user_id = notification.user_id,
                        reason = %reason,
                        "Notification email not delivered"
                    );
                    if let Err(e) = NotificationRepo::record_delivery_failure(
                        &self.pool,
                        notification.id,
                        &reason.to_string(),
                    )
                    .await
                    {
                        tracing::error!(
                            notification_id = notification.id,
                            error = %e,
                            "Failed to record notification delivery failure"
                        );
                    }
                }
            }
        }

        if summary.processed > 0 {
            tracing::info!(
                processed = summary.processed,
                sent = summary.sent,
                skipped = summary.skipped,
                "Mailer run finished"
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
                    tracing::info!("Notification mailer stopping");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.run_once().await {
                        tracing::error!(error = %e, "Mailer run failed");
                    }
                }
            }
        }
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), MailError> {
        let profile = ProfileRepo::find_by_id(&self.pool, notification.user_id)
            .await?
            .ok_or(MailError::ProfileNotFound)?;
        let to = profile
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(MailError::NoEmail)?;

        let audience = if notification.kind == KIND_SESSION_CREATED_TUTOR {
            Audience::Tutor
        } else {
            Audience::Student
        };
        let meta = &notification.meta;
        let starts_at: Option<Timestamp> = meta
            .get("starts_at")
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        let details = SessionDetails {
            subject: meta.get("subject").and_then(|v| v.as_str()).unwrap_or_default(),
            starts_at,
            meeting_link: meta.get("meeting_link").and_then(|v| v.as_str()),
        };

        let rendered = templates::session_created_email(audience, profile.full_name.as_deref(), &details);
        let message = EmailMessage {
            to: to.to_string(),
            subject: rendered.subject,
            html: rendered.html,
            text: rendered.text,
        };
        self.notifier.send_email(&message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_reasons_match_error_codes() {
        assert_eq!(MailError::ProfileNotFound.to_string(), ERROR_PROFILE_NOT_FOUND);
        assert_eq!(MailError::NoEmail.to_string(), ERROR_NO_EMAIL);
    }
}
