//! Session reminder scheduler.
//!
//! Each run selects sessions starting inside the configured window that have
//! neither the `reminder_sent` flag nor a `session_reminder_log` row, sends a
//! reminder to both participants over the configured channel, and marks the
//! session reminded when at least one of the two sends succeeded. Reminded
//! sessions also get a delivered in-app row per participant.

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::{Duration, FixedOffset, NaiveTime, Offset, TimeZone, Utc};
use educonnect_core::notification_kinds::{
    KIND_SESSION_REMINDER_STUDENT, KIND_SESSION_REMINDER_TUTOR,
};
use educonnect_core::types::{DbId, Timestamp};
use educonnect_db::models::notification::CreateNotification;
use educonnect_db::models::session::ReminderCandidate;
use educonnect_db::repositories::{NotificationRepo, SessionRepo};
use educonnect_db::DbPool;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::delivery::{ChatOutcome, EmailMessage, Notifier};
use crate::templates::{self, Audience, SessionDetails};

/// Default number of sessions per run.
pub const DEFAULT_BATCH_SIZE: i64 = 100;

/// Default look-ahead of the rolling window.
pub const DEFAULT_LOOKAHEAD_MIN: i64 = 30;

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// Which sessions a run considers, relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderWindow {
    /// Sessions starting in `[now, now + d]`.
    Upcoming(Duration),
    /// Sessions starting during the next calendar day on the slot clock.
    NextCalendarDay,
}

impl Default for ReminderWindow {
    fn default() -> Self {
        Self::Upcoming(Duration::minutes(DEFAULT_LOOKAHEAD_MIN))
    }
}

/// Start-time range of one run. The end is inclusive only for
/// [`ReminderWindow::Upcoming`]; a calendar day excludes the next midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderBounds {
    pub from: Timestamp,
    pub to: Timestamp,
    pub include_end: bool,
}

impl ReminderWindow {
    pub fn bounds(&self, now: Timestamp, tz: &FixedOffset) -> ReminderBounds {
        match self {
            Self::Upcoming(d) => ReminderBounds {
                from: now,
                to: now + *d,
                include_end: true,
            },
            Self::NextCalendarDay => {
                let tomorrow = now.with_timezone(tz).date_naive() + Duration::days(1);
                let local_midnight = tomorrow.and_time(NaiveTime::MIN);
                let offset = Duration::seconds(i64::from(tz.local_minus_utc()));
                let from = Utc.from_utc_datetime(&(local_midnight - offset));
                ReminderBounds {
                    from,
                    to: from + Duration::days(1),
                    include_end: false,
                }
            }
        }
    }
}

impl FromStr for ReminderWindow {
    type Err = String;

    /// Accepts `next-day`, `<n>m` or `<n>h`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "next-day" {
            return Ok(Self::NextCalendarDay);
        }
        let (digits, unit) = s.split_at(s.len().saturating_sub(1));
        let n: i64 = digits
            .parse()
            .map_err(|_| format!("Invalid reminder window '{s}'"))?;
        if n <= 0 {
            return Err(format!("Reminder window must be positive, got '{s}'"));
        }
        match unit {
            "m" => Ok(Self::Upcoming(Duration::minutes(n))),
            "h" => Ok(Self::Upcoming(Duration::hours(n))),
            _ => Err(format!("Invalid reminder window '{s}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReminderChannel {
    #[default]
    Email,
    Chat,
}

impl ReminderChannel {
    /// Value stored in `session_reminder_log.channel`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Chat => "chat",
        }
    }
}

impl fmt::Display for ReminderChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "chat" | "whatsapp" => Ok(Self::Chat),
            other => Err(format!("Unknown reminder channel '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct ReminderConfig {
    pub window: ReminderWindow,
    pub channel: ReminderChannel,
    pub batch_size: i64,
    /// Clock on which "next calendar day" is evaluated.
    pub tz: FixedOffset,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            window: ReminderWindow::default(),
            channel: ReminderChannel::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            tz: Utc.fix(),
        }
    }
}

impl ReminderConfig {
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `REMINDER_WINDOW`         | `30m`   |
    /// | `REMINDER_CHANNEL`        | `email` |
    /// | `REMINDER_BATCH_SIZE`     | `100`   |
    /// | `SLOT_UTC_OFFSET_MINUTES` | `0`     |
    ///
    /// Unparseable values fall back to the default with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let window = match std::env::var("REMINDER_WINDOW") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "Ignoring REMINDER_WINDOW");
                defaults.window
            }),
            Err(_) => defaults.window,
        };
        let channel = match std::env::var("REMINDER_CHANNEL") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "Ignoring REMINDER_CHANNEL");
                defaults.channel
            }),
            Err(_) => defaults.channel,
        };
        let batch_size = std::env::var("REMINDER_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n: &i64| *n > 0)
            .unwrap_or(defaults.batch_size);
        let tz = std::env::var("SLOT_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .and_then(|minutes| FixedOffset::east_opt(minutes * 60))
            .unwrap_or(defaults.tz);

        Self { window, channel, batch_size, tz }
    }
}

/// Counts reported by one reminder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderRunSummary {
    pub processed: u32,
    pub reminded: u32,
    pub skipped: u32,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

pub struct ReminderScheduler {
    pool: DbPool,
    notifier: Notifier,
    config: ReminderConfig,
}

impl ReminderScheduler {
    pub fn new(pool: DbPool, notifier: Notifier, config: ReminderConfig) -> Self {
        Self { pool, notifier, config }
    }

    pub fn config(&self) -> &ReminderConfig {
        &self.config
    }

    /// Remind every eligible session in the window around `now`.
    pub async fn run_once(&self, now: Timestamp) -> Result<ReminderRunSummary, sqlx::Error> {
        let bounds = self.config.window.bounds(now, &self.config.tz);
        let candidates = SessionRepo::list_reminder_candidates(
            &self.pool,
            bounds.from,
            bounds.to,
            bounds.include_end,
            self.config.batch_size,
        )
        .await?;

        let mut summary = ReminderRunSummary::default();
        for candidate in &candidates {
            summary.processed += 1;

            let (student_ok, tutor_ok) = futures::future::join(
                self.remind(Audience::Student, candidate),
                self.remind(Audience::Tutor, candidate),
            )
            .await;

            if !student_ok && !tutor_ok {
                tracing::warn!(session_id = candidate.id, "No reminder delivered to either participant");
                summary.skipped += 1;
                continue;
            }

            match SessionRepo::mark_reminded(&self.pool, candidate.id, self.config.channel.as_str())
                .await
            {
                Ok(true) => {
                    summary.reminded += 1;
                    self.write_in_app(candidate).await;
                }
                Ok(false) => {
                    tracing::debug!(session_id = candidate.id, "Session already reminded by another run");
                    summary.skipped += 1;
                }
                Err(e) => {
                    tracing::error!(session_id = candidate.id, error = %e, "Failed to mark session reminded");
                    summary.skipped += 1;
                }
            }
        }

        if summary.processed > 0 {
            tracing::info!(
                processed = summary.processed,
                reminded = summary.reminded,
                skipped = summary.skipped,
                channel = %self.config.channel,
                "Reminder run finished"
            );
        }
        Ok(summary)
    }

    /// Run [`Self::run_once`] every `every` until `cancel` fires.
    pub async fn run(&self, every: StdDuration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(every);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Reminder scheduler stopping");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.run_once(Utc::now()).await {
                        tracing::error!(error = %e, "Reminder run failed");
                    }
                }
            }
        }
    }

    /// Send one participant's reminder. Returns `true` on delivery.
    async fn remind(&self, audience: Audience, c: &ReminderCandidate) -> bool {
        let (user_id, name, email, phone) = participant(audience, c);
        let details = details(c);

        match self.config.channel {
            ReminderChannel::Email => {
                let Some(to) = email.map(str::trim).filter(|e| !e.is_empty()) else {
                    tracing::warn!(session_id = c.id, user_id, "Participant has no email address");
                    return false;
                };
                let rendered = templates::reminder_email(audience, name, &details);
                let message = EmailMessage {
                    to: to.to_string(),
                    subject: rendered.subject,
                    html: rendered.html,
                    text: rendered.text,
                };
                match self.notifier.send_email(&message).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(session_id = c.id, user_id, error = %e, "Reminder email failed");
                        false
                    }
                }
            }
            ReminderChannel::Chat => {
                let body = templates::reminder_chat(audience, &details);
                match self.notifier.send_chat(phone, &body).await {
                    Ok(ChatOutcome::Sent) => true,
                    Ok(ChatOutcome::NoRecipient) => {
                        tracing::warn!(session_id = c.id, user_id, "Participant has no chat address");
                        false
                    }
                    Err(e) => {
                        tracing::warn!(session_id = c.id, user_id, error = %e, "Reminder chat failed");
                        false
                    }
                }
            }
        }
    }

    async fn write_in_app(&self, c: &ReminderCandidate) {
        let (title, body) = templates::reminder_notice(&details(c));
        for (user_id, kind) in [
            (c.student_id, KIND_SESSION_REMINDER_STUDENT),
            (c.tutor_id, KIND_SESSION_REMINDER_TUTOR),
        ] {
            let input = CreateNotification {
                user_id,
                kind: kind.to_string(),
                title: title.clone(),
                body: Some(body.clone()),
                session_id: Some(c.id),
                meta: serde_json::json!({
                    "via": self.config.channel.as_str(),
                    "starts_at": c.starts_at,
                    "meeting_link": c.meeting_link,
                }),
                delivered: true,
            };
            if let Err(e) = NotificationRepo::create(&self.pool, &input).await {
                tracing::warn!(session_id = c.id, user_id, error = %e, "Failed to write reminder notification");
            }
        }
    }
}

fn participant(
    audience: Audience,
    c: &ReminderCandidate,
) -> (DbId, Option<&str>, Option<&str>, Option<&str>) {
    match audience {
        Audience::Student => (
            c.student_id,
            c.student_name.as_deref(),
            c.student_email.as_deref(),
            c.student_phone.as_deref(),
        ),
        Audience::Tutor => (
            c.tutor_id,
            c.tutor_name.as_deref(),
            c.tutor_email.as_deref(),
            c.tutor_phone.as_deref(),
        ),
    }
}

fn details(c: &ReminderCandidate) -> SessionDetails<'_> {
    SessionDetails {
        subject: &c.subject,
        starts_at: Some(c.starts_at),
        meeting_link: Some(&c.meeting_link),
    }
}
