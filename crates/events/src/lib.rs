//! EduConnect notification delivery.
//!
//! - [`delivery`]: email and chat transports behind [`Notifier`].
//! - [`OutboxProcessor`]: drains `notification_outbox` with bounded retry.
//! - [`ReminderScheduler`]: one-time reminders for upcoming sessions.
//! - [`NotificationMailer`]: emails undelivered in-app confirmations.
//!
//! Each sweep exposes `run_once` for cron-triggered invocation and `run`
//! for an in-process interval loop.

pub mod delivery;
pub mod mailer;
pub mod outbox;
pub mod reminders;
pub mod templates;

pub use delivery::{ChatSender, DeliveryError, EmailMessage, EmailSender, LogOnlySender, Notifier};
pub use mailer::{MailError, MailerRunSummary, NotificationMailer};
pub use outbox::{OutboxConfig, OutboxProcessor, OutboxRunSummary, OutboxTopic};
pub use reminders::{
    ReminderBounds, ReminderChannel, ReminderConfig, ReminderRunSummary, ReminderScheduler,
    ReminderWindow,
};
