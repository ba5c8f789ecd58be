//! Outbound notification transports.
//!
//! Two independently failable channels sit behind object-safe traits:
//! [`EmailSender`] (SMTP in production) and [`ChatSender`] (WhatsApp Cloud
//! API). [`Notifier`] bundles one of each, bounds every send with a timeout
//! and resolves chat recipients. When a transport is not configured the
//! [`LogOnlySender`] stands in, logging the message and reporting success.

pub mod email;
pub mod whatsapp;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use email::{EmailConfig, EmailError, SmtpEmailSender};
pub use whatsapp::{ChatError, WhatsAppConfig, WhatsAppSender};

/// Default upper bound for a single transport call.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Failure of a single delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}

// ---------------------------------------------------------------------------
// Messages and traits
// ---------------------------------------------------------------------------

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), DeliveryError>;
}

#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_chat(&self, to: &str, body: &str) -> Result<(), DeliveryError>;
}

/// Stand-in transport for unconfigured environments.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlySender;

#[async_trait]
impl EmailSender for LogOnlySender {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        tracing::info!(to = %message.to, subject = %message.subject, "Email transport not configured, logging only");
        Ok(())
    }
}

#[async_trait]
impl ChatSender for LogOnlySender {
    async fn send_chat(&self, to: &str, body: &str) -> Result<(), DeliveryError> {
        tracing::info!(to, body, "Chat transport not configured, logging only");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Outcome of a chat send that may have had no recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    Sent,
    NoRecipient,
}

/// Both transports plus the policy shared by every sweep.
#[derive(Clone)]
pub struct Notifier {
    email: Arc<dyn EmailSender>,
    chat: Arc<dyn ChatSender>,
    /// Recipient used when a profile has no chat address.
    chat_fallback_to: Option<String>,
    timeout: Duration,
}

impl Notifier {
    pub fn new(email: Arc<dyn EmailSender>, chat: Arc<dyn ChatSender>) -> Self {
        Self {
            email,
            chat,
            chat_fallback_to: None,
            timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_chat_fallback(mut self, to: Option<String>) -> Self {
        self.chat_fallback_to = to.filter(|t| !t.trim().is_empty());
        self
    }

    /// Build transports from the environment.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `DELIVERY_TIMEOUT_SECS`  | `10`    |
    ///
    /// SMTP and WhatsApp settings are read by [`EmailConfig::from_env`] and
    /// [`WhatsAppConfig::from_env`]; a missing transport falls back to
    /// [`LogOnlySender`].
    ///
    /// # Panics
    ///
    /// Panics if `SMTP_HOST` is set but the SMTP settings are unusable.
    pub fn from_env() -> Self {
        let timeout = std::env::var("DELIVERY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_DELIVERY_TIMEOUT);

        let email: Arc<dyn EmailSender> = match EmailConfig::from_env() {
            Some(config) => {
                let host = config.smtp_host.clone();
                let sender = SmtpEmailSender::new(config)
                    .unwrap_or_else(|e| panic!("Invalid SMTP settings for '{host}': {e}"));
                tracing::info!(%host, "SMTP email transport enabled");
                Arc::new(sender)
            }
            None => {
                tracing::warn!("SMTP_HOST not set, emails will only be logged");
                Arc::new(LogOnlySender)
            }
        };

        let whatsapp = WhatsAppConfig::from_env();
        let fallback = whatsapp.test_to.clone();
        let chat: Arc<dyn ChatSender> = if whatsapp.is_configured() {
            tracing::info!("WhatsApp chat transport enabled");
            Arc::new(WhatsAppSender::new(whatsapp, timeout))
        } else {
            tracing::warn!("WhatsApp credentials not set, chat messages will only be logged");
            Arc::new(LogOnlySender)
        };

        Self::new(email, chat)
            .with_timeout(timeout)
            .with_chat_fallback(fallback)
    }

    /// Send an email, bounded by the delivery timeout.
    pub async fn send_email(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        match tokio::time::timeout(self.timeout, self.email.send_email(message)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(self.timeout)),
        }
    }

    /// Send a chat message to `to`, or to the fallback recipient when `to`
    /// is missing. Reports [`ChatOutcome::NoRecipient`] when neither exists.
    pub async fn send_chat(&self, to: Option<&str>, body: &str) -> Result<ChatOutcome, DeliveryError> {
        let Some(recipient) = self.chat_recipient(to) else {
            return Ok(ChatOutcome::NoRecipient);
        };
        match tokio::time::timeout(self.timeout, self.chat.send_chat(recipient, body)).await {
            Ok(result) => result.map(|()| ChatOutcome::Sent),
            Err(_) => Err(DeliveryError::Timeout(self.timeout)),
        }
    }

    fn chat_recipient<'a>(&'a self, to: Option<&'a str>) -> Option<&'a str> {
        to.map(str::trim)
            .filter(|t| !t.is_empty())
            .or(self.chat_fallback_to.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;

    #[derive(Default)]
    struct RecordingChat {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatSender for RecordingChat {
        async fn send_chat(&self, to: &str, _body: &str) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(to.to_string());
            Ok(())
        }
    }

    struct SlowEmail;

    #[async_trait]
    impl EmailSender for SlowEmail {
        async fn send_email(&self, _message: &EmailMessage) -> Result<(), DeliveryError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: "awa@example.com".into(),
            subject: "Hi".into(),
            html: "<p>Hi</p>".into(),
            text: "Hi".into(),
        }
    }

    #[tokio::test]
    async fn chat_uses_fallback_recipient() {
        let chat = Arc::new(RecordingChat::default());
        let notifier = Notifier::new(Arc::new(LogOnlySender), chat.clone())
            .with_chat_fallback(Some("+22370000000".into()));

        assert_eq!(
            notifier.send_chat(None, "hello").await.unwrap(),
            ChatOutcome::Sent
        );
        assert_eq!(
            notifier.send_chat(Some("  +22371111111 "), "hello").await.unwrap(),
            ChatOutcome::Sent
        );
        assert_eq!(
            *chat.sent.lock().unwrap(),
            vec!["+22370000000".to_string(), "+22371111111".to_string()]
        );
    }

    #[tokio::test]
    async fn chat_without_any_recipient_is_skipped() {
        let chat = Arc::new(RecordingChat::default());
        let notifier = Notifier::new(Arc::new(LogOnlySender), chat.clone());

        assert_eq!(
            notifier.send_chat(Some("  "), "hello").await.unwrap(),
            ChatOutcome::NoRecipient
        );
        assert!(chat.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn slow_transport_times_out() {
        let notifier = Notifier::new(Arc::new(SlowEmail), Arc::new(LogOnlySender))
            .with_timeout(Duration::from_millis(50));
        assert_matches!(
            notifier.send_email(&message()).await,
            Err(DeliveryError::Timeout(_))
        );
    }

    #[tokio::test]
    async fn log_only_reports_success() {
        let notifier = Notifier::new(Arc::new(LogOnlySender), Arc::new(LogOnlySender));
        assert!(notifier.send_email(&message()).await.is_ok());
    }
}
