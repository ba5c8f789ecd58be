//! Chat delivery via the WhatsApp Cloud API.
//!
//! [`WhatsAppSender`] POSTs a text message to
//! `{api_base}/{phone_id}/messages` with a bearer token. Unlike webhook
//! delivery there is no in-process retry: a failed send is retried by the
//! next sweep run.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{ChatSender, DeliveryError};

/// Graph API base used when `WHATSAPP_API_BASE` is not set.
const DEFAULT_API_BASE: &str = "https://graph.facebook.com/v19.0";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("WhatsApp API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct WhatsAppConfig {
    pub token: Option<String>,
    pub phone_id: Option<String>,
    pub api_base: String,
    /// Recipient used when a profile has no phone number.
    pub test_to: Option<String>,
}

impl WhatsAppConfig {
    /// | Env Var              | Default                            |
    /// |----------------------|------------------------------------|
    /// | `WHATSAPP_TOKEN`     | --                                 |
    /// | `WHATSAPP_PHONE_ID`  | --                                 |
    /// | `WHATSAPP_API_BASE`  | `https://graph.facebook.com/v19.0` |
    /// | `WHATSAPP_TEST_TO`   | --                                 |
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            token: non_empty("WHATSAPP_TOKEN"),
            phone_id: non_empty("WHATSAPP_PHONE_ID"),
            api_base: non_empty("WHATSAPP_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.into()),
            test_to: non_empty("WHATSAPP_TEST_TO"),
        }
    }

    /// Both the token and the sending phone id are present.
    pub fn is_configured(&self) -> bool {
        self.token.is_some() && self.phone_id.is_some()
    }

    fn messages_url(&self) -> Option<String> {
        let phone_id = self.phone_id.as_deref()?;
        Some(format!("{}/{phone_id}/messages", self.api_base.trim_end_matches('/')))
    }
}

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

pub struct WhatsAppSender {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppSender {
    pub fn new(config: WhatsAppConfig, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self { client, config }
    }

    async fn post(&self, to: &str, body: &str) -> Result<(), ChatError> {
        let (Some(url), Some(token)) = (self.config.messages_url(), self.config.token.as_deref())
        else {
            tracing::info!(to, body, "WhatsApp not configured, logging only");
            return Ok(());
        };

        let payload = TextMessage {
            messaging_product: "whatsapp",
            to,
            kind: "text",
            text: TextBody { body },
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to, "WhatsApp message sent");
        Ok(())
    }
}

#[async_trait]
impl ChatSender for WhatsAppSender {
    async fn send_chat(&self, to: &str, body: &str) -> Result<(), DeliveryError> {
        self.post(to, body).await.map_err(DeliveryError::from)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
