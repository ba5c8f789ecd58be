use chrono::{FixedOffset, Offset, Utc};
use educonnect_core::booking::{
    BookingPolicy, DEFAULT_SESSION_DURATION_MIN, DEFAULT_START_OFFSET_MIN,
    RESERVATION_DURATION_MIN,
};
use educonnect_events::{OutboxConfig, ReminderConfig};

use crate::auth::jwt::JwtConfig;

/// Default meeting room host.
pub const DEFAULT_MEETING_BASE_URL: &str = "https://meet.jit.si";

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on collaborator calls such as tutor matching (default: `10`).
    pub delivery_timeout_secs: u64,
    /// JWT validation settings.
    pub jwt: JwtConfig,
    /// Shared secret expected in `x-cron-secret`. Cron endpoints reject every
    /// call when unset.
    pub cron_secret: Option<String>,
    pub booking: BookingConfig,
    pub outbox: OutboxConfig,
    pub reminders: ReminderConfig,
}

/// Scheduling defaults for the booking flows.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Wall clock on which slot bands are read.
    pub slot_tz: FixedOffset,
    pub policy: BookingPolicy,
    /// Fixed length of a direct reservation.
    pub reservation_duration_min: i64,
    pub meeting_base_url: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            slot_tz: Utc.fix(),
            policy: BookingPolicy::default(),
            reservation_duration_min: RESERVATION_DURATION_MIN,
            meeting_base_url: DEFAULT_MEETING_BASE_URL.to_string(),
        }
    }
}

impl BookingConfig {
    /// | Env Var                        | Default               |
    /// |--------------------------------|-----------------------|
    /// | `SLOT_UTC_OFFSET_MINUTES`      | `0`                   |
    /// | `DEFAULT_START_OFFSET_MIN`     | `60`                  |
    /// | `DEFAULT_SESSION_DURATION_MIN` | `60`                  |
    /// | `RESERVATION_DURATION_MIN`     | `120`                 |
    /// | `MEETING_BASE_URL`             | `https://meet.jit.si` |
    pub fn from_env() -> Self {
        let offset_min: i32 = std::env::var("SLOT_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("SLOT_UTC_OFFSET_MINUTES must be a valid i32");
        let slot_tz = FixedOffset::east_opt(offset_min * 60)
            .expect("SLOT_UTC_OFFSET_MINUTES must be within +/- 24h");

        let default_start_offset_min: i64 = std::env::var("DEFAULT_START_OFFSET_MIN")
            .unwrap_or_else(|_| DEFAULT_START_OFFSET_MIN.to_string())
            .parse()
            .expect("DEFAULT_START_OFFSET_MIN must be a valid i64");

        let default_duration_min: i64 = std::env::var("DEFAULT_SESSION_DURATION_MIN")
            .unwrap_or_else(|_| DEFAULT_SESSION_DURATION_MIN.to_string())
            .parse()
            .expect("DEFAULT_SESSION_DURATION_MIN must be a valid i64");

        let reservation_duration_min: i64 = std::env::var("RESERVATION_DURATION_MIN")
            .unwrap_or_else(|_| RESERVATION_DURATION_MIN.to_string())
            .parse()
            .expect("RESERVATION_DURATION_MIN must be a valid i64");

        let meeting_base_url = std::env::var("MEETING_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_MEETING_BASE_URL.into());

        Self {
            slot_tz,
            policy: BookingPolicy {
                default_start_offset_min,
                default_duration_min,
            },
            reservation_duration_min,
            meeting_base_url,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `DELIVERY_TIMEOUT_SECS` | `10`                    |
    /// | `CRON_SECRET`           | unset                   |
    ///
    /// Nested sections read their own variables: [`JwtConfig::from_env`],
    /// [`BookingConfig::from_env`], [`OutboxConfig::from_env`] and
    /// [`ReminderConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(bad) = cors_origins
            .iter()
            .find(|o| o.parse::<axum::http::HeaderValue>().is_err())
        {
            panic!("Invalid CORS origin '{bad}'");
        }

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let delivery_timeout_secs: u64 = std::env::var("DELIVERY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("DELIVERY_TIMEOUT_SECS must be a valid u64");

        let cron_secret = std::env::var("CRON_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty());
        if cron_secret.is_none() {
            tracing::warn!("CRON_SECRET not set, job endpoints will reject every call");
        }

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            delivery_timeout_secs,
            jwt: JwtConfig::from_env(),
            cron_secret,
            booking: BookingConfig::from_env(),
            outbox: OutboxConfig::from_env(),
            reminders: ReminderConfig::from_env(),
        }
    }
}
