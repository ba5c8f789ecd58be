//! Background sweeps for EduConnect.
//!
//! The worker runs the outbox processor, the session reminder scheduler and
//! the notification mailer on fixed intervals. Each sweep is also reachable
//! through the cron-protected `/api/v1/jobs/*` endpoints; deployments pick
//! whichever trigger suits them.

use std::time::Duration;

/// Default seconds between outbox runs.
pub const DEFAULT_OUTBOX_INTERVAL_SECS: u64 = 60;

/// Default seconds between reminder runs.
pub const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 300;

/// Default seconds between mailer runs.
pub const DEFAULT_MAILER_INTERVAL_SECS: u64 = 60;

/// Sweep cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    pub outbox_every: Duration,
    pub reminders_every: Duration,
    pub mailer_every: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            outbox_every: Duration::from_secs(DEFAULT_OUTBOX_INTERVAL_SECS),
            reminders_every: Duration::from_secs(DEFAULT_REMINDER_INTERVAL_SECS),
            mailer_every: Duration::from_secs(DEFAULT_MAILER_INTERVAL_SECS),
        }
    }
}

impl WorkerConfig {
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `OUTBOX_INTERVAL_SECS`   | `60`    |
    /// | `REMINDER_INTERVAL_SECS` | `300`   |
    /// | `MAILER_INTERVAL_SECS`   | `60`    |
    pub fn from_env() -> Self {
        let read = |name: &str, default: u64| {
            interval_secs(std::env::var(name).ok().as_deref(), default)
        };
        Self {
            outbox_every: read("OUTBOX_INTERVAL_SECS", DEFAULT_OUTBOX_INTERVAL_SECS),
            reminders_every: read("REMINDER_INTERVAL_SECS", DEFAULT_REMINDER_INTERVAL_SECS),
            mailer_every: read("MAILER_INTERVAL_SECS", DEFAULT_MAILER_INTERVAL_SECS),
        }
    }
}

/// Parse a positive number of seconds, falling back to `default`.
fn interval_secs(raw: Option<&str>, default: u64) -> Duration {
    let secs = raw
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_parsing() {
        assert_eq!(interval_secs(Some("15"), 60), Duration::from_secs(15));
        assert_eq!(interval_secs(Some(" 90 "), 60), Duration::from_secs(90));
        assert_eq!(interval_secs(None, 60), Duration::from_secs(60));
        // Zero would make `tokio::time::interval` panic.
        assert_eq!(interval_secs(Some("0"), 60), Duration::from_secs(60));
        assert_eq!(interval_secs(Some("soon"), 60), Duration::from_secs(60));
    }

    #[test]
    fn defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.outbox_every, Duration::from_secs(60));
        assert_eq!(config.reminders_every, Duration::from_secs(300));
        assert_eq!(config.mailer_every, Duration::from_secs(60));
    }
}
