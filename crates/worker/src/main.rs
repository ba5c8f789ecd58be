use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use educonnect_events::{
    NotificationMailer, Notifier, OutboxConfig, OutboxProcessor, ReminderConfig, ReminderScheduler,
};
use educonnect_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "educonnect_worker=debug,educonnect_events=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();
    tracing::info!(?config, "Loaded worker configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = educonnect_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    educonnect_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database connection pool created");

    // --- Sweeps ---
    let notifier = Notifier::from_env();
    let cancel = CancellationToken::new();

    let outbox = OutboxProcessor::new(pool.clone(), notifier.clone(), OutboxConfig::from_env());
    let outbox_cancel = cancel.clone();
    let outbox_handle = tokio::spawn(async move {
        outbox.run(config.outbox_every, outbox_cancel).await;
    });

    let reminders =
        ReminderScheduler::new(pool.clone(), notifier.clone(), ReminderConfig::from_env());
    let reminders_cancel = cancel.clone();
    let reminders_handle = tokio::spawn(async move {
        reminders.run(config.reminders_every, reminders_cancel).await;
    });

    let mailer = NotificationMailer::new(pool, notifier);
    let mailer_cancel = cancel.clone();
    let mailer_handle = tokio::spawn(async move {
        mailer.run(config.mailer_every, mailer_cancel).await;
    });

    tracing::info!("Worker started (outbox, session reminders, email dispatch)");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to install Ctrl-C handler")?;
    tracing::info!("Received SIGINT (Ctrl-C), stopping sweeps");

    cancel.cancel();
    for (name, handle) in [
        ("outbox", outbox_handle),
        ("reminders", reminders_handle),
        ("mailer", mailer_handle),
    ] {
        if tokio::time::timeout(Duration::from_secs(10), handle).await.is_err() {
            tracing::warn!(sweep = name, "Sweep did not stop in time");
        }
    }

    tracing::info!("Worker stopped");
    Ok(())
}
