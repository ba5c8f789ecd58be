//! Cron-triggered sweep endpoints.
//!
//! Each call runs one pass of a sweep and returns its summary. Requests
//! without the shared `x-cron-secret` are rejected before any work.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use educonnect_events::{
    MailerRunSummary, NotificationMailer, OutboxProcessor, OutboxRunSummary, ReminderRunSummary,
    ReminderScheduler,
};

use crate::error::AppResult;
use crate::middleware::auth::CronAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/jobs/outbox
pub async fn run_outbox(
    _cron: CronAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<OutboxRunSummary>>> {
    let processor =
        OutboxProcessor::new(state.pool.clone(), state.notifier.clone(), state.config.outbox);
    let summary = processor.run_once().await?;
    Ok(Json(DataResponse { data: summary }))
}

/// POST /api/v1/jobs/session-reminders
pub async fn run_session_reminders(
    _cron: CronAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ReminderRunSummary>>> {
    let scheduler =
        ReminderScheduler::new(state.pool.clone(), state.notifier.clone(), state.config.reminders);
    let summary = scheduler.run_once(Utc::now()).await?;
    Ok(Json(DataResponse { data: summary }))
}

/// POST /api/v1/jobs/email-dispatch
pub async fn run_email_dispatch(
    _cron: CronAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MailerRunSummary>>> {
    let mailer = NotificationMailer::new(state.pool.clone(), state.notifier.clone());
    let summary = mailer.run_once().await?;
    Ok(Json(DataResponse { data: summary }))
}
