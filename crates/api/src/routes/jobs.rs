//! Route definitions for cron-triggered sweeps.
//!
//! Guarded by the `x-cron-secret` header rather than a user token.

use axum::routing::post;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// POST   /outbox                    -> run_outbox
/// POST   /session-reminders         -> run_session_reminders
/// POST   /email-dispatch            -> run_email_dispatch
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/outbox", post(jobs::run_outbox))
        .route("/session-reminders", post(jobs::run_session_reminders))
        .route("/email-dispatch", post(jobs::run_email_dispatch))
}
