pub mod health;
pub mod jobs;
pub mod matches;
pub mod notifications;
pub mod requests;
pub mod reservations;
pub mod sessions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /requests                                         create + match (student)
///
/// /matches/{id}/accept                              accept, schedule session
/// /matches/{id}/decline                             decline (tutor)
///
/// /reservations                                     book a tutor directly
///
/// /sessions/{id}                                    get, reschedule (participants)
/// /sessions/{id}/rating                             rate (student, after the end)
///
/// /notifications                                    list (last 7 days)
/// /notifications/unread-count                       unread count
/// /notifications/seen                               mark seen (POST)
/// /notifications/{id}/read                          mark read (POST)
///
/// /jobs/outbox                                      outbox sweep (cron secret)
/// /jobs/session-reminders                           reminder sweep (cron secret)
/// /jobs/email-dispatch                              mailer sweep (cron secret)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/requests", requests::router())
        .nest("/matches", matches::router())
        .nest("/reservations", reservations::router())
        .nest("/sessions", sessions::router())
        .nest("/notifications", notifications::router())
        .nest("/jobs", jobs::router())
}
