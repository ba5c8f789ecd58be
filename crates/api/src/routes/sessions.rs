//! Route definitions for the `/sessions` resource.
//!
//! All endpoints require authentication and participation in the session.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Routes mounted at `/sessions`.
///
/// ```text
/// GET    /{id}                      -> get_session
/// PATCH  /{id}                      -> update_session
/// POST   /{id}/rating               -> rate_session (student only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(sessions::get_session).patch(sessions::update_session),
        )
        .route("/{id}/rating", post(sessions::rate_session))
}
