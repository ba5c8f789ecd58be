use axum::routing::post;
use axum::Router;

use crate::handlers::matches;
use crate::state::AppState;

/// Routes mounted at `/matches`.
///
/// ```text
/// POST   /{id}/accept               -> accept_match (request's student)
/// POST   /{id}/decline              -> decline_match (proposed tutor)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/accept", post(matches::accept_match))
        .route("/{id}/decline", post(matches::decline_match))
}
