use axum::routing::post;
use axum::Router;

use crate::handlers::reservations;
use crate::state::AppState;

/// Routes mounted at `/reservations`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(reservations::create_reservation))
}
