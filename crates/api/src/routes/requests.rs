use axum::routing::post;
use axum::Router;

use crate::handlers::requests;
use crate::state::AppState;

/// Routes mounted at `/requests`.
///
/// ```text
/// POST   /                          -> create_request
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(requests::create_request))
}
