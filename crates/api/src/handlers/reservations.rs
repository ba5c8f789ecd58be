//! Handler for direct tutor reservations.

use axum::extract::State;
use axum::response::Response;
use educonnect_core::types::{DbId, Timestamp};
use serde::Deserialize;

use super::matches::booking_response;
use crate::error::AppResult;
use crate::extract::ApiJson;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReserveBody {
    pub request_id: DbId,
    pub tutor_id: DbId,
    pub starts_at: Option<Timestamp>,
}

/// POST /api/v1/reservations
///
/// Book a tutor for one of the caller's requests without waiting for a
/// proposal. Replays return the existing session with a warning.
pub async fn create_reservation(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ReserveBody>,
) -> AppResult<Response> {
    let booking = state
        .booking
        .reserve(auth.user_id, body.request_id, body.tutor_id, body.starts_at)
        .await?;
    Ok(booking_response(booking))
}
