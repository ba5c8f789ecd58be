//! Handlers for the `/matches` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use educonnect_core::types::{DbId, Timestamp};
use serde::Deserialize;

use crate::booking::Booking;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, WarnedResponse, WARNING_ALREADY_ACCEPTED};
use crate::state::AppState;

/// Request body for `POST /matches/{id}/accept`. Send `{}` for the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct AcceptMatchBody {
    pub starts_at: Option<Timestamp>,
    pub duration_min: Option<i64>,
}

/// 201 when this call created the session, 200 with a warning on a replay.
pub(crate) fn booking_response(booking: Booking) -> Response {
    if booking.created {
        (
            StatusCode::CREATED,
            Json(WarnedResponse {
                data: booking.session,
                warning: None,
            }),
        )
            .into_response()
    } else {
        (
            StatusCode::OK,
            Json(WarnedResponse {
                data: booking.session,
                warning: Some(WARNING_ALREADY_ACCEPTED.to_string()),
            }),
        )
            .into_response()
    }
}

/// POST /api/v1/matches/{id}/accept
pub async fn accept_match(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiPath(match_id): ApiPath<DbId>,
    ApiJson(body): ApiJson<AcceptMatchBody>,
) -> AppResult<Response> {
    let booking = state
        .booking
        .accept_match(auth.user_id, match_id, body.starts_at, body.duration_min)
        .await?;
    Ok(booking_response(booking))
}

/// POST /api/v1/matches/{id}/decline
pub async fn decline_match(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiPath(match_id): ApiPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let declined = state.booking.decline_match(auth.user_id, match_id).await?;
    Ok(Json(DataResponse { data: declined }))
}
