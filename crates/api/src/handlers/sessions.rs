//! Handlers for the `/sessions` resource.
//!
//! Only the session's student and tutor may read or edit it; only the
//! student may rate it.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use educonnect_core::booking::reschedule;
use educonnect_core::error::CoreError;
use educonnect_core::types::{DbId, Timestamp};
use educonnect_core::validation::{validate_meeting_link, validate_mode, validate_rating};
use educonnect_db::models::rating::UpsertRating;
use educonnect_db::models::session::{Session, UpdateSession};
use educonnect_db::repositories::{RatingRepo, SessionRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Request body for `PATCH /sessions/{id}`. At least one field is required.
#[derive(Debug, Deserialize)]
pub struct UpdateSessionBody {
    pub starts_at: Option<Timestamp>,
    pub meeting_link: Option<String>,
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RateSessionBody {
    pub rating: i16,
    pub comment: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a session the caller takes part in.
async fn load_for_participant(
    state: &AppState,
    session_id: DbId,
    user_id: DbId,
) -> AppResult<Session> {
    let session = SessionRepo::find_by_id(&state.pool, session_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Session",
            id: session_id,
        })?;
    if !session.is_participant(user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You are not a participant of this session".into(),
        )));
    }
    Ok(session)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/sessions/{id}
pub async fn get_session(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let session = load_for_participant(&state, session_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: session }))
}

/// PATCH /api/v1/sessions/{id}
///
/// Moving `starts_at` keeps the duration and re-derives the slot code. The
/// reminder flag is left as is.
pub async fn update_session(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<DbId>,
    ApiJson(body): ApiJson<UpdateSessionBody>,
) -> AppResult<impl IntoResponse> {
    if body.starts_at.is_none() && body.meeting_link.is_none() && body.mode.is_none() {
        return Err(AppError::Core(CoreError::Validation(
            "Provide at least one of starts_at, meeting_link or mode".into(),
        )));
    }

    let session = load_for_participant(&state, session_id, auth.user_id).await?;

    let mut update = UpdateSession::default();
    if let Some(new_start) = body.starts_at {
        let bounds = reschedule(
            (session.starts_at, session.ends_at),
            new_start,
            &state.config.booking.slot_tz,
        );
        update.starts_at = Some(bounds.starts_at);
        update.ends_at = Some(bounds.ends_at);
        update.slot_code = Some(bounds.slot.code());
    }
    if let Some(link) = body.meeting_link.as_deref() {
        validate_meeting_link(link)?;
        update.meeting_link = Some(link.trim().to_string());
    }
    if let Some(mode) = body.mode.as_deref() {
        update.mode = Some(validate_mode(Some(mode))?.to_string());
    }

    let updated = SessionRepo::update(&state.pool, session_id, &update)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Session",
            id: session_id,
        })?;

    tracing::info!(session_id, user_id = auth.user_id, "Session updated");
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/sessions/{id}/rating
///
/// Create or overwrite the student's rating once the session has ended.
pub async fn rate_session(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<DbId>,
    ApiJson(body): ApiJson<RateSessionBody>,
) -> AppResult<impl IntoResponse> {
    let session = SessionRepo::find_by_id(&state.pool, session_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Session",
            id: session_id,
        })?;
    if session.student_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the session's student can rate it".into(),
        )));
    }

    let comment = body
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    validate_rating(body.rating, comment, session.ends_at, Utc::now())?;

    let rating = RatingRepo::upsert(
        &state.pool,
        &UpsertRating {
            session_id,
            student_id: session.student_id,
            tutor_id: session.tutor_id,
            rating: body.rating,
            comment: comment.map(str::to_string),
        },
    )
    .await?;

    tracing::info!(session_id, rating = body.rating, "Session rated");
    Ok(Json(DataResponse { data: rating }))
}
