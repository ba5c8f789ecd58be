//! Handlers for the `/requests` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use educonnect_core::error::CoreError;
use educonnect_core::notification_kinds::TOPIC_MATCH_PROPOSED;
use educonnect_core::slot::{normalize_slots, RawSlot};
use educonnect_core::status::MatchStatus;
use educonnect_core::types::DbId;
use educonnect_core::validation::{subject_slug, validate_mode, validate_subject};
use educonnect_db::models::request::{CreateRequest, TutoringRequest};
use educonnect_db::models::tutor_match::TutorCandidate;
use educonnect_db::repositories::{MatchRepo, OutboxRepo, RequestRepo};
use educonnect_db::DbPool;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::extract::ApiJson;
use crate::middleware::auth::AuthUser;
use crate::response::WarnedResponse;
use crate::state::AppState;

/// Warning returned when the request was saved but matching failed.
pub const WARNING_MATCHING_UNAVAILABLE: &str = "MATCHING_UNAVAILABLE";

/// Request body for `POST /requests`.
///
/// `slots` takes precedence; `time_slots` carries legacy labels such as
/// `"Mercredi (wed:evening)"`.
#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub subject: String,
    #[serde(default)]
    pub slots: Vec<RawSlot>,
    #[serde(default)]
    pub time_slots: Vec<String>,
    pub request_meta: Option<serde_json::Value>,
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedRequest {
    pub request: TutoringRequest,
    pub tutors: Vec<TutorCandidate>,
}

/// POST /api/v1/requests
///
/// Save a student's request, run tutor matching and queue a
/// `match.proposed` event for each proposed match.
pub async fn create_request(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateRequestBody>,
) -> AppResult<impl IntoResponse> {
    if !auth.is_student() {
        return Err(CoreError::Forbidden("Only students can create requests".into()).into());
    }

    let subject = validate_subject(&body.subject)?;
    let mode = validate_mode(body.mode.as_deref())?;
    let slots = normalize_slots(&body.slots, &body.time_slots);
    if slots.is_empty() {
        return Err(CoreError::Validation("At least one valid time slot is required".into()).into());
    }

    let request = RequestRepo::create(
        &state.pool,
        &CreateRequest {
            student_id: auth.user_id,
            subject_slug: subject_slug(&subject),
            subject,
            mode: mode.to_string(),
            slots,
            request_meta: body.request_meta,
        },
    )
    .await?;

    let (tutors, warning) = match state.matcher.match_tutors(request.id).await {
        Ok(tutors) => (tutors, None),
        Err(e) => {
            tracing::warn!(request_id = request.id, error = %e, "Tutor matching failed");
            (Vec::new(), Some(WARNING_MATCHING_UNAVAILABLE.to_string()))
        }
    };

    enqueue_proposals(&state.pool, request.id).await;

    tracing::info!(
        request_id = request.id,
        student_id = auth.user_id,
        candidates = tutors.len(),
        "Request created"
    );

    Ok((
        StatusCode::CREATED,
        Json(WarnedResponse {
            data: CreatedRequest { request, tutors },
            warning,
        }),
    ))
}

/// Queue a `match.proposed` event per proposed match. Failures are logged.
async fn enqueue_proposals(pool: &DbPool, request_id: DbId) {
    let proposed = match MatchRepo::list_for_request(pool, request_id, MatchStatus::Proposed).await
    {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(request_id, error = %e, "Failed to list proposed matches");
            return;
        }
    };

    for m in proposed {
        let payload = serde_json::json!({ "match_id": m.id });
        if let Err(e) = OutboxRepo::enqueue(pool, TOPIC_MATCH_PROPOSED, &payload).await {
            tracing::warn!(request_id, match_id = m.id, error = %e, "Failed to enqueue match proposal");
        }
    }
}
