//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`] and only ever touch
//! the caller's own rows.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use educonnect_core::error::CoreError;
use educonnect_core::types::DbId;
use educonnect_db::repositories::NotificationRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// How far back the notification centre looks.
const LOOKBACK_DAYS: i64 = 7;

/// Maximum rows returned by the listing.
const LIST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct MarkSeenBody {
    pub ids: Vec<DbId>,
}

/// GET /api/v1/notifications
///
/// Last week's notifications, unseen first, then newest first.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let since = Utc::now() - Duration::days(LOOKBACK_DAYS);
    let notifications =
        NotificationRepo::list_recent_for_user(&state.pool, auth.user_id, since, LIST_LIMIT)
            .await?;

    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "data": { "count": count }
    })))
}

/// POST /api/v1/notifications/{id}/read
///
/// Returns 204 No Content on success, or 404 if the notification does not
/// belong to the caller.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiPath(notification_id): ApiPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = NotificationRepo::mark_read(&state.pool, notification_id, auth.user_id).await?;

    if !found {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id: notification_id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/seen
///
/// Stamp `seen_at` on the given notifications. Returns how many changed.
pub async fn mark_seen(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<MarkSeenBody>,
) -> AppResult<Json<serde_json::Value>> {
    if body.ids.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "ids must contain at least one notification id".into(),
        )));
    }

    let count = NotificationRepo::mark_seen(&state.pool, auth.user_id, &body.ids).await?;

    Ok(Json(serde_json::json!({
        "data": { "marked_seen": count }
    })))
}
