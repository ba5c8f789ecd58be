//! Authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use educonnect_core::error::CoreError;
use educonnect_core::roles::ROLE_STUDENT;
use educonnect_core::types::DbId;
use subtle::ConstantTimeEq;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the scheduler's shared secret.
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

fn unauthenticated(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.to_owned()))
}

/// Caller identity taken from the `Authorization: Bearer <jwt>` header.
///
/// Handlers take it as an argument; a missing or bad token short-circuits
/// with 401 `UNAUTHENTICATED` before the handler runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Profile id from `claims.sub`.
    pub user_id: DbId,
    pub role: String,
}

impl AuthUser {
    pub fn is_student(&self) -> bool {
        self.role == ROLE_STUDENT
    }
}

/// Extract the token from an `Authorization` header value. The scheme is
/// matched case-insensitively.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| unauthenticated("Missing Authorization header"))?
            .to_str()
            .map_err(|_| unauthenticated("Authorization header is not valid ASCII"))?;

        let token = bearer_token(header)
            .ok_or_else(|| unauthenticated("Expected: Authorization: Bearer <token>"))?;

        let claims = validate_token(token, &state.config.jwt).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            unauthenticated("Invalid or expired token")
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

/// Guard for scheduler-triggered job endpoints.
///
/// Accepts the request only when `x-cron-secret` equals the configured
/// `CRON_SECRET`. With no secret configured every call is rejected.
#[derive(Debug, Clone, Copy)]
pub struct CronAuth;

impl FromRequestParts<AppState> for CronAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.cron_secret.as_deref() else {
            return Err(unauthenticated("Job endpoints are disabled"));
        };

        let provided = parts
            .headers
            .get(CRON_SECRET_HEADER)
            .map(|v| v.as_bytes())
            .unwrap_or_default();

        if !secrets_match(provided, expected.as_bytes()) {
            return Err(unauthenticated("Invalid cron secret"));
        }

        Ok(CronAuth)
    }
}

/// Compare in time independent of where the inputs first differ. Only a
/// length mismatch returns early.
fn secrets_match(provided: &[u8], expected: &[u8]) -> bool {
    bool::from(provided.ct_eq(expected))
}
