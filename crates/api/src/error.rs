use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use educonnect_core::error::CoreError;
use serde::Serialize;

/// Partial unique index allowing a single accepted match per request.
const ONE_ACCEPTED_PER_REQUEST: &str = "uq_matches_one_accepted_per_request";

/// PostgreSQL `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Error returned by every HTTP handler.
///
/// Domain failures arrive as [`CoreError`], storage failures as
/// [`sqlx::Error`]. The response body is always `{"error": ..., "code": ...}`
/// and internal details never leave the process.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed input caught before reaching the domain layer.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

/// Status, machine code and client-facing message for one error.
struct Rendered {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl Rendered {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// Log the detail, hand the client a fixed message.
    fn internal(detail: &dyn std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Request failed with an internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            INTERNAL_MESSAGE,
        )
    }
}

impl AppError {
    fn render(&self) -> Rendered {
        match self {
            AppError::Core(core) => render_core(core),
            AppError::Database(err) => render_sqlx(err),
            AppError::BadRequest(msg) => {
                Rendered::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.as_str())
            }
            AppError::InternalError(msg) => Rendered::internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let Rendered {
            status,
            code,
            message,
        } = self.render();
        (
            status,
            Json(ErrorBody {
                error: message,
                code,
            }),
        )
            .into_response()
    }
}

fn render_core(err: &CoreError) -> Rendered {
    use StatusCode as S;

    match err {
        CoreError::NotFound { entity, id } => {
            Rendered::new(S::NOT_FOUND, "NOT_FOUND", format!("{entity} with id {id} not found"))
        }
        CoreError::Validation(msg) => {
            Rendered::new(S::BAD_REQUEST, "VALIDATION_ERROR", msg.as_str())
        }
        CoreError::Unauthorized(msg) => {
            Rendered::new(S::UNAUTHORIZED, "UNAUTHENTICATED", msg.as_str())
        }
        CoreError::Forbidden(msg) => Rendered::new(S::FORBIDDEN, "FORBIDDEN", msg.as_str()),
        CoreError::Conflict(msg) => Rendered::new(S::CONFLICT, "CONFLICT", msg.as_str()),
        CoreError::InvalidState(msg) => Rendered::new(S::CONFLICT, "INVALID_STATE", msg.as_str()),
        CoreError::Internal(msg) => Rendered::internal(msg),
    }
}

/// `RowNotFound` is a 404. Unique violations are 409, with the
/// one-accepted-match index getting its own code. Anything else is a 500.
fn render_sqlx(err: &sqlx::Error) -> Rendered {
    let db_err = match err {
        sqlx::Error::RowNotFound => {
            return Rendered::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found");
        }
        sqlx::Error::Database(db_err) => db_err,
        other => return Rendered::internal(other),
    };

    if db_err.code().as_deref() != Some(PG_UNIQUE_VIOLATION) {
        return Rendered::internal(db_err);
    }

    match db_err.constraint() {
        Some(ONE_ACCEPTED_PER_REQUEST) => Rendered::new(
            StatusCode::CONFLICT,
            "CONFLICT_ALREADY_ACCEPTED",
            "Another tutor has already been accepted for this request",
        ),
        Some(constraint) if constraint.starts_with("uq_") => Rendered::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
        ),
        _ => Rendered::internal(db_err),
    }
}
