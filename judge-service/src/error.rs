//! HTTP-facing error type. Maps the request-rejection and host-level-fault
//! tiers from `spec.md` §7 onto status codes; per-test and adapter-internal
//! failures never construct this type — those are absorbed into `Verdict`s
//! by the orchestrator and still return `200`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug)]
pub enum AppError {
    /// Tier 1: request-rejection (validator failure, missing source, unknown
    /// language tag, malformed test case shape, disallowed file reference).
    Validation(String),
    /// Tier 4: host-level fault. The correlation id has already been logged
    /// server-side; only it is returned to the caller.
    Internal(Uuid),
}

impl AppError {
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        let correlation_id = Uuid::new_v4();
        log::error!("[{}] {}: {}", correlation_id, context, err);
        AppError::Internal(correlation_id)
    }
}

impl From<judge::Error> for AppError {
    fn from(err: judge::Error) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(reason) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": reason }))).into_response()
            }
            AppError::Internal(correlation_id) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error", "correlation_id": correlation_id })),
            )
                .into_response(),
        }
    }
}
