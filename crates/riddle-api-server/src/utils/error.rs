use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure modes of one completion call. A failed call aborts the turn
/// before any session mutation, so callers can retry against unchanged
/// room state.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("completion API returned no choices")]
    EmptyCompletion,

    #[error("completion API rejected the credential: {0}")]
    AuthenticationFailure(String),

    #[error("completion API call failed: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream authentication error: {0}")]
    UpstreamAuth(String),

    #[error("LLM error: {0}")]
    LlmError(String),
}

impl From<CompletionError> for ApiError {
    fn from(err: CompletionError) -> Self {
        match err {
            // Auth failures are actionable by the operator, keep them distinct.
            CompletionError::AuthenticationFailure(msg) => ApiError::UpstreamAuth(msg),
            CompletionError::EmptyCompletion => {
                ApiError::LlmError("no completion returned".to_string())
            }
            CompletionError::Transport(msg) => ApiError::LlmError(msg),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BadRequest", msg)
            }
            ApiError::UpstreamAuth(msg) => {
                tracing::error!("Upstream auth error: {}", msg);
                (StatusCode::BAD_GATEWAY, "UpstreamAuth", msg)
            }
            ApiError::LlmError(msg) => {
                tracing::error!("LLM error: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "LlmError", msg)
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}
