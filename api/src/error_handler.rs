use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use repo_context_engine::RepoContextError;
use thiserror::Error;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
///
/// Validation errors intentionally carry a generic message: field-level
/// detail stays out of the response body so internals do not leak.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("startup error: {0}")]
    Startup(String),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Platform authentication failed; the client must end the session
    /// and sign the user out.
    #[error("authentication with the git platform failed")]
    Unauthorized,

    /// LLM provider failure after the fallback-prompt path was exhausted.
    #[error("text generation failed: {0}")]
    UpstreamLlm(String),

    /// Required platform step failed (detail fetch, resolution transport).
    #[error("repository context failed: {0}")]
    Context(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // startup-only
            AppError::MissingEnv(_) | AppError::Startup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 4xx
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,

            // 5xx
            AppError::UpstreamLlm(_) | AppError::Context(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingEnv(_) => "MISSING_ENV",
            AppError::Startup(_) => "STARTUP_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::UpstreamLlm(_) => "UPSTREAM_LLM_ERROR",
            AppError::Context(_) => "CONTEXT_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            // Generic by design.
            AppError::BadRequest(_) => "Invalid request.".into(),
            AppError::Unauthorized => {
                "Your git platform session is no longer valid. Please sign in again.".into()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        ApiResponse::<()>::error(self.error_code(), self.public_message())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Convert common Axum rejections to `AppError`.
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Map context-engine failures onto HTTP semantics.
///
/// A 401 anywhere, or a failed GitLab project resolution, terminates the
/// session (401 + sign-out). Everything else that reaches this conversion
/// was a required step and surfaces as a 500.
impl From<RepoContextError> for AppError {
    fn from(err: RepoContextError) -> Self {
        if err.ends_session() {
            AppError::Unauthorized
        } else {
            AppError::Context(err.to_string())
        }
    }
}

impl From<ai_llm_service::AiLlmError> for AppError {
    fn from(err: ai_llm_service::AiLlmError) -> Self {
        AppError::UpstreamLlm(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_context_engine::PlatformError;

    #[test]
    fn auth_failures_force_a_sign_out() {
        let err: AppError = RepoContextError::Platform(PlatformError::Unauthorized).into();
        assert!(matches!(err, AppError::Unauthorized));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn failed_project_resolution_forces_a_sign_out() {
        let err: AppError =
            RepoContextError::Platform(PlatformError::ProjectResolution("no match".into())).into();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[test]
    fn other_platform_failures_are_internal_errors() {
        let err: AppError = RepoContextError::Platform(PlatformError::Server(502)).into();
        assert!(matches!(err, AppError::Context(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bad_request_message_is_generic() {
        let err = AppError::BadRequest("history[3].role was 'wizard'".into());
        assert_eq!(err.public_message(), "Invalid request.");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
