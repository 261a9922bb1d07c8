//! Crate-wide error hierarchy for repo-context-engine.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type RepoContextResult<T> = Result<T, RepoContextError>;

/// Root error type for the repo-context-engine crate.
#[derive(Debug, Error)]
pub enum RepoContextError {
    /// Platform (GitHub/GitLab) related failure.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// JSON serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration problems (bad/missing tokens, base URL, etc.).
    #[error(transparent)]
    Config(#[from] PlatformConfigError),

    /// Input validation errors (bad repository ids, unsupported formats).
    #[error("validation error: {0}")]
    Validation(String),

    /// Generic catch-all error when nothing else fits.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RepoContextError {
    /// True when the underlying cause is an HTTP 401 from the platform.
    ///
    /// Callers must treat this as an authentication failure that ends the
    /// session (forced sign-out).
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            RepoContextError::Platform(PlatformError::Unauthorized)
        )
    }

    /// True for failures that must terminate the user's session instead of
    /// degrading to a fallback prompt: a 401 anywhere, or a failed project
    /// identity resolution.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            RepoContextError::Platform(PlatformError::Unauthorized)
                | RepoContextError::Platform(PlatformError::ProjectResolution(_))
        )
    }
}

/// Platform-specific error used inside the adapter layer.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited {
        /// Optional `Retry-After` hint in seconds when available.
        retry_after_secs: Option<u64>,
    },

    /// Gateway / server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other HTTP status (non-2xx) not covered by specific variants.
    #[error("http status error: status {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected/invalid shape of platform response.
    #[error("invalid platform response: {0}")]
    InvalidResponse(String),

    /// GitLab project search returned no usable match.
    #[error("project resolution failed: {0}")]
    ProjectResolution(String),
}

/// Configuration and setup errors (base API URL, missing token, etc.).
#[derive(Debug, Error)]
pub enum PlatformConfigError {
    /// Missing required platform access token.
    #[error("missing platform token")]
    MissingToken,

    /// Invalid base API URL.
    #[error("invalid base api url: {0}")]
    InvalidBaseUrl(String),

    /// Unknown platform name in configuration or request headers.
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
}

// ===== Conversions for `?` ergonomics at the crate root =====

impl From<reqwest::Error> for RepoContextError {
    fn from(e: reqwest::Error) -> Self {
        RepoContextError::Platform(PlatformError::from(e))
    }
}

// ===== Mapping from reqwest::Error into PlatformError =====

impl From<reqwest::Error> for PlatformError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return PlatformError::Timeout;
        }

        if let Some(status) = e.status() {
            let code = status.as_u16();
            return match code {
                401 => PlatformError::Unauthorized,
                403 => PlatformError::Forbidden,
                404 => PlatformError::NotFound,
                429 => PlatformError::RateLimited {
                    retry_after_secs: None,
                },
                500..=599 => PlatformError::Server(code),
                _ => PlatformError::HttpStatus(code),
            };
        }

        PlatformError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_detected_through_the_root_error() {
        let err = RepoContextError::Platform(PlatformError::Unauthorized);
        assert!(err.is_unauthorized());

        let err = RepoContextError::Platform(PlatformError::Server(502));
        assert!(!err.is_unauthorized());
    }
}
