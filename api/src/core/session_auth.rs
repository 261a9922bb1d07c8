use axum::http::HeaderMap;
use repo_context_engine::platforms::PlatformKind;

use crate::error_handler::{AppError, AppResult};

/// Per-request platform credentials from the authenticated session.
///
/// The OAuth flow itself lives outside this service; by the time a request
/// arrives here the session layer has already put the platform access
/// token and platform name on the request.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    pub access_token: String,
    pub platform: PlatformKind,
}

impl SessionAuth {
    /// Reads `Authorization: Bearer <token>` and `X-Git-Platform` headers.
    ///
    /// Missing or malformed values are a validation failure (400 with a
    /// generic message), not an auth failure: the client never attached a
    /// session, so there is nothing to sign out of.
    pub fn from_headers(headers: &HeaderMap) -> AppResult<Self> {
        let access_token = headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest("missing access token".into()))?
            .to_string();

        let platform = headers
            .get("X-Git-Platform")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::BadRequest("missing platform header".into()))?
            .parse::<PlatformKind>()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        Ok(Self {
            access_token,
            platform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(token: Option<&str>, platform: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(t) = token {
            map.insert("Authorization", HeaderValue::from_str(t).unwrap());
        }
        if let Some(p) = platform {
            map.insert("X-Git-Platform", HeaderValue::from_str(p).unwrap());
        }
        map
    }

    #[test]
    fn bearer_token_and_platform_are_extracted() {
        let auth =
            SessionAuth::from_headers(&headers(Some("Bearer tok-123"), Some("gitlab"))).unwrap();
        assert_eq!(auth.access_token, "tok-123");
        assert_eq!(auth.platform, PlatformKind::GitLab);
    }

    #[test]
    fn missing_token_is_a_bad_request() {
        let err = SessionAuth::from_headers(&headers(None, Some("github"))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn unknown_platform_is_a_bad_request() {
        let err = SessionAuth::from_headers(&headers(Some("Bearer t"), Some("sourcehut")))
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
