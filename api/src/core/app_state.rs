use std::sync::Arc;

use ai_llm_service::{LlmService, config_generation};

use crate::error_handler::{AppError, AppResult};

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// API base for GitHub, e.g. "https://api.github.com".
    pub github_api_base: String,
    /// API base for GitLab, e.g. "https://gitlab.com/api/v4".
    pub gitlab_api_base: String,
    /// Shared LLM service for README generation.
    pub llm: Arc<LlmService>,
}

impl AppState {
    /// Load shared state from environment variables.
    ///
    /// Platform tokens are NOT configured here: they arrive per request
    /// from the user's session and never outlive it.
    pub fn from_env() -> AppResult<Self> {
        let github_api_base = std::env::var("GITHUB_API_BASE")
            .unwrap_or_else(|_| "https://api.github.com".into());
        let gitlab_api_base = std::env::var("GITLAB_API_BASE")
            .unwrap_or_else(|_| "https://gitlab.com/api/v4".into());

        let llm_cfg =
            config_generation().map_err(|e| AppError::Startup(format!("LLM config: {e}")))?;
        let llm = LlmService::new(llm_cfg)
            .map_err(|e| AppError::Startup(format!("LLM service: {e}")))?;

        Ok(Self {
            github_api_base,
            gitlab_api_base,
            llm: Arc::new(llm),
        })
    }
}
