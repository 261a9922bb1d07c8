//! Default LLM config loaded strictly from environment variables.
//!
//! This module provides a convenience constructor for [`LlmModelConfig`]
//! for the single **generation** role this service runs: producing README
//! drafts from an assembled repository prompt.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`       = provider kind (`ollama` | `openai`), default `ollama`
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = generation model (mandatory)
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY` = API key (mandatory)
//! - `OPENAI_URL`     = endpoint, default `https://api.openai.com`
//! - `OPENAI_MODEL`   = generation model (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError, env_opt_u32, must_env},
};

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// # Errors
///
/// - [`ConfigError::MissingVar`] if both are missing
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Ok(url) = std::env::var("OLLAMA_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }
    if let Ok(port) = std::env::var("OLLAMA_PORT") {
        if !port.trim().is_empty() {
            let _ = port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "OLLAMA_PORT",
                    reason: "expected u16 (1..=65535)",
                })?;
            return Ok(format!("http://localhost:{port}"));
        }
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

/// Constructs the generation config from environment, routed by `LLM_KIND`.
///
/// # Defaults
/// - `temperature = Some(0.7)`
/// - `timeout_secs = Some(600)` (README drafts can run long)
pub fn config_generation() -> Result<LlmModelConfig, AiLlmError> {
    let kind = std::env::var("LLM_KIND").unwrap_or_else(|_| "ollama".into());
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;

    match kind.trim().to_ascii_lowercase().as_str() {
        "ollama" => {
            let endpoint = ollama_endpoint()?;
            let model = must_env("OLLAMA_MODEL")?;

            Ok(LlmModelConfig {
                provider: LlmProvider::Ollama,
                model,
                endpoint,
                api_key: None,
                max_tokens,
                temperature: Some(0.7),
                top_p: None,
                timeout_secs: Some(600),
            })
        }
        "openai" => {
            let endpoint =
                std::env::var("OPENAI_URL").unwrap_or_else(|_| "https://api.openai.com".into());
            let model = must_env("OPENAI_MODEL")?;
            let api_key = must_env("OPENAI_API_KEY")?;

            Ok(LlmModelConfig {
                provider: LlmProvider::OpenAI,
                model,
                endpoint,
                api_key: Some(api_key),
                max_tokens,
                temperature: Some(0.7),
                top_p: None,
                timeout_secs: Some(600),
            })
        }
        other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
    }
}
