//! Provider-agnostic LLM front-end.
//!
//! Construct once from a [`LlmModelConfig`], wrap in `Arc`, and pass clones
//! to dependents. The concrete provider client is built eagerly at
//! construction (enum dispatch, no trait objects) so misconfiguration
//! fails at startup rather than on the first chat turn.

use tracing::debug;

use crate::chat::{ChatTurn, TokenStream};
use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::AiLlmError;
use crate::health_service::{HealthService, HealthStatus};
use crate::services::ollama_service::OllamaService;
use crate::services::open_ai_service::OpenAiService;

enum ProviderClient {
    Ollama(OllamaService),
    OpenAI(OpenAiService),
}

/// Shared LLM service for the README-generation role.
pub struct LlmService {
    cfg: LlmModelConfig,
    client: ProviderClient,
    health: HealthService,
}

impl LlmService {
    /// Creates the service and its provider client.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] on invalid configuration or HTTP client
    /// construction failure.
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        let client = match cfg.provider {
            LlmProvider::Ollama => ProviderClient::Ollama(OllamaService::new(cfg.clone())?),
            LlmProvider::OpenAI => ProviderClient::OpenAI(OpenAiService::new(cfg.clone())?),
        };

        Ok(Self {
            cfg,
            client,
            health: HealthService::new(Some(10))?,
        })
    }

    /// Buffered generation: full completion text in one response.
    pub async fn chat(&self, system: &str, turns: &[ChatTurn]) -> Result<String, AiLlmError> {
        debug!(provider = ?self.cfg.provider, turns = turns.len(), "buffered chat");
        match &self.client {
            ProviderClient::Ollama(c) => c.chat(system, turns).await,
            ProviderClient::OpenAI(c) => c.chat(system, turns).await,
        }
    }

    /// Streaming generation: token fragments as the model produces them.
    pub async fn chat_stream(
        &self,
        system: &str,
        turns: &[ChatTurn],
    ) -> Result<TokenStream, AiLlmError> {
        debug!(provider = ?self.cfg.provider, turns = turns.len(), "streaming chat");
        match &self.client {
            ProviderClient::Ollama(c) => c.chat_stream(system, turns).await,
            ProviderClient::OpenAI(c) => c.chat_stream(system, turns).await,
        }
    }

    /// Health snapshot for the configured provider endpoint.
    pub async fn health(&self) -> HealthStatus {
        self.health.check(&self.cfg).await
    }

    /// The active model configuration.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }
}
