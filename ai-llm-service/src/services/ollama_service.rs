//! Lightweight Ollama service for chat generation.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/chat` with `stream=false` — buffered generation
//! - `POST {endpoint}/api/chat` with `stream=true`  — NDJSON token stream
//!
//! It uses the universal configuration [`LlmModelConfig`] and ensures
//! that the selected provider is [`LlmProvider::Ollama`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::chat::{ChatTurn, TokenStream};
use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{
    AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
};
use crate::streaming::ollama_token_stream;

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with
/// a configurable timeout. Provides high-level calls:
/// - [`OllamaService::chat`]        — buffered chat completion
/// - [`OllamaService::chat_stream`] — incremental token stream
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not `Ollama`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(Provider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{}/api/chat", base);

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Performs a **buffered** chat request (`stream=false`).
    ///
    /// The system prompt becomes the leading `system` message, followed by
    /// the conversation turns in order.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client errors
    /// - `Decode` if the response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn chat(&self, system: &str, turns: &[ChatTurn]) -> Result<String, AiLlmError> {
        let body = ChatRequest::from_cfg(&self.cfg, system, turns, false);

        debug!("POST {}", self.url_chat);
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            return Err(self.status_error(resp).await.into());
        }

        let out: ChatResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; ensure `stream=false` is used"
                )),
            )
        })?;

        Ok(out.message.map(|m| m.content).unwrap_or_default())
    }

    /// Performs a **streaming** chat request (`stream=true`).
    ///
    /// Returns a [`TokenStream`] of text fragments decoded from the NDJSON
    /// response body.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses (checked before streaming)
    /// - [`AiLlmError::HttpTransport`] for client errors
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn chat_stream(
        &self,
        system: &str,
        turns: &[ChatTurn],
    ) -> Result<TokenStream, AiLlmError> {
        let body = ChatRequest::from_cfg(&self.cfg, system, turns, true);

        debug!("POST {} (stream)", self.url_chat);
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            return Err(self.status_error(resp).await.into());
        }

        Ok(ollama_token_stream(resp.bytes_stream()))
    }

    async fn status_error(&self, resp: reqwest::Response) -> ProviderError {
        let status = resp.status();
        let url = self.url_chat.clone();
        let text = resp.text().await.unwrap_or_default();
        ProviderError::new(
            Provider::Ollama,
            ProviderErrorKind::HttpStatus(HttpError {
                status,
                url,
                snippet: make_snippet(&text),
            }),
        )
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/chat`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

impl<'a> ChatRequest<'a> {
    /// Builds a request from config, system prompt and conversation turns.
    fn from_cfg(cfg: &'a LlmModelConfig, system: &'a str, turns: &'a [ChatTurn], stream: bool) -> Self {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: system,
        });
        for turn in turns {
            messages.push(WireMessage {
                role: &turn.role,
                content: &turn.content,
            });
        }

        let options = ChatOptions {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        };

        Self {
            model: &cfg.model,
            messages,
            stream,
            options: Some(options),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Subset of Ollama `options`.
///
/// Extend this struct as needed (top_k, stop sequences, penalties, etc.).
#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response body for `/api/chat` with `stream=false`.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}
