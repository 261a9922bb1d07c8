//! Shared LLM service: provider clients (Ollama/OpenAI), unified errors,
//! health checks, and streaming or buffered chat generation.

pub mod chat;
pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod llm_service;
pub mod services;
pub mod streaming;

pub use chat::{ChatTurn, TokenStream};
pub use config::default_config::config_generation;
pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::AiLlmError;
pub use health_service::HealthStatus;
pub use llm_service::LlmService;
