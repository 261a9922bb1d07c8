//! Chat-shaped request/response primitives shared by all providers.

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error_handler::AiLlmError;

/// One prior turn of the conversation sent to the model.
///
/// `role` is the provider wire value (`"user"` / `"assistant"`); both
/// Ollama and OpenAI accept the same vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

/// Stream of generated text fragments from a provider.
///
/// Fragments carry no framing; concatenating them yields the full
/// completion text.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, AiLlmError>> + Send>>;
