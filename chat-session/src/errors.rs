//! Error types for the conversation session.

use thiserror::Error;

/// Convenient alias for session results.
pub type ChatSessionResult<T> = Result<T, ChatSessionError>;

/// Failures while sending a message or consuming the reply stream.
///
/// None of these corrupt the session: the message list keeps every
/// fully-appended message, and a partially-streamed assistant message
/// stays in its last-known state.
#[derive(Debug, Error)]
pub enum ChatSessionError {
    /// The network call could not be issued or broke mid-stream.
    #[error("transport error: {0}")]
    Transport(String),

    /// No chunk arrived within the configured idle window.
    #[error("stream stalled: no chunk within {0} seconds")]
    StreamStalled(u64),

    /// A session method was called in the wrong phase.
    #[error("invalid session phase: {0}")]
    InvalidPhase(&'static str),
}
