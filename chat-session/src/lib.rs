//! Client-side conversation session and markdown post-processing.
//!
//! The session holds the chat transcript, enforces the one-in-flight-send
//! rule, and renders streamed model output into a single incrementally
//! updated assistant message. Markdown extraction isolates the README
//! body for preview and copy.

mod errors;
pub mod markdown;
pub mod session;

pub use errors::{ChatSessionError, ChatSessionResult};
pub use markdown::extract_readme;
pub use session::{
    ClientMessage, ConversationSession, HistoryTurn, MessageRole, OutboundChat, SendOutcome,
    SessionPhase,
};
