//! Conversation session: the client-side state machine behind the chat UI.
//!
//! One session per active chat. The session owns the ordered message list;
//! nothing else writes to it. A send walks Idle → Sending → Streaming and
//! back to Idle (errors also land on Idle), and at most one send is in
//! flight at a time; a second `begin_send` while processing is a no-op.
//!
//! Streaming updates are idempotent full replacements: each incoming chunk
//! extends a running accumulator and the assistant message's `display` is
//! replaced with the whole accumulated string, so a re-render after any
//! chunk shows consistent text without duplication.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{Future, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use repo_context_engine::platforms::Repository;

use crate::errors::{ChatSessionError, ChatSessionResult};

/// Who authored a message in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One turn in the visible chat transcript.
///
/// `display` is the only mutable field, and only the owning session
/// rewrites it (full replacement per chunk while streaming).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    pub id: String,
    pub role: MessageRole,
    pub display: String,
    pub timestamp: DateTime<Utc>,
}

/// One history turn as serialized to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

/// The payload of one outbound chat request.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundChat {
    pub history: Vec<HistoryTurn>,
    pub input: String,
    pub repository: Repository,
}

/// Where the session currently is in its send cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Sending,
    Streaming,
}

/// Outcome of a composed send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The reply stream was fully consumed.
    Completed,
    /// Blank input or a send already in flight; nothing was sent.
    Ignored,
}

/// Default per-chunk idle window before a stalled stream is abandoned.
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 120;

/// Client-side chat session for one repository.
pub struct ConversationSession {
    repository: Repository,
    messages: Vec<ClientMessage>,
    latest_markdown_id: Option<String>,
    phase: SessionPhase,
    idle_timeout: Duration,
}

impl ConversationSession {
    pub fn new(repository: Repository) -> Self {
        Self {
            repository,
            messages: Vec::new(),
            latest_markdown_id: None,
            phase: SessionPhase::Idle,
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }

    /// Overrides the stalled-stream window (mostly for tests).
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// The transcript, in canonical conversation order.
    pub fn messages(&self) -> &[ClientMessage] {
        &self.messages
    }

    /// Id of the assistant message holding the latest generated markdown.
    pub fn latest_markdown_id(&self) -> Option<&str> {
        self.latest_markdown_id.as_deref()
    }

    /// Display text of the latest generated markdown, if any.
    ///
    /// The id is a weak pointer: it is looked up against the message list
    /// on every call rather than holding the text itself.
    pub fn latest_markdown(&self) -> Option<&str> {
        let id = self.latest_markdown_id.as_deref()?;
        self.messages
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.display.as_str())
    }

    /// True while a send is in flight (Sending or Streaming).
    pub fn is_processing(&self) -> bool {
        self.phase != SessionPhase::Idle
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Starts a send: validates input, gates on the in-flight flag,
    /// appends the user message, and returns the outbound payload.
    ///
    /// Returns `None`, changing nothing, when `input` is blank or a
    /// send is already in flight. The returned payload carries the full
    /// prior history (everything appended before this call).
    pub fn begin_send(&mut self, input: &str) -> Option<OutboundChat> {
        let input = input.trim();
        if input.is_empty() {
            debug!("ignoring blank input");
            return None;
        }
        if self.is_processing() {
            debug!("ignoring send while another is in flight");
            return None;
        }

        let history = self
            .messages
            .iter()
            .map(|m| HistoryTurn {
                role: m.role.as_str().to_string(),
                content: m.display.clone(),
            })
            .collect();

        self.messages.push(ClientMessage {
            id: services::message_id(),
            role: MessageRole::User,
            display: input.to_string(),
            timestamp: Utc::now(),
        });
        self.phase = SessionPhase::Sending;

        Some(OutboundChat {
            history,
            input: input.to_string(),
            repository: self.repository.clone(),
        })
    }

    /// Aborts a send whose network call failed before any bytes arrived.
    ///
    /// The already-appended user message stays; only the in-flight flag is
    /// cleared.
    pub fn abort_send(&mut self) {
        if self.phase != SessionPhase::Idle {
            self.phase = SessionPhase::Idle;
        }
    }

    /// Consumes the reply stream, updating one assistant message in place.
    ///
    /// Allocates the assistant message, records it as the latest markdown,
    /// then replaces its `display` with the cumulative text after every
    /// chunk. Ends back on Idle whether the stream finished, broke, or
    /// stalled past the idle window; on failure the partial message keeps
    /// its last state.
    pub async fn consume_stream<S, E>(&mut self, mut stream: S) -> ChatSessionResult<()>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: std::fmt::Display,
    {
        if self.phase != SessionPhase::Sending {
            return Err(ChatSessionError::InvalidPhase(
                "consume_stream requires a begun send",
            ));
        }
        self.phase = SessionPhase::Streaming;

        let message_id = services::message_id();
        self.messages.push(ClientMessage {
            id: message_id.clone(),
            role: MessageRole::Assistant,
            display: String::new(),
            timestamp: Utc::now(),
        });
        self.latest_markdown_id = Some(message_id.clone());

        // Bytes, not text: a chunk boundary may split a UTF-8 sequence, so
        // decoding always runs over the whole accumulated buffer.
        let mut accumulated: Vec<u8> = Vec::new();
        loop {
            let next = tokio::time::timeout(self.idle_timeout, stream.next()).await;
            let item = match next {
                Ok(item) => item,
                Err(_) => {
                    warn!(
                        secs = self.idle_timeout.as_secs(),
                        "reply stream stalled; abandoning"
                    );
                    self.phase = SessionPhase::Idle;
                    return Err(ChatSessionError::StreamStalled(self.idle_timeout.as_secs()));
                }
            };

            match item {
                Some(Ok(bytes)) => {
                    accumulated.extend_from_slice(&bytes);
                    let text = String::from_utf8_lossy(&accumulated).into_owned();
                    self.replace_display(&message_id, &text);
                }
                Some(Err(e)) => {
                    warn!(error = %e, "reply stream broke; keeping partial message");
                    self.phase = SessionPhase::Idle;
                    return Err(ChatSessionError::Transport(e.to_string()));
                }
                None => break,
            }
        }

        self.phase = SessionPhase::Idle;
        Ok(())
    }

    /// One-shot send: gate, transport call, stream consumption.
    ///
    /// `transport` receives the outbound payload and returns the reply
    /// byte stream; it is only invoked when the send is admitted.
    pub async fn send_message<F, Fut, S, E>(
        &mut self,
        input: &str,
        transport: F,
    ) -> ChatSessionResult<SendOutcome>
    where
        F: FnOnce(OutboundChat) -> Fut,
        Fut: Future<Output = ChatSessionResult<S>>,
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: std::fmt::Display,
    {
        let Some(outbound) = self.begin_send(input) else {
            return Ok(SendOutcome::Ignored);
        };

        let stream = match transport(outbound).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "chat request failed before streaming");
                self.abort_send();
                return Err(e);
            }
        };

        self.consume_stream(stream).await?;
        Ok(SendOutcome::Completed)
    }

    fn replace_display(&mut self, id: &str, text: &str) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            // Full replacement, not append: re-renders stay duplication-free.
            message.display = text.to_string();
        }
    }
}
