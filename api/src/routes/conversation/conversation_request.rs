use chat_session::HistoryTurn;
use repo_context_engine::platforms::Repository;
use serde::Deserialize;

/// Body of `POST /conversation`.
///
/// `history` is the transcript as the client session serializes it:
/// `{role, content}` pairs in canonical conversation order.
#[derive(Debug, Deserialize)]
pub struct ConversationRequest {
    pub history: Vec<HistoryTurn>,
    pub input: String,
    pub repository: Repository,
}
