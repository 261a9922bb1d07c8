use chat_session::HistoryTurn;
use repo_context_engine::platforms::Repository;
use serde::Deserialize;

/// Body of `POST /repo/create-readme` (legacy, non-streamed path).
///
/// Unlike `/conversation`, the access token travels in the body and the
/// platform is inferred from the repository record itself.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReadmeRequest {
    pub message: String,
    pub repository: Repository,
    pub access_token: String,
    #[serde(default)]
    pub previous_conversation: Vec<HistoryTurn>,
}
