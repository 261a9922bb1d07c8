use std::sync::Arc;

use ai_llm_service::ChatTurn;
use axum::{
    body::Body,
    extract::{Json, State},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use repo_context_engine::platforms::{PlatformConfig, RepoLocator};
use repo_context_engine::{build_repository_context, prompt};
use tracing::{info, instrument, warn};

use crate::{
    core::{app_state::AppState, session_auth::SessionAuth},
    error_handler::{AppError, AppResult},
    routes::conversation::conversation_request::ConversationRequest,
};

/// HTTP endpoint for one streamed conversation turn.
///
/// Builds fresh repository context, renders the system prompt, and pipes
/// the LLM token stream straight through as the response body (raw text
/// chunks, no framing). Context-building failures degrade to a minimal
/// prompt; only auth failures and LLM failures end the request.
#[instrument(name = "conversation_route", skip(state, headers, body))]
pub async fn conversation_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ConversationRequest>,
) -> AppResult<Response> {
    let auth = SessionAuth::from_headers(&headers)?;

    if body.input.trim().is_empty() {
        return Err(AppError::BadRequest("empty input".into()));
    }
    for turn in &body.history {
        if turn.role != "user" && turn.role != "assistant" {
            return Err(AppError::BadRequest(format!(
                "unexpected history role '{}'",
                turn.role
            )));
        }
    }

    let repository = body.repository;
    if repository.owner.login.trim().is_empty() || repository.name.trim().is_empty() {
        return Err(AppError::BadRequest("malformed repository".into()));
    }

    let locator = RepoLocator {
        owner: repository.owner.login.clone(),
        name: repository.name.clone(),
    };

    let base_api = match auth.platform {
        repo_context_engine::platforms::PlatformKind::GitHub => state.github_api_base.clone(),
        repo_context_engine::platforms::PlatformKind::GitLab => state.gitlab_api_base.clone(),
    };
    let cfg = PlatformConfig {
        kind: auth.platform,
        base_api,
        token: auth.access_token,
    };

    info!(
        platform = ?auth.platform,
        repo = %locator.full_name(),
        turns = body.history.len(),
        "conversation turn started"
    );

    // Context failures degrade; auth failures terminate the session.
    let system_prompt = match build_repository_context(cfg, &locator).await {
        Ok(context) => prompt::render_system_prompt(&repository, &context),
        Err(e) if e.ends_session() => return Err(e.into()),
        Err(e) => {
            warn!(error = %e, "context building failed; using fallback prompt");
            prompt::render_fallback_prompt(&repository)
        }
    };

    let mut turns: Vec<ChatTurn> = body
        .history
        .iter()
        .map(|t| ChatTurn {
            role: t.role.clone(),
            content: t.content.clone(),
        })
        .collect();
    turns.push(ChatTurn::user(body.input));

    let stream = state
        .llm
        .chat_stream(&system_prompt, &turns)
        .await
        .map_err(AppError::from)?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::UpstreamLlm(e.to_string()))?;

    Ok(response)
}
