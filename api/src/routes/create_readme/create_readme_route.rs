use std::sync::Arc;

use ai_llm_service::ChatTurn;
use axum::{
    extract::{Json, State},
};
use repo_context_engine::normalize;
use repo_context_engine::platforms::{PlatformConfig, PlatformKind, RepoLocator};
use repo_context_engine::{build_repository_context, prompt};
use tracing::{info, instrument, warn};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::create_readme::{
        create_readme_request::CreateReadmeRequest, create_readme_response::CreateReadmeResponse,
    },
};

/// Legacy endpoint: one buffered README generation per call.
///
/// Kept for clients that predate the streamed conversation path. The
/// whole completion is returned as a single JSON payload.
#[instrument(name = "create_readme_route", skip(state, body))]
pub async fn create_readme_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateReadmeRequest>,
) -> AppResult<Json<CreateReadmeResponse>> {
    if body.message.trim().is_empty() {
        return Err(AppError::BadRequest("empty message".into()));
    }
    if body.access_token.trim().is_empty() {
        return Err(AppError::BadRequest("missing access token".into()));
    }

    let repository = body.repository;
    if repository.owner.login.trim().is_empty() || repository.name.trim().is_empty() {
        return Err(AppError::BadRequest("malformed repository".into()));
    }

    let platform = normalize::platform_of(&repository);
    let base_api = match platform {
        PlatformKind::GitHub => state.github_api_base.clone(),
        PlatformKind::GitLab => state.gitlab_api_base.clone(),
    };
    let cfg = PlatformConfig {
        kind: platform,
        base_api,
        token: body.access_token,
    };

    let locator = RepoLocator {
        owner: repository.owner.login.clone(),
        name: repository.name.clone(),
    };

    info!(
        platform = ?platform,
        repo = %locator.full_name(),
        "legacy readme generation started"
    );

    let system_prompt = match build_repository_context(cfg, &locator).await {
        Ok(context) => prompt::render_system_prompt(&repository, &context),
        Err(e) if e.ends_session() => return Err(e.into()),
        Err(e) => {
            warn!(error = %e, "context building failed; using fallback prompt");
            prompt::render_fallback_prompt(&repository)
        }
    };

    let mut turns: Vec<ChatTurn> = body
        .previous_conversation
        .iter()
        .map(|t| ChatTurn {
            role: t.role.clone(),
            content: t.content.clone(),
        })
        .collect();
    turns.push(ChatTurn::user(body.message));

    let message = state
        .llm
        .chat(&system_prompt, &turns)
        .await
        .map_err(AppError::from)?;

    Ok(Json(CreateReadmeResponse { message }))
}
