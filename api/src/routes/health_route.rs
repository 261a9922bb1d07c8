use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use tracing::instrument;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

/// Health snapshot: is the configured LLM endpoint reachable.
///
/// Always 200; the body's `ok` flag carries the verdict so load balancers
/// and dashboards read one shape.
#[instrument(name = "health_route", skip(state))]
pub async fn health_route(State(state): State<Arc<AppState>>) -> Response {
    let status = state.llm.health().await;
    ApiResponse::success(status).into_response_with_status(StatusCode::OK)
}
