pub mod context;
mod errors;
pub mod normalize;
pub mod platforms;
pub mod prompt;

pub use errors::{PlatformConfigError, PlatformError, RepoContextError, RepoContextResult};

use tracing::{debug, info};

use crate::platforms::{PlatformClient, PlatformConfig, RepoLocator, RepositoryContext};

/// Runs the full aggregation pipeline for a single repository.
///
/// This function is invoked by the HTTP layer when a conversation turn
/// needs fresh repository context. It is responsible for:
///   * constructing the platform client
///   * resolving the repository to its platform-native address
///   * fanning out the context fetches and assembling the bundle
///
/// Resolution failure is fatal (no partial context is returned); a 401
/// anywhere surfaces as [`RepoContextError::is_unauthorized`] so the
/// caller can terminate the session.
pub async fn build_repository_context(
    cfg: PlatformConfig,
    locator: &RepoLocator,
) -> RepoContextResult<RepositoryContext> {
    info!(
        platform = ?cfg.kind,
        repo = %locator.full_name(),
        "context aggregation started"
    );

    let client = PlatformClient::from_config(cfg)?;
    let repo_ref = client.resolve(locator).await?;

    let context = context::build_context(&client, &repo_ref).await?;
    debug!(
        repo = %locator.full_name(),
        root_entries = context.root_structure.len(),
        source_dirs = context.source_files.len(),
        docs = context.documentation_files.len(),
        contributors = context.contributors.len(),
        "context bundle assembled"
    );

    Ok(context)
}
