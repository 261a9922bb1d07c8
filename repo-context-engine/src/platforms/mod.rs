//! Platform facade without async-trait or dynamic trait objects.
//!
//! This module exposes an enum `PlatformClient` that wraps concrete
//! implementations for each source-control platform. The goal is to
//! provide a uniform, platform-agnostic interface for:
//!   * resolving a repository to its platform-native address
//!   * fetching normalized repositories, details, files, trees and
//!     contributor lists.

pub mod types;
pub use types::*;

pub mod github;
pub mod gitlab;

use crate::errors::{PlatformConfigError, RepoContextResult};
use tracing::debug;

/// Runtime configuration for any platform client.
///
/// The token comes from the user's OAuth session and is never stored by
/// this crate.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub kind: PlatformKind,
    /// API base, e.g. "https://api.github.com" or "https://gitlab.com/api/v4".
    pub base_api: String,
    /// Access token for the platform.
    pub token: String,
}

impl PlatformConfig {
    /// Builds a config for the given platform with its public API base.
    pub fn for_kind(kind: PlatformKind, token: String) -> RepoContextResult<Self> {
        if token.trim().is_empty() {
            return Err(PlatformConfigError::MissingToken.into());
        }

        let base_api = match kind {
            PlatformKind::GitHub => "https://api.github.com".to_string(),
            PlatformKind::GitLab => "https://gitlab.com/api/v4".to_string(),
        };

        Ok(Self {
            kind,
            base_api,
            token,
        })
    }
}

/// Concrete platform client with enum dispatch.
///
/// This type is the main entry point for all platform interactions.
#[derive(Debug, Clone)]
pub enum PlatformClient {
    GitHub(github::GitHubClient),
    GitLab(gitlab::GitLabClient),
}

impl PlatformClient {
    /// Constructs a concrete platform client from generic configuration.
    ///
    /// The underlying HTTP client is shared and configured with a stable
    /// user agent so that platforms can identify the integration.
    pub fn from_config(cfg: PlatformConfig) -> RepoContextResult<Self> {
        debug!(
            "Initializing platform client: kind={:?}, base_api={}",
            cfg.kind, cfg.base_api
        );

        let client = reqwest::Client::builder()
            .user_agent("repo-context-engine/0.1")
            .build()?;

        let client = match cfg.kind {
            PlatformKind::GitHub => {
                PlatformClient::GitHub(github::GitHubClient::new(client, cfg.base_api, cfg.token))
            }
            PlatformKind::GitLab => {
                PlatformClient::GitLab(gitlab::GitLabClient::new(client, cfg.base_api, cfg.token))
            }
        };

        Ok(client)
    }

    /// Resolves a repository locator to the platform-native address.
    ///
    /// For GitHub this is a pure transformation; for GitLab it performs the
    /// whoami + project-search round-trips. Failure here is fatal to any
    /// aggregation built on top.
    pub async fn resolve(&self, locator: &RepoLocator) -> RepoContextResult<RepoRef> {
        debug!(
            "Resolving repository: owner={}, name={}",
            locator.owner, locator.name
        );

        match self {
            Self::GitHub(c) => Ok(c.resolve(locator)),
            Self::GitLab(c) => c.resolve(locator).await,
        }
    }

    /// Fetches the canonical normalized repository record.
    pub async fn fetch_repository(&self, repo_ref: &RepoRef) -> RepoContextResult<Repository> {
        match self {
            Self::GitHub(c) => c.fetch_repository(repo_ref).await,
            Self::GitLab(c) => c.fetch_repository(repo_ref).await,
        }
    }

    /// Lists the authenticated user's repositories, normalized.
    pub async fn list_repositories(&self) -> RepoContextResult<Vec<Repository>> {
        match self {
            Self::GitHub(c) => c.list_repositories().await,
            Self::GitLab(c) => c.list_repositories().await,
        }
    }

    /// Fetches enrichment details; required step, failures raise.
    pub async fn fetch_repo_details(&self, repo_ref: &RepoRef) -> RepoContextResult<RepoDetails> {
        match self {
            Self::GitHub(c) => c.fetch_repo_details(repo_ref).await,
            Self::GitLab(c) => c.fetch_repo_details(repo_ref).await,
        }
    }

    /// Fetches a single file; `Ok(None)` when the file does not exist.
    pub async fn fetch_file(
        &self,
        repo_ref: &RepoRef,
        file_name: &str,
    ) -> RepoContextResult<Option<FileContent>> {
        match self {
            Self::GitHub(c) => c.fetch_file(repo_ref, file_name).await,
            Self::GitLab(c) => c.fetch_file(repo_ref, file_name).await,
        }
    }

    /// Lists a directory; best-effort, empty on non-auth failures.
    pub async fn fetch_directory(
        &self,
        repo_ref: &RepoRef,
        path: &str,
    ) -> RepoContextResult<Vec<TreeEntry>> {
        match self {
            Self::GitHub(c) => c.fetch_directory(repo_ref, path).await,
            Self::GitLab(c) => c.fetch_directory(repo_ref, path).await,
        }
    }

    /// Lists contributors; best-effort, empty on non-auth failures.
    pub async fn fetch_contributors(&self, repo_ref: &RepoRef) -> RepoContextResult<Vec<String>> {
        match self {
            Self::GitHub(c) => c.fetch_contributors(repo_ref).await,
            Self::GitLab(c) => c.fetch_contributors(repo_ref).await,
        }
    }
}

impl std::str::FromStr for PlatformKind {
    type Err = PlatformConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(PlatformKind::GitHub),
            "gitlab" => Ok(PlatformKind::GitLab),
            other => Err(PlatformConfigError::UnknownPlatform(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_kind_parses_case_insensitively() {
        assert_eq!("GitHub".parse::<PlatformKind>().unwrap(), PlatformKind::GitHub);
        assert_eq!("gitlab".parse::<PlatformKind>().unwrap(), PlatformKind::GitLab);
        assert!("bitbucket".parse::<PlatformKind>().is_err());
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(PlatformConfig::for_kind(PlatformKind::GitHub, "  ".into()).is_err());
    }
}
