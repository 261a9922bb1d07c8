//! GitHub adapter (REST v3) for repository metadata, files and trees.
//!
//! Endpoints used (as of 2025):
//!   * GET /repos/{owner}/{repo}
//!   * GET /repos/{owner}/{repo}/contents/{path}
//!   * GET /repos/{owner}/{repo}/contributors
//!
//! Resources are addressed by the `owner/repo` pair directly; there is no
//! resolution step like on GitLab.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{PlatformError, RepoContextError, RepoContextResult};
use crate::normalize;
use crate::platforms::types::*;

/// GitHub HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String, // e.g. "https://api.github.com"
    token: String,    // bearer token from the user's OAuth session
}

impl GitHubClient {
    /// Constructs a GitHub client with a shared HTTP instance and auth token.
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        debug!("Creating GitHubClient with base_api={}", base_api);
        Self {
            http,
            base_api,
            token,
        }
    }

    /// Resolves the platform-native address for a repository.
    ///
    /// GitHub needs no network round-trip here; `owner/repo` is the address.
    pub fn resolve(&self, locator: &RepoLocator) -> RepoRef {
        RepoRef::GitHub {
            owner: locator.owner.clone(),
            repo: locator.name.clone(),
        }
    }

    /// Fetches the raw repository payload and normalizes it.
    pub async fn fetch_repository(&self, repo_ref: &RepoRef) -> RepoContextResult<Repository> {
        let raw = self.get_repo_raw(repo_ref).await?;
        Ok(normalize::from_github(raw))
    }

    /// Lists the authenticated user's repositories, normalized.
    ///
    /// Backs the repo picker. Any non-2xx here is raised; a 401 must end
    /// the caller's session.
    pub async fn list_repositories(&self) -> RepoContextResult<Vec<Repository>> {
        let url = format!("{}/user/repos", self.base_api);
        debug!("GitHub list_repositories: {}", url);

        let raw: Vec<GitHubRepo> = self
            .http
            .get(url)
            .query(&[("per_page", "100"), ("sort", "updated")])
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(raw.into_iter().map(normalize::from_github).collect())
    }

    /// Fetches enrichment details for a repository.
    ///
    /// Any non-2xx here is raised; a 401 must end the caller's session.
    pub async fn fetch_repo_details(&self, repo_ref: &RepoRef) -> RepoContextResult<RepoDetails> {
        let raw = self.get_repo_raw(repo_ref).await?;

        let visibility = raw
            .visibility
            .clone()
            .unwrap_or_else(|| if raw.private { "private".into() } else { "public".into() });

        Ok(RepoDetails {
            stars: raw.stargazers_count,
            forks: raw.forks_count,
            open_issues: raw.open_issues_count,
            topics: raw.topics.unwrap_or_default(),
            default_branch: raw.default_branch,
            language: raw.language,
            last_update: raw.updated_at,
            homepage: raw.homepage.filter(|h| !h.is_empty()),
            has_wiki: raw.has_wiki,
            visibility,
        })
    }

    /// Fetches a single file and decodes its content to text.
    ///
    /// Returns `Ok(None)` if the file does not exist (404); not-found is an
    /// expected, silent case.
    pub async fn fetch_file(
        &self,
        repo_ref: &RepoRef,
        file_name: &str,
    ) -> RepoContextResult<Option<FileContent>> {
        let (owner, repo) = expect_github(repo_ref)?;
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_api, owner, repo, file_name
        );
        debug!("GitHub fetch_file: {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        if resp.status().as_u16() == 404 {
            debug!("GitHub file not found: {}", file_name);
            return Ok(None);
        }

        let raw: GitHubContent = resp.error_for_status()?.json().await?;
        let content = decode_base64_content(&raw.content.unwrap_or_default())?;

        Ok(Some(FileContent {
            name: raw.name,
            content,
        }))
    }

    /// Lists one directory of the repository tree.
    ///
    /// Best-effort: any non-2xx other than 401 yields an empty list and a
    /// warning; a 401 is raised so the session can be terminated.
    pub async fn fetch_directory(
        &self,
        repo_ref: &RepoRef,
        path: &str,
    ) -> RepoContextResult<Vec<TreeEntry>> {
        let (owner, repo) = expect_github(repo_ref)?;
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_api, owner, repo, path
        );
        debug!("GitHub fetch_directory: {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        if resp.status().as_u16() == 401 {
            return Err(PlatformError::Unauthorized.into());
        }
        if !resp.status().is_success() {
            warn!(
                status = resp.status().as_u16(),
                path, "GitHub directory listing failed; defaulting to empty"
            );
            return Ok(Vec::new());
        }

        let raw: Vec<GitHubContent> = resp.json().await?;
        let entries = raw
            .into_iter()
            .map(|e| TreeEntry {
                name: e.name,
                path: e.path,
                kind: if e.kind == "dir" {
                    EntryKind::Dir
                } else {
                    EntryKind::File
                },
                size: e.size.unwrap_or(0),
            })
            .collect();

        Ok(entries)
    }

    /// Lists contributor login names in the platform's response order.
    ///
    /// Same defaulting policy as [`GitHubClient::fetch_directory`].
    pub async fn fetch_contributors(&self, repo_ref: &RepoRef) -> RepoContextResult<Vec<String>> {
        let (owner, repo) = expect_github(repo_ref)?;
        let url = format!(
            "{}/repos/{}/{}/contributors",
            self.base_api, owner, repo
        );
        debug!("GitHub fetch_contributors: {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        if resp.status().as_u16() == 401 {
            return Err(PlatformError::Unauthorized.into());
        }
        if !resp.status().is_success() {
            warn!(
                status = resp.status().as_u16(),
                "GitHub contributor listing failed; defaulting to empty"
            );
            return Ok(Vec::new());
        }

        let raw: Vec<GitHubContributor> = resp.json().await?;
        Ok(raw.into_iter().map(|c| c.login).collect())
    }

    async fn get_repo_raw(&self, repo_ref: &RepoRef) -> RepoContextResult<GitHubRepo> {
        let (owner, repo) = expect_github(repo_ref)?;
        let url = format!("{}/repos/{}/{}", self.base_api, owner, repo);
        debug!("GitHub get_repo_raw: {}", url);

        let raw: GitHubRepo = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(raw)
    }
}

fn expect_github(repo_ref: &RepoRef) -> RepoContextResult<(&str, &str)> {
    match repo_ref {
        RepoRef::GitHub { owner, repo } => Ok((owner.as_str(), repo.as_str())),
        RepoRef::GitLab { .. } => Err(RepoContextError::Validation(
            "GitLab ref passed to GitHub client".into(),
        )),
    }
}

/// Decodes the base64 payload GitHub returns for file contents.
///
/// The payload arrives chunked with embedded newlines; whitespace is
/// stripped before decoding.
pub(crate) fn decode_base64_content(encoded: &str) -> RepoContextResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| PlatformError::InvalidResponse(format!("bad base64 content: {e}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// GitHub repository response (subset).
#[derive(Debug, Deserialize)]
pub struct GitHubRepo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub private: bool,
    pub html_url: String,
    pub default_branch: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub open_issues_count: u64,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub has_wiki: bool,
    #[serde(default)]
    pub visibility: Option<String>,
    pub owner: GitHubOwner,
}

#[derive(Debug, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubContent {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubContributor {
    login: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_content_with_line_breaks_decodes() {
        // "hello world" split the way GitHub chunks payloads.
        let encoded = "aGVsbG8g\nd29ybGQ=\n";
        assert_eq!(decode_base64_content(encoded).unwrap(), "hello world");
    }

    #[test]
    fn invalid_base64_is_an_invalid_response() {
        assert!(decode_base64_content("!!not base64!!").is_err());
    }
}
