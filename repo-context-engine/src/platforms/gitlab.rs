//! GitLab adapter (REST v4) for repository metadata, files and trees.
//!
//! Endpoints used (as of 2025):
//!   * GET /user
//!   * GET /users/{id}/projects?search={name}
//!   * GET /projects/{id}
//!   * GET /projects/{id}/languages
//!   * GET /projects/{id}/repository/tree?path={path}
//!   * GET /projects/{id}/repository/files/{path}?ref={ref}
//!   * GET /projects/{id}/repository/contributors
//!
//! Unlike GitHub, every repository call is keyed by a numeric project id.
//! The id is resolved up front through the authenticated user (whoami,
//! then project search by name); resolution failure is fatal to the whole
//! aggregation.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{PlatformError, RepoContextError, RepoContextResult};
use crate::normalize;
use crate::platforms::github::decode_base64_content;
use crate::platforms::types::*;

/// GitLab HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: Client,
    base_api: String, // e.g. "https://gitlab.com/api/v4"
    token: String,    // bearer token from the user's OAuth session
}

impl GitLabClient {
    /// Constructs a GitLab client with a shared HTTP instance and auth token.
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        debug!("Creating GitLabClient with base_api={}", base_api);
        Self {
            http,
            base_api,
            token,
        }
    }

    /// Resolves a repository name to its numeric project id.
    ///
    /// Two round-trips: `GET /user` for the authenticated user's id, then
    /// `GET /users/{id}/projects?search={name}`. An exact `path` or `name`
    /// match wins; otherwise the first hit is taken. Zero matches raise;
    /// there is no silent fallback for identity resolution.
    pub async fn resolve(&self, locator: &RepoLocator) -> RepoContextResult<RepoRef> {
        let url = format!("{}/user", self.base_api);
        debug!("GitLab whoami: {}", url);

        let user: GitLabUser = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let url = format!("{}/users/{}/projects", self.base_api, user.id);
        debug!("GitLab project search: {} (search={})", url, locator.name);

        let projects: Vec<GitLabProject> = self
            .http
            .get(url)
            .query(&[("search", locator.name.as_str())])
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let project = projects
            .iter()
            .find(|p| p.path == locator.name || p.name == locator.name)
            .or_else(|| projects.first())
            .ok_or_else(|| {
                PlatformError::ProjectResolution(format!(
                    "no project matching '{}' for user {}",
                    locator.name, user.id
                ))
            })?;

        Ok(RepoRef::GitLab {
            project_id: project.id,
            default_branch: project
                .default_branch
                .clone()
                .unwrap_or_else(|| "main".into()),
        })
    }

    /// Fetches the raw project payload and normalizes it.
    pub async fn fetch_repository(&self, repo_ref: &RepoRef) -> RepoContextResult<Repository> {
        let raw = self.get_project_raw(repo_ref).await?;
        Ok(normalize::from_gitlab(raw))
    }

    /// Lists the authenticated user's projects, normalized.
    ///
    /// Backs the repo picker. Uses the same whoami indirection as
    /// [`GitLabClient::resolve`]; any non-2xx here is raised.
    pub async fn list_repositories(&self) -> RepoContextResult<Vec<Repository>> {
        let url = format!("{}/user", self.base_api);
        debug!("GitLab whoami: {}", url);

        let user: GitLabUser = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let url = format!("{}/users/{}/projects", self.base_api, user.id);
        debug!("GitLab list_repositories: {}", url);

        let raw: Vec<GitLabProject> = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(raw.into_iter().map(normalize::from_gitlab).collect())
    }

    /// Fetches enrichment details for a project.
    ///
    /// The project payload carries no language field; a best-effort call to
    /// `/projects/{id}/languages` picks the dominant one.
    pub async fn fetch_repo_details(&self, repo_ref: &RepoRef) -> RepoContextResult<RepoDetails> {
        let raw = self.get_project_raw(repo_ref).await?;
        let language = self.fetch_primary_language(repo_ref).await;

        Ok(RepoDetails {
            stars: raw.star_count,
            forks: raw.forks_count,
            open_issues: raw.open_issues_count.unwrap_or(0),
            topics: normalize::gitlab_topics(&raw),
            default_branch: raw.default_branch.unwrap_or_else(|| "main".into()),
            language,
            last_update: raw.last_activity_at,
            homepage: None,
            has_wiki: raw.wiki_enabled,
            visibility: raw.visibility,
        })
    }

    /// Fetches a single file from the default branch and decodes it.
    ///
    /// GitLab returns base64 content re-chunked into fixed-width lines; the
    /// chunking is cosmetic and stripped before decoding.
    ///
    /// Returns `Ok(None)` if the file does not exist (404).
    pub async fn fetch_file(
        &self,
        repo_ref: &RepoRef,
        file_name: &str,
    ) -> RepoContextResult<Option<FileContent>> {
        let (project_id, default_branch) = expect_gitlab(repo_ref)?;
        let url = format!(
            "{}/projects/{}/repository/files/{}",
            self.base_api,
            project_id,
            urlencoding::encode(file_name)
        );
        debug!("GitLab fetch_file: {}", url);

        let resp = self
            .http
            .get(url)
            .query(&[("ref", default_branch)])
            .bearer_auth(&self.token)
            .send()
            .await?;

        if resp.status().as_u16() == 404 {
            debug!("GitLab file not found: {}", file_name);
            return Ok(None);
        }

        let raw: GitLabFile = resp.error_for_status()?.json().await?;
        let content = decode_base64_content(&raw.content)?;

        Ok(Some(FileContent {
            name: raw.file_name,
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
        let (project_id, _) = expect_gitlab(repo_ref)?;
        let url = format!(
            "{}/projects/{}/repository/tree",
            self.base_api, project_id
        );
        debug!("GitLab fetch_directory: {} (path={})", url, path);

        let resp = self
            .http
            .get(url)
            .query(&[("path", path)])
            .bearer_auth(&self.token)
            .send()
            .await?;

        if resp.status().as_u16() == 401 {
            return Err(PlatformError::Unauthorized.into());
        }
        if !resp.status().is_success() {
            warn!(
                status = resp.status().as_u16(),
                path, "GitLab tree listing failed; defaulting to empty"
            );
            return Ok(Vec::new());
        }

        let raw: Vec<GitLabTreeEntry> = resp.json().await?;
        let entries = raw
            .into_iter()
            .map(|e| TreeEntry {
                name: e.name,
                path: e.path,
                kind: if e.kind == "tree" {
                    EntryKind::Dir
                } else {
                    EntryKind::File
                },
                // The tree endpoint reports no sizes.
                size: 0,
            })
            .collect();

        Ok(entries)
    }

    /// Lists contributor names in the platform's response order.
    ///
    /// Same defaulting policy as [`GitLabClient::fetch_directory`].
    pub async fn fetch_contributors(&self, repo_ref: &RepoRef) -> RepoContextResult<Vec<String>> {
        let (project_id, _) = expect_gitlab(repo_ref)?;
        let url = format!(
            "{}/projects/{}/repository/contributors",
            self.base_api, project_id
        );
        debug!("GitLab fetch_contributors: {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if resp.status().as_u16() == 401 {
            return Err(PlatformError::Unauthorized.into());
        }
        if !resp.status().is_success() {
            warn!(
                status = resp.status().as_u16(),
                "GitLab contributor listing failed; defaulting to empty"
            );
            return Ok(Vec::new());
        }

        let raw: Vec<GitLabContributor> = resp.json().await?;
        Ok(raw.into_iter().map(|c| c.name).collect())
    }

    async fn get_project_raw(&self, repo_ref: &RepoRef) -> RepoContextResult<GitLabProject> {
        let (project_id, _) = expect_gitlab(repo_ref)?;
        let url = format!("{}/projects/{}", self.base_api, project_id);
        debug!("GitLab get_project_raw: {}", url);

        let raw: GitLabProject = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(raw)
    }

    /// Best-effort dominant language via `/projects/{id}/languages`.
    async fn fetch_primary_language(&self, repo_ref: &RepoRef) -> Option<String> {
        let (project_id, _) = expect_gitlab(repo_ref).ok()?;
        let url = format!("{}/projects/{}/languages", self.base_api, project_id);
        debug!("GitLab fetch_primary_language: {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .ok()?;

        if !resp.status().is_success() {
            warn!(
                status = resp.status().as_u16(),
                "GitLab languages fetch failed; leaving language unset"
            );
            return None;
        }

        let langs: std::collections::BTreeMap<String, f64> = resp.json().await.ok()?;
        langs
            .into_iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(name, _)| name)
    }
}

fn expect_gitlab(repo_ref: &RepoRef) -> RepoContextResult<(u64, &str)> {
    match repo_ref {
        RepoRef::GitLab {
            project_id,
            default_branch,
        } => Ok((*project_id, default_branch.as_str())),
        RepoRef::GitHub { .. } => Err(RepoContextError::Validation(
            "GitHub ref passed to GitLab client".into(),
        )),
    }
}

/// GitLab authenticated user response (subset).
#[derive(Debug, Deserialize)]
struct GitLabUser {
    id: u64,
}

/// GitLab project response (subset).
#[derive(Debug, Deserialize)]
pub struct GitLabProject {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub path_with_namespace: String,
    pub description: Option<String>,
    pub visibility: String,
    pub web_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub star_count: u64,
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: Option<u64>,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    #[serde(default)]
    pub tag_list: Option<Vec<String>>,
    #[serde(default)]
    pub wiki_enabled: bool,
    pub namespace: GitLabNamespace,
}

#[derive(Debug, Deserialize)]
pub struct GitLabNamespace {
    pub path: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabFile {
    file_name: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct GitLabTreeEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String, // "tree" | "blob"
}

#[derive(Debug, Deserialize)]
struct GitLabContributor {
    name: String,
}
