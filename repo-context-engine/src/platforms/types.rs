//! Platform-agnostic data model for repositories and aggregated context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported source-control platforms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    GitHub,
    GitLab,
}

/// Repository id as the platforms report it.
///
/// GitHub uses numeric ids, GitLab numeric ids as well, but both are kept
/// behind an untagged wrapper so client payloads round-trip either shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RepoId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoId::Number(n) => write!(f, "{n}"),
            RepoId::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Owner of a repository (account or namespace).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
    pub avatar_url: Option<String>,
}

/// Canonical, platform-agnostic repository record.
///
/// Built only by the normalizer (`normalize::from_github` /
/// `normalize::from_gitlab`); immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepoId,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub private: bool,
    pub url: String,
    pub default_branch: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub language: Option<String>,
    pub star_count: u64,
    pub fork_count: u64,
    pub topics: Vec<String>,
    pub owner: RepoOwner,
}

/// Where a repository lives, as addressed by the caller.
///
/// * GitHub resources are addressed by the `owner/name` pair directly.
/// * GitLab needs the `name` only; the numeric project id is resolved
///   through the authenticated user before any other call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoLocator {
    pub owner: String,
    pub name: String,
}

impl RepoLocator {
    /// `owner/name` as used in GitHub URLs and the canonical `full_name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Resolved platform-native address for a repository.
///
/// GitLab's numeric-id indirection is the structural difference the
/// aggregator has to accommodate; it resolves once and keys every
/// subsequent call off this value.
#[derive(Debug, Clone)]
pub enum RepoRef {
    GitHub {
        owner: String,
        repo: String,
    },
    GitLab {
        project_id: u64,
        default_branch: String,
    },
}

/// Enrichment data about a repository beyond its basic identity.
///
/// Fetched fresh per chat-session initialization; never cached across
/// sessions, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoDetails {
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub topics: Vec<String>,
    pub default_branch: String,
    pub language: Option<String>,
    pub last_update: DateTime<Utc>,
    pub homepage: Option<String>,
    pub has_wiki: bool,
    pub visibility: String,
}

/// A fetched repository file with decoded text content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    pub name: String,
    pub content: String,
}

/// Kind of a repository tree entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub size: u64,
}

/// A well-known configuration file found at the repository root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub name: String,
    pub content: String,
}

/// A probed source directory and the files it contains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDirectory {
    pub directory: String,
    pub files: Vec<String>,
}

/// One piece of project documentation (a file or a directory listing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentationFile {
    pub path: String,
    pub is_directory: bool,
    pub contents: String,
}

/// The full aggregated bundle fed into prompt assembly.
///
/// Built once per prompt-generation call and discarded after rendering;
/// never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryContext {
    pub details: RepoDetails,
    pub package_json: Option<FileContent>,
    pub license: Option<FileContent>,
    pub readme: Option<FileContent>,
    pub root_structure: Vec<TreeEntry>,
    pub config_files: Vec<ConfigFile>,
    pub source_files: Vec<SourceDirectory>,
    pub documentation_files: Vec<DocumentationFile>,
    pub contributors: Vec<String>,
}
