//! Context aggregator: orchestrates adapter calls into one
//! [`RepositoryContext`] bundle.
//!
//! The details fetch runs first (its `language` drives the source-directory
//! sweep), then everything else fans out in parallel. Every best-effort
//! sub-fetch is isolated: a failure defaults to null/empty and is logged,
//! never aborting the aggregate. The only fatal failures are platform
//! identity resolution (handled by the caller) and the details fetch
//! itself, and a 401 anywhere, which must end the session.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::errors::RepoContextResult;
use crate::platforms::types::*;
use crate::platforms::PlatformClient;

/// Well-known root files probed for the context bundle.
const PACKAGE_MANIFEST: &str = "package.json";
const LICENSE_FILE: &str = "LICENSE";
const README_FILE: &str = "README.md";

/// Config files worth showing to the model when present.
const CONFIG_FILE_CANDIDATES: &[&str] = &[
    "tsconfig.json",
    "next.config.js",
    "tailwind.config.js",
    ".eslintrc.json",
    "Dockerfile",
    "docker-compose.yml",
    "Makefile",
    "Cargo.toml",
    "pyproject.toml",
    "go.mod",
];

/// Well-known documentation locations; `true` marks a directory probe.
const DOCUMENTATION_CANDIDATES: &[(&str, bool)] = &[
    ("docs", true),
    ("doc", true),
    ("CONTRIBUTING.md", false),
    ("CHANGELOG.md", false),
    ("CODE_OF_CONDUCT.md", false),
    ("SECURITY.md", false),
    ("ARCHITECTURE.md", false),
];

/// Builds the full context bundle for one repository.
///
/// The returned bundle is ephemeral: rendered into a prompt and dropped.
pub async fn build_context(
    client: &PlatformClient,
    repo_ref: &RepoRef,
) -> RepoContextResult<RepositoryContext> {
    // Sequential prerequisite: language selects the source sweep candidates.
    let details = client.fetch_repo_details(repo_ref).await?;
    debug!(
        language = details.language.as_deref().unwrap_or("unknown"),
        "repo details fetched; fanning out context fetches"
    );

    let (
        package_json,
        license,
        readme,
        contributors,
        root_structure,
        config_files,
        source_files,
        documentation_files,
    ) = tokio::join!(
        fetch_file_isolated(client, repo_ref, PACKAGE_MANIFEST),
        fetch_file_isolated(client, repo_ref, LICENSE_FILE),
        fetch_file_isolated(client, repo_ref, README_FILE),
        fetch_contributors_isolated(client, repo_ref),
        fetch_directory_isolated(client, repo_ref, ""),
        fetch_config_files(client, repo_ref),
        fetch_source_directories(client, repo_ref, details.language.as_deref()),
        fetch_documentation(client, repo_ref),
    );

    let package_json = package_json?;
    let license = license?;
    let readme = readme?;
    let contributors = contributors?;
    let root_structure = root_structure?;
    let config_files = config_files?;
    let source_files = source_files?;
    let documentation_files = documentation_files?;

    Ok(RepositoryContext {
        details,
        package_json,
        license,
        readme,
        root_structure,
        config_files,
        source_files,
        documentation_files,
        contributors,
    })
}

/// Candidate root directories to probe, picked by primary language.
fn source_dir_candidates(language: Option<&str>) -> &'static [&'static str] {
    match language.map(|l| l.to_ascii_lowercase()).as_deref() {
        Some("javascript") | Some("typescript") => {
            &["src", "app", "lib", "pages", "components"]
        }
        Some("go") => &["cmd", "pkg", "internal"],
        Some("rust") => &["src", "crates"],
        Some("python") => &["src", "app"],
        _ => &["src", "lib", "app"],
    }
}

/// File probe that never aborts the aggregate (401 excepted).
async fn fetch_file_isolated(
    client: &PlatformClient,
    repo_ref: &RepoRef,
    file_name: &str,
) -> RepoContextResult<Option<FileContent>> {
    match client.fetch_file(repo_ref, file_name).await {
        Ok(v) => Ok(v),
        Err(e) if e.is_unauthorized() => Err(e),
        Err(e) => {
            warn!(file_name, error = %e, "file fetch failed; defaulting to none");
            Ok(None)
        }
    }
}

async fn fetch_directory_isolated(
    client: &PlatformClient,
    repo_ref: &RepoRef,
    path: &str,
) -> RepoContextResult<Vec<TreeEntry>> {
    match client.fetch_directory(repo_ref, path).await {
        Ok(v) => Ok(v),
        Err(e) if e.is_unauthorized() => Err(e),
        Err(e) => {
            warn!(path, error = %e, "directory fetch failed; defaulting to empty");
            Ok(Vec::new())
        }
    }
}

async fn fetch_contributors_isolated(
    client: &PlatformClient,
    repo_ref: &RepoRef,
) -> RepoContextResult<Vec<String>> {
    match client.fetch_contributors(repo_ref).await {
        Ok(v) => Ok(v),
        Err(e) if e.is_unauthorized() => Err(e),
        Err(e) => {
            warn!(error = %e, "contributor fetch failed; defaulting to empty");
            Ok(Vec::new())
        }
    }
}

/// Probes the well-known config files in parallel; missing ones are dropped.
async fn fetch_config_files(
    client: &PlatformClient,
    repo_ref: &RepoRef,
) -> RepoContextResult<Vec<ConfigFile>> {
    let probes = CONFIG_FILE_CANDIDATES
        .iter()
        .map(|name| fetch_file_isolated(client, repo_ref, name));

    let mut found = Vec::new();
    for result in join_all(probes).await {
        if let Some(file) = result? {
            found.push(ConfigFile {
                name: file.name,
                content: file.content,
            });
        }
    }

    Ok(found)
}

/// Probes the language-directed candidate directories in parallel.
///
/// Only non-empty listings are retained.
async fn fetch_source_directories(
    client: &PlatformClient,
    repo_ref: &RepoRef,
    language: Option<&str>,
) -> RepoContextResult<Vec<SourceDirectory>> {
    let candidates = source_dir_candidates(language);
    let probes = candidates
        .iter()
        .map(|dir| fetch_directory_isolated(client, repo_ref, dir));

    let mut found = Vec::new();
    for (dir, result) in candidates.iter().zip(join_all(probes).await) {
        let entries = result?;
        if entries.is_empty() {
            continue;
        }
        found.push(SourceDirectory {
            directory: (*dir).to_string(),
            files: entries.into_iter().map(|e| e.name).collect(),
        });
    }

    Ok(found)
}

/// Probes the fixed documentation set in parallel; missing entries are
/// dropped, not nulled.
async fn fetch_documentation(
    client: &PlatformClient,
    repo_ref: &RepoRef,
) -> RepoContextResult<Vec<DocumentationFile>> {
    let probes = DOCUMENTATION_CANDIDATES.iter().map(|(path, is_dir)| async move {
        if *is_dir {
            let entries = fetch_directory_isolated(client, repo_ref, path).await?;
            if entries.is_empty() {
                return Ok::<_, crate::errors::RepoContextError>(None);
            }
            let listing = entries
                .iter()
                .map(|e| e.name.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            Ok(Some(DocumentationFile {
                path: (*path).to_string(),
                is_directory: true,
                contents: listing,
            }))
        } else {
            let file = fetch_file_isolated(client, repo_ref, path).await?;
            Ok(file.map(|f| DocumentationFile {
                path: (*path).to_string(),
                is_directory: false,
                contents: f.content,
            }))
        }
    });

    let mut found = Vec::new();
    for result in join_all(probes).await {
        if let Some(doc) = result? {
            found.push(doc);
        }
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_candidates_follow_the_language() {
        assert_eq!(
            source_dir_candidates(Some("TypeScript")),
            &["src", "app", "lib", "pages", "components"]
        );
        assert_eq!(source_dir_candidates(Some("Go")), &["cmd", "pkg", "internal"]);
        assert_eq!(source_dir_candidates(None), &["src", "lib", "app"]);
    }
}
