//! Pure mapping from platform-native payloads into the canonical
//! [`Repository`] record.
//!
//! No network, no side effects. Each platform names the same facts
//! differently (GitHub `full_name`/`html_url`/`stargazers_count` vs GitLab
//! `path_with_namespace`/`web_url`/`star_count`); these functions are the
//! only place that knows both vocabularies.

use crate::platforms::github::GitHubRepo;
use crate::platforms::gitlab::GitLabProject;
use crate::platforms::types::{PlatformKind, RepoId, RepoOwner, Repository};

/// Normalizes a raw GitHub repository payload.
pub fn from_github(raw: GitHubRepo) -> Repository {
    Repository {
        id: RepoId::Number(raw.id),
        name: raw.name,
        full_name: raw.full_name,
        description: raw.description,
        private: raw.private,
        url: raw.html_url,
        default_branch: raw.default_branch,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        language: raw.language,
        star_count: raw.stargazers_count,
        fork_count: raw.forks_count,
        topics: raw.topics.unwrap_or_default(),
        owner: RepoOwner {
            login: raw.owner.login,
            avatar_url: raw.owner.avatar_url,
        },
    }
}

/// Normalizes a raw GitLab project payload.
///
/// `private` is derived from visibility: anything that is not `public`
/// (including `internal`) counts as private. `updated_at` maps from
/// `last_activity_at`, the closest GitLab equivalent.
pub fn from_gitlab(raw: GitLabProject) -> Repository {
    let topics = gitlab_topics(&raw);

    Repository {
        id: RepoId::Number(raw.id),
        name: raw.name,
        full_name: raw.path_with_namespace,
        description: raw.description,
        private: raw.visibility != "public",
        url: raw.web_url,
        default_branch: raw.default_branch.unwrap_or_else(|| "main".into()),
        created_at: raw.created_at,
        updated_at: raw.last_activity_at,
        language: None,
        star_count: raw.star_count,
        fork_count: raw.forks_count,
        topics,
        owner: RepoOwner {
            login: raw.namespace.path,
            avatar_url: raw.namespace.avatar_url,
        },
    }
}

/// Topics with the GitLab legacy `tag_list` fallback; empty when absent.
pub fn gitlab_topics(raw: &GitLabProject) -> Vec<String> {
    raw.topics
        .clone()
        .or_else(|| raw.tag_list.clone())
        .unwrap_or_default()
}

/// The platform a normalized repository came from, judged by its URL.
///
/// Used by the legacy non-streamed route, where the client echoes the
/// repository record back without a platform header.
pub fn platform_of(repo: &Repository) -> PlatformKind {
    if repo.url.contains("gitlab") {
        PlatformKind::GitLab
    } else {
        PlatformKind::GitHub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn github_raw(private: bool) -> GitHubRepo {
        serde_json::from_value(serde_json::json!({
            "id": 42,
            "name": "foo",
            "full_name": "bar/foo",
            "description": "desc",
            "private": private,
            "html_url": "https://github.com/bar/foo",
            "default_branch": "main",
            "created_at": "2023-01-01T00:00:00Z",
            "updated_at": "2024-06-01T12:00:00Z",
            "language": "Rust",
            "stargazers_count": 7,
            "forks_count": 2,
            "open_issues_count": 1,
            "topics": ["cli", "rust"],
            "has_wiki": true,
            "owner": {"login": "bar", "avatar_url": "https://a.example/u.png"}
        }))
        .unwrap()
    }

    fn gitlab_raw(visibility: &str) -> GitLabProject {
        serde_json::from_value(serde_json::json!({
            "id": 99,
            "name": "foo",
            "path": "foo",
            "path_with_namespace": "bar/foo",
            "description": null,
            "visibility": visibility,
            "web_url": "https://gitlab.com/bar/foo",
            "default_branch": "master",
            "created_at": "2023-01-01T00:00:00Z",
            "last_activity_at": "2024-06-01T12:00:00Z",
            "star_count": 3,
            "forks_count": 1,
            "namespace": {"path": "bar"}
        }))
        .unwrap()
    }

    #[test]
    fn github_fields_map_onto_the_canonical_record() {
        let repo = from_github(github_raw(false));
        assert_eq!(repo.id, RepoId::Number(42));
        assert_eq!(repo.full_name, "bar/foo");
        assert_eq!(repo.url, "https://github.com/bar/foo");
        assert_eq!(repo.star_count, 7);
        assert_eq!(repo.owner.login, "bar");
        assert_eq!(repo.topics, vec!["cli", "rust"]);
        assert!(!repo.private);
    }

    #[test]
    fn gitlab_fields_map_onto_the_canonical_record() {
        let repo = from_gitlab(gitlab_raw("public"));
        assert_eq!(repo.id, RepoId::Number(99));
        assert_eq!(repo.full_name, "bar/foo");
        assert_eq!(repo.url, "https://gitlab.com/bar/foo");
        assert_eq!(repo.star_count, 3);
        assert_eq!(repo.owner.login, "bar");
        assert_eq!(repo.default_branch, "master");
    }

    #[test]
    fn private_iff_visibility_is_non_public() {
        assert!(!from_gitlab(gitlab_raw("public")).private);
        assert!(from_gitlab(gitlab_raw("internal")).private);
        assert!(from_gitlab(gitlab_raw("private")).private);

        assert!(!from_github(github_raw(false)).private);
        assert!(from_github(github_raw(true)).private);
    }

    #[test]
    fn topics_default_to_empty_when_absent() {
        let repo = from_gitlab(gitlab_raw("public"));
        assert!(repo.topics.is_empty());
    }

    #[test]
    fn gitlab_legacy_tag_list_is_honored() {
        let mut raw = gitlab_raw("public");
        raw.tag_list = Some(vec!["legacy".into()]);
        assert_eq!(from_gitlab(raw).topics, vec!["legacy"]);
    }

    #[test]
    fn platform_is_judged_by_url() {
        assert_eq!(
            platform_of(&from_github(github_raw(false))),
            PlatformKind::GitHub
        );
        assert_eq!(
            platform_of(&from_gitlab(gitlab_raw("public"))),
            PlatformKind::GitLab
        );
    }
}
