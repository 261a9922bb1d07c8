//! Integration tests for the context aggregation pipeline.
//!
//! These tests run the platform adapters against a local mock server and
//! verify the aggregator's fault-isolation and resolution semantics.

use mockito::Matcher;

use repo_context_engine::context::build_context;
use repo_context_engine::platforms::{
    PlatformClient, PlatformConfig, PlatformKind, RepoLocator, RepoRef,
};

fn github_repo_body() -> String {
    serde_json::json!({
        "id": 42,
        "name": "foo",
        "full_name": "bar/foo",
        "description": "desc",
        "private": false,
        "html_url": "https://github.com/bar/foo",
        "default_branch": "main",
        "created_at": "2023-01-01T00:00:00Z",
        "updated_at": "2024-06-01T12:00:00Z",
        "language": "Rust",
        "stargazers_count": 7,
        "forks_count": 2,
        "open_issues_count": 1,
        "topics": ["cli"],
        "has_wiki": true,
        "owner": {"login": "bar", "avatar_url": null}
    })
    .to_string()
}

fn github_client(base: String) -> PlatformClient {
    let cfg = PlatformConfig {
        kind: PlatformKind::GitHub,
        base_api: base,
        token: "test-token".into(),
    };
    PlatformClient::from_config(cfg).expect("client")
}

fn gitlab_client(base: String) -> PlatformClient {
    let cfg = PlatformConfig {
        kind: PlatformKind::GitLab,
        base_api: base,
        token: "test-token".into(),
    };
    PlatformClient::from_config(cfg).expect("client")
}

fn locator() -> RepoLocator {
    RepoLocator {
        owner: "bar".into(),
        name: "foo".into(),
    }
}

#[tokio::test]
async fn contributor_failure_does_not_abort_the_aggregate() {
    let mut server = mockito::Server::new_async().await;

    let _repo = server
        .mock("GET", "/repos/bar/foo")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(github_repo_body())
        .create_async()
        .await;

    // {"name":"foo"} in base64, line-wrapped the way GitHub returns it.
    let _manifest = server
        .mock("GET", "/repos/bar/foo/contents/package.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "name": "package.json",
                "path": "package.json",
                "type": "file",
                "size": 14,
                "content": "eyJuYW1lIjoi\nZm9vIn0=\n",
                "encoding": "base64"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let _root = server
        .mock("GET", "/repos/bar/foo/contents/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!([
                {"name": "src", "path": "src", "type": "dir"},
                {"name": "Cargo.toml", "path": "Cargo.toml", "type": "file", "size": 120}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let _contributors = server
        .mock("GET", "/repos/bar/foo/contributors")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    // Every other probe is unmatched and fails; best-effort fetches must
    // swallow that.
    let client = github_client(server.url());
    let repo_ref = client.resolve(&locator()).await.expect("resolve");

    let context = build_context(&client, &repo_ref).await.expect("context");

    assert!(context.contributors.is_empty());
    assert_eq!(context.details.stars, 7);
    assert_eq!(context.details.language.as_deref(), Some("Rust"));
    assert_eq!(
        context.package_json.as_ref().map(|f| f.content.as_str()),
        Some("{\"name\":\"foo\"}")
    );
    assert_eq!(context.root_structure.len(), 2);
    assert!(context.license.is_none());
    assert!(context.readme.is_none());
}

#[tokio::test]
async fn unauthorized_details_fetch_is_fatal() {
    let mut server = mockito::Server::new_async().await;

    let _repo = server
        .mock("GET", "/repos/bar/foo")
        .with_status(401)
        .with_body("bad credentials")
        .create_async()
        .await;

    let client = github_client(server.url());
    let repo_ref = client.resolve(&locator()).await.expect("resolve");

    let err = build_context(&client, &repo_ref)
        .await
        .expect_err("401 must raise");
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn gitlab_resolution_with_zero_matches_raises() {
    let mut server = mockito::Server::new_async().await;

    let _user = server
        .mock("GET", "/user")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 7}"#)
        .create_async()
        .await;

    let _projects = server
        .mock("GET", "/users/7/projects")
        .match_query(Matcher::UrlEncoded("search".into(), "foo".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let client = gitlab_client(server.url());
    let err = client
        .resolve(&locator())
        .await
        .expect_err("zero matches must raise");

    assert!(err.to_string().contains("project resolution failed"));
}

#[tokio::test]
async fn gitlab_resolution_prefers_the_exact_path_match() {
    let mut server = mockito::Server::new_async().await;

    let _user = server
        .mock("GET", "/user")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 7}"#)
        .create_async()
        .await;

    let project = |id: u64, path: &str| {
        serde_json::json!({
            "id": id,
            "name": path,
            "path": path,
            "path_with_namespace": format!("bar/{path}"),
            "description": null,
            "visibility": "private",
            "web_url": format!("https://gitlab.com/bar/{path}"),
            "default_branch": "trunk",
            "created_at": "2023-01-01T00:00:00Z",
            "last_activity_at": "2024-06-01T12:00:00Z",
            "star_count": 0,
            "forks_count": 0,
            "namespace": {"path": "bar"}
        })
    };

    let _projects = server
        .mock("GET", "/users/7/projects")
        .match_query(Matcher::UrlEncoded("search".into(), "foo".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!([project(11, "foo-extras"), project(12, "foo")]).to_string(),
        )
        .create_async()
        .await;

    let client = gitlab_client(server.url());
    let repo_ref = client.resolve(&locator()).await.expect("resolve");

    match repo_ref {
        RepoRef::GitLab {
            project_id,
            default_branch,
        } => {
            assert_eq!(project_id, 12);
            assert_eq!(default_branch, "trunk");
        }
        RepoRef::GitHub { .. } => panic!("expected a GitLab ref"),
    }
}

#[tokio::test]
async fn gitlab_file_content_is_decoded_from_rechunked_base64() {
    let mut server = mockito::Server::new_async().await;

    // "# readme for foo" in base64, re-chunked into narrow line segments
    // the way GitLab pads file payloads.
    let _file = server
        .mock("GET", "/projects/99/repository/files/README.md")
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "file_name": "README.md",
                "file_path": "README.md",
                "encoding": "base64",
                "content": "IyByZWFk\nbWUgZm9y\nIGZvbw==\n"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = gitlab_client(server.url());
    let repo_ref = RepoRef::GitLab {
        project_id: 99,
        default_branch: "main".into(),
    };

    let file = client
        .fetch_file(&repo_ref, "README.md")
        .await
        .expect("fetch")
        .expect("file present");

    assert_eq!(file.name, "README.md");
    assert_eq!(file.content, "# readme for foo");
}

#[tokio::test]
async fn listed_repositories_come_back_normalized() {
    let mut server = mockito::Server::new_async().await;

    let _repos = server
        .mock("GET", "/user/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!("[{}]", github_repo_body()))
        .create_async()
        .await;

    let client = github_client(server.url());
    let repos = client.list_repositories().await.expect("list");

    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].full_name, "bar/foo");
    assert_eq!(repos[0].owner.login, "bar");
    assert!(!repos[0].private);
}

#[tokio::test]
async fn missing_file_is_a_silent_none() {
    let mut server = mockito::Server::new_async().await;

    let _file = server
        .mock("GET", "/repos/bar/foo/contents/LICENSE")
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let client = github_client(server.url());
    let repo_ref = client.resolve(&locator()).await.expect("resolve");

    let file = client.fetch_file(&repo_ref, "LICENSE").await.expect("fetch");
    assert!(file.is_none());
}
