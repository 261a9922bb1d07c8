//! Prompt assembler: renders a repository context into the system prompt
//! for README generation.
//!
//! The template is deterministic: same inputs, same string. Structured
//! sections are JSON-serialized, file contents included as raw text, and
//! every section is held under a character budget so a large repository
//! cannot blow through the model's context window.

use serde::Serialize;

use crate::platforms::types::{Repository, RepositoryContext};

/// Budget for each raw file body embedded in the prompt.
const FILE_CONTENT_BUDGET: usize = 6_000;

/// Budget for each JSON-serialized structure section.
const SECTION_BUDGET: usize = 4_000;

/// Maximum number of entries shown per listing section.
const MAX_LISTING_ENTRIES: usize = 50;

/// Fixed instructions prepended to every generation prompt.
///
/// The delimiter contract here must match what markdown extraction looks
/// for on the client side.
const INSTRUCTIONS: &str = "\
You are an expert technical writer generating a README.md for the \
repository described below. Use the repository context as ground truth; \
do not invent features that are not visible in it. Wrap the final README \
between the lines ---README-CONTENT-START--- and ---README-CONTENT-END---.";

/// Renders the full system prompt from a repository and its context.
pub fn render_system_prompt(repository: &Repository, context: &RepositoryContext) -> String {
    let mut out = String::new();

    out.push_str(INSTRUCTIONS);
    out.push_str("\n\n");

    push_basic_facts(&mut out, repository);

    let details = &context.details;
    out.push_str("## Repository details\n");
    out.push_str(&format!(
        "Stars: {} | Forks: {} | Open issues: {}\n",
        details.stars, details.forks, details.open_issues
    ));
    out.push_str(&format!("Default branch: {}\n", details.default_branch));
    out.push_str(&format!(
        "Primary language: {}\n",
        details.language.as_deref().unwrap_or("Unknown")
    ));
    out.push_str(&format!("Visibility: {}\n", details.visibility));
    out.push_str(&format!("Has wiki: {}\n", details.has_wiki));
    if let Some(homepage) = &details.homepage {
        out.push_str(&format!("Homepage: {homepage}\n"));
    }
    if !details.topics.is_empty() {
        out.push_str(&format!("Topics: {}\n", details.topics.join(", ")));
    }
    out.push_str(&format!("Last update: {}\n\n", details.last_update));

    out.push_str("## Package.json\n");
    match &context.package_json {
        Some(file) => {
            out.push_str(truncated(&file.content, FILE_CONTENT_BUDGET));
            out.push('\n');
        }
        None => out.push_str("Package.json: Not found\n"),
    }
    out.push('\n');

    out.push_str("## License\n");
    match &context.license {
        Some(file) => {
            out.push_str(truncated(&file.content, FILE_CONTENT_BUDGET));
            out.push('\n');
        }
        None => out.push_str("License: Not found\n"),
    }
    out.push('\n');

    out.push_str("## Existing README\n");
    match &context.readme {
        Some(file) => {
            out.push_str(truncated(&file.content, FILE_CONTENT_BUDGET));
            out.push('\n');
        }
        None => out.push_str("README: Not found\n"),
    }
    out.push('\n');

    push_json_section(
        &mut out,
        "## Root structure",
        &capped(&context.root_structure),
    );
    push_json_section(&mut out, "## Config files", &capped(&context.config_files));
    push_json_section(&mut out, "## Source files", &capped(&context.source_files));
    push_json_section(
        &mut out,
        "## Documentation",
        &capped(&context.documentation_files),
    );

    out.push_str("## Contributors\n");
    if context.contributors.is_empty() {
        out.push_str("Contributors: Not found\n");
    } else {
        let shown: Vec<&str> = context
            .contributors
            .iter()
            .take(MAX_LISTING_ENTRIES)
            .map(String::as_str)
            .collect();
        out.push_str(&shown.join(", "));
        out.push('\n');
    }

    out
}

/// Minimal prompt used when context building fails.
///
/// Availability wins over completeness: the model still gets the
/// repository's identity even when every enrichment fetch failed.
pub fn render_fallback_prompt(repository: &Repository) -> String {
    let mut out = String::new();
    out.push_str(INSTRUCTIONS);
    out.push_str("\n\n");
    push_basic_facts(&mut out, repository);
    out.push_str("No further repository context is available.\n");
    out
}

fn push_basic_facts(out: &mut String, repository: &Repository) {
    out.push_str("## Repository\n");
    out.push_str(&format!("Name: {}\n", repository.name));
    out.push_str(&format!("Full name: {}\n", repository.full_name));
    out.push_str(&format!("Owner: {}\n", repository.owner.login));
    out.push_str(&format!(
        "Description: {}\n",
        repository.description.as_deref().unwrap_or("None")
    ));
    out.push_str(&format!("URL: {}\n\n", repository.url));
}

fn push_json_section<T: Serialize>(out: &mut String, header: &str, items: &[T]) {
    out.push_str(header);
    out.push('\n');

    if items.is_empty() {
        out.push_str("None found\n\n");
        return;
    }

    let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".into());
    out.push_str(truncated(&json, SECTION_BUDGET));
    out.push_str("\n\n");
}

fn capped<T: Clone>(items: &[T]) -> Vec<T> {
    items.iter().take(MAX_LISTING_ENTRIES).cloned().collect()
}

/// Char-boundary-safe truncation.
fn truncated(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::types::*;
    use chrono::{TimeZone, Utc};

    fn repository() -> Repository {
        Repository {
            id: RepoId::Number(1),
            name: "foo".into(),
            full_name: "bar/foo".into(),
            description: Some("desc".into()),
            private: false,
            url: "https://github.com/bar/foo".into(),
            default_branch: "main".into(),
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            language: Some("Rust".into()),
            star_count: 7,
            fork_count: 2,
            topics: vec![],
            owner: RepoOwner {
                login: "bar".into(),
                avatar_url: None,
            },
        }
    }

    fn context_without_package_json() -> RepositoryContext {
        RepositoryContext {
            details: RepoDetails {
                stars: 7,
                forks: 2,
                open_issues: 0,
                topics: vec![],
                default_branch: "main".into(),
                language: Some("Rust".into()),
                last_update: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
                homepage: None,
                has_wiki: false,
                visibility: "public".into(),
            },
            package_json: None,
            license: None,
            readme: None,
            root_structure: vec![],
            config_files: vec![],
            source_files: vec![],
            documentation_files: vec![],
            contributors: vec![],
        }
    }

    #[test]
    fn missing_package_json_renders_not_found() {
        let prompt = render_system_prompt(&repository(), &context_without_package_json());
        assert!(prompt.contains("Package.json: Not found"));
        assert!(prompt.contains("Name: foo"));
        assert!(prompt.contains("Owner: bar"));
        assert!(prompt.contains("Description: desc"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = render_system_prompt(&repository(), &context_without_package_json());
        let b = render_system_prompt(&repository(), &context_without_package_json());
        assert_eq!(a, b);
    }

    #[test]
    fn oversized_file_content_is_capped() {
        let mut ctx = context_without_package_json();
        ctx.readme = Some(FileContent {
            name: "README.md".into(),
            content: "x".repeat(FILE_CONTENT_BUDGET * 3),
        });
        let prompt = render_system_prompt(&repository(), &ctx);
        // The prompt keeps the budgeted slice plus the fixed template text.
        assert!(prompt.len() < FILE_CONTENT_BUDGET * 2);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let s = "é".repeat(10);
        let cut = truncated(&s, 3);
        assert_eq!(cut, "é");
    }

    #[test]
    fn fallback_prompt_carries_identity_only() {
        let prompt = render_fallback_prompt(&repository());
        assert!(prompt.contains("Name: foo"));
        assert!(prompt.contains("No further repository context"));
        assert!(!prompt.contains("Package.json"));
    }
}
