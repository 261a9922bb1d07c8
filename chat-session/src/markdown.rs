//! Locates the delimited README content inside a streamed reply.

/// Delimiters the generation prompt asks the model to emit.
const CONTENT_START: &str = "---README-CONTENT-START---";
const CONTENT_END: &str = "---README-CONTENT-END---";

/// Legacy fence used by older prompts.
const FENCE_START: &str = "```markdown";
const FENCE_END: &str = "```";

/// Extracts the README body from a model reply.
///
/// Pure and total: never panics, always returns a string. If the
/// dedicated start/end pair is present, only the interior is returned;
/// failing that, a ```` ```markdown ```` fence is honored; with no
/// delimiter at all the text is returned unmodified (the whole reply is
/// assumed to be the README).
pub fn extract_readme(text: &str) -> String {
    if let Some(start) = text.find(CONTENT_START) {
        let after = &text[start + CONTENT_START.len()..];
        let inner = match after.find(CONTENT_END) {
            Some(end) => &after[..end],
            None => after,
        };
        return inner.trim().to_string();
    }

    if let Some(start) = text.find(FENCE_START) {
        let after = &text[start + FENCE_START.len()..];
        let inner = match after.find(FENCE_END) {
            Some(end) => &after[..end],
            None => after,
        };
        return inner.trim().to_string();
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimited_content_returns_only_the_interior() {
        let text = "Sure! Here is your README:\n---README-CONTENT-START---\n# Foo\n\nHello.\n---README-CONTENT-END---\nLet me know!";
        assert_eq!(extract_readme(text), "# Foo\n\nHello.");
    }

    #[test]
    fn markdown_fence_is_honored_as_fallback() {
        let text = "```markdown\n# Foo\n```";
        assert_eq!(extract_readme(text), "# Foo");
    }

    #[test]
    fn missing_end_delimiter_takes_the_rest() {
        let text = "---README-CONTENT-START---\n# Foo";
        assert_eq!(extract_readme(text), "# Foo");
    }

    #[test]
    fn absent_delimiters_return_the_text_unmodified() {
        let text = "# Foo\n\nplain readme";
        assert_eq!(extract_readme(text), text);
    }

    #[test]
    fn extraction_is_idempotent_without_delimiters() {
        let text = "# Foo\n\nplain readme";
        let once = extract_readme(text);
        assert_eq!(extract_readme(&once), once);
    }

    #[test]
    fn extraction_of_extracted_content_is_stable() {
        let text = "---README-CONTENT-START---\n# Foo\n---README-CONTENT-END---";
        let once = extract_readme(text);
        assert_eq!(extract_readme(&once), once);
    }

    #[test]
    fn empty_input_yields_an_empty_string() {
        assert_eq!(extract_readme(""), "");
    }
}
