//! Incremental decoding of provider byte streams into text tokens.
//!
//! Providers frame their streams differently:
//! - Ollama emits NDJSON: one JSON chunk per line.
//! - OpenAI emits SSE: `data: {json}` events separated by blank lines,
//!   terminated by `data: [DONE]`.
//!
//! Both are decoded here with the same buffered line loop: bytes arrive at
//! arbitrary chunk boundaries, so a partial line stays in the buffer until
//! its terminator shows up. The resulting [`TokenStream`] yields plain text
//! fragments whose concatenation is the full completion.

use bytes::Bytes;
use futures::stream::unfold;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::warn;

use crate::chat::TokenStream;
use crate::error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind};

/// What one framed line contributed to the token stream.
enum LineOutcome {
    /// A text fragment to yield.
    Token(String),
    /// Framing noise (keep-alives, empty deltas); keep reading.
    Skip,
    /// The provider signaled end-of-stream.
    Done,
    /// The line was unrecoverably malformed.
    Fail(AiLlmError),
}

/// Decodes an Ollama NDJSON chat stream.
pub fn ollama_token_stream(
    bytes_stream: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
) -> TokenStream {
    lines_to_tokens(bytes_stream, parse_ollama_line)
}

/// Decodes an OpenAI SSE chat-completions stream.
pub fn openai_token_stream(
    bytes_stream: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
) -> TokenStream {
    lines_to_tokens(bytes_stream, parse_openai_line)
}

/// Shared buffered line loop over a byte stream.
///
/// Chunk boundaries carry no meaning: a line is processed only once its
/// `\n` terminator has arrived (or the stream ended with a non-empty tail).
fn lines_to_tokens<S, F>(bytes_stream: S, parse: F) -> TokenStream
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
    F: FnMut(&str) -> LineOutcome + Send + 'static,
{
    let state = (Box::pin(bytes_stream), String::new(), false, parse);

    let stream = unfold(state, |(mut stream, mut buffer, finished, mut parse)| {
        async move {
            if finished {
                return None;
            }

            loop {
                if let Some(pos) = buffer.find('\n') {
                    let raw: String = buffer.drain(..=pos).collect();
                    let line = raw.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match parse(line) {
                        LineOutcome::Token(t) => {
                            return Some((Ok(t), (stream, buffer, false, parse)));
                        }
                        LineOutcome::Skip => continue,
                        LineOutcome::Done => return None,
                        LineOutcome::Fail(e) => {
                            return Some((Err(e), (stream, buffer, true, parse)));
                        }
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                    }
                    Some(Err(e)) => {
                        return Some((
                            Err(AiLlmError::HttpTransport(e)),
                            (stream, buffer, true, parse),
                        ));
                    }
                    None => {
                        // Stream ended; flush a trailing unterminated line.
                        let tail = buffer.trim().to_string();
                        buffer.clear();
                        if tail.is_empty() {
                            return None;
                        }
                        return match parse(&tail) {
                            LineOutcome::Token(t) => Some((Ok(t), (stream, buffer, true, parse))),
                            _ => None,
                        };
                    }
                }
            }
        }
    });

    Box::pin(stream)
}

/* ==========================
Line parsers
========================== */

#[derive(Debug, Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    message: Option<OllamaChunkMessage>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChunkMessage {
    #[serde(default)]
    content: String,
}

fn parse_ollama_line(line: &str) -> LineOutcome {
    let chunk: OllamaChunk = match serde_json::from_str(line) {
        Ok(c) => c,
        Err(e) => {
            return LineOutcome::Fail(
                ProviderError::new(
                    Provider::Ollama,
                    ProviderErrorKind::Stream(format!("bad NDJSON chunk: {e}")),
                )
                .into(),
            );
        }
    };

    let content = chunk.message.map(|m| m.content).unwrap_or_default();
    if !content.is_empty() {
        return LineOutcome::Token(content);
    }
    if chunk.done {
        return LineOutcome::Done;
    }
    LineOutcome::Skip
}

#[derive(Debug, Deserialize)]
struct OpenAiChunk {
    choices: Vec<OpenAiChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChunkChoice {
    #[serde(default)]
    delta: OpenAiDelta,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
}

fn parse_openai_line(line: &str) -> LineOutcome {
    // SSE fields other than `data:` (events, comments, retries) are noise.
    let Some(data) = line.strip_prefix("data:") else {
        return LineOutcome::Skip;
    };
    let data = data.trim();

    if data == "[DONE]" {
        return LineOutcome::Done;
    }

    let chunk: OpenAiChunk = match serde_json::from_str(data) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "skipping undecodable SSE data line");
            return LineOutcome::Skip;
        }
    };

    match chunk
        .choices
        .into_iter()
        .find_map(|c| c.delta.content)
        .filter(|c| !c.is_empty())
    {
        Some(content) => LineOutcome::Token(content),
        None => LineOutcome::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunked(parts: &[&str]) -> impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static {
        let owned: Vec<reqwest::Result<Bytes>> = parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p.as_bytes())))
            .collect();
        stream::iter(owned)
    }

    async fn collect(stream: TokenStream) -> String {
        stream
            .filter_map(|r| async move { r.ok() })
            .collect::<Vec<_>>()
            .await
            .concat()
    }

    #[tokio::test]
    async fn ollama_tokens_survive_arbitrary_chunk_boundaries() {
        // One NDJSON line split across three byte chunks.
        let parts = [
            "{\"message\":{\"content\":\"Hel",
            "lo \"},\"done\":false}\n{\"message\":{\"content\":\"world\"},\"done\":false}\n",
            "{\"message\":{\"content\":\"\"},\"done\":true}\n",
        ];
        let out = collect(ollama_token_stream(chunked(&parts))).await;
        assert_eq!(out, "Hello world");
    }

    #[tokio::test]
    async fn openai_stream_stops_at_done_marker() {
        let parts = [
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\ndata: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"never\"}}]}\n\n",
        ];
        let out = collect(openai_token_stream(chunked(&parts))).await;
        assert_eq!(out, "ab");
    }

    #[tokio::test]
    async fn openai_role_preamble_and_keepalives_are_skipped() {
        let parts = [
            ": keep-alive\n\n",
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n\n",
            "data: [DONE]\n\n",
        ];
        let out = collect(openai_token_stream(chunked(&parts))).await;
        assert_eq!(out, "hi");
    }

    #[tokio::test]
    async fn malformed_ollama_chunk_surfaces_a_stream_error() {
        let parts = ["{\"message\":{\"content\":\"x\"},\"done\":false}\nnot json\n"];
        let mut s = ollama_token_stream(chunked(&parts));
        assert_eq!(s.next().await.unwrap().unwrap(), "x");
        assert!(s.next().await.unwrap().is_err());
        assert!(s.next().await.is_none());
    }
}
