//! Integration tests for the conversation session state machine.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures::stream;

use chat_session::{ConversationSession, MessageRole, SendOutcome, SessionPhase};
use repo_context_engine::platforms::{RepoId, RepoOwner, Repository};

fn repository() -> Repository {
    Repository {
        id: RepoId::Number(1),
        name: "foo".into(),
        full_name: "bar/foo".into(),
        description: Some("desc".into()),
        private: false,
        url: "https://github.com/bar/foo".into(),
        default_branch: "main".into(),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
        language: Some("Rust".into()),
        star_count: 0,
        fork_count: 0,
        topics: vec![],
        owner: RepoOwner {
            login: "bar".into(),
            avatar_url: None,
        },
    }
}

type ChunkStream = stream::Iter<std::vec::IntoIter<Result<Bytes, std::io::Error>>>;

fn chunk_stream(parts: &[&str]) -> ChunkStream {
    let owned: Vec<Result<Bytes, std::io::Error>> = parts
        .iter()
        .map(|p| Ok(Bytes::copy_from_slice(p.as_bytes())))
        .collect();
    stream::iter(owned)
}

fn byte_chunk_stream(parts: Vec<Vec<u8>>) -> ChunkStream {
    let owned: Vec<Result<Bytes, std::io::Error>> =
        parts.into_iter().map(|p| Ok(Bytes::from(p))).collect();
    stream::iter(owned)
}

#[tokio::test]
async fn final_display_is_invariant_to_chunk_boundaries() {
    let full = "# Foo résumé of the repo"; // multi-byte chars included
    let bytes = full.as_bytes();

    // Several pathological chunkings, including one that splits a UTF-8
    // sequence in the middle.
    let chunkings: Vec<Vec<Vec<u8>>> = vec![
        vec![bytes.to_vec()],
        bytes.chunks(1).map(|c| c.to_vec()).collect(),
        bytes.chunks(3).map(|c| c.to_vec()).collect(),
        vec![bytes[..8].to_vec(), bytes[8..].to_vec()],
    ];

    for chunks in chunkings {
        let mut session = ConversationSession::new(repository());
        let outcome = session
            .send_message("generate", |_outbound| async move {
                Ok(byte_chunk_stream(chunks))
            })
            .await
            .expect("send");

        assert_eq!(outcome, SendOutcome::Completed);
        assert_eq!(session.latest_markdown(), Some(full));
        assert_eq!(session.phase(), SessionPhase::Idle);
    }
}

#[tokio::test]
async fn second_send_while_in_flight_is_a_no_op() {
    let mut session = ConversationSession::new(repository());

    // First send admitted: the session is now processing.
    let first = session.begin_send("hello");
    assert!(first.is_some());
    assert!(session.is_processing());

    // Second send rejected before any transport call happens.
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let outcome = session
        .send_message("hello again", |_outbound| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(chunk_stream(&["x"])) }
        })
        .await
        .expect("ignored send is not an error");

    assert_eq!(outcome, SendOutcome::Ignored);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // Only the first user message was appended.
    assert_eq!(session.messages().len(), 1);
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let mut session = ConversationSession::new(repository());

    let outcome = session
        .send_message("   ", |_outbound| async move { Ok(chunk_stream(&["x"])) })
        .await
        .expect("ignored send is not an error");

    assert_eq!(outcome, SendOutcome::Ignored);
    assert!(session.messages().is_empty());
    assert!(!session.is_processing());
}

#[tokio::test]
async fn history_carries_all_prior_turns_in_order() {
    let mut session = ConversationSession::new(repository());

    session
        .send_message("first", |_o| async move { Ok(chunk_stream(&["reply one"])) })
        .await
        .expect("send");

    let outbound = session.begin_send("second").expect("admitted");
    assert_eq!(outbound.input, "second");
    assert_eq!(outbound.repository.full_name, "bar/foo");

    let roles: Vec<&str> = outbound.history.iter().map(|t| t.role.as_str()).collect();
    let contents: Vec<&str> = outbound
        .history
        .iter()
        .map(|t| t.content.as_str())
        .collect();
    assert_eq!(roles, ["user", "assistant"]);
    assert_eq!(contents, ["first", "reply one"]);
}

#[tokio::test]
async fn stream_error_keeps_the_partial_message_and_returns_to_idle() {
    let mut session = ConversationSession::new(repository());

    let items: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"partial ")),
        Ok(Bytes::from_static(b"text")),
        Err(std::io::Error::other("connection reset")),
    ];

    let result = session
        .send_message("generate", |_o| async move { Ok(stream::iter(items)) })
        .await;

    assert!(result.is_err());
    assert_eq!(session.phase(), SessionPhase::Idle);
    // User message + partially streamed assistant message both survive.
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.latest_markdown(), Some("partial text"));
}

#[tokio::test]
async fn stalled_stream_times_out_and_returns_to_idle() {
    let mut session =
        ConversationSession::new(repository()).with_idle_timeout(Duration::from_millis(20));

    let result = session
        .send_message("generate", |_o| async move {
            Ok(stream::pending::<Result<Bytes, std::io::Error>>())
        })
        .await;

    assert!(result.is_err());
    assert_eq!(session.phase(), SessionPhase::Idle);
    // The empty assistant message stays in its last-known state.
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.latest_markdown(), Some(""));
}

#[tokio::test]
async fn transport_failure_clears_the_in_flight_flag() {
    let mut session = ConversationSession::new(repository());

    let result = session
        .send_message("generate", |_o| async move {
            Err::<ChunkStream, _>(chat_session::ChatSessionError::Transport(
                "refused".into(),
            ))
        })
        .await;

    assert!(result.is_err());
    assert!(!session.is_processing());
    // The user message was appended synchronously and survives the failure.
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.messages()[0].role, MessageRole::User);

    // The session accepts a new send afterwards.
    assert!(session.begin_send("retry").is_some());
}

#[tokio::test]
async fn latest_markdown_id_tracks_the_newest_assistant_message() {
    let mut session = ConversationSession::new(repository());

    session
        .send_message("one", |_o| async move { Ok(chunk_stream(&["first reply"])) })
        .await
        .expect("send");
    let first_id = session.latest_markdown_id().unwrap().to_string();

    session
        .send_message("two", |_o| async move { Ok(chunk_stream(&["second reply"])) })
        .await
        .expect("send");
    let second_id = session.latest_markdown_id().unwrap();

    assert_ne!(first_id, second_id);
    assert_eq!(session.latest_markdown(), Some("second reply"));
}
