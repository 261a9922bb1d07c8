//! Integration tests for the LLM service against a mock provider endpoint.

use futures::StreamExt;

use ai_llm_service::chat::ChatTurn;
use ai_llm_service::config::llm_model_config::LlmModelConfig;
use ai_llm_service::config::llm_provider::LlmProvider;
use ai_llm_service::llm_service::LlmService;

fn ollama_cfg(endpoint: String) -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: "qwen3:14b".into(),
        endpoint,
        api_key: None,
        max_tokens: Some(256),
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(5),
    }
}

#[tokio::test]
async fn buffered_chat_returns_the_message_content() {
    let mut server = mockito::Server::new_async().await;

    let _chat = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":{"role":"assistant","content":"hello"},"done":true}"#)
        .create_async()
        .await;

    let svc = LlmService::new(ollama_cfg(server.url())).expect("service");
    let out = svc
        .chat("be terse", &[ChatTurn::user("hi")])
        .await
        .expect("chat");

    assert_eq!(out, "hello");
}

#[tokio::test]
async fn streamed_chat_concatenates_to_the_full_completion() {
    let mut server = mockito::Server::new_async().await;

    let body = concat!(
        "{\"message\":{\"content\":\"# \"},\"done\":false}\n",
        "{\"message\":{\"content\":\"Readme\"},\"done\":false}\n",
        "{\"message\":{\"content\":\"\"},\"done\":true}\n",
    );

    let _chat = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_header("content-type", "application/x-ndjson")
        .with_body(body)
        .create_async()
        .await;

    let svc = LlmService::new(ollama_cfg(server.url())).expect("service");
    let stream = svc
        .chat_stream("be terse", &[ChatTurn::user("write a readme")])
        .await
        .expect("stream");

    let tokens: Vec<String> = stream
        .filter_map(|r| async move { r.ok() })
        .collect()
        .await;

    assert_eq!(tokens.concat(), "# Readme");
}

#[tokio::test]
async fn upstream_failure_is_surfaced_as_an_error() {
    let mut server = mockito::Server::new_async().await;

    let _chat = server
        .mock("POST", "/api/chat")
        .with_status(500)
        .with_body("model melted")
        .create_async()
        .await;

    let svc = LlmService::new(ollama_cfg(server.url())).expect("service");
    let err = svc
        .chat("be terse", &[ChatTurn::user("hi")])
        .await
        .expect_err("500 must raise");

    assert!(err.to_string().contains("500"));
}

#[test]
fn openai_without_api_key_fails_at_construction() {
    let cfg = LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: "gpt-4o".into(),
        endpoint: "https://api.openai.com".into(),
        api_key: None,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: None,
    };

    assert!(LlmService::new(cfg).is_err());
}
