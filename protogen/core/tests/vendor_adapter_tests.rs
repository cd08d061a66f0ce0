// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Vendor adapters against mock HTTP servers.
//!
//! Checks the request shape each vendor expects and how its response is
//! normalized: fragment concatenation, blocked and empty responses, and
//! HTTP status mapping.

use mockito::{Matcher, Server};
use protogen_core::domain::config::ProvidersConfig;
use protogen_core::domain::llm::{
    DispatchError, FinishReason, GenerationOptions, GenerationRequest, LlmError, LlmProvider,
    ProviderCredentials, ProviderId,
};
use protogen_core::infrastructure::llm::anthropic::AnthropicAdapter;
use protogen_core::infrastructure::llm::gemini::GeminiAdapter;
use protogen_core::infrastructure::llm::openai::OpenAIAdapter;
use protogen_core::infrastructure::llm::ProviderDispatcher;
use serde_json::json;

const GEMINI_PATH: &str = "/models/gemini-2.5-flash:generateContent";

fn options() -> GenerationOptions {
    GenerationOptions {
        temperature: 0.3,
        max_output_tokens: 8000,
    }
}

fn gemini(server: &Server) -> GeminiAdapter {
    GeminiAdapter::new(
        server.url(),
        "g-key".to_string(),
        "gemini-2.5-flash".to_string(),
        None,
    )
    .unwrap()
}

#[tokio::test]
async fn test_gemini_concatenates_all_parts() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_header("x-goog-api-key", "g-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{"text": "## Protocol\n"}, {"text": "1. Thaw"}, {"text": " reagents"}]
                    },
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let response = gemini(&server).generate("sys", "user", &options()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.text, "## Protocol\n1. Thaw reagents");
    assert_eq!(response.finish_reason, FinishReason::Stop);
}

#[tokio::test]
async fn test_gemini_sends_combined_prompt_and_generation_config() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""text":"X\\n\\nY""#.to_string()),
            Matcher::Regex(r#""maxOutputTokens":8000"#.to_string()),
        ]))
        .with_status(200)
        .with_body(json!({"candidates": [{"content": {"parts": [{"text": "ok"}]}}]}).to_string())
        .create_async()
        .await;

    let response = gemini(&server).generate("X", "Y", &options()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.text, "ok");
}

#[tokio::test]
async fn test_gemini_keeps_models_prefix() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-pro:generateContent")
        .with_status(200)
        .with_body(json!({"candidates": [{"content": {"parts": [{"text": "ok"}]}}]}).to_string())
        .create_async()
        .await;

    let adapter = GeminiAdapter::new(
        format!("{}/", server.url()),
        "g-key".to_string(),
        "models/gemini-pro".to_string(),
        None,
    )
    .unwrap();
    adapter.generate("sys", "user", &options()).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_blocked_prompt() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", GEMINI_PATH)
        .with_status(200)
        .with_body(json!({"promptFeedback": {"blockReason": "SAFETY"}}).to_string())
        .create_async()
        .await;

    let err = gemini(&server).generate("sys", "user", &options()).await.unwrap_err();
    match err {
        LlmError::Blocked(reason) => assert!(reason.contains("SAFETY")),
        other => panic!("expected Blocked, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gemini_safety_stop_without_text_is_blocked() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", GEMINI_PATH)
        .with_status(200)
        .with_body(json!({"candidates": [{"finishReason": "SAFETY"}]}).to_string())
        .create_async()
        .await;

    let err = gemini(&server).generate("sys", "user", &options()).await.unwrap_err();
    assert!(matches!(err, LlmError::Blocked(_)));
}

#[tokio::test]
async fn test_gemini_truncated_text_is_returned() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", GEMINI_PATH)
        .with_status(200)
        .with_body(
            json!({"candidates": [{
                "content": {"parts": [{"text": "partial"}]},
                "finishReason": "MAX_TOKENS"
            }]})
            .to_string(),
        )
        .create_async()
        .await;

    let response = gemini(&server).generate("sys", "user", &options()).await.unwrap();
    assert_eq!(response.text, "partial");
    assert_eq!(response.finish_reason, FinishReason::Length);
}

#[tokio::test]
async fn test_gemini_no_candidates_is_empty_response() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", GEMINI_PATH)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let err = gemini(&server).generate("sys", "user", &options()).await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse));
}

#[tokio::test]
async fn test_openai_sends_separate_messages() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4-turbo-preview",
            "messages": [
                {"role": "system", "content": "X"},
                {"role": "user", "content": "Y"}
            ],
            "max_tokens": 8000
        })))
        .with_status(200)
        .with_body(
            json!({
                "model": "gpt-4-turbo-preview",
                "choices": [{"message": {"role": "assistant", "content": "answer"}, "finish_reason": "stop"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let adapter = OpenAIAdapter::new(
        server.url(),
        "sk-test".to_string(),
        "gpt-4-turbo-preview".to_string(),
        None,
    )
    .unwrap();
    let response = adapter.generate("X", "Y", &options()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.text, "answer");
    assert_eq!(response.model, "gpt-4-turbo-preview");
}

#[tokio::test]
async fn test_openai_status_mapping() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body(r#"{"error": {"message": "Incorrect API key"}}"#)
        .create_async()
        .await;

    let adapter = OpenAIAdapter::new(server.url(), "bad".into(), "gpt-4o".into(), None).unwrap();
    let err = adapter.generate("sys", "user", &options()).await.unwrap_err();
    match err {
        LlmError::Authentication(body) => assert!(body.contains("Incorrect API key")),
        other => panic!("expected Authentication, got {:?}", other),
    }
}

#[tokio::test]
async fn test_openai_content_filter_without_text_is_blocked() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(
            json!({"choices": [{"message": {"content": null}, "finish_reason": "content_filter"}]})
                .to_string(),
        )
        .create_async()
        .await;

    let adapter = OpenAIAdapter::new(server.url(), "sk".into(), "gpt-4o".into(), None).unwrap();
    let err = adapter.generate("sys", "user", &options()).await.unwrap_err();
    assert!(matches!(err, LlmError::Blocked(_)));
}

#[tokio::test]
async fn test_openai_empty_string_content_is_success() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(
            json!({"choices": [{"message": {"content": ""}, "finish_reason": "stop"}]}).to_string(),
        )
        .create_async()
        .await;

    let adapter = OpenAIAdapter::new(server.url(), "sk".into(), "gpt-4o".into(), None).unwrap();
    let response = adapter.generate("sys", "user", &options()).await.unwrap();
    assert_eq!(response.text, "");
}

#[tokio::test]
async fn test_anthropic_joins_text_blocks() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/messages")
        .match_header("x-api-key", "a-key")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::PartialJson(json!({
            "system": "X",
            "messages": [{"role": "user", "content": "Y"}]
        })))
        .with_status(200)
        .with_body(
            json!({
                "model": "claude-3-sonnet-20240229",
                "content": [
                    {"type": "text", "text": "first "},
                    {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                    {"type": "text", "text": "second"}
                ],
                "stop_reason": "end_turn"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let adapter = AnthropicAdapter::new(
        server.url(),
        "a-key".to_string(),
        "claude-3-sonnet-20240229".to_string(),
        None,
    )
    .unwrap();
    let response = adapter.generate("X", "Y", &options()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.text, "first second");
    assert_eq!(response.finish_reason, FinishReason::Stop);
}

#[tokio::test]
async fn test_anthropic_rate_limit() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/messages")
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let adapter =
        AnthropicAdapter::new(server.url(), "a-key".into(), "claude".into(), None).unwrap();
    let err = adapter.generate("sys", "user", &options()).await.unwrap_err();
    assert!(matches!(err, LlmError::RateLimit(_)));
}

#[tokio::test]
async fn test_malformed_body() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/messages")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let adapter =
        AnthropicAdapter::new(server.url(), "a-key".into(), "claude".into(), None).unwrap();
    let err = adapter.generate("sys", "user", &options()).await.unwrap_err();
    assert!(matches!(err, LlmError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_fallback_to_gemini_sends_combined_prompt() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_body(Matcher::Regex(r#""text":"X\\n\\nY""#.to_string()))
        .with_status(200)
        .with_body(json!({"candidates": [{"content": {"parts": [{"text": "mocked"}]}}]}).to_string())
        .create_async()
        .await;

    let mut config = ProvidersConfig::default();
    config.gemini.endpoint = Some(server.url());
    config.gemini.model = Some("gemini-2.5-flash".to_string());
    let credentials = ProviderCredentials::from_entries([(ProviderId::Gemini, Some("g-key"))]);
    let dispatcher = ProviderDispatcher::from_config(&config, &credentials);

    let request = GenerationRequest::new("X", "Y", ProviderId::OpenAi);
    let result = dispatcher.generate(&request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(result.provider_used, ProviderId::Gemini);
    assert_eq!(result.text, "mocked");
}

#[tokio::test]
async fn test_no_credentials_makes_no_http_call() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut config = ProvidersConfig::default();
    for id in ProviderId::PRIORITY {
        config.get_mut(id).endpoint = Some(server.url());
    }
    let dispatcher = ProviderDispatcher::from_config(&config, &ProviderCredentials::default());

    let request = GenerationRequest::new("X", "Y", ProviderId::Gemini);
    let err = dispatcher.generate(&request).await.unwrap_err();

    assert!(matches!(err, DispatchError::NoProviderAvailable));
    mock.assert_async().await;
}
