//! OpenAI request/response mapping and HTTP behavior.

use std::collections::BTreeMap;

use tandem::credentials::{Credentials, OPENAI_API_KEY};
use tandem::providers::openai::{build_request, parse_response, OpenAiProvider};
use tandem::providers::{CompletionRequest, LlmProvider, Message, ProviderError};

use crate::support::serve_once;

fn request() -> CompletionRequest {
    CompletionRequest {
        system: Some("You are 'Casey'.".to_owned()),
        messages: vec![Message::user("hey")],
        temperature: Some(0.7),
        max_tokens: Some(100),
    }
}

#[test]
fn system_prompt_becomes_first_message() {
    let built = build_request("gpt-4o-mini", &request());
    assert_eq!(built.model, "gpt-4o-mini");
    assert_eq!(built.messages.len(), 2);
    assert_eq!(built.messages[0].role, "system");
    assert_eq!(
        built.messages[0].content.as_deref(),
        Some("You are 'Casey'.")
    );
    assert_eq!(built.messages[1].role, "user");
    assert_eq!(built.max_tokens, Some(100));
}

#[test]
fn response_uses_first_choice() {
    let body = r#"{
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{"message": {"role": "assistant", "content": "k."}}],
        "usage": {"prompt_tokens": 20, "completion_tokens": 2}
    }"#;
    let parsed = parse_response(body).expect("response should parse");
    assert_eq!(parsed.text, "k.");
    assert_eq!(parsed.usage.input_tokens, 20);
    assert_eq!(parsed.model, "gpt-4o-mini-2024-07-18");
}

#[test]
fn response_without_choices_is_parse_error() {
    let result = parse_response(r#"{"model": "gpt-4o-mini", "choices": []}"#);
    assert!(matches!(result, Err(ProviderError::Parse(_))));
}

#[tokio::test]
async fn sends_bearer_token_to_chat_completions() {
    let body = r#"{"model": "gpt-4o-mini", "choices": [{"message": {"role": "assistant", "content": "whatever"}}]}"#;
    let (base_url, captured) = serve_once("200 OK", body).await;
    let provider = OpenAiProvider::new(
        "openai/gpt-4o-mini".to_owned(),
        "gpt-4o-mini".to_owned(),
        Credentials::from_map(BTreeMap::from([(
            OPENAI_API_KEY.to_owned(),
            "sk-test".to_owned(),
        )])),
    )
    .with_base_url(base_url);

    let response = provider
        .complete(request())
        .await
        .expect("completion should succeed");
    assert_eq!(response.text, "whatever");

    let seen = captured.await.expect("request should be captured");
    assert!(seen.head.starts_with("POST /chat/completions"));
    assert!(seen
        .head
        .to_ascii_lowercase()
        .contains("authorization: bearer sk-test"));
    let sent: serde_json::Value = serde_json::from_str(&seen.body)
        .expect("body should be JSON");
    assert_eq!(sent["messages"][1]["content"], "hey");
}

#[tokio::test]
async fn missing_key_is_reported() {
    let provider = OpenAiProvider::new(
        "openai/gpt-4o-mini".to_owned(),
        "gpt-4o-mini".to_owned(),
        Credentials::default(),
    );
    let result = provider.complete(request()).await;
    assert!(matches!(
        result,
        Err(ProviderError::MissingCredential { key }) if key == OPENAI_API_KEY
    ));
}
