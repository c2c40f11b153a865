//! Gemini request/response mapping and HTTP behavior.

use std::collections::BTreeMap;

use tandem::credentials::{Credentials, GEMINI_API_KEY};
use tandem::providers::gemini::{build_request, parse_response, GeminiProvider};
use tandem::providers::{CompletionRequest, LlmProvider, Message, ProviderError};

use crate::support::serve_once;

fn request() -> CompletionRequest {
    CompletionRequest {
        system: Some("You are 'Taylor'.".to_owned()),
        messages: vec![Message::user("hello there")],
        temperature: Some(0.7),
        max_tokens: Some(100),
    }
}

#[test]
fn request_uses_system_instruction_and_generation_config() {
    let built = build_request(&request());
    let json = serde_json::to_value(&built)
        .expect("request should serialize");

    assert_eq!(
        json["systemInstruction"]["parts"][0]["text"],
        "You are 'Taylor'."
    );
    assert!(json["systemInstruction"].get("role").is_none());
    assert_eq!(json["contents"][0]["role"], "user");
    assert_eq!(json["contents"][0]["parts"][0]["text"], "hello there");
    assert_eq!(json["generationConfig"]["maxOutputTokens"], 100);
    let temperature = json["generationConfig"]["temperature"]
        .as_f64()
        .expect("temperature should be a number");
    assert!((temperature - 0.7).abs() < 1e-6);
}

#[test]
fn request_without_system_prompt_omits_instruction() {
    let mut req = request();
    req.system = None;
    req.temperature = None;
    let json = serde_json::to_value(build_request(&req))
        .expect("request should serialize");
    assert!(json.get("systemInstruction").is_none());
    assert!(json["generationConfig"].get("temperature").is_none());
}

#[test]
fn response_text_parts_are_joined() {
    let body = r#"{
        "candidates": [{"content": {"role": "model", "parts": [{"text": "Hey "}, {"text": "you!"}]}}],
        "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3},
        "modelVersion": "gemini-1.5-flash-002"
    }"#;
    let parsed = parse_response(body, "gemini-1.5-flash")
        .expect("response should parse");
    assert_eq!(parsed.text, "Hey you!");
    assert_eq!(parsed.usage.input_tokens, 12);
    assert_eq!(parsed.usage.output_tokens, 3);
    assert_eq!(parsed.model, "gemini-1.5-flash-002");
}

#[test]
fn blocked_response_parses_to_empty_text() {
    let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
    let parsed = parse_response(body, "gemini-1.5-flash")
        .expect("response should parse");
    assert!(parsed.text.is_empty());
    assert_eq!(parsed.model, "gemini-1.5-flash");
}

#[test]
fn malformed_response_is_parse_error() {
    let result = parse_response("not json", "gemini-1.5-flash");
    assert!(matches!(result, Err(ProviderError::Parse(_))));
}

#[tokio::test]
async fn missing_key_fails_before_any_request() {
    let provider = GeminiProvider::new(
        "gemini/gemini-1.5-flash".to_owned(),
        "gemini-1.5-flash".to_owned(),
        Credentials::default(),
    )
    .with_base_url("http://127.0.0.1:9");

    let result = provider.complete(request()).await;
    match result {
        Err(ProviderError::MissingCredential { key }) => assert_eq!(key, GEMINI_API_KEY),
        other => panic!("expected missing credential, got {other:?}"),
    }
}

#[tokio::test]
async fn error_status_is_reported_with_redacted_body() {
    let body = r#"{"error": {"message": "API key AIzaSyA1234567890abcdefghijklmnopqrstu not valid"}}"#;
    let (base_url, _captured) = serve_once("400 Bad Request", body).await;
    let provider = GeminiProvider::new(
        "gemini/gemini-1.5-flash".to_owned(),
        "gemini-1.5-flash".to_owned(),
        Credentials::from_map(BTreeMap::from([(
            GEMINI_API_KEY.to_owned(),
            "AIzaSyA1234567890abcdefghijklmnopqrstu".to_owned(),
        )])),
    )
    .with_base_url(base_url);

    match provider.complete(request()).await {
        Err(ProviderError::HttpStatus { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("[REDACTED]"));
            assert!(!body.contains("AIzaSy"));
        }
        other => panic!("expected HTTP status error, got {other:?}"),
    }
}
