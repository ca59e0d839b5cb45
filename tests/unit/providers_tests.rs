/*!
 * Tests for the provider implementations
 */

use std::time::Duration;

use submod::app_config::{TranslationConfig, TranslationProvider};
use submod::providers::anthropic::{Anthropic, AnthropicRequest, AnthropicResponse};
use submod::providers::openai::{OpenAI, OpenAIRequest, OpenAIResponse};
use submod::providers::{create_provider, CompletionRequest, Provider};

/// Test OpenAI request serialization
#[test]
fn test_openaiRequest_serialize_shouldContainMessagesAndTemperature() {
    let request = OpenAIRequest::new("gpt-4o")
        .add_message("system", "Rewrite.")
        .add_message("user", "1. Hello")
        .temperature(0.3);

    let json = serde_json::to_value(&request).unwrap();

    assert_eq!(json["model"], "gpt-4o");
    assert_eq!(json["messages"][0]["role"], "system");
    assert_eq!(json["messages"][1]["content"], "1. Hello");
    assert!((json["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    assert!(json.get("max_tokens").is_none());
    assert_eq!(request.messages().len(), 2);
}

/// Test the configured token ceiling reaches the request body
#[test]
fn test_openai_buildRequest_withMaxTokens_shouldSerializeCeiling() {
    let completion = CompletionRequest {
        system: "Rewrite.".to_string(),
        user: "1. Hello".to_string(),
        model: "gpt-4o".to_string(),
        temperature: 0.3,
        timeout: Duration::from_secs(5),
    };

    let capped = OpenAI::new("k", "").with_max_tokens(1024).build_request(completion.clone());
    let json = serde_json::to_value(&capped).unwrap();
    assert_eq!(json["max_tokens"], 1024);
    assert_eq!(json["messages"][1]["content"], "1. Hello");

    let uncapped = OpenAI::new("k", "").build_request(completion);
    assert!(serde_json::to_value(&uncapped).unwrap().get("max_tokens").is_none());
}

#[test]
fn test_openaiResponse_extractText_shouldUseFirstNonEmptyChoice() {
    let response: OpenAIResponse = serde_json::from_str(
        r#"{"choices":[{"message":{"role":"assistant","content":"1. Hi"}}],
            "usage":{"prompt_tokens":5,"completion_tokens":2,"total_tokens":7}}"#,
    )
    .unwrap();
    assert_eq!(OpenAI::extract_text(&response), Some("1. Hi".to_string()));

    let empty: OpenAIResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
    assert_eq!(OpenAI::extract_text(&empty), None);
}

#[test]
fn test_openai_completionsUrl_shouldJoinEndpoint() {
    assert_eq!(
        OpenAI::new("k", "http://localhost:1234/v1/").completions_url(),
        "http://localhost:1234/v1/chat/completions"
    );
    assert_eq!(
        OpenAI::new("k", "").completions_url(),
        "https://api.openai.com/v1/chat/completions"
    );
}

/// Test Anthropic request serialization
#[test]
fn test_anthropicRequest_serialize_shouldCarrySystemAndMaxTokens() {
    let request = AnthropicRequest::new("claude-3-5-haiku-latest", 2048)
        .system("Rewrite.")
        .add_message("user", "1. Hello")
        .temperature(0.2);

    let json = serde_json::to_value(&request).unwrap();

    assert_eq!(json["system"], "Rewrite.");
    assert_eq!(json["max_tokens"], 2048);
    assert_eq!(json["messages"][0]["role"], "user");
}

#[test]
fn test_anthropicResponse_extractText_shouldJoinTextBlocks() {
    let response: AnthropicResponse = serde_json::from_str(
        r#"{"content":[{"type":"text","text":"1. Hi\n"},{"type":"tool_use"},{"type":"text","text":"2. There"}],
            "usage":{"input_tokens":3,"output_tokens":4}}"#,
    )
    .unwrap();

    assert_eq!(Anthropic::extract_text_from_response(&response), "1. Hi\n2. There");
}

#[test]
fn test_anthropic_messagesUrl_shouldJoinEndpoint() {
    assert_eq!(
        Anthropic::new("k", "https://api.anthropic.com/").messages_url(),
        "https://api.anthropic.com/v1/messages"
    );
}

/// Test provider construction from configuration
#[test]
fn test_createProvider_shouldFollowConfiguredType() {
    let mut config = TranslationConfig::default();
    assert_eq!(create_provider(&config).name(), "openai");

    config.provider = TranslationProvider::Anthropic;
    assert_eq!(create_provider(&config).name(), "anthropic");

    config.provider = TranslationProvider::LMStudio;
    assert_eq!(create_provider(&config).name(), "lmstudio");
}

/// Test connection errors against a closed local port
#[tokio::test]
async fn test_openai_complete_withUnreachableEndpoint_shouldFail() {
    let client = OpenAI::new("k", "http://127.0.0.1:9/v1");
    let request = CompletionRequest {
        system: "s".to_string(),
        user: "1. u".to_string(),
        model: "m".to_string(),
        temperature: 0.0,
        timeout: Duration::from_secs(2),
    };

    assert!(client.complete(request).await.is_err());
}

/// Live OpenAI call, needs OPENAI_API_KEY
#[tokio::test]
#[ignore]
async fn test_openai_provider_withValidApiKey_shouldComplete() {
    let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        return;
    }

    let client = OpenAI::new(api_key, "");
    let text = client
        .complete(CompletionRequest {
            system: "Rewrite each numbered line in modern English.".to_string(),
            user: "1. Whither goest thou?".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.3,
            timeout: Duration::from_secs(30),
        })
        .await
        .unwrap();

    assert!(text.starts_with("1."));
}

/// Live Anthropic call, needs ANTHROPIC_API_KEY
#[tokio::test]
#[ignore]
async fn test_anthropic_provider_withValidApiKey_shouldComplete() {
    let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        return;
    }

    let client = Anthropic::new(api_key, "");
    assert!(client
        .test_connection("claude-3-5-haiku-latest", Duration::from_secs(30))
        .await
        .is_ok());
}
