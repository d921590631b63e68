//! Gemini gateway for LLM interactions.
//!
//! This module provides a gateway for Google's Generative Language API
//! (`generateContent`). The role-tagged message list used internally is adapted
//! to the Gemini wire format: the system instruction travels in a dedicated
//! field and the assistant role is renamed `model`.

use crate::error::{MemchatError, Result};
use crate::llm::gateway::{CompletionConfig, LlmGateway};
use crate::llm::models::{LlmGatewayResponse, LlmMessage, MessageRole};
use crate::llm::usage::LlmUsage;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

/// Marker Gemini attaches to quota/rate-limit failures.
const QUOTA_MARKER: &str = "RESOURCE_EXHAUSTED";

/// Configuration for connecting to the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Option<std::time::Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("GOOGLE_API_KEY").unwrap_or_default(),
            base_url: std::env::var("GEMINI_API_ENDPOINT")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            timeout: None,
        }
    }
}

/// Gateway for the Google Gemini LLM service.
pub struct GeminiGateway {
    client: Client,
    config: GeminiConfig,
}

impl GeminiGateway {
    /// Create a new Gemini gateway with default configuration.
    pub fn new() -> Self {
        Self::with_config(GeminiConfig::default())
    }

    /// Create a new Gemini gateway with custom configuration.
    pub fn with_config(config: GeminiConfig) -> Self {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder.build().unwrap();

        Self { client, config }
    }

    /// Create gateway with custom API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::with_config(GeminiConfig {
            api_key: api_key.into(),
            ..Default::default()
        })
    }

    /// Create gateway with custom API key and base URL.
    pub fn with_api_key_and_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self::with_config(GeminiConfig {
            api_key: api_key.into(),
            base_url: base_url.into(),
            ..Default::default()
        })
    }
}

impl Default for GeminiGateway {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a message list into the Gemini `systemInstruction` field and the
/// `contents` array. The system message, when present, is always the first
/// element of the assembled list.
fn adapt_messages_to_gemini(messages: &[LlmMessage]) -> (Option<Value>, Vec<Value>) {
    let mut system_instruction = None;
    let mut contents = Vec::new();

    for message in messages {
        match message.role {
            MessageRole::System => {
                if system_instruction.is_none() {
                    system_instruction = Some(serde_json::json!({
                        "parts": [{"text": message.content}]
                    }));
                }
            }
            MessageRole::User => {
                contents.push(serde_json::json!({
                    "role": "user",
                    "parts": [{"text": message.content}]
                }));
            }
            MessageRole::Assistant => {
                contents.push(serde_json::json!({
                    "role": "model",
                    "parts": [{"text": message.content}]
                }));
            }
        }
    }

    (system_instruction, contents)
}

/// Concatenate the text parts of the first candidate.
fn extract_content(body: &Value) -> Option<String> {
    let parts = body["candidates"][0]["content"]["parts"].as_array()?;

    let text: String =
        parts.iter().filter_map(|p| p["text"].as_str()).collect::<Vec<_>>().join("");

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl LlmGateway for GeminiGateway {
    async fn complete(
        &self,
        model: &str,
        messages: &[LlmMessage],
        config: &CompletionConfig,
    ) -> Result<LlmGatewayResponse> {
        info!("Delegating to Gemini for completion");
        debug!("Model: {}, Message count: {}", model, messages.len());

        let (system_instruction, contents) = adapt_messages_to_gemini(messages);

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "temperature": config.temperature,
                "maxOutputTokens": config.max_tokens,
            }
        });

        if let Some(system_instruction) = system_instruction {
            body["systemInstruction"] = system_instruction;
        }

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.config.base_url, model))
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS || error_text.contains(QUOTA_MARKER)
            {
                return Err(MemchatError::QuotaExceeded);
            }

            return Err(MemchatError::Gateway(format!(
                "Gemini API error: {} - {}",
                status, error_text
            )));
        }

        let response_body: Value = response.json().await?;

        let content = extract_content(&response_body)
            .ok_or_else(|| MemchatError::Gateway("No content in response".to_string()))?;

        let usage = LlmUsage::from_response_value(&response_body);

        Ok(LlmGatewayResponse { content, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_config_default_base_url() {
        std::env::remove_var("GEMINI_API_ENDPOINT");
        let config = GeminiConfig::default();
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com/v1beta");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_gateway_with_api_key() {
        let gateway = GeminiGateway::with_api_key("my-api-key");
        assert_eq!(gateway.config.api_key, "my-api-key");
    }

    #[test]
    fn test_gateway_with_api_key_and_base_url() {
        let gateway = GeminiGateway::with_api_key_and_base_url("key", "https://custom.example");
        assert_eq!(gateway.config.api_key, "key");
        assert_eq!(gateway.config.base_url, "https://custom.example");
    }

    #[test]
    fn test_gateway_with_config_timeout() {
        let gateway = GeminiGateway::with_config(GeminiConfig {
            timeout: Some(std::time::Duration::from_secs(5)),
            ..Default::default()
        });
        assert_eq!(gateway.config.timeout, Some(std::time::Duration::from_secs(5)));
    }

    #[test]
    fn test_adapt_messages_roles() {
        let messages = vec![
            LlmMessage::user("Hi"),
            LlmMessage::assistant("Hello there"),
            LlmMessage::user("How are you?"),
        ];

        let (system, contents) = adapt_messages_to_gemini(&messages);

        assert!(system.is_none());
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "Hello there");
        assert_eq!(contents[2]["role"], "user");
    }

    #[test]
    fn test_adapt_messages_system_instruction() {
        let messages = vec![LlmMessage::system("Be terse."), LlmMessage::user("Hi")];

        let (system, contents) = adapt_messages_to_gemini(&messages);

        let system = system.unwrap();
        assert_eq!(system["parts"][0]["text"], "Be terse.");
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
    }

    #[test]
    fn test_extract_content_joins_parts() {
        let body = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hello"}, {"text": " world"}]}
            }]
        });

        assert_eq!(extract_content(&body), Some("Hello world".to_string()));
    }

    #[test]
    fn test_extract_content_missing() {
        let body = serde_json::json!({"candidates": []});
        assert_eq!(extract_content(&body), None);
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"Hello!"}],"role":"model"}}],
                    "usageMetadata":{"promptTokenCount":5,"candidatesTokenCount":2}}"#,
            )
            .create();

        let gateway = GeminiGateway::with_api_key_and_base_url("test-key", server.url());
        let messages = vec![LlmMessage::user("Hi")];
        let config = CompletionConfig::default();

        let result = gateway.complete("gemini-2.5-flash", &messages, &config).await;

        mock.assert();
        let response = result.unwrap();
        assert_eq!(response.content, "Hello!");
        let usage = response.usage.unwrap();
        assert_eq!(usage.input_tokens, 5);
        assert_eq!(usage.output_tokens, 2);
    }

    #[tokio::test]
    async fn test_complete_without_usage_metadata() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Hi"}]}}]}"#)
            .create();

        let gateway = GeminiGateway::with_api_key_and_base_url("test-key", server.url());
        let messages = vec![LlmMessage::user("Hello")];

        let result = gateway
            .complete("gemini-2.5-flash", &messages, &CompletionConfig::default())
            .await;

        mock.assert();
        let response = result.unwrap();
        assert_eq!(response.content, "Hi");
        assert!(response.usage.is_none());
    }

    #[tokio::test]
    async fn test_complete_http_429_is_quota_exceeded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(429)
            .with_body("Too Many Requests")
            .create();

        let gateway = GeminiGateway::with_api_key_and_base_url("test-key", server.url());
        let messages = vec![LlmMessage::user("Hi")];

        let result = gateway
            .complete("gemini-2.5-flash", &messages, &CompletionConfig::default())
            .await;

        mock.assert();
        assert!(matches!(result, Err(MemchatError::QuotaExceeded)));
    }

    #[tokio::test]
    async fn test_complete_resource_exhausted_marker_is_quota_exceeded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(400)
            .with_body(r#"{"error":{"status":"RESOURCE_EXHAUSTED","message":"quota"}}"#)
            .create();

        let gateway = GeminiGateway::with_api_key_and_base_url("test-key", server.url());
        let messages = vec![LlmMessage::user("Hi")];

        let result = gateway
            .complete("gemini-2.5-flash", &messages, &CompletionConfig::default())
            .await;

        mock.assert();
        assert!(matches!(result, Err(MemchatError::QuotaExceeded)));
    }

    #[tokio::test]
    async fn test_complete_provider_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(500)
            .with_body("internal error")
            .create();

        let gateway = GeminiGateway::with_api_key_and_base_url("test-key", server.url());
        let messages = vec![LlmMessage::user("Hi")];

        let result = gateway
            .complete("gemini-2.5-flash", &messages, &CompletionConfig::default())
            .await;

        mock.assert();
        assert!(matches!(result, Err(MemchatError::Gateway(_))));
    }

    #[tokio::test]
    async fn test_complete_empty_candidates_is_gateway_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create();

        let gateway = GeminiGateway::with_api_key_and_base_url("test-key", server.url());
        let messages = vec![LlmMessage::user("Hi")];

        let result = gateway
            .complete("gemini-2.5-flash", &messages, &CompletionConfig::default())
            .await;

        mock.assert();
        assert!(matches!(result, Err(MemchatError::Gateway(_))));
    }
}
