//! OpenAI-compatible API backend
//!
//! Implements LlmBackend by making HTTP calls to any OpenAI-compatible
//! chat completions endpoint (OpenAI, Ollama, vLLM, LM Studio, etc.).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{Conversation, Role};

use super::http::{build_client, endpoint, send_with_retry};
use super::{BackendHealth, LlmBackend, OutputSchema};

const PROVIDER: &str = "openai";

// ─────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────

/// Configuration for OpenAI-compatible API backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL (e.g., "https://api.openai.com/v1", "http://localhost:11434/v1")
    pub base_url: String,

    /// API key (empty string for local servers like Ollama)
    pub api_key: String,

    /// Model to use (e.g., "gpt-4o-mini", "llama3")
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries on transient errors
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// OpenAI API types (request/response)
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

// ─────────────────────────────────────────────────────────────────
// OpenAI Backend
// ─────────────────────────────────────────────────────────────────

/// OpenAI-compatible API backend
pub struct OpenAiBackend {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiBackend {
    /// Create a new OpenAI backend with the given configuration
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = build_client(PROVIDER, config.timeout_secs)?;

        info!(
            base_url = %config.base_url,
            model = %config.model,
            "OpenAI-compatible backend created"
        );

        Ok(Self { config, client })
    }

    /// Build the authorization header value (if API key is set)
    fn auth_header(&self) -> Option<String> {
        if self.config.api_key.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", self.config.api_key))
        }
    }

    fn build_request(
        &self,
        conversation: &Conversation,
        system_prompt: &str,
        schema: Option<&OutputSchema>,
    ) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system_prompt.to_string(),
            });
        }
        messages.extend(conversation.messages().iter().map(|m| ChatMessage {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: m.text.clone(),
        }));

        let response_format = schema.map(|s| {
            serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": s.name,
                    "schema": s.to_json_schema(),
                },
            })
        });

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            response_format,
        }
    }
}

/// Pull the first choice's text out of a completion response
fn extract_text(parsed: ChatCompletionResponse) -> Result<String> {
    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::malformed(PROVIDER, "Empty text response"));
    }
    Ok(text)
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn health_check(&self) -> Result<BackendHealth> {
        let url = endpoint(&self.config.base_url, "models");
        let mut req = self.client.get(&url);
        if let Some(ref auth) = self.auth_header() {
            req = req.header("Authorization", auth);
        }

        Ok(match req.send().await {
            Ok(resp) if resp.status().is_success() => BackendHealth::ok(&self.config.model),
            Ok(resp) => BackendHealth::failing(
                &self.config.model,
                format!("API returned status {}", resp.status()),
            ),
            Err(e) => BackendHealth::failing(&self.config.model, format!("Connection failed: {}", e)),
        })
    }

    async fn generate(
        &self,
        conversation: &Conversation,
        system_prompt: &str,
        schema: Option<&OutputSchema>,
    ) -> Result<String> {
        let body = self.build_request(conversation, system_prompt, schema);
        let url = endpoint(&self.config.base_url, "chat/completions");
        let auth = self.auth_header();

        debug!(
            model = %self.config.model,
            messages = body.messages.len(),
            structured = schema.is_some(),
            "Sending chat completion"
        );

        let response = send_with_retry(PROVIDER, self.config.max_retries, || {
            let req = self.client.post(&url).json(&body);
            match auth.as_deref() {
                Some(auth) => req.header("Authorization", auth),
                None => req,
            }
        })
        .await?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::malformed(PROVIDER, format!("Failed to parse API response: {}", e)))?;

        extract_text(parsed)
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::http::spawn_stub;
    use crate::llm::SchemaField;
    use crate::types::Message;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Json;

    const SCHEMA: OutputSchema = OutputSchema {
        name: "decision",
        fields: &[SchemaField { name: "agent", description: "who", required: true }],
    };

    fn conversation() -> Conversation {
        Conversation::new(vec![Message::user("hi"), Message::assistant("Aye!"), Message::user("deal?")])
    }

    fn config_for(base_url: String) -> OpenAiConfig {
        OpenAiConfig {
            base_url,
            max_retries: 0,
            timeout_secs: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = OpenAiConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert!(config.api_key.is_empty());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_auth_header() {
        let config = OpenAiConfig {
            api_key: "sk-test-123".to_string(),
            ..Default::default()
        };
        let backend = OpenAiBackend::new(config).unwrap();
        assert_eq!(backend.auth_header(), Some("Bearer sk-test-123".to_string()));

        let no_key = OpenAiBackend::new(OpenAiConfig::default()).unwrap();
        assert_eq!(no_key.auth_header(), None);
    }

    #[test]
    fn test_request_shape() {
        let backend = OpenAiBackend::new(OpenAiConfig::default()).unwrap();
        let req = backend.build_request(&conversation(), "be brief", Some(&SCHEMA));
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][2]["role"], "assistant");
        assert_eq!(json["messages"].as_array().unwrap().len(), 4);
        assert_eq!(json["response_format"]["json_schema"]["name"], "decision");

        let plain = backend.build_request(&conversation(), "", None);
        let json = serde_json::to_value(&plain).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn test_extract_text_rejects_empty() {
        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(extract_text(empty), Err(Error::Malformed { .. })));

        let blank: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap();
        assert!(extract_text(blank).is_err());
    }

    #[tokio::test]
    async fn test_generate_against_stub() {
        let app = axum::Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<Value>| async move {
                let last = body["messages"].as_array().map(|m| m.len()).unwrap_or(0);
                Json(serde_json::json!({
                    "choices": [{ "message": { "content": format!("saw {} messages", last) } }]
                }))
            }),
        );
        let base = spawn_stub(app).await;
        let backend = OpenAiBackend::new(config_for(base)).unwrap();

        let text = backend.generate(&conversation(), "sys", None).await.unwrap();
        assert_eq!(text, "saw 4 messages");
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_quota() {
        let app = axum::Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = spawn_stub(app).await;
        let backend = OpenAiBackend::new(config_for(base)).unwrap();

        let err = backend.generate(&conversation(), "sys", None).await.unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { .. }));
    }
}
