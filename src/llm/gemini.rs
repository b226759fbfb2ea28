//! Google Gemini backend
//!
//! Calls the `generateContent` REST endpoint. Conversation turns map to the
//! `user`/`model` roles Gemini expects, the system prompt travels as
//! `systemInstruction`, and structured mode sets a JSON response schema.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{Conversation, Role};

use super::http::{build_client, endpoint, send_with_retry};
use super::{BackendHealth, LlmBackend, OutputSchema};

const PROVIDER: &str = "gemini";

/// Environment variable consulted when no key is configured
pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

// ─────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API base URL, up to and including the version segment
    pub base_url: String,

    /// API key; empty means not configured
    pub api_key: String,

    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries on transient errors
    pub max_retries: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Gemini API types
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

// ─────────────────────────────────────────────────────────────────
// Gemini Backend
// ─────────────────────────────────────────────────────────────────

pub struct GeminiBackend {
    config: GeminiConfig,
    client: Client,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = build_client(PROVIDER, config.timeout_secs)?;

        info!(
            model = %config.model,
            key_configured = !config.api_key.is_empty(),
            "Gemini backend created"
        );

        Ok(Self { config, client })
    }

    fn require_key(&self) -> Result<&str> {
        if self.config.api_key.trim().is_empty() {
            return Err(Error::not_configured(
                PROVIDER,
                format!("{} not set", GEMINI_KEY_ENV),
            ));
        }
        Ok(&self.config.api_key)
    }

    fn build_request(
        &self,
        conversation: &Conversation,
        system_prompt: &str,
        schema: Option<&OutputSchema>,
    ) -> GenerateContentRequest {
        let contents = conversation
            .messages()
            .iter()
            .map(|m| Content {
                role: match m.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                },
                parts: vec![Part { text: m.text.clone() }],
            })
            .collect();

        let system_instruction = (!system_prompt.is_empty()).then(|| SystemInstruction {
            parts: vec![Part {
                text: system_prompt.to_string(),
            }],
        });

        let generation_config = schema.map(|s| {
            json!({
                "responseMimeType": "application/json",
                "responseSchema": s.to_gemini_schema(),
            })
        });

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config,
        }
    }
}

/// Concatenate the first candidate's text parts
fn extract_text(parsed: GenerateContentResponse) -> Result<String> {
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::malformed(PROVIDER, "Empty text response from Gemini API"));
    }
    Ok(text)
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn health_check(&self) -> Result<BackendHealth> {
        let key = match self.require_key() {
            Ok(key) => key,
            Err(e) => return Ok(BackendHealth::failing(&self.config.model, e.to_string())),
        };

        let url = endpoint(&self.config.base_url, &format!("models/{}", self.config.model));
        Ok(match self.client.get(&url).header("x-goog-api-key", key).send().await {
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
        let key = self.require_key()?;
        let body = self.build_request(conversation, system_prompt, schema);
        let url = endpoint(
            &self.config.base_url,
            &format!("models/{}:generateContent", self.config.model),
        );

        debug!(
            model = %self.config.model,
            turns = body.contents.len(),
            structured = schema.is_some(),
            "Sending generateContent"
        );

        let response = send_with_retry(PROVIDER, self.config.max_retries, || {
            self.client
                .post(&url)
                .header("x-goog-api-key", key)
                .json(&body)
        })
        .await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::malformed(PROVIDER, format!("Failed to parse API response: {}", e)))?;

        extract_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::http::spawn_stub;
    use crate::llm::SchemaField;
    use crate::types::Message;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::Json;

    const SCHEMA: OutputSchema = OutputSchema {
        name: "synthesis",
        fields: &[SchemaField { name: "response", description: "text", required: true }],
    };

    fn keyed(base_url: String) -> GeminiConfig {
        GeminiConfig {
            base_url,
            api_key: "test-key".to_string(),
            timeout_secs: 5,
            max_retries: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        // Unroutable base URL: any request would surface as a network error.
        let backend = GeminiBackend::new(GeminiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        })
        .unwrap();

        let conv = Conversation::new(vec![Message::user("hi")]);
        let err = backend.generate(&conv, "sys", None).await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured { .. }));

        let health = backend.health_check().await.unwrap();
        assert!(!health.operational);
    }

    #[test]
    fn test_request_shape() {
        let backend = GeminiBackend::new(keyed("http://localhost".into())).unwrap();
        let conv = Conversation::new(vec![Message::user("hi"), Message::assistant("Ugh.")]);

        let json = serde_json::to_value(backend.build_request(&conv, "be Squidward", Some(&SCHEMA))).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be Squidward");
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "OBJECT");

        let json = serde_json::to_value(backend.build_request(&conv, "", None)).unwrap();
        assert!(json.get("systemInstruction").is_none());
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let parsed: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Oh "},{"text":"boy!"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(parsed).unwrap(), "Oh boy!");

        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(matches!(extract_text(blocked), Err(Error::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_generate_against_stub() {
        let app = axum::Router::new().route(
            "/models/:call",
            post(|Path(call): Path<String>, headers: HeaderMap| async move {
                let key = headers
                    .get("x-goog-api-key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(json!({
                    "candidates": [{ "content": { "parts": [{ "text": format!("{} {}", call, key) }] } }]
                }))
            }),
        );
        let base = spawn_stub(app).await;
        let backend = GeminiBackend::new(keyed(base)).unwrap();

        let conv = Conversation::new(vec![Message::user("hi")]);
        let text = backend.generate(&conv, "sys", None).await.unwrap();
        assert_eq!(text, "gemini-2.5-flash:generateContent test-key");
    }

    #[tokio::test]
    async fn test_quota_wording_maps_to_quota() {
        let app = axum::Router::new().route(
            "/models/:call",
            post(|| async { (StatusCode::FORBIDDEN, "Quota exceeded for quota metric") }),
        );
        let base = spawn_stub(app).await;
        let backend = GeminiBackend::new(keyed(base)).unwrap();

        let conv = Conversation::new(vec![Message::user("hi")]);
        let err = backend.generate(&conv, "sys", None).await.unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { .. }));
    }
}
