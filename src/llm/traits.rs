//! Collaborator trait definitions
//!
//! Defines the `LlmBackend` trait every text-generation provider implements,
//! plus the schema descriptor used to request structured JSON output.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::error::Result;
use crate::types::Conversation;

// ─────────────────────────────────────────────────────────────────
// Backend Health
// ─────────────────────────────────────────────────────────────────

/// Health status of a backend
#[derive(Debug, Clone)]
pub struct BackendHealth {
    /// Whether the backend looks usable
    pub operational: bool,

    /// Model the backend will call
    pub model: String,

    /// Any error message
    pub error: Option<String>,
}

impl BackendHealth {
    pub fn ok(model: impl Into<String>) -> Self {
        Self {
            operational: true,
            model: model.into(),
            error: None,
        }
    }

    pub fn failing(model: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            operational: false,
            model: model.into(),
            error: Some(error.into()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Structured Output Schema
// ─────────────────────────────────────────────────────────────────

/// One string field of a structured response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaField {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

/// Named set of string fields the collaborator should answer with.
///
/// Providers disagree on schema dialects, so the descriptor renders itself
/// to each one rather than carrying a raw JSON blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSchema {
    pub name: &'static str,
    pub fields: &'static [SchemaField],
}

impl OutputSchema {
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    fn required(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect()
    }

    /// Standard JSON Schema (OpenAI `response_format`)
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in self.fields {
            properties.insert(
                field.name.to_string(),
                json!({ "type": "string", "description": field.description }),
            );
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required(),
        })
    }

    /// Gemini `responseSchema` dialect (upper-case type names)
    pub fn to_gemini_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in self.fields {
            properties.insert(field.name.to_string(), json!({ "type": "STRING" }));
        }

        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": self.required(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────
// LlmBackend Trait
// ─────────────────────────────────────────────────────────────────

/// The single capability the router and aggregator depend on.
///
/// Implementations must be object-safe and shareable across tasks: the
/// aggregator calls the same backend from four concurrent futures.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Provider name (e.g., "gemini", "openai", "mock")
    fn name(&self) -> &'static str;

    /// Check whether the backend can be called
    async fn health_check(&self) -> Result<BackendHealth>;

    /// Generate text for `conversation` under `system_prompt`.
    ///
    /// With a schema, the returned text is expected (not guaranteed) to be a
    /// JSON document with the schema's fields. Callers parse it defensively.
    async fn generate(
        &self,
        conversation: &Conversation,
        system_prompt: &str,
        schema: Option<&OutputSchema>,
    ) -> Result<String>;
}

/// Type alias for a shared backend reference
pub type SharedBackend = Arc<dyn LlmBackend>;

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
