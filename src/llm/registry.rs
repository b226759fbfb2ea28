//! Backend selection
//!
//! Maps the configured provider name to a concrete backend.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::config::LlmSettings;
use crate::error::Result;

use super::{GeminiBackend, GeminiConfig, MockBackend, OpenAiBackend, OpenAiConfig, SharedBackend};

// ─────────────────────────────────────────────────────────────────
// Backend Kind
// ─────────────────────────────────────────────────────────────────

/// Supported providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Google Gemini REST API
    Gemini,
    /// OpenAI-compatible chat completions API
    OpenAi,
    /// In-process scripted backend
    Mock,
}

impl BackendKind {
    pub fn all() -> &'static [BackendKind] {
        &[BackendKind::Gemini, BackendKind::OpenAi, BackendKind::Mock]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Gemini => "gemini",
            BackendKind::OpenAi => "openai",
            BackendKind::Mock => "mock",
        }
    }

    /// Standard environment variable holding this provider's key
    pub fn key_env(&self) -> Option<&'static str> {
        match self {
            BackendKind::Gemini => Some(super::gemini::GEMINI_KEY_ENV),
            BackendKind::OpenAi => Some("OPENAI_API_KEY"),
            BackendKind::Mock => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(BackendKind::Gemini),
            "openai" => Ok(BackendKind::OpenAi),
            "mock" => Ok(BackendKind::Mock),
            other => Err(format!(
                "Unknown provider '{}'. Valid: {}",
                other,
                BackendKind::all()
                    .iter()
                    .map(BackendKind::name)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Factory
// ─────────────────────────────────────────────────────────────────

/// Build the configured backend. Empty settings fall back to provider defaults.
pub fn create_backend(settings: &LlmSettings) -> Result<SharedBackend> {
    let kind = settings.kind()?;
    let api_key = settings.resolved_api_key();

    let backend: SharedBackend = match kind {
        BackendKind::Gemini => {
            let defaults = GeminiConfig::default();
            Arc::new(GeminiBackend::new(GeminiConfig {
                base_url: non_empty_or(&settings.base_url, defaults.base_url),
                api_key,
                model: non_empty_or(&settings.model, defaults.model),
                timeout_secs: settings.timeout_secs,
                max_retries: settings.max_retries,
            })?)
        }
        BackendKind::OpenAi => {
            let defaults = OpenAiConfig::default();
            Arc::new(OpenAiBackend::new(OpenAiConfig {
                base_url: non_empty_or(&settings.base_url, defaults.base_url),
                api_key,
                model: non_empty_or(&settings.model, defaults.model),
                timeout_secs: settings.timeout_secs,
                max_retries: settings.max_retries,
            })?)
        }
        BackendKind::Mock => Arc::new(MockBackend::new()),
    };

    info!(backend = kind.name(), "LLM backend ready");
    Ok(backend)
}

fn non_empty_or(value: &str, default: String) -> String {
    if value.trim().is_empty() {
        default
    } else {
        value.to_string()
    }
}
