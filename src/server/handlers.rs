//! Request handlers and their wire shapes

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::Error;
use crate::orchestrator::{Mode, Orchestrator};
use crate::persona::{PersonaId, PersonaRegistry};
use crate::types::{Conversation, HistoryEntry, ResponseEnvelope};
use crate::version::build_info;

pub type SharedState = Arc<Orchestrator>;

// ─────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub assistant_message: String,
    pub replier_input: ReplierInput,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplierInput {
    pub frame_set: Value,
    pub context_count: usize,
    pub agent: String,
    pub reasons: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_responses: Option<BTreeMap<PersonaId, String>>,
}

impl ReplierInput {
    fn from_envelope(envelope: &ResponseEnvelope, context_count: usize) -> Self {
        let agent = envelope.speaker.slug().to_string();
        Self {
            frame_set: json!({
                "frames": {
                    "persona": {
                        "value": agent,
                        "rationale": [envelope.rationale],
                    }
                }
            }),
            context_count,
            agent,
            reasons: envelope.rationale.clone(),
            display_name: envelope.display_label.clone(),
            agent_responses: envelope.per_persona_replies.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaSummary {
    pub id: PersonaId,
    pub display_name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub operational: bool,
    /// Model the backend calls; absent when the check itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub version: String,
    /// RFC 3339 time of the check
    pub checked_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ─────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────

/// `POST /api/chat`
pub async fn chat(State(orchestrator): State<SharedState>, body: Bytes) -> (StatusCode, Json<Value>) {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("chat", request_id = %request_id);

    async move {
        let (history, mode) = match parse_chat_body(&body) {
            Ok(parsed) => parsed,
            Err(response) => return response,
        };

        let conversation = Conversation::from_history(&history);
        info!(mode = %mode, messages = conversation.len(), "Chat request received");

        match orchestrator.handle(mode, &conversation).await {
            Ok(envelope) => {
                let response = ChatResponse {
                    replier_input: ReplierInput::from_envelope(&envelope, conversation.len()),
                    assistant_message: envelope.text,
                    request_id,
                };
                (StatusCode::OK, Json(json!(response)))
            }
            Err(Error::InvalidInput(details)) => {
                warn!(details = %details, "Rejected chat request");
                invalid_input(details)
            }
            Err(e) => {
                // route/aggregate only surface InvalidInput; anything else is a bug
                warn!(error = %e, "Unexpected orchestration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error", "details": e.to_string() })),
                )
            }
        }
    }
    .instrument(span)
    .await
}

/// Pull `history` and `mode` out of the raw body.
fn parse_chat_body(body: &[u8]) -> Result<(Vec<HistoryEntry>, Mode), (StatusCode, Json<Value>)> {
    let missing_history = || {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "history array is required" })),
        )
    };

    let value: Value = serde_json::from_slice(body).map_err(|_| missing_history())?;
    let history = match value.get("history") {
        Some(history @ Value::Array(_)) => history.clone(),
        _ => return Err(missing_history()),
    };
    let history: Vec<HistoryEntry> =
        serde_json::from_value(history).map_err(|e| invalid_input(e.to_string()))?;

    let mode = value
        .get("mode")
        .and_then(Value::as_str)
        .map(Mode::from_label)
        .unwrap_or_default();

    Ok((history, mode))
}

fn invalid_input(details: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "invalid input", "details": details })),
    )
}

/// `GET /api/personas`
pub async fn personas() -> Json<Vec<PersonaSummary>> {
    let registry = PersonaRegistry::new();
    Json(
        registry
            .profiles()
            .into_iter()
            .map(|profile| PersonaSummary {
                id: profile.id,
                display_name: profile.display_name(),
                description: profile.description,
            })
            .collect(),
    )
}

/// `GET /healthz`
pub async fn healthz(State(orchestrator): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let backend = orchestrator.backend();
    let (status, operational, model, error) = match backend.health_check().await {
        Ok(health) if health.operational => ("ok", true, Some(health.model), None),
        Ok(health) => ("degraded", false, Some(health.model), health.error),
        Err(e) => ("error", false, None, Some(e.to_string())),
    };

    let code = if operational {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(HealthResponse {
            status,
            backend: backend.name(),
            operational,
            model,
            version: build_info().full_version(),
            checked_at: Utc::now().to_rfc3339(),
            error,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingSettings;
    use crate::llm::{MockBackend, MockFailure};

    fn state(mock: MockBackend) -> SharedState {
        let routing = RoutingSettings {
            default_persona: "spongebob".to_string(),
            parallel_fanout: true,
        };
        Arc::new(Orchestrator::new(Arc::new(mock), &routing).unwrap())
    }

    async fn post(state: SharedState, body: Value) -> (StatusCode, Value) {
        let (status, Json(value)) = chat(State(state), Bytes::from(body.to_string())).await;
        (status, value)
    }

    #[tokio::test]
    async fn test_chat_router_mode() {
        let mock = MockBackend::new()
            .reply_when("routing controller", r#"{"agent":"mrkrabs","reasons":"money talk"}"#)
            .reply_when("You are Mr. Krabs", "Argh, that'll cost ye!");
        let body = json!({
            "history": [
                { "role": "user", "content": "How much is a Krabby Patty?" }
            ]
        });

        let (status, value) = post(state(mock), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["assistantMessage"], "Argh, that'll cost ye!");
        assert_eq!(value["replierInput"]["agent"], "mrkrabs");
        assert_eq!(value["replierInput"]["displayName"], "Mr. Krabs");
        assert_eq!(value["replierInput"]["reasons"], "money talk");
        assert_eq!(value["replierInput"]["contextCount"], 1);
        assert_eq!(
            value["replierInput"]["frameSet"]["frames"]["persona"]["value"],
            "mrkrabs"
        );
        assert!(value["replierInput"].get("agentResponses").is_none());
        assert!(value["requestId"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_chat_aggregator_mode() {
        let body = json!({
            "mode": "aggregator",
            "history": [{ "role": "user", "content": "Any advice?" }]
        });

        let (status, value) = post(state(MockBackend::new()), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["replierInput"]["agent"], "chorus");
        assert_eq!(value["replierInput"]["displayName"], "Bikini Bottom Chorus");
        assert_eq!(value["assistantMessage"], "mock response\n\nmock episode_moral");
        assert_eq!(
            value["replierInput"]["agentResponses"]["patrick"],
            "Mock reply: You are Patrick Star."
        );
    }

    #[tokio::test]
    async fn test_chat_requires_history_array() {
        for body in [json!({}), json!({ "history": "hello" }), json!({ "history": null })] {
            let (status, value) = post(state(MockBackend::new()), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(value["error"], "history array is required");
        }

        let (status, Json(value)) =
            chat(State(state(MockBackend::new())), Bytes::from_static(b"not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"], "history array is required");
    }

    #[tokio::test]
    async fn test_chat_empty_history() {
        let mock = MockBackend::new();
        let (status, value) = post(state(mock), json!({ "history": [] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"], "invalid input");
        assert!(value["details"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_chat_accepts_entries_without_role() {
        let body = json!({
            "history": [
                { "content": "Ugh, I'd rather practice my clarinet." },
                { "role": "user", "content": null }
            ]
        });

        let (status, value) = post(state(MockBackend::new()), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["replierInput"]["agent"], "squidward");
        assert_eq!(value["replierInput"]["contextCount"], 2);
    }

    #[tokio::test]
    async fn test_chat_rejects_malformed_entries() {
        for entry in [json!(42), json!({ "role": 5, "content": "hi" })] {
            let (status, value) = post(state(MockBackend::new()), json!({ "history": [entry] })).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(value["error"], "invalid input");
        }
    }

    #[tokio::test]
    async fn test_chat_fallback_is_still_ok() {
        let mock = MockBackend::new().fail_when("routing controller", MockFailure::QuotaExceeded);
        let body = json!({ "history": [{ "role": "user", "content": "hi" }] });

        let (status, value) = post(state(mock), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["replierInput"]["agent"], "spongebob");
        assert_eq!(value["replierInput"]["reasons"], "Fallback due to orchestration error");
    }

    #[tokio::test]
    async fn test_personas_lists_all_four() {
        let Json(list) = personas().await;
        let ids: Vec<_> = list.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), 4);
        assert!(ids.contains(&PersonaId::Squidward));

        let value = json!(list);
        assert!(value[0].get("displayName").is_some());
    }

    #[tokio::test]
    async fn test_healthz_reports_backend() {
        let (status, Json(health)) = healthz(State(state(MockBackend::new()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health.status, "ok");
        assert_eq!(health.backend, "mock");
        assert_eq!(health.model.as_deref(), Some("mock"));
        assert!(health.error.is_none());
        assert!(health.version.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(chrono::DateTime::parse_from_rfc3339(&health.checked_at).is_ok());
    }
}
