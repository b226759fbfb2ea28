//! Defensive parsing of the collaborator's structured output.
//!
//! Both parsers are total: any input yields a value, never an error. Fields
//! are checked one at a time so a half-valid document still contributes
//! whatever it got right.

use serde_json::{Map, Value};

use crate::persona::PersonaId;

/// Used when the synthesis has no usable `response`
pub const DEFAULT_SYNTHESIS_RESPONSE: &str = "Together we sing: \"Oh my barnacles!\" It seems our voices got a little tangled up, like when SpongeBob tried to conduct an orchestra of jellyfish. Sometimes even the most beautiful melodies need a moment to find their rhythm!";

/// Used when the synthesis has no usable `episode_moral`
pub const DEFAULT_EPISODE_MORAL: &str = "Chorus: When our voices get out of tune, we simply take a deep breath and sing again in perfect harmony!";

// ─────────────────────────────────────────────────────────────────
// Routing decision
// ─────────────────────────────────────────────────────────────────

/// Outcome of parsing a routing decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDecision {
    /// `agent` named a known persona
    Valid {
        persona: PersonaId,
        reasons: Option<String>,
    },
    /// A JSON object, but `agent` was missing or not a known persona
    InvalidAgent { raw: Option<String> },
    /// Not a JSON object at all
    Unparseable,
}

pub fn parse_decision(text: &str) -> ParsedDecision {
    let Some(object) = parse_object(text) else {
        return ParsedDecision::Unparseable;
    };

    let raw = string_field(&object, "agent");
    match raw.as_deref().and_then(PersonaId::from_slug) {
        Some(persona) => ParsedDecision::Valid {
            persona,
            reasons: scalar_field(&object, "reasons"),
        },
        _ => ParsedDecision::InvalidAgent { raw },
    }
}

// ─────────────────────────────────────────────────────────────────
// Chorus synthesis
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub response: String,
    pub episode_moral: String,
}

impl Default for Synthesis {
    fn default() -> Self {
        Self {
            response: DEFAULT_SYNTHESIS_RESPONSE.to_string(),
            episode_moral: DEFAULT_EPISODE_MORAL.to_string(),
        }
    }
}

pub fn parse_synthesis(text: &str) -> Synthesis {
    let mut synthesis = Synthesis::default();
    let Some(object) = parse_object(text) else {
        return synthesis;
    };

    if let Some(response) = string_field(&object, "response") {
        synthesis.response = response;
    }
    if let Some(moral) = string_field(&object, "episode_moral") {
        synthesis.episode_moral = moral;
    }
    synthesis
}

// ─────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────

/// Remove a surrounding Markdown code fence, with or without a language tag
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the rest of the opening line (e.g. "json"), if there is a next line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().trim_end_matches("```").trim()
}

/// Parse a JSON object, falling back to the outermost `{...}` span
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    let body = strip_code_fence(text);
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        return Some(map);
    }

    let text = text.trim();
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Non-blank string field
fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Like `string_field`, but numbers and booleans are stringified
fn scalar_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => string_field(object, key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_valid() {
        assert_eq!(
            parse_decision(r#"{"agent":"squidward","reasons":"user sighed"}"#),
            ParsedDecision::Valid {
                persona: PersonaId::Squidward,
                reasons: Some("user sighed".to_string()),
            }
        );
        assert_eq!(
            parse_decision(r#"{"agent":"mrkrabs"}"#),
            ParsedDecision::Valid { persona: PersonaId::MrKrabs, reasons: None }
        );
    }

    #[test]
    fn test_decision_invalid_agent() {
        assert_eq!(
            parse_decision(r#"{"agent":"plankton","reasons":"evil"}"#),
            ParsedDecision::InvalidAgent { raw: Some("plankton".to_string()) }
        );
        assert_eq!(
            parse_decision(r#"{"agent":42}"#),
            ParsedDecision::InvalidAgent { raw: None }
        );
        assert_eq!(parse_decision("{}"), ParsedDecision::InvalidAgent { raw: None });
    }

    #[test]
    fn test_decision_garbage() {
        assert_eq!(parse_decision("squidward"), ParsedDecision::Unparseable);
        assert_eq!(parse_decision(""), ParsedDecision::Unparseable);
        assert_eq!(parse_decision("[\"patrick\"]"), ParsedDecision::Unparseable);
        assert_eq!(parse_decision("} nope {"), ParsedDecision::Unparseable);
    }

    #[test]
    fn test_decision_in_code_fence() {
        let fenced = "```json\n{\"agent\": \"patrick\", \"reasons\": 7}\n```";
        assert_eq!(
            parse_decision(fenced),
            ParsedDecision::Valid { persona: PersonaId::Patrick, reasons: Some("7".to_string()) }
        );
    }

    #[test]
    fn test_decision_in_single_line_fence() {
        assert_eq!(
            parse_decision("```{\"agent\":\"patrick\",\"reasons\":\"r\"}```"),
            ParsedDecision::Valid { persona: PersonaId::Patrick, reasons: Some("r".to_string()) }
        );
        assert!(matches!(
            parse_decision("```json {\"agent\":\"squidward\"}```"),
            ParsedDecision::Valid { persona: PersonaId::Squidward, .. }
        ));
    }

    #[test]
    fn test_decision_agent_must_be_exact_slug() {
        assert_eq!(
            parse_decision(r#"{"agent":"Mr_Krabs"}"#),
            ParsedDecision::InvalidAgent { raw: Some("Mr_Krabs".to_string()) }
        );
        assert_eq!(
            parse_decision(r#"{"agent":" patrick "}"#),
            ParsedDecision::InvalidAgent { raw: Some(" patrick ".to_string()) }
        );
    }

    #[test]
    fn test_decision_with_chatter() {
        let chatty = "Sure! Here you go: {\"agent\": \"spongebob\"} Hope that helps.";
        assert!(matches!(parse_decision(chatty), ParsedDecision::Valid { persona: PersonaId::SpongeBob, .. }));
    }

    #[test]
    fn test_synthesis_valid() {
        let s = parse_synthesis(r#"{"response":"As one voice.","episode_moral":"Chorus: Sing."}"#);
        assert_eq!(s.response, "As one voice.");
        assert_eq!(s.episode_moral, "Chorus: Sing.");
    }

    #[test]
    fn test_synthesis_in_single_line_fence() {
        let s = parse_synthesis("```json {\"response\":\"a\",\"episode_moral\":\"b\"}```");
        assert_eq!(s.response, "a");
        assert_eq!(s.episode_moral, "b");

        let s = parse_synthesis("```{\"response\":\"a\"}```");
        assert_eq!(s.response, "a");
        assert_eq!(s.episode_moral, DEFAULT_EPISODE_MORAL);
    }

    #[test]
    fn test_synthesis_field_by_field_defaults() {
        let s = parse_synthesis(r#"{"response":"Only this part.","episode_moral":""}"#);
        assert_eq!(s.response, "Only this part.");
        assert_eq!(s.episode_moral, DEFAULT_EPISODE_MORAL);

        let s = parse_synthesis(r#"{"response":null,"episode_moral":"Chorus: ok"}"#);
        assert_eq!(s.response, DEFAULT_SYNTHESIS_RESPONSE);
        assert_eq!(s.episode_moral, "Chorus: ok");
    }

    #[test]
    fn test_synthesis_garbage() {
        assert_eq!(parse_synthesis("not json"), Synthesis::default());
        assert_eq!(parse_synthesis("```\n```"), Synthesis::default());
    }

    #[test]
    fn test_parsers_are_idempotent() {
        let text = r#"{"response":"a","episode_moral":"b"}"#;
        assert_eq!(parse_synthesis(text), parse_synthesis(text));
        assert_eq!(parse_decision("garbage"), parse_decision("garbage"));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("  {}  "), "{}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fence("```{\"a\":1}```"), "{\"a\":1}");
    }
}
