//! Routing and response types
//!
//! Everything here is request-scoped: built while answering one turn and
//! dropped once the envelope has been handed back.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::persona::PersonaId;

/// Display label of the synthetic aggregate identity
pub const CHORUS_LABEL: &str = "Bikini Bottom Chorus";

// ─────────────────────────────────────────────────────────────────
// Speaker
// ─────────────────────────────────────────────────────────────────

/// Who the envelope speaks as: one persona, or the chorus of all four
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    Persona(PersonaId),
    Chorus,
}

impl Speaker {
    /// Identity string exposed to callers ("spongebob", ..., "chorus")
    pub fn slug(&self) -> &'static str {
        match self {
            Speaker::Persona(id) => id.slug(),
            Speaker::Chorus => "chorus",
        }
    }

}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl Serialize for Speaker {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

// ─────────────────────────────────────────────────────────────────
// Routing Decision
// ─────────────────────────────────────────────────────────────────

/// Where a routing decision came from, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// The collaborator named a valid persona
    Collaborator,
    /// Collaborator answer unusable; the classified last speaker was kept
    Continuity,
    /// Nothing usable at all; the configured default persona
    Default,
}

/// Output of the router's selection step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub persona: PersonaId,
    pub rationale: String,
    pub source: DecisionSource,
}

// ─────────────────────────────────────────────────────────────────
// Aggregation Result
// ─────────────────────────────────────────────────────────────────

/// Raw material and output of one chorus synthesis.
/// An empty reply string means that persona failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationResult {
    pub per_persona_replies: BTreeMap<PersonaId, String>,
    pub synthesized_text: String,
    pub moral: String,
}

impl AggregationResult {
    /// Final display text: the synthesis, a blank line, then the moral
    pub fn display_text(&self) -> String {
        format!("{}\n\n{}", self.synthesized_text, self.moral)
    }
}

// ─────────────────────────────────────────────────────────────────
// Response Envelope
// ─────────────────────────────────────────────────────────────────

/// Value returned to the request handler for every turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseEnvelope {
    /// Non-empty display text
    pub text: String,

    /// Chosen persona, or `chorus`
    #[serde(rename = "persona")]
    pub speaker: Speaker,

    /// Human-readable label for the speaker
    pub display_label: String,

    /// Why this speaker answered
    pub rationale: String,

    /// Raw per-persona replies (aggregation only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_persona_replies: Option<BTreeMap<PersonaId, String>>,

    /// True when the text is a canned apology rather than a generated reply
    pub fallback: bool,
}

impl ResponseEnvelope {
    /// Envelope for a single persona's reply
    pub fn persona(id: PersonaId, text: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speaker: Speaker::Persona(id),
            display_label: id.display_name().to_string(),
            rationale: rationale.into(),
            per_persona_replies: None,
            fallback: false,
        }
    }

    /// Envelope for a chorus synthesis
    pub fn chorus(result: AggregationResult, rationale: impl Into<String>) -> Self {
        Self {
            text: result.display_text(),
            speaker: Speaker::Chorus,
            display_label: CHORUS_LABEL.to_string(),
            rationale: rationale.into(),
            per_persona_replies: Some(result.per_persona_replies),
            fallback: false,
        }
    }

    /// Mark this envelope as a canned fallback
    pub fn into_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_slug() {
        assert_eq!(Speaker::Persona(PersonaId::MrKrabs).slug(), "mrkrabs");
        assert_eq!(Speaker::Chorus.slug(), "chorus");
    }

    #[test]
    fn test_display_text_joins_with_blank_line() {
        let result = AggregationResult {
            per_persona_replies: BTreeMap::new(),
            synthesized_text: "Together we say hi.".into(),
            moral: "Chorus: be kind.".into(),
        };
        assert_eq!(result.display_text(), "Together we say hi.\n\nChorus: be kind.");
    }

    #[test]
    fn test_envelope_serialization() {
        let env = ResponseEnvelope::persona(PersonaId::Squidward, "Ugh.", "continuity");
        let json = serde_json::to_value(&env).unwrap();

        assert_eq!(json["persona"], "squidward");
        assert_eq!(json["display_label"], "Squidward");
        assert_eq!(json["fallback"], false);
        assert!(json.get("per_persona_replies").is_none());
    }

    #[test]
    fn test_chorus_envelope_carries_replies() {
        let mut replies = BTreeMap::new();
        replies.insert(PersonaId::Patrick, String::new());
        replies.insert(PersonaId::SpongeBob, "Hi pal!".to_string());

        let env = ResponseEnvelope::chorus(
            AggregationResult {
                per_persona_replies: replies,
                synthesized_text: "As one voice".into(),
                moral: "Chorus: sing".into(),
            },
            "synth",
        );
        let json = serde_json::to_value(&env).unwrap();

        assert_eq!(json["persona"], "chorus");
        assert_eq!(json["per_persona_replies"]["patrick"], "");
        assert_eq!(json["per_persona_replies"]["spongebob"], "Hi pal!");
        assert_eq!(env.text, "As one voice\n\nChorus: sing");
    }
}
