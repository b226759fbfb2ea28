//! Router: pick one persona for the next turn and let it answer.
//!
//! Selection precedence is collaborator decision, then the classified last
//! speaker, then the configured default. The reply itself never surfaces a
//! collaborator error: a failed or empty reply becomes that persona's apology.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::llm::SharedBackend;
use crate::persona::{KeywordClassifier, PersonaId, PersonaRegistry, PersonaResponder};
use crate::types::{Conversation, DecisionSource, ResponseEnvelope, RoutingDecision};

use super::fallback::{with_fallback, FALLBACK_RATIONALE};
use super::prompts::{decision_prompt, DECISION_SCHEMA};
use super::structured::{parse_decision, ParsedDecision};
use super::ensure_non_empty;

pub struct Router {
    backend: SharedBackend,
    registry: PersonaRegistry,
    classifier: KeywordClassifier,
    default_persona: PersonaId,
}

impl Router {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            registry: PersonaRegistry::new(),
            classifier: KeywordClassifier::default(),
            default_persona: PersonaId::default(),
        }
    }

    pub fn with_default_persona(mut self, persona: PersonaId) -> Self {
        self.default_persona = persona;
        self
    }

    /// Answer the next turn as a single persona.
    ///
    /// Fails only on an empty conversation; every other failure degrades to
    /// the default persona's apology.
    pub async fn route(&self, conversation: &Conversation) -> Result<ResponseEnvelope> {
        ensure_non_empty(conversation)?;

        let default = self.default_persona;
        Ok(with_fallback("router", self.route_inner(conversation), || {
            ResponseEnvelope::persona(default, self.registry.apology(default), FALLBACK_RATIONALE)
        })
        .await)
    }

    async fn route_inner(&self, conversation: &Conversation) -> Result<ResponseEnvelope> {
        let decision = self.decide(conversation).await?;
        info!(
            persona = %decision.persona,
            source = ?decision.source,
            "Routing decision made"
        );

        let (text, apologised) = self.reply_as(decision.persona, conversation).await;
        let envelope = ResponseEnvelope::persona(decision.persona, text, decision.rationale);
        Ok(if apologised {
            envelope.into_fallback()
        } else {
            envelope
        })
    }

    /// Run the selection step: classify, prompt, parse, resolve.
    ///
    /// Errors only when the collaborator call itself fails.
    pub async fn decide(&self, conversation: &Conversation) -> Result<RoutingDecision> {
        let last_speaker = conversation
            .last_assistant_message()
            .and_then(|m| self.classifier.classify(&m.text));
        let user_text = conversation.last_user_message().map(|m| m.text.as_str());
        debug!(last_speaker = ?last_speaker, "Classified last assistant message");

        let prompt = decision_prompt(last_speaker, user_text, conversation.len(), self.default_persona);
        let raw = self
            .backend
            .generate(conversation, &prompt, Some(&DECISION_SCHEMA))
            .await
            .map_err(|e| Error::InvalidDecision(e.format_for_log()))?;

        Ok(resolve_decision(parse_decision(&raw), last_speaker, self.default_persona))
    }

    /// Persona reply, or its apology when the call fails or comes back blank.
    /// The flag is true when the apology was used.
    async fn reply_as(&self, persona: PersonaId, conversation: &Conversation) -> (String, bool) {
        let responder = PersonaResponder::new(persona, self.backend.clone());
        match responder.respond(conversation).await {
            Ok(text) if !text.trim().is_empty() => (text, false),
            Ok(_) => {
                warn!(persona = %persona, "Persona returned an empty reply, using apology");
                (self.registry.apology(persona).to_string(), true)
            }
            Err(e) => {
                warn!(persona = %persona, error = %e, "Persona failed to respond, using apology");
                (self.registry.apology(persona).to_string(), true)
            }
        }
    }
}

/// Apply the selection precedence to a parsed decision
pub fn resolve_decision(
    parsed: ParsedDecision,
    last_speaker: Option<PersonaId>,
    default_persona: PersonaId,
) -> RoutingDecision {
    match (parsed, last_speaker) {
        (ParsedDecision::Valid { persona, reasons }, _) => RoutingDecision {
            persona,
            rationale: reasons.unwrap_or_else(|| format!("Routed to {}", persona)),
            source: DecisionSource::Collaborator,
        },
        (ParsedDecision::InvalidAgent { raw }, Some(last)) => {
            debug!(agent = ?raw, "Collaborator named an unknown persona");
            RoutingDecision {
                persona: last,
                rationale: format!("Continuing with {} based on conversation context", last),
                source: DecisionSource::Continuity,
            }
        }
        (ParsedDecision::Unparseable, Some(last)) => RoutingDecision {
            persona: last,
            rationale: format!("Continuing with {} due to parsing error", last),
            source: DecisionSource::Continuity,
        },
        (_, None) => RoutingDecision {
            persona: default_persona,
            rationale: default_rationale(default_persona),
            source: DecisionSource::Default,
        },
    }
}

fn default_rationale(persona: PersonaId) -> String {
    match persona {
        PersonaId::SpongeBob => {
            "Defaulted to spongebob for positivity and welcoming interaction".to_string()
        }
        other => format!("Defaulted to {}", other),
    }
}
