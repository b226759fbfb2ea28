//! Aggregator: ask every persona, then blend the answers into one chorus reply.
//!
//! Persona failures are isolated: a failed persona contributes an empty
//! string and the rest carry on. Only when all four come back empty is the
//! synthesis skipped in favour of the fixed chorus apology.

use std::collections::BTreeMap;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::llm::SharedBackend;
use crate::persona::{PersonaId, PersonaResponder};
use crate::types::{AggregationResult, Conversation, ResponseEnvelope};

use super::ensure_non_empty;
use super::fallback::{with_fallback, FALLBACK_RATIONALE};
use super::prompts::{synthesis_prompt, SYNTHESIS_SCHEMA};
use super::structured::parse_synthesis;

/// Rationale on every successful chorus envelope
pub const SYNTHESIS_RATIONALE: &str = "Synthesized response from all agents";

const FALLBACK_RESPONSE: &str = "In harmony we sing: \"Oh my barnacles and sea stars!\" It seems our beautiful chorus got a bit out of sync, like when Patrick tried to lead a choir of sea horses. Sometimes even the most well-intentioned performances need a moment to find their perfect pitch!";

const FALLBACK_MORAL: &str = "Chorus: When our melody gets a little off-key, we simply gather our voices together and sing with renewed spirit!";

pub struct Aggregator {
    backend: SharedBackend,
    parallel: bool,
}

impl Aggregator {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            parallel: true,
        }
    }

    /// Issue the persona calls concurrently (default) or one after another
    pub fn with_parallel_fanout(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Answer the next turn as the chorus of all personas.
    ///
    /// Fails only on an empty conversation.
    pub async fn aggregate(&self, conversation: &Conversation) -> Result<ResponseEnvelope> {
        ensure_non_empty(conversation)?;
        Ok(with_fallback("aggregator", self.aggregate_inner(conversation), fallback_envelope).await)
    }

    async fn aggregate_inner(&self, conversation: &Conversation) -> Result<ResponseEnvelope> {
        let replies = self.collect_replies(conversation).await;

        let answered = replies.values().filter(|r| !r.trim().is_empty()).count();
        if answered == 0 {
            return Err(Error::AllPersonasFailed {
                attempted: replies.len(),
            });
        }
        debug!(answered, attempted = replies.len(), "Persona replies collected");

        let prompt = synthesis_prompt(&replies);
        let raw = self
            .backend
            .generate(conversation, &prompt, Some(&SYNTHESIS_SCHEMA))
            .await?;
        let synthesis = parse_synthesis(&raw);

        info!(answered, "Chorus synthesized");
        Ok(ResponseEnvelope::chorus(
            AggregationResult {
                per_persona_replies: replies,
                synthesized_text: synthesis.response,
                moral: synthesis.episode_moral,
            },
            SYNTHESIS_RATIONALE,
        ))
    }

    /// One reply per persona; failures and blank replies become `""`.
    pub async fn collect_replies(&self, conversation: &Conversation) -> BTreeMap<PersonaId, String> {
        let responders: Vec<PersonaResponder> = PersonaId::all()
            .iter()
            .map(|id| PersonaResponder::new(*id, self.backend.clone()))
            .collect();

        if self.parallel {
            join_all(responders.iter().map(|r| ask(r, conversation)))
                .await
                .into_iter()
                .collect()
        } else {
            let mut replies = BTreeMap::new();
            for responder in &responders {
                let (id, text) = ask(responder, conversation).await;
                replies.insert(id, text);
            }
            replies
        }
    }
}

async fn ask(responder: &PersonaResponder, conversation: &Conversation) -> (PersonaId, String) {
    let id = responder.id();
    match responder.respond(conversation).await {
        Ok(text) if !text.trim().is_empty() => (id, text),
        Ok(_) => {
            warn!(persona = %id, "Persona returned an empty reply");
            (id, String::new())
        }
        Err(e) => {
            warn!(persona = %id, error = %e, "Persona failed to respond");
            (id, String::new())
        }
    }
}

fn fallback_envelope() -> ResponseEnvelope {
    ResponseEnvelope::chorus(
        AggregationResult {
            per_persona_replies: BTreeMap::new(),
            synthesized_text: FALLBACK_RESPONSE.to_string(),
            moral: FALLBACK_MORAL.to_string(),
        },
        FALLBACK_RATIONALE,
    )
}
