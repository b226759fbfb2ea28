//! Persona responder: one in-character reply per call.
//!
//! No fallback here. Failures go back to the router or aggregator, which
//! decide whether to substitute an apology or record an empty reply.

use tracing::debug;

use crate::error::Result;
use crate::llm::SharedBackend;
use crate::types::Conversation;

use super::registry::PersonaRegistry;
use super::types::PersonaId;

/// Binds one persona's instruction to a backend
#[derive(Clone)]
pub struct PersonaResponder {
    id: PersonaId,
    backend: SharedBackend,
}

impl PersonaResponder {
    pub fn new(id: PersonaId, backend: SharedBackend) -> Self {
        Self { id, backend }
    }

    pub fn id(&self) -> PersonaId {
        self.id
    }

    /// Ask the collaborator for this persona's reply to `conversation`
    pub async fn respond(&self, conversation: &Conversation) -> Result<String> {
        let instruction = PersonaRegistry::new().profile(self.id).instruction;
        debug!(persona = %self.id, turns = conversation.len(), "Requesting persona reply");
        self.backend.generate(conversation, instruction, None).await
    }
}
