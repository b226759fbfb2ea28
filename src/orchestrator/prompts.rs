//! Prompt builders and output schemas for the two structured calls.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::llm::{OutputSchema, SchemaField};
use crate::persona::{PersonaId, PersonaRegistry};

/// Shape of the routing decision: which persona answers, and why
pub const DECISION_SCHEMA: OutputSchema = OutputSchema {
    name: "routing_decision",
    fields: &[
        SchemaField {
            name: "agent",
            description: "Slug of the persona that should answer next",
            required: true,
        },
        SchemaField {
            name: "reasons",
            description: "Short explanation of the choice",
            required: false,
        },
    ],
};

/// Shape of the chorus synthesis
pub const SYNTHESIS_SCHEMA: OutputSchema = OutputSchema {
    name: "chorus_synthesis",
    fields: &[
        SchemaField {
            name: "response",
            description: "The blended chorus reply",
            required: true,
        },
        SchemaField {
            name: "episode_moral",
            description: "Closing moral line, sung in unison",
            required: true,
        },
    ],
};

/// System prompt for the routing decision.
///
/// `last_speaker` is the classifier's guess, not a recorded fact.
pub fn decision_prompt(
    last_speaker: Option<PersonaId>,
    user_text: Option<&str>,
    conversation_len: usize,
    default_persona: PersonaId,
) -> String {
    let registry = PersonaRegistry::new();
    let mut prompt = String::new();

    prompt.push_str(
        "You are the routing controller for a cast of four personas. \
         Choose exactly one persona to answer the user next.\n\n",
    );

    let _ = writeln!(prompt, "CRITICAL CONTEXT:");
    let _ = writeln!(
        prompt,
        "- Last assistant message was from: {}",
        last_speaker.map(|p| p.slug()).unwrap_or("unknown")
    );
    let _ = writeln!(
        prompt,
        "- Current user message: \"{}\"",
        user_text.unwrap_or("No user message")
    );
    let _ = writeln!(prompt, "- Conversation history length: {} messages\n", conversation_len);

    let _ = writeln!(prompt, "CONVERSATION CONTINUITY RULES (STRICT PRIORITY):");
    let _ = writeln!(
        prompt,
        "1. CONTINUE SAME AGENT: If the user responds to the last agent's message, keep that agent (most cases)"
    );
    let _ = writeln!(
        prompt,
        "2. EXPLICIT CHARACTER REQUEST: Only switch if the user explicitly asks for a different character"
    );
    let _ = writeln!(
        prompt,
        "3. TOPIC CHANGE: Only switch if the conversation completely changes topics"
    );
    let _ = writeln!(
        prompt,
        "4. FALLBACK: Default to {} if uncertain\n",
        default_persona.slug()
    );

    let _ = writeln!(prompt, "AGENT PERSONALITIES:");
    for id in PersonaId::all() {
        let _ = writeln!(prompt, "- {}: {}", id.slug(), registry.profile(*id).routing_hint);
    }

    prompt.push_str(
        "\nDECISION LOGIC:\n\
         - If the user asks \"where is [character]\" -> CONTINUE with the last agent (they're still in the conversation)\n\
         - If the user says \"I want to talk to [character]\" -> SWITCH to that character\n\
         - If the user responds to the last message -> CONTINUE with the same agent\n\
         - If the user asks a follow-up question -> CONTINUE with the same agent\n\n",
    );

    let _ = writeln!(
        prompt,
        "Available agents: {}. ONLY USE ONE OF THESE AGENTS.\n",
        PersonaId::slug_list()
    );
    let _ = write!(
        prompt,
        "Output strictly as JSON:\n{{\n  \"agent\": \"{}\",\n  \"reasons\": \"Continuing conversation with the same agent for continuity\"\n}}",
        default_persona.slug()
    );

    prompt
}

/// System prompt asking the collaborator to weave the four replies together.
/// Empty replies are embedded as-is.
pub fn synthesis_prompt(replies: &BTreeMap<PersonaId, String>) -> String {
    let mut prompt = String::from(
        "You are the Bikini Bottom Chorus, a harmonious ensemble of voices from the deep blue sea.\n\n\
         You are given responses from four Bikini Bottom residents. Weave their voices together \
         into one reply, like a school of fish swimming in sync.\n\n\
         CHORUS COMPOSITION RULES:\n\
         - Start with a warm, welcoming tone that captures the spirit of community\n\
         - Weave together SpongeBob's infectious optimism and enthusiasm\n\
         - Blend in Squidward's practical wisdom and realistic perspective\n\
         - Harmonize with Mr. Krabs' business-savvy, money-smart advice\n\
         - Add Patrick's delightful comic relief as a sweet, simple counterpoint\n\
         - Use phrases like \"Together we say...\", \"In harmony...\", \"As one voice...\"\n\
         - Use transitions like \"And as SpongeBob would say...\", \"Squidward adds...\", \"Mr. Krabs reminds us...\"\n\
         - Keep the tone warm, supportive, and community-focused\n\
         - Maximum 7 sentences for the main response\n\
         - End with a moral that sounds like a chorus singing in unison\n\n\
         Agent voices to harmonize:\n",
    );

    for id in PersonaId::all() {
        let reply = replies.get(id).map(String::as_str).unwrap_or("");
        let _ = writeln!(prompt, "{}: \"{}\"", id.display_name(), reply);
    }

    prompt.push_str(
        "\nOutput as JSON:\n{\n  \"response\": \"Your harmonious chorus response here\",\n  \
         \"episode_moral\": \"Chorus: Your moral sung in unison here\"\n}",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_prompt_context() {
        let prompt = decision_prompt(
            Some(PersonaId::Squidward),
            Some("where is Patrick?"),
            5,
            PersonaId::SpongeBob,
        );
        assert!(prompt.contains("Last assistant message was from: squidward"));
        assert!(prompt.contains("Current user message: \"where is Patrick?\""));
        assert!(prompt.contains("history length: 5 messages"));
        assert!(prompt.contains("Default to spongebob if uncertain"));
        assert!(prompt.contains("\"spongebob\", \"squidward\", \"mrkrabs\", \"patrick\""));
    }

    #[test]
    fn test_decision_prompt_unknowns() {
        let prompt = decision_prompt(None, None, 1, PersonaId::Patrick);
        assert!(prompt.contains("was from: unknown"));
        assert!(prompt.contains("No user message"));
        assert!(prompt.contains("Default to patrick"));
    }

    #[test]
    fn test_decision_prompt_lists_every_persona() {
        let prompt = decision_prompt(None, Some("hi"), 1, PersonaId::SpongeBob);
        for id in PersonaId::all() {
            assert!(prompt.contains(&format!("- {}: ", id.slug())));
        }
        // Persona instructions never leak into the routing call.
        assert!(!prompt.contains("You are SpongeBob"));
    }

    #[test]
    fn test_synthesis_prompt_embeds_replies() {
        let mut replies = BTreeMap::new();
        replies.insert(PersonaId::SpongeBob, "I'm ready!".to_string());
        replies.insert(PersonaId::Squidward, String::new());

        let prompt = synthesis_prompt(&replies);
        assert!(prompt.contains("SpongeBob: \"I'm ready!\""));
        assert!(prompt.contains("Squidward: \"\""));
        // Missing entries render empty too.
        assert!(prompt.contains("Mr. Krabs: \"\""));
        assert!(prompt.contains("Maximum 7 sentences"));
    }

    #[test]
    fn test_schemas() {
        let decision: Vec<_> = DECISION_SCHEMA.field_names().collect();
        assert_eq!(decision, vec!["agent", "reasons"]);
        assert_eq!(DECISION_SCHEMA.to_json_schema()["required"], serde_json::json!(["agent"]));

        let synthesis: Vec<_> = SYNTHESIS_SCHEMA.field_names().collect();
        assert_eq!(synthesis, vec!["response", "episode_moral"]);
    }
}
