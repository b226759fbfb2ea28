//! Core types for the persona system.
//!
//! The set of personas is closed: four fixed voices, each with a slug used on
//! the wire, a display label, and a static profile in the registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Persona Identity
// ─────────────────────────────────────────────────────────────────

/// The four persona voices that can answer a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaId {
    /// Relentless optimist; the default voice.
    SpongeBob,
    /// Weary, sarcastic realist.
    Squidward,
    /// Money-minded pragmatist.
    MrKrabs,
    /// Simple, well-meaning, occasionally profound.
    Patrick,
}

impl PersonaId {
    /// Slug used on the wire, in prompts and in config.
    pub fn slug(&self) -> &'static str {
        match self {
            PersonaId::SpongeBob => "spongebob",
            PersonaId::Squidward => "squidward",
            PersonaId::MrKrabs => "mrkrabs",
            PersonaId::Patrick => "patrick",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            PersonaId::SpongeBob => "SpongeBob",
            PersonaId::Squidward => "Squidward",
            PersonaId::MrKrabs => "Mr. Krabs",
            PersonaId::Patrick => "Patrick",
        }
    }

    /// All personas, in the order the chorus presents them.
    pub fn all() -> &'static [PersonaId] {
        &[
            PersonaId::SpongeBob,
            PersonaId::Squidward,
            PersonaId::MrKrabs,
            PersonaId::Patrick,
        ]
    }

    /// Exact slug match, no normalisation.
    pub fn from_slug(slug: &str) -> Option<PersonaId> {
        PersonaId::all().iter().copied().find(|p| p.slug() == slug)
    }

    /// Comma-separated quoted slugs, for prompts and error messages.
    pub fn slug_list() -> String {
        PersonaId::all()
            .iter()
            .map(|p| format!("\"{}\"", p.slug()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for PersonaId {
    fn default() -> Self {
        PersonaId::SpongeBob
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for PersonaId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spongebob" => Ok(PersonaId::SpongeBob),
            "squidward" => Ok(PersonaId::Squidward),
            "mrkrabs" | "mr_krabs" | "mr-krabs" => Ok(PersonaId::MrKrabs),
            "patrick" => Ok(PersonaId::Patrick),
            _ => Err(format!(
                "Unknown persona '{}'. Valid: {}",
                s,
                PersonaId::slug_list()
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_slug() {
        assert_eq!(PersonaId::SpongeBob.slug(), "spongebob");
        assert_eq!(PersonaId::Squidward.slug(), "squidward");
        assert_eq!(PersonaId::MrKrabs.slug(), "mrkrabs");
        assert_eq!(PersonaId::Patrick.slug(), "patrick");
    }

    #[test]
    fn test_persona_from_str() {
        assert_eq!("squidward".parse::<PersonaId>().unwrap(), PersonaId::Squidward);
        assert_eq!(" MrKrabs ".parse::<PersonaId>().unwrap(), PersonaId::MrKrabs);
        assert_eq!("mr_krabs".parse::<PersonaId>().unwrap(), PersonaId::MrKrabs);
        assert!("gary".parse::<PersonaId>().is_err());
        assert!("".parse::<PersonaId>().is_err());
    }

    #[test]
    fn test_from_slug_is_exact() {
        assert_eq!(PersonaId::from_slug("patrick"), Some(PersonaId::Patrick));
        assert_eq!(PersonaId::from_slug("mrkrabs"), Some(PersonaId::MrKrabs));
        assert_eq!(PersonaId::from_slug("MrKrabs"), None);
        assert_eq!(PersonaId::from_slug("mr_krabs"), None);
        assert_eq!(PersonaId::from_slug(" patrick"), None);
    }

    #[test]
    fn test_slug_roundtrip_for_all() {
        for id in PersonaId::all() {
            assert_eq!(id.slug().parse::<PersonaId>().unwrap(), *id);
        }
        assert_eq!(PersonaId::all().len(), 4);
    }

    #[test]
    fn test_serde_uses_slugs() {
        let json = serde_json::to_string(&PersonaId::MrKrabs).unwrap();
        assert_eq!(json, "\"mrkrabs\"");
        let parsed: PersonaId = serde_json::from_str("\"spongebob\"").unwrap();
        assert_eq!(parsed, PersonaId::SpongeBob);
    }

    #[test]
    fn test_default_is_spongebob() {
        assert_eq!(PersonaId::default(), PersonaId::SpongeBob);
    }
}
