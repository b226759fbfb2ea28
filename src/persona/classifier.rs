//! Keyword classifier: guesses which persona wrote a piece of text.
//!
//! The service keeps no session state, so the only way to know who spoke last
//! is to look at what was said. Rules are `(persona, vocabulary)` pairs tested
//! in order; the first persona with any matching keyword wins.

use super::registry::PersonaRegistry;
use super::types::PersonaId;

/// Ordered rule table over lower-case substrings.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<(PersonaId, Vec<String>)>,
}

impl KeywordClassifier {
    /// Build a classifier from explicit rules. Keywords are lower-cased.
    pub fn new<I, K, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = (PersonaId, K)>,
        K: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = rules
            .into_iter()
            .map(|(id, words)| {
                let words = words
                    .into_iter()
                    .map(|w| w.as_ref().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                (id, words)
            })
            .collect();
        Self { rules }
    }

    /// Classifier over the registry's vocabularies in the standard order.
    pub fn from_registry(registry: &PersonaRegistry) -> Self {
        Self::new(
            registry
                .keyword_rules()
                .into_iter()
                .map(|(id, words)| (id, words.iter().copied())),
        )
    }

    /// Guess the persona behind `text`, or `None` when nothing matches.
    pub fn classify(&self, text: &str) -> Option<PersonaId> {
        let text = text.to_lowercase();
        if text.trim().is_empty() {
            return None;
        }

        self.rules
            .iter()
            .find(|(_, words)| words.iter().any(|w| text.contains(w.as_str())))
            .map(|(id, _)| *id)
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::from_registry(&PersonaRegistry::new())
    }
}
