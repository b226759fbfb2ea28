//! Persona system: the four fixed voices that can answer a turn.
//!
//! Identities and their static profiles live in the registry. The keyword
//! classifier recovers who spoke last from plain text, and the responder
//! turns a profile into a collaborator call.

pub mod classifier;
pub mod registry;
pub mod responder;
pub mod types;

pub use classifier::KeywordClassifier;
pub use registry::PersonaRegistry;
pub use responder::PersonaResponder;
pub use types::PersonaId;
