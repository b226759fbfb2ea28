//! Type definitions for the Chorus Router
//!
//! Conversation input types and the routing/response types that flow back
//! up to the request handler.

mod conversation;
mod envelope;

pub use conversation::*;
pub use envelope::*;
