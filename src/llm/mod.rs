//! LLM collaborator seam
//!
//! Everything the router and aggregator know about text generation goes
//! through the `LlmBackend` trait defined here.

mod gemini;
mod http;
mod mock;
mod openai;
mod registry;
mod traits;

pub use gemini::{GeminiBackend, GeminiConfig};
pub use mock::MockBackend;
#[cfg(test)]
pub use mock::MockFailure;
pub use openai::{OpenAiBackend, OpenAiConfig};
pub use registry::*;
pub use traits::*;
