//! Orchestration entry points
//!
//! Two ways to answer a conversation turn:
//! - Router: pick one persona and let it reply
//! - Aggregator: ask all personas and synthesize one chorus reply
//!
//! Both return a `ResponseEnvelope` for any non-empty conversation.

pub mod aggregator;
pub mod fallback;
pub mod prompts;
pub mod router;
pub mod structured;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RoutingSettings;
use crate::error::{Error, Result};
use crate::llm::SharedBackend;
use crate::types::{Conversation, ResponseEnvelope};

pub use aggregator::Aggregator;
pub use router::Router;

/// Reject conversations with nothing to answer
pub(crate) fn ensure_non_empty(conversation: &Conversation) -> Result<()> {
    if conversation.is_empty() {
        return Err(Error::InvalidInput("conversation is empty".to_string()));
    }
    Ok(())
}

/// Which entry point answers a turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Router,
    Aggregator,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Router => "router",
            Mode::Aggregator => "aggregator",
        }
    }

    /// Lenient parse: anything but "aggregator" selects the router
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "aggregator" | "chorus" => Mode::Aggregator,
            _ => Mode::Router,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Router and aggregator sharing one backend
pub struct Orchestrator {
    router: Router,
    aggregator: Aggregator,
    backend: SharedBackend,
}

impl Orchestrator {
    pub fn new(backend: SharedBackend, routing: &RoutingSettings) -> Result<Self> {
        let router = Router::new(backend.clone()).with_default_persona(routing.default_persona()?);
        let aggregator = Aggregator::new(backend.clone()).with_parallel_fanout(routing.parallel_fanout);
        Ok(Self {
            router,
            aggregator,
            backend,
        })
    }

    pub async fn handle(&self, mode: Mode, conversation: &Conversation) -> Result<ResponseEnvelope> {
        debug!(mode = %mode, messages = conversation.len(), "Handling conversation");
        match mode {
            Mode::Router => self.router.route(conversation).await,
            Mode::Aggregator => self.aggregator.aggregate(conversation).await,
        }
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

}
