//! Mock backend for testing and offline runs
//!
//! Unscripted replies are deterministic: plain calls echo the first line of the
//! system prompt, structured calls fill every schema field with a placeholder.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;
use crate::types::Conversation;

use super::{BackendHealth, LlmBackend, OutputSchema};

#[cfg(test)]
pub use harness::MockFailure;

const PROVIDER: &str = "mock";

// ─────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────

/// Deterministic in-process backend
#[derive(Default)]
pub struct MockBackend {
    #[cfg(test)]
    harness: harness::Harness,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unscripted reply: echo the prompt's first line, or fill every schema
    /// field with a placeholder.
    fn default_reply(system_prompt: &str, schema: Option<&OutputSchema>) -> String {
        match schema {
            Some(schema) => {
                let fields: Map<String, Value> = schema
                    .field_names()
                    .map(|f| (f.to_string(), Value::String(format!("mock {}", f))))
                    .collect();
                Value::Object(fields).to_string()
            }
            None => {
                let first = system_prompt.lines().next().unwrap_or("").trim();
                format!("Mock reply: {}", first)
            }
        }
    }

    #[cfg(test)]
    async fn scripted(
        &self,
        conversation: &Conversation,
        system_prompt: &str,
        schema: Option<&OutputSchema>,
    ) -> Option<Result<String>> {
        self.harness.observe(conversation, system_prompt, schema).await
    }

    #[cfg(not(test))]
    async fn scripted(
        &self,
        _conversation: &Conversation,
        _system_prompt: &str,
        _schema: Option<&OutputSchema>,
    ) -> Option<Result<String>> {
        None
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn health_check(&self) -> Result<BackendHealth> {
        Ok(BackendHealth::ok(PROVIDER))
    }

    async fn generate(
        &self,
        conversation: &Conversation,
        system_prompt: &str,
        schema: Option<&OutputSchema>,
    ) -> Result<String> {
        debug!(
            messages = conversation.len(),
            schema = schema.map(|s| s.name).unwrap_or("none"),
            "Mock generate"
        );

        match self.scripted(conversation, system_prompt, schema).await {
            Some(reply) => reply,
            None => Ok(Self::default_reply(system_prompt, schema)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Test harness
// ─────────────────────────────────────────────────────────────────

/// Scripting and call recording for unit tests. Replies are matched by
/// system-prompt substring, so a test can make the routing call, a single
/// persona, or the synthesis call misbehave on its own.
#[cfg(test)]
mod harness {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use parking_lot::{Mutex, RwLock};

    use super::{MockBackend, OutputSchema, PROVIDER};
    use crate::error::{Error, Result};
    use crate::types::Conversation;

    /// Failure modes a scripted call can simulate
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MockFailure {
        NotConfigured,
        QuotaExceeded,
        Network,
        Malformed,
    }

    impl MockFailure {
        pub fn to_error(self) -> Error {
            match self {
                MockFailure::NotConfigured => Error::not_configured(PROVIDER, "no key"),
                MockFailure::QuotaExceeded => Error::QuotaExceeded {
                    provider: PROVIDER.to_string(),
                    message: "quota exceeded".to_string(),
                },
                MockFailure::Network => Error::network(PROVIDER, "simulated timeout"),
                MockFailure::Malformed => Error::malformed(PROVIDER, "empty text"),
            }
        }
    }

    #[derive(Debug, Clone)]
    enum Scripted {
        Text(String),
        Fail(MockFailure),
    }

    /// One recorded call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MockCall {
        pub system_prompt: String,
        pub schema: Option<&'static str>,
        pub conversation_len: usize,
    }

    #[derive(Default)]
    pub(super) struct Harness {
        script: RwLock<Vec<(String, Scripted)>>,
        calls: Mutex<Vec<MockCall>>,
        latency: Option<Duration>,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl Harness {
        /// Record the call, honour latency, and return the scripted reply if any
        pub(super) async fn observe(
            &self,
            conversation: &Conversation,
            system_prompt: &str,
            schema: Option<&OutputSchema>,
        ) -> Option<Result<String>> {
            self.calls.lock().push(MockCall {
                system_prompt: system_prompt.to_string(),
                schema: schema.map(|s| s.name),
                conversation_len: conversation.len(),
            });

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let scripted = self
                .script
                .read()
                .iter()
                .find(|(pattern, _)| system_prompt.contains(pattern.as_str()))
                .map(|(_, reply)| reply.clone());
            scripted.map(|reply| match reply {
                Scripted::Text(text) => Ok(text),
                Scripted::Fail(failure) => Err(failure.to_error()),
            })
        }
    }

    impl MockBackend {
        /// Sleep this long inside every call
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.harness.latency = Some(latency);
            self
        }

        /// Reply with `text` whenever the system prompt contains `pattern`.
        /// Rules are tried in insertion order.
        pub fn reply_when(self, pattern: impl Into<String>, text: impl Into<String>) -> Self {
            self.harness
                .script
                .write()
                .push((pattern.into(), Scripted::Text(text.into())));
            self
        }

        /// Fail with `failure` whenever the system prompt contains `pattern`
        pub fn fail_when(self, pattern: impl Into<String>, failure: MockFailure) -> Self {
            self.harness
                .script
                .write()
                .push((pattern.into(), Scripted::Fail(failure)));
            self
        }

        /// All calls so far, in arrival order
        pub fn calls(&self) -> Vec<MockCall> {
            self.harness.calls.lock().clone()
        }

        pub fn call_count(&self) -> usize {
            self.harness.calls.lock().len()
        }

        /// Number of calls whose system prompt contains `pattern`
        pub fn calls_matching(&self, pattern: &str) -> usize {
            self.harness
                .calls
                .lock()
                .iter()
                .filter(|c| c.system_prompt.contains(pattern))
                .count()
        }

        /// Highest number of calls observed running at once
        pub fn peak_concurrency(&self) -> usize {
            self.harness.peak_in_flight.load(Ordering::SeqCst)
        }

        pub fn reset(&self) {
            self.harness.calls.lock().clear();
            self.harness.peak_in_flight.store(0, Ordering::SeqCst);
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
