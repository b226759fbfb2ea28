//! Catch-all wrapper shared by both entry points.

use std::future::Future;

use tracing::{error, warn};

use crate::error::Result;
use crate::types::ResponseEnvelope;

/// Rationale attached to every top-level fallback envelope
pub const FALLBACK_RATIONALE: &str = "Fallback due to orchestration error";

/// Await `operation`; on error, log it and return `fallback()` marked as a
/// fallback envelope instead.
pub async fn with_fallback<F, Fb>(entry: &'static str, operation: F, fallback: Fb) -> ResponseEnvelope
where
    F: Future<Output = Result<ResponseEnvelope>>,
    Fb: FnOnce() -> ResponseEnvelope,
{
    match operation.await {
        Ok(envelope) => envelope,
        Err(e) => {
            // Provider outages are expected; anything else is a bug
            if e.is_collaborator() {
                warn!(entry, code = %e.code(), error = %e, "Collaborator failed, returning fallback");
            } else {
                error!(entry, code = %e.code(), error = %e, "Orchestration failed, returning fallback");
            }
            fallback().into_fallback()
        }
    }
}
