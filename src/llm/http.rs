//! Shared HTTP plumbing for the REST providers
//!
//! Both providers retry the same way: exponential backoff on 429, 5xx and
//! connect/timeout failures, immediate return on anything else.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// First retry waits this long; each further retry doubles it.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(8);

/// Deterministic doubling schedule, bounded only by the retry count
fn retry_schedule() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: RETRY_BASE_DELAY,
        initial_interval: RETRY_BASE_DELAY,
        randomization_factor: 0.0,
        multiplier: 2.0,
        max_interval: RETRY_MAX_DELAY,
        max_elapsed_time: None,
        ..Default::default()
    }
}

/// Build a client with the provider timeout applied to every request
pub(crate) fn build_client(provider: &str, timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create HTTP client for {}: {}", provider, e)))
}

/// Join a base URL and a path without doubling or dropping the slash
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Send a request built by `build`, retrying transient failures.
///
/// `build` is called once per attempt since a `RequestBuilder` is consumed
/// by `send`.
pub(crate) async fn send_with_retry<F>(
    provider: &'static str,
    max_retries: u32,
    mut build: F,
) -> Result<Response>
where
    F: FnMut() -> RequestBuilder,
{
    let mut last_error: Option<Error> = None;
    let mut schedule = retry_schedule();

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = schedule.next_backoff().unwrap_or(RETRY_MAX_DELAY);
            debug!(provider, attempt, ?delay, "Retrying after error");
            tokio::time::sleep(delay).await;
        }

        match build().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                let body = response.text().await.unwrap_or_default();
                let err = Error::from_status(provider, status.as_u16(), body);
                if !err.is_retryable() {
                    return Err(err);
                }
                warn!(provider, status = %status, attempt, "Retryable API error");
                last_error = Some(err);
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                warn!(provider, attempt, error = %e, "Retryable connection error");
                last_error = Some(Error::network(provider, e.to_string()));
            }
            Err(e) => {
                return Err(Error::network(provider, format!("Request error: {}", e)));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::network(provider, "All retry attempts exhausted")))
}

/// Serve `app` on an ephemeral local port and return its base URL.
#[cfg(test)]
pub(crate) async fn spawn_stub(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
