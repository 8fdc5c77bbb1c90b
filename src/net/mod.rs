//! Outbound HTTP with the repository's retry policy applied.
//!
//! Every fetch performed by the sync pipeline goes through [`Fetcher`], which
//! wraps a shared [`reqwest::Client`] in an *unbounded* fixed-interval retry
//! loop: transient failures are logged at `warn` and retried until they stop
//! happening. There is no retry budget and no circuit breaker - the external
//! scheduler that invokes upsync owns the real timeout, and a stuck run is
//! terminated from outside. Individual requests are still bounded by the
//! client timeout so a dead connection cannot hang a single attempt forever.
//!
//! The backoff interval and the transient-vs-fatal predicate live in
//! [`RetryPolicy`] and are injectable, so tests exercise the retry path with
//! a zero interval and synthetic failures instead of real network delays.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_RETRY_INTERVAL, HTTP_TIMEOUT, USER_AGENT};

/// Retry behavior for outbound requests.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Fixed sleep between attempts.
    pub interval: Duration,
    /// Classifier deciding whether a failure is transient (retried) or
    /// fatal (propagated).
    pub is_transient: fn(&reqwest::Error) -> bool,
}

impl RetryPolicy {
    /// Default classifier: every transport and HTTP-status failure is
    /// transient; only response-decoding failures are fatal, since a body
    /// that fetched fine but will not parse is a data problem, not a
    /// network one.
    #[must_use]
    pub fn default_is_transient(error: &reqwest::Error) -> bool {
        !error.is_decode()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            is_transient: Self::default_is_transient,
        }
    }
}

/// Retry `action` forever at a fixed interval while `is_transient` accepts
/// the failure.
///
/// Each failed attempt is logged at `warn` with the operation name before
/// the classifier decides whether to keep going. Fatal failures propagate
/// immediately.
pub async fn retry_forever<T, E, A, F, C>(
    interval: Duration,
    operation: &str,
    action: A,
    is_transient: C,
) -> Result<T, E>
where
    A: FnMut() -> F,
    F: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    // FixedInterval is an infinite iterator, so the retry loop has no cap.
    RetryIf::spawn(FixedInterval::new(interval), action, |error: &E| {
        let transient = is_transient(error);
        if transient {
            warn!("{operation} failed, retrying in {interval:?}: {error}");
        }
        transient
    })
    .await
}

/// Shared HTTP client with the retry policy baked in.
pub struct Fetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Build a fetcher with a bounded per-request timeout and the upsync
    /// user agent (the GitHub API rejects anonymous clients without one).
    pub fn new(policy: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, policy })
    }

    /// Fetch a URL and return the response body as text.
    ///
    /// Retries transient failures indefinitely per the policy; only fatal
    /// failures (per the policy's classifier) surface as errors.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!("fetching {url}");
        let body = retry_forever(
            self.policy.interval,
            url,
            || async move {
                let response = self.client.get(url).send().await?;
                response.error_for_status()?.text().await
            },
            self.policy.is_transient,
        )
        .await
        .with_context(|| format!("failed to fetch {url}"))?;
        debug!("fetched {url} ({} bytes)", body.len());
        Ok(body)
    }

    /// Fetch a URL and deserialize the response body as JSON.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("fetching {url} as JSON");
        retry_forever(
            self.policy.interval,
            url,
            || async move {
                let response = self.client.get(url).send().await?;
                response.error_for_status()?.json::<T>().await
            },
            self.policy.is_transient,
        )
        .await
        .with_context(|| format!("failed to fetch {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_the_transient_failure_clears() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, String> = retry_forever(
            Duration::ZERO,
            "flaky",
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 4 {
                        Err("connection reset".to_string())
                    } else {
                        Ok(n)
                    }
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), 4);
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn fatal_failures_propagate_immediately() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), String> = retry_forever(
            Duration::ZERO,
            "broken",
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err("malformed response".to_string()) }
            },
            |error| !error.contains("malformed"),
        )
        .await;

        assert_eq!(result.unwrap_err(), "malformed response");
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let result: Result<&str, String> =
            retry_forever(Duration::ZERO, "ok", || async { Ok("done") }, |_| true).await;
        assert_eq!(result.unwrap(), "done");
    }
}
