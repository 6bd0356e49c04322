//! Bounded retry over a fixed backoff schedule
//!
//! One retry per schedule entry, so a schedule of N delays makes at most N + 1
//! attempts. Only transient failures are retried.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::upstream::{CompletionProvider, CompletionRequest, UpstreamError};

/// Waits between attempts: 1s, 2s, 4s
pub const DEFAULT_RETRY_DELAYS: [Duration; 3] = [
    Duration::from_millis(1000),
    Duration::from_millis(2000),
    Duration::from_millis(4000),
];

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self { delays: Vec::new() }
    }

    pub fn max_attempts(&self) -> usize {
        self.delays.len() + 1
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Run `operation` until it succeeds, fails non-transiently, or the
    /// schedule is exhausted. The closure receives the 1-based attempt number.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, UpstreamError>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut attempt = 1;
        loop {
            let error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !error.is_transient() {
                return Err(error);
            }

            let Some(delay) = self.delays.get(attempt - 1) else {
                return Err(error);
            };

            warn!(
                error_type = error.category(),
                "Upstream attempt {}/{} failed, retrying in {:?}: {}",
                attempt,
                self.max_attempts(),
                delay,
                error
            );
            tokio::time::sleep(*delay).await;
            attempt += 1;
        }
    }

    /// Retry a single completion request against `provider`
    pub async fn complete(
        &self,
        provider: &dyn CompletionProvider,
        request: &CompletionRequest,
    ) -> Result<String, UpstreamError> {
        self.run(|_| provider.complete(request)).await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAYS.to_vec())
    }
}
