//! Retrying gateway decorator.
//!
//! Wraps any backend with the gateway retry policy: transient failures are
//! retried with exponential backoff up to a fixed attempt budget; every
//! other failure class is returned immediately. Malformed output is not a
//! backend error at all: parsing happens above the gateway, and the
//! orchestrator advances to the next candidate instead of retrying.

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use radscribe_util::error::LlmError;

use crate::types::{LlmBackend, LlmInvocation, LlmResult};

/// Backend decorator applying the transient-retry policy
pub struct RetryingBackend {
    inner: Box<dyn LlmBackend>,
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryingBackend {
    /// Wrap a backend with the given retry budget and backoff base delay.
    ///
    /// `max_attempts` counts the first attempt; attempt `n` (0-based) sleeps
    /// `base_delay * 2^n` before the next try, with the doubling factor
    /// capped at `2^16`.
    #[must_use]
    pub fn new(inner: Box<dyn LlmBackend>, max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wrap a backend using the retry section of the configuration.
    #[must_use]
    pub fn from_config(
        inner: Box<dyn LlmBackend>,
        retry: &radscribe_config::RetryConfig,
    ) -> Self {
        Self::new(
            inner,
            retry.max_attempts,
            Duration::from_millis(retry.base_delay_ms),
        )
    }
}

#[async_trait]
impl LlmBackend for RetryingBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let mut attempt: u32 = 0;
        loop {
            match self.inner.invoke(inv.clone()).await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_transient() && attempt + 1 < self.max_attempts => {
                    // Cap the exponent so large attempt budgets cannot
                    // overflow the doubling factor.
                    let delay = self.base_delay.saturating_mul(1u32 << attempt.min(16));
                    warn!(
                        report_id = %inv.report_id,
                        task = %inv.task,
                        model = %inv.model,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
