//! Retry with exponential backoff and full jitter.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use tracing::warn;

use crate::core::constants::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE, RETRY_CAP};
use crate::error::ApiError;

/// How often and how long to wait before retrying transient failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base: DEFAULT_RETRY_BASE,
            cap: RETRY_CAP,
        }
    }
}

impl RetryPolicy {
    /// Random delay in `[0, min(cap, base * 2^attempt)]`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let ceiling = self
            .base
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.cap);
        let millis = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
    }

    /// Delay before the next attempt; a server-provided hint wins, up to `cap`.
    fn delay(&self, attempt: u32, error: &ApiError) -> Duration {
        match error {
            ApiError::RateLimited {
                retry_after: Some(hint),
                ..
            } => (*hint).min(self.cap),
            _ => self.backoff(attempt),
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
///
/// Only transient and rate-limit failures are retried.
pub async fn retrying<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.delay(attempt, &error);
                attempt += 1;
                warn!(
                    attempt,
                    max = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    %error,
                    "retrying request"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Parse a `Retry-After` header given in seconds.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
