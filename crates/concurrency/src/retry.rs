//! Shared retry policy
//!
//! Every hot- and cold-store call goes through [`RetryPolicy::run`]:
//!
//! ```text
//! attempt 0 ── timeout(op) ──┬─ Ok ───────────────► return
//!                            ├─ permanent error ──► return error
//!                            └─ transient error ──► sleep(backoff(0)) ─► attempt 1 ...
//! ```
//!
//! After `max_attempts` tries the last error is returned unchanged, so
//! callers can still tell a timeout from a throttled store.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use strata_tier_core::{Error, Result, TieringConfig};
use tracing::{debug, warn};

/// Exponents above this would overflow; 2^30 base units is already far past any cap.
const MAX_EXPONENT: u32 = 30;

/// Timeout and exponential backoff for one logical operation
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base: Duration,
    max: Duration,
    timeout: Option<Duration>,
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base: Duration::from_millis(100),
            max: Duration::from_secs(10),
            timeout: Some(Duration::from_secs(5)),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy with the given attempt ceiling and backoff bounds, no timeout, no jitter
    pub fn new(max_attempts: u32, base: Duration, max: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            base,
            max,
            timeout: None,
            jitter: false,
        }
    }

    /// Policy for individual store calls
    pub fn for_io(config: &TieringConfig) -> Self {
        RetryPolicy {
            max_attempts: config.io_max_attempts.max(1),
            base: config.retry_backoff_base(),
            max: config.retry_backoff_max(),
            timeout: Some(config.io_timeout()),
            jitter: config.retry_jitter,
        }
    }

    /// Policy for whole-record archival attempts (backoff only; each store
    /// call inside an attempt carries its own timeout)
    pub fn for_archival(config: &TieringConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_retry_attempts.max(1),
            base: config.retry_backoff_base(),
            max: config.retry_backoff_max(),
            timeout: None,
            jitter: config.retry_jitter,
        }
    }

    /// Bound each attempt by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Randomize delays
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Maximum number of attempts
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Per-attempt timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Delay before retry number `attempt` (0-indexed)
    ///
    /// `min(base * 2^attempt, max)`. With jitter the result is drawn
    /// uniformly from the upper half of that window, so delays stay
    /// spread out without collapsing to zero.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(MAX_EXPONENT);
        let factor = 2u32.saturating_pow(exponent);
        let delay = self.base.saturating_mul(factor).min(self.max);

        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let half = delay / 2;
        let spread = rand::thread_rng().gen_range(0..=half.as_micros() as u64);
        half + Duration::from_micros(spread)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out
    ///
    /// Only errors for which [`Error::is_transient`] holds are retried.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            let result = match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, op()).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout {
                        operation: operation.to_string(),
                        after_ms: limit.as_millis() as u64,
                    }),
                },
                None => op().await,
            };

            match result {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation, attempts = attempt + 1, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt + 1 < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
