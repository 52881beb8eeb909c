//! Retry policy, backoff computation and the sleeping seam.
//!
//! A [`RetryPolicy`] decides whether a failed attempt is retried and how long to
//! wait before the next one. Waiting goes through a [`Sleeper`] so that tests can
//! observe delays without actually sleeping.

use async_trait::async_trait;
use http::StatusCode;
use rand::Rng;
use std::collections::BTreeSet;
use std::time::Duration;

/// Defines when and how failed requests are retried.
///
/// Delays for ordinary retries grow as `base_delay * 2^n`, capped at `max_delay`,
/// where `n` counts the backoff retries taken so far (starting at 0). Rate-limited
/// responses that carry a reset hint wait exactly that long instead.
///
/// # Examples
///
/// ```
/// use sportmonks::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .max_retries(2)
///     .base_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(1))
///     .retry_status_codes([503])
///     .build();
///
/// assert_eq!(policy.backoff_delay(0), Duration::from_millis(100));
/// assert_eq!(policy.backoff_delay(1), Duration::from_millis(200));
/// assert_eq!(policy.backoff_delay(10), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
    retry_on_rate_limit: bool,
    retry_status_codes: BTreeSet<u16>,
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            retry_on_rate_limit: true,
            retry_status_codes: [500, 502, 503, 504].into_iter().collect(),
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Creates a builder starting from the default policy.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// The maximum number of retries after the first attempt.
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// The delay before the first backoff retry.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// The upper bound for any computed backoff delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Whether HTTP 429 responses are retried.
    pub fn retry_on_rate_limit(&self) -> bool {
        self.retry_on_rate_limit
    }

    /// Returns `true` if the given status is in the retriable set.
    pub fn is_retriable_status(&self, status: StatusCode) -> bool {
        self.retry_status_codes.contains(&status.as_u16())
    }

    /// Computes the backoff delay for the `index`-th backoff retry (0-indexed).
    ///
    /// Jitter, when enabled, scales the delay by a random factor between 50% and 100%.
    pub fn backoff_delay(&self, index: u32) -> Duration {
        let multiplier = 2u32.checked_pow(index).unwrap_or(u32::MAX);
        let delay = self
            .base_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);

        if self.jitter {
            let jitter_factor = rand::thread_rng().gen_range(0.5..=1.0);
            delay.mul_f64(jitter_factor)
        } else {
            delay
        }
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Sets the maximum number of retries.
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    /// Sets the delay before the first backoff retry.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.policy.base_delay = delay;
        self
    }

    /// Sets the cap for computed backoff delays.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Sets whether HTTP 429 responses are retried.
    pub fn retry_on_rate_limit(mut self, retry: bool) -> Self {
        self.policy.retry_on_rate_limit = retry;
        self
    }

    /// Replaces the set of retriable status codes.
    pub fn retry_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.policy.retry_status_codes = codes.into_iter().collect();
        self
    }

    /// Enables random jitter on computed backoff delays.
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.policy.jitter = jitter;
        self
    }

    /// Builds the policy.
    pub fn build(self) -> RetryPolicy {
        self.policy
    }
}

/// Suspends the current task for a duration.
///
/// The default [`TokioSleeper`] uses `tokio::time::sleep`, which does not block
/// other in-flight requests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Waits for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
