use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Classifies a failure as worth another attempt.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// The delay before attempt `n` is `base_delay * (n - 1)`. Zero retries
    /// immediately.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay slept before `attempt` (1-based). The first attempt is immediate.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.saturating_sub(1)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are used up. The last error is returned unchanged.
pub async fn with_retry<T, E, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut schedule: Vec<Duration> = Vec::new();
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Upstream call succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if attempt >= policy.max_attempts() => {
                tracing::error!(
                    attempts = attempt,
                    delays = ?schedule,
                    "Upstream call failed after {} retries: {err}",
                    policy.max_retries
                );
                return Err(err);
            }
            Err(err) if !err.is_retryable() => {
                tracing::debug!(attempt, "Non-retryable upstream failure: {err}");
                return Err(err);
            }
            Err(err) => {
                let delay = policy.delay_before(attempt + 1);
                tracing::warn!(
                    "Upstream call failed, retry {attempt}/{} in {}ms: {err}",
                    policy.max_retries,
                    delay.as_millis()
                );
                schedule.push(delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
