//! Loop configuration: round bounds, per-call timeouts, and retry policy.

use std::time::Duration;

/// Retry policy for reasoning-engine outages.
///
/// Backoff doubles per attempt from `initial_backoff`, clamped at
/// `max_backoff`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total decide attempts per round (first try included).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper clamp for the exponential backoff.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before retrying after the given zero-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }
}

/// Configuration for one delegation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// Maximum resolved delegation rounds per request.
    pub max_rounds: u32,
    /// Deadline for a single reasoning-engine decision.
    pub decide_timeout: Duration,
    /// Deadline for a single capability invocation.
    pub invoke_timeout: Duration,
    /// Retry policy applied when the reasoning engine is unavailable.
    pub retry: RetryPolicy,
    /// Give up after this many consecutive failed results from the same
    /// capability. `None` disables the cutoff, leaving only the round
    /// bound.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_rounds: 8,
            decide_timeout: Duration::from_secs(60),
            invoke_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            max_consecutive_failures: Some(3),
        }
    }
}

impl LoopConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn with_decide_timeout(mut self, timeout: Duration) -> Self {
        self.decide_timeout = timeout;
        self
    }

    pub fn with_invoke_timeout(mut self, timeout: Duration) -> Self {
        self.invoke_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_consecutive_failures(mut self, limit: Option<u32>) -> Self {
        self.max_consecutive_failures = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_clamps() {
        let policy = RetryPolicy::default()
            .with_initial_backoff(Duration::from_millis(500))
            .with_max_backoff(Duration::from_secs(2));

        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        // Clamped from here on.
        assert_eq!(policy.delay_for(3), Duration::from_secs(2));
        assert_eq!(policy.delay_for(30), Duration::from_secs(2));
    }

    #[test]
    fn at_least_one_attempt() {
        let policy = RetryPolicy::default().with_max_attempts(0);
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn config_defaults() {
        let config = LoopConfig::default();
        assert_eq!(config.max_rounds, 8);
        assert_eq!(config.max_consecutive_failures, Some(3));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn config_builders() {
        let config = LoopConfig::new()
            .with_max_rounds(3)
            .with_invoke_timeout(Duration::from_secs(5))
            .with_max_consecutive_failures(None);
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.invoke_timeout, Duration::from_secs(5));
        assert_eq!(config.max_consecutive_failures, None);
    }
}
