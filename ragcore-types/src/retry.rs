//! Retry policy and delay computation (spec §3, §8).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff shape for retried operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategy {
    Exponential,
    Linear,
    Fixed,
}

/// A retry policy: how long to wait between attempt `n` and `n + 1`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub strategy: RetryStrategy,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub jitter: bool,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::Exponential,
            base_delay: Duration::from_millis(200),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: false,
            max_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// Computes the delay before attempt `n` (0-indexed), clamped to
    /// `max_delay`, per spec §3:
    ///
    /// - exponential: `base * multiplier^n`
    /// - linear: `base * (1 + multiplier * n)`
    /// - fixed: `base`
    ///
    /// When `jitter` is enabled the clamped delay is multiplied by a
    /// uniform factor in `[0.8, 1.2]`; callers that need deterministic
    /// delays (e.g. property tests) should use [`RetryPolicy::delay_for`]
    /// with `jitter: false` or check the delay falls within the jitter band.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_secs_f64();
        let raw = match self.strategy {
            RetryStrategy::Exponential => base * self.multiplier.powi(attempt as i32),
            RetryStrategy::Linear => base * (1.0 + self.multiplier * f64::from(attempt)),
            RetryStrategy::Fixed => base,
        };
        let clamped = raw.min(self.max_delay.as_secs_f64()).max(0.0);
        let factor = if self.jitter {
            0.8 + rand::random::<f64>() * 0.4
        } else {
            1.0
        };
        Duration::from_secs_f64(clamped * factor)
    }

    /// Whether an error at 4xx status `code` should be retried. Per spec
    /// §4.2, transient errors (timeouts, connection refused, 5xx) are
    /// retried; 4xx is terminal except 408 (request timeout) and 429 (too
    /// many requests).
    #[must_use]
    pub const fn is_retryable_status(code: u16) -> bool {
        if code >= 500 {
            return true;
        }
        if code == 408 || code == 429 {
            return true;
        }
        code < 400
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_delays_match_formula_without_jitter() {
        let policy = RetryPolicy {
            strategy: RetryStrategy::Exponential,
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
            jitter: false,
            max_attempts: 5,
        };
        let delays: Vec<f64> = (0..4).map(|n| policy.delay_for(n).as_secs_f64()).collect();
        assert!((delays[0] - 0.1).abs() < 1e-9);
        assert!((delays[1] - 0.2).abs() < 1e-9);
        assert!((delays[2] - 0.4).abs() < 1e-9);
        assert!((delays[3] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn linear_delays_match_formula() {
        let policy = RetryPolicy {
            strategy: RetryStrategy::Linear,
            base_delay: Duration::from_millis(100),
            multiplier: 1.0,
            max_delay: Duration::from_secs(10),
            jitter: false,
            max_attempts: 5,
        };
        assert!((policy.delay_for(0).as_secs_f64() - 0.1).abs() < 1e-9);
        assert!((policy.delay_for(1).as_secs_f64() - 0.2).abs() < 1e-9);
        assert!((policy.delay_for(2).as_secs_f64() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn fixed_delay_never_changes() {
        let policy = RetryPolicy {
            strategy: RetryStrategy::Fixed,
            base_delay: Duration::from_millis(250),
            multiplier: 5.0,
            max_delay: Duration::from_secs(10),
            jitter: false,
            max_attempts: 5,
        };
        for n in 0..5 {
            assert!((policy.delay_for(n).as_secs_f64() - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn delay_is_clamped_to_max() {
        let policy = RetryPolicy {
            strategy: RetryStrategy::Exponential,
            base_delay: Duration::from_secs(1),
            multiplier: 10.0,
            max_delay: Duration::from_secs(5),
            jitter: false,
            max_attempts: 5,
        };
        assert!(policy.delay_for(3).as_secs_f64() <= 5.0);
    }

    #[test]
    fn jitter_stays_within_band() {
        let policy = RetryPolicy {
            strategy: RetryStrategy::Fixed,
            base_delay: Duration::from_millis(1000),
            multiplier: 1.0,
            max_delay: Duration::from_secs(10),
            jitter: true,
            max_attempts: 5,
        };
        for _ in 0..200 {
            let delay = policy.delay_for(0).as_secs_f64();
            assert!((0.8..=1.2).contains(&delay), "delay {delay} out of band");
        }
    }

    #[test]
    fn retryable_status_classification() {
        assert!(RetryPolicy::is_retryable_status(500));
        assert!(RetryPolicy::is_retryable_status(503));
        assert!(RetryPolicy::is_retryable_status(408));
        assert!(RetryPolicy::is_retryable_status(429));
        assert!(!RetryPolicy::is_retryable_status(404));
        assert!(!RetryPolicy::is_retryable_status(400));
        assert!(RetryPolicy::is_retryable_status(200));
    }
}
