use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// How many times to try a video and how long to wait between tries
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_retries: u32,
    /// Base of the exponential backoff used without proxies
    pub initial_delay: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
    /// Fixed pause before retrying through the next proxy
    pub proxy_retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_secs_f64(config.initial_delay_secs),
            jitter_min: Duration::from_secs_f64(config.jitter_min_secs),
            jitter_max: Duration::from_secs_f64(config.jitter_max_secs),
            proxy_retry_delay: Duration::from_secs_f64(config.proxy_retry_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// Attempt budget, never below one
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Wait before the attempt following the zero-based `attempt_index`.
    ///
    /// Through a proxy pool the next attempt uses another egress address, so only a
    /// short fixed pause is taken. Otherwise the wait is
    /// `initial_delay * 2^attempt_index` plus uniform jitter.
    pub fn backoff_delay(&self, attempt_index: u32, proxied: bool) -> Duration {
        if proxied {
            return self.proxy_retry_delay;
        }
        self.exponential_delay(attempt_index)
            .saturating_add(jitter(self.jitter_min, self.jitter_max))
    }

    /// Backoff without jitter
    pub fn exponential_delay(&self, attempt_index: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt_index))
    }
}

/// Uniformly random duration in `[min, max]`; `min` when the range is empty
pub fn jitter(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let secs = rand::thread_rng().gen_range(min.as_secs_f64()..=max.as_secs_f64());
    Duration::from_secs_f64(secs)
}

/// Suspension point used for backoff and pacing
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_secs(15),
            jitter_min: Duration::from_secs(1),
            jitter_max: Duration::from_secs(10),
            proxy_retry_delay: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_exponential_delay_doubles() {
        let policy = policy();
        let delays: Vec<u64> = (0..5).map(|i| policy.exponential_delay(i).as_secs()).collect();
        assert_eq!(delays, vec![15, 30, 60, 120, 240]);
    }

    #[test]
    fn test_backoff_delay_stays_within_jitter_bounds() {
        let policy = policy();
        for attempt in 0..4 {
            let base = policy.exponential_delay(attempt);
            for _ in 0..50 {
                let delay = policy.backoff_delay(attempt, false);
                assert!(delay >= base + policy.jitter_min, "{delay:?}");
                assert!(delay <= base + policy.jitter_max, "{delay:?}");
            }
        }
    }

    #[test]
    fn test_proxied_backoff_is_fixed() {
        let policy = policy();
        assert_eq!(policy.backoff_delay(0, true), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(4, true), Duration::from_secs(1));
    }

    #[test]
    fn test_jitter_with_empty_range() {
        assert_eq!(jitter(Duration::ZERO, Duration::ZERO), Duration::ZERO);
        assert_eq!(
            jitter(Duration::from_secs(3), Duration::from_secs(1)),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_exponential_delay_saturates() {
        let policy = policy();
        assert_eq!(
            policy.exponential_delay(200),
            Duration::from_secs(15).saturating_mul(u32::MAX)
        );
    }

    #[test]
    fn test_attempts_never_zero() {
        let policy = RetryPolicy {
            max_retries: 0,
            ..policy()
        };
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn test_policy_from_default_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay, Duration::from_secs(15));
        assert_eq!(policy.proxy_retry_delay, Duration::from_secs(1));
    }
}
