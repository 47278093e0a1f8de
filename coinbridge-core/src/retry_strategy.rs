//! Retry policy for HTTP requests.
//!
//! Whether an error is worth retrying comes from
//! [`Error::is_retryable`](crate::Error::is_retryable); the policy decides
//! how many times and how long to wait in between.

use crate::error::Error;
use rand::Rng;
use std::time::Duration;

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategyType {
    /// Constant delay.
    Fixed,
    /// `base * 2^attempt`.
    Exponential,
    /// `base * (attempt + 1)`.
    Linear,
}

/// Retry settings.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay growth.
    pub strategy_type: RetryStrategyType,
    /// Base delay in milliseconds.
    pub base_delay_ms: u64,
    /// Delay ceiling in milliseconds.
    pub max_delay_ms: u64,
    /// Retry rate limit rejections.
    pub retry_on_rate_limit: bool,
    /// Random extra delay as a fraction of the computed delay.
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            strategy_type: RetryStrategyType::Exponential,
            base_delay_ms: 100,
            max_delay_ms: 30_000,
            retry_on_rate_limit: true,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// Never retry.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Retry decisions and delays.
#[derive(Debug, Clone, Default)]
pub struct RetryStrategy {
    config: RetryConfig,
}

impl RetryStrategy {
    /// Strategy from a config.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Whether `error` on zero-based `attempt` should be retried.
    pub fn should_retry(&self, error: &Error, attempt: u32) -> bool {
        if attempt >= self.config.max_retries {
            return false;
        }
        match error {
            Error::RateLimit { .. } => self.config.retry_on_rate_limit,
            other => other.is_retryable(),
        }
    }

    /// Delay before retrying after zero-based `attempt`. A server supplied
    /// `Retry-After` wins over the computed backoff.
    pub fn calculate_delay(&self, attempt: u32, error: &Error) -> Duration {
        if let Some(retry_after) = error.retry_after() {
            return retry_after;
        }
        let base = self.config.base_delay_ms;
        let raw = match self.config.strategy_type {
            RetryStrategyType::Fixed => base,
            RetryStrategyType::Exponential => base.saturating_mul(2_u64.saturating_pow(attempt)),
            RetryStrategyType::Linear => base.saturating_mul(u64::from(attempt) + 1),
        };
        let mut delay = raw.min(self.config.max_delay_ms);
        if self.config.jitter_factor > 0.0 {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let spread = (delay as f64 * self.config.jitter_factor) as u64;
            delay += rand::rng().random_range(0..=spread);
        }
        Duration::from_millis(delay)
    }

    /// Configured retry count.
    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }
}
