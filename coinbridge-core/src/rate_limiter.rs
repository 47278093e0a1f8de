//! Token bucket throttle.
//!
//! Exchanges advertise a minimum interval between requests (`rate_limit`
//! milliseconds). The bucket refills continuously at one token per
//! interval and endpoints may charge more than one token per call.
//!
//! ```rust
//! use coinbridge_core::rate_limiter::RateLimiter;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let limiter = RateLimiter::from_interval(Duration::from_millis(50));
//! limiter.wait().await;
//! limiter.wait_cost(2.0).await;
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::trace;

/// Bucket parameters.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum stored tokens, i.e. the allowed burst.
    pub capacity: f64,
    /// Time to refill one token.
    pub interval: Duration,
}

impl RateLimiterConfig {
    /// Bucket of `capacity` tokens refilling one token per `interval`.
    pub fn new(capacity: f64, interval: Duration) -> Self {
        Self { capacity, interval }
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new(1.0, Duration::from_millis(100))
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
    config: RateLimiterConfig,
}

impl Bucket {
    fn refill(&mut self, now: Instant) {
        let interval = self.config.interval.as_secs_f64();
        if interval <= 0.0 {
            self.tokens = self.config.capacity;
        } else {
            let earned = now.duration_since(self.last_refill).as_secs_f64() / interval;
            self.tokens = (self.tokens + earned).min(self.config.capacity);
        }
        self.last_refill = now;
    }

    /// Takes `cost` tokens, going into debt if needed, and returns how
    /// long the caller must sleep to pay it back.
    fn reserve(&mut self, cost: f64, now: Instant) -> Duration {
        self.refill(now);
        self.tokens -= cost;
        if self.tokens >= 0.0 {
            Duration::ZERO
        } else {
            self.config.interval.mul_f64(-self.tokens)
        }
    }
}

/// Shared throttle; clones share the same bucket.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    bucket: Arc<Mutex<Bucket>>,
}

impl RateLimiter {
    /// Limiter with an explicit configuration.
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            bucket: Arc::new(Mutex::new(Bucket {
                tokens: config.capacity,
                last_refill: Instant::now(),
                config,
            })),
        }
    }

    /// One request per `interval`, no burst.
    pub fn from_interval(interval: Duration) -> Self {
        Self::new(RateLimiterConfig::new(1.0, interval))
    }

    /// Waits for one token.
    pub async fn wait(&self) {
        self.wait_cost(1.0).await;
    }

    /// Waits for `cost` tokens.
    pub async fn wait_cost(&self, cost: f64) {
        let delay = self.bucket.lock().await.reserve(cost, Instant::now());
        if !delay.is_zero() {
            trace!(delay_ms = delay.as_millis(), cost, "throttling request");
            sleep(delay).await;
        }
    }

    /// Tokens currently available.
    pub async fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(Instant::now());
        bucket.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_goes_into_debt() {
        let now = Instant::now();
        let mut bucket = Bucket {
            tokens: 1.0,
            last_refill: now,
            config: RateLimiterConfig::new(1.0, Duration::from_millis(100)),
        };
        assert_eq!(bucket.reserve(1.0, now), Duration::ZERO);
        assert_eq!(bucket.reserve(1.0, now), Duration::from_millis(100));
        assert_eq!(bucket.reserve(2.0, now), Duration::from_millis(300));
    }

    #[test]
    fn test_refill_caps_at_capacity() {
        let start = Instant::now();
        let mut bucket = Bucket {
            tokens: 0.0,
            last_refill: start,
            config: RateLimiterConfig::new(3.0, Duration::from_millis(10)),
        };
        bucket.refill(start + Duration::from_secs(5));
        assert!((bucket.tokens - 3.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_wait_throttles_second_call() {
        let limiter = RateLimiter::from_interval(Duration::from_millis(40));
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(35));
    }
}
