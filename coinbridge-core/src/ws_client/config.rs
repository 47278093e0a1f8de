//! WebSocket configuration types.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff settings for reconnection.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Delay ceiling.
    pub max_delay: Duration,
    /// Random extra delay as a fraction of the computed delay.
    pub jitter_factor: f64,
    /// Growth factor per attempt.
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter_factor: 0.25,
            multiplier: 2.0,
        }
    }
}

/// Computes reconnect delays.
#[derive(Debug, Clone)]
pub struct BackoffStrategy {
    config: BackoffConfig,
}

impl BackoffStrategy {
    /// Strategy from a config.
    pub fn new(config: BackoffConfig) -> Self {
        Self { config }
    }

    /// Delay for zero-based `attempt`, jitter included.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let capped = self.base_delay_ms(attempt);
        let jitter = if self.config.jitter_factor > 0.0 {
            rand::rng().random::<f64>() * capped * self.config.jitter_factor
        } else {
            0.0
        };
        Duration::from_millis((capped + jitter) as u64)
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    fn base_delay_ms(&self, attempt: u32) -> f64 {
        let base = self.config.base_delay.as_millis() as f64;
        let max = self.config.max_delay.as_millis() as f64;
        (base * self.config.multiplier.powi(attempt.min(64) as i32)).min(max)
    }
}

/// Default cap on stored subscriptions.
pub const DEFAULT_MAX_SUBSCRIPTIONS: usize = 100;

/// Connection settings.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Endpoint URL.
    pub url: String,
    /// Connect timeout in milliseconds.
    pub connect_timeout: u64,
    /// Keep-alive interval in milliseconds; 0 disables pings.
    pub ping_interval: u64,
    /// Close the connection when no pong arrived for this long (ms).
    pub pong_timeout: u64,
    /// Reconnect attempts before giving up.
    pub max_reconnect_attempts: u32,
    /// Reconnect automatically after a drop.
    pub auto_reconnect: bool,
    /// Reconnect delays.
    pub backoff_config: BackoffConfig,
    /// Subscription cap.
    pub max_subscriptions: usize,
    /// Time allowed for a graceful close (ms).
    pub shutdown_timeout: u64,
    /// Text frame used as an application ping instead of a protocol
    /// ping, e.g. `"ping"`. A text `"pong"` reply counts as a pong.
    pub app_ping: Option<String>,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            connect_timeout: 10_000,
            ping_interval: 30_000,
            pong_timeout: 90_000,
            max_reconnect_attempts: 5,
            auto_reconnect: true,
            backoff_config: BackoffConfig::default(),
            max_subscriptions: DEFAULT_MAX_SUBSCRIPTIONS,
            shutdown_timeout: 5_000,
            app_ping: None,
        }
    }
}

impl WsConfig {
    /// Default settings for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}
