//! Bitget exchange builder.
//!
//! Fluent construction of [`Bitget`] instances: credentials, transport
//! settings and the stream cache options.

use super::{Bitget, BitgetOptions};
use coinbridge_core::retry_strategy::RetryConfig;
use coinbridge_core::{ExchangeConfig, Result, SecretString};
use serde_json::Value;
use std::time::Duration;

/// Builder for creating Bitget exchange instances.
///
/// # Example
///
/// ```no_run
/// use coinbridge_exchanges::bitget::BitgetBuilder;
/// use std::time::Duration;
///
/// let bitget = BitgetBuilder::new()
///     .api_key("your-api-key")
///     .secret("your-secret")
///     .passphrase("your-passphrase")
///     .timeout(Duration::from_secs(30))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct BitgetBuilder {
    /// Exchange configuration
    config: ExchangeConfig,
    /// Bitget-specific options
    options: BitgetOptions,
}

impl Default for BitgetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BitgetBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: ExchangeConfig {
                id: "bitget".to_string(),
                name: "Bitget".to_string(),
                rate_limit: Duration::from_millis(50),
                ..Default::default()
            },
            options: BitgetOptions::default(),
        }
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(SecretString::new(key));
        self
    }

    /// Sets the API secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.config.secret = Some(SecretString::new(secret));
        self
    }

    /// Sets the passphrase. Bitget requires it for every private call and
    /// for the stream login.
    pub fn passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.config.password = Some(SecretString::new(passphrase));
        self
    }

    /// Default product type: `spot`, `umcbl` or `dmcbl`.
    pub fn product_type(mut self, product_type: impl Into<String>) -> Self {
        self.options.product_type = product_type.into();
        self
    }

    /// Sets the total request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the retry policy for transient HTTP failures.
    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.config.retry_config = Some(retry);
        self
    }

    /// Sets the receive window in milliseconds.
    pub fn recv_window(mut self, millis: u64) -> Self {
        self.options.recv_window = millis;
        self
    }

    /// Enables or disables the request throttle.
    pub fn enable_rate_limit(mut self, enabled: bool) -> Self {
        self.config.enable_rate_limit = enabled;
        self
    }

    /// Routes HTTP traffic through `url`.
    pub fn proxy_url(mut self, url: impl Into<String>) -> Self {
        self.config.proxy = Some(url.into());
        self
    }

    /// Logs request bodies.
    pub fn verbose(mut self, enabled: bool) -> Self {
        self.config.verbose = enabled;
        self
    }

    /// Capacity of each public trade cache.
    pub fn trades_limit(mut self, limit: usize) -> Self {
        self.options.trades_limit = limit;
        self
    }

    /// Capacity of each candle cache.
    pub fn ohlcv_limit(mut self, limit: usize) -> Self {
        self.options.ohlcv_limit = limit;
        self
    }

    /// Capacity of the order caches.
    pub fn orders_limit(mut self, limit: usize) -> Self {
        self.options.orders_limit = limit;
        self
    }

    /// Turns order book checksum verification on or off.
    pub fn checksum(mut self, enabled: bool) -> Self {
        self.options.checksum = enabled;
        self
    }

    /// Routes contract streams to demo trading.
    pub fn sandbox(mut self, enabled: bool) -> Self {
        self.config.sandbox = enabled;
        self
    }

    /// Replaces the endpoint for `key` (`rest` or `ws`).
    pub fn url_override(mut self, key: impl Into<String>, url: impl Into<String>) -> Self {
        self.config.url_overrides.insert(key.into(), url.into());
        self
    }

    /// Sets a free-form option.
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.options.insert(key.into(), value);
        self
    }

    /// Returns the current configuration.
    pub fn get_config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Returns the current options.
    pub fn get_options(&self) -> &BitgetOptions {
        &self.options
    }

    /// Builds the exchange.
    pub fn build(self) -> Result<Bitget> {
        Bitget::new_with_options(self.config, self.options)
    }
}
