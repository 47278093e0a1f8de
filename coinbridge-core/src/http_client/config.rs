use crate::retry_strategy::RetryConfig;
use std::time::Duration;

/// Transport settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Total time for a request including retries.
    pub timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Logs request bodies at debug level.
    pub verbose: bool,
    /// `User-Agent` header.
    pub user_agent: String,
    /// Optional proxy URL.
    pub proxy: Option<String>,
    /// Applies the rate limiter when one is installed.
    pub enable_rate_limit: bool,
    /// Retry policy.
    pub retry_config: RetryConfig,
    /// Largest accepted response body in bytes.
    pub max_response_size: usize,
    /// Largest request body in bytes.
    pub max_request_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            verbose: false,
            user_agent: concat!("coinbridge/", env!("CARGO_PKG_VERSION")).to_string(),
            proxy: None,
            enable_rate_limit: true,
            retry_config: RetryConfig::default(),
            max_response_size: 10 * 1024 * 1024,
            max_request_size: 10 * 1024 * 1024,
        }
    }
}

impl HttpConfig {
    /// Rejects settings that cannot work.
    pub fn validate(&self) -> crate::Result<()> {
        if self.timeout.is_zero() {
            return Err(crate::Error::invalid_request("timeout must be positive"));
        }
        if self.max_request_size == 0 || self.max_response_size == 0 {
            return Err(crate::Error::invalid_request("size limits must be positive"));
        }
        Ok(())
    }
}
