use crate::error::{Error, Result};
use crate::rate_limiter::RateLimiter;
use crate::retry_strategy::RetryStrategy;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::config::HttpConfig;

/// Maps `(status, body)` to a vendor error, or `None` to fall through to
/// the generic status mapping. Runs for every response, successful or not.
pub type ErrorHook = Arc<dyn Fn(u16, &Value) -> Option<Error> + Send + Sync>;

/// HTTP client with retry, throttling and vendor error mapping.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpConfig,
    rate_limiter: Option<RateLimiter>,
    retry_strategy: RetryStrategy,
    error_hook: Option<ErrorHook>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("rate_limiter", &self.rate_limiter.is_some())
            .field("error_hook", &self.error_hook.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Invalid configuration, an unparsable proxy URL, or a TLS backend
    /// that fails to initialise.
    pub fn new(config: HttpConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .user_agent(&config.user_agent);

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| Error::network(format!("Invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            retry_strategy: RetryStrategy::new(config.retry_config.clone()),
            client,
            config,
            rate_limiter: None,
            error_hook: None,
        })
    }

    /// Installs a throttle.
    pub fn set_rate_limiter(&mut self, rate_limiter: RateLimiter) {
        self.rate_limiter = Some(rate_limiter);
    }

    /// Replaces the retry policy.
    pub fn set_retry_strategy(&mut self, strategy: RetryStrategy) {
        self.retry_strategy = strategy;
    }

    /// Installs the vendor error mapper.
    pub fn set_error_hook(&mut self, hook: ErrorHook) {
        self.error_hook = Some(hook);
    }

    /// Current configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.rate_limiter.as_ref()
    }

    pub(crate) fn retry_strategy(&self) -> &RetryStrategy {
        &self.retry_strategy
    }

    pub(crate) fn error_hook(&self) -> Option<&ErrorHook> {
        self.error_hook.as_ref()
    }
}
