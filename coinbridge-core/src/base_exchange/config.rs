//! Exchange configuration and its builder.

use crate::credentials::SecretString;
use crate::retry_strategy::RetryConfig;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Settings shared by every adapter.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Exchange identifier, e.g. `bitget`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// API key.
    pub api_key: Option<SecretString>,
    /// API secret.
    pub secret: Option<SecretString>,
    /// Passphrase, required by some venues.
    pub password: Option<SecretString>,
    /// User id, required by some venues.
    pub uid: Option<String>,
    /// Throttle outgoing requests.
    pub enable_rate_limit: bool,
    /// Minimum spacing between requests.
    pub rate_limit: Duration,
    /// Total request timeout.
    pub timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Retry policy; `None` keeps the HTTP client default.
    pub retry_config: Option<RetryConfig>,
    /// Use testnet endpoints where the venue has them.
    pub sandbox: bool,
    /// Custom `User-Agent`.
    pub user_agent: Option<String>,
    /// Proxy URL.
    pub proxy: Option<String>,
    /// Log request and response bodies.
    pub verbose: bool,
    /// Adapter specific options.
    pub options: HashMap<String, Value>,
    /// Endpoint overrides keyed by API group (`public`, `private`, `ws`).
    pub url_overrides: HashMap<String, String>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            api_key: None,
            secret: None,
            password: None,
            uid: None,
            enable_rate_limit: true,
            rate_limit: Duration::from_millis(100),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            retry_config: None,
            sandbox: false,
            user_agent: None,
            proxy: None,
            verbose: false,
            options: HashMap::new(),
            url_overrides: HashMap::new(),
        }
    }
}

impl ExchangeConfig {
    /// Starts a builder.
    ///
    /// ```rust
    /// use coinbridge_core::base_exchange::ExchangeConfig;
    ///
    /// let config = ExchangeConfig::builder()
    ///     .id("bitget")
    ///     .api_key("key")
    ///     .secret("secret")
    ///     .password("passphrase")
    ///     .build();
    /// assert!(config.password.is_some());
    /// ```
    pub fn builder() -> ExchangeConfigBuilder {
        ExchangeConfigBuilder::default()
    }

    /// Override for `key`, if any.
    pub fn url_override(&self, key: &str) -> Option<&str> {
        self.url_overrides.get(key).map(String::as_str)
    }
}

/// Fluent builder for [`ExchangeConfig`].
#[derive(Debug, Clone, Default)]
pub struct ExchangeConfigBuilder {
    config: ExchangeConfig,
}

impl ExchangeConfigBuilder {
    /// Builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the exchange id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.config.id = id.into();
        self
    }

    /// Sets the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
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

    /// Sets the passphrase.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(SecretString::new(password));
        self
    }

    /// Sets the user id.
    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.config.uid = Some(uid.into());
        self
    }

    /// Turns request throttling on or off.
    pub fn enable_rate_limit(mut self, enabled: bool) -> Self {
        self.config.enable_rate_limit = enabled;
        self
    }

    /// Sets the minimum spacing between requests.
    pub fn rate_limit(mut self, interval: Duration) -> Self {
        self.config.rate_limit = interval;
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the TCP connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the retry policy.
    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.config.retry_config = Some(retry);
        self
    }

    /// Switches to testnet endpoints.
    pub fn sandbox(mut self, enabled: bool) -> Self {
        self.config.sandbox = enabled;
        self
    }

    /// Sets the `User-Agent`.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Routes HTTP traffic through `url`.
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.config.proxy = Some(url.into());
        self
    }

    /// Turns verbose logging on or off.
    pub fn verbose(mut self, enabled: bool) -> Self {
        self.config.verbose = enabled;
        self
    }

    /// Sets one adapter option.
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.options.insert(key.into(), value);
        self
    }

    /// Merges adapter options.
    pub fn options(mut self, options: HashMap<String, Value>) -> Self {
        self.config.options.extend(options);
        self
    }

    /// Points API group `key` at `url`. Tests use this to target a mock server.
    pub fn url_override(mut self, key: impl Into<String>, url: impl Into<String>) -> Self {
        self.config.url_overrides.insert(key.into(), url.into());
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> ExchangeConfig {
        self.config
    }
}
