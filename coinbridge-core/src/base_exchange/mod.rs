//! Shared adapter plumbing.
//!
//! Every adapter owns a [`BaseExchange`]: its config, an [`HttpClient`]
//! built from that config, the loaded markets and a currency alias table.

mod config;
mod market_cache;

pub use config::{ExchangeConfig, ExchangeConfigBuilder};
pub use market_cache::MarketCache;

use crate::credentials::SecretString;
use crate::error::{Error, Result};
use crate::http_client::{HttpClient, HttpConfig};
use crate::rate_limiter::RateLimiter;
use crate::types::Market;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Currency aliases applied by every adapter.
const COMMON_CURRENCIES: [(&str, &str); 3] = [("XBT", "BTC"), ("BCC", "BCH"), ("BCHSV", "BSV")];

/// Markets keyed by unified symbol.
pub type MarketMap = Arc<HashMap<String, Arc<Market>>>;

/// Config, transport and market state shared by adapters.
#[derive(Debug)]
pub struct BaseExchange {
    /// Exchange configuration.
    pub config: ExchangeConfig,
    /// HTTP transport.
    pub http_client: HttpClient,
    /// Loaded markets.
    pub market_cache: Arc<RwLock<MarketCache>>,
    market_loading_lock: Mutex<()>,
    /// Exchange currency id to unified code.
    pub common_currencies: HashMap<String, String>,
}

impl BaseExchange {
    /// Builds the HTTP client from `config`.
    pub fn new(config: ExchangeConfig) -> Result<Self> {
        info!(exchange = %config.id, "Initializing exchange");

        if config.timeout.is_zero() {
            return Err(Error::invalid_request("timeout cannot be zero"));
        }
        if config.timeout > Duration::from_secs(300) {
            warn!(
                timeout_secs = config.timeout.as_secs(),
                "Request timeout exceeds 5 minutes"
            );
        }

        let defaults = HttpConfig::default();
        let http_config = HttpConfig {
            timeout: config.timeout,
            connect_timeout: config.connect_timeout,
            verbose: config.verbose,
            user_agent: config.user_agent.clone().unwrap_or(defaults.user_agent),
            proxy: config.proxy.clone(),
            enable_rate_limit: config.enable_rate_limit,
            retry_config: config.retry_config.clone().unwrap_or(defaults.retry_config),
            ..HttpConfig::default()
        };
        let mut http_client = HttpClient::new(http_config)?;
        if config.enable_rate_limit {
            http_client.set_rate_limiter(RateLimiter::from_interval(config.rate_limit));
        }

        Ok(Self {
            config,
            http_client,
            market_cache: Arc::new(RwLock::new(MarketCache::default())),
            market_loading_lock: Mutex::new(()),
            common_currencies: COMMON_CURRENCIES
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        })
    }

    /// Adds adapter specific currency aliases.
    pub fn with_common_currencies<'a>(
        mut self,
        aliases: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        self.common_currencies.extend(
            aliases
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        self
    }

    fn cache(&self) -> RwLockReadGuard<'_, MarketCache> {
        self.market_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn cache_mut(&self) -> RwLockWriteGuard<'_, MarketCache> {
        self.market_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads markets through `loader` unless already loaded. Concurrent
    /// callers wait for the first load instead of issuing their own.
    pub async fn load_markets_with<F, Fut>(&self, reload: bool, loader: F) -> Result<MarketMap>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Market>>>,
    {
        let _loading = self.market_loading_lock.lock().await;
        {
            let cache = self.cache();
            if cache.is_loaded() && !reload {
                debug!(
                    exchange = %self.config.id,
                    markets = cache.market_count(),
                    "Returning cached markets"
                );
                return Ok(cache.markets());
            }
        }

        info!(exchange = %self.config.id, reload, "Loading markets");
        let markets = loader().await?;
        Ok(self.set_markets(markets))
    }

    /// Replaces the loaded markets.
    pub fn set_markets(&self, markets: Vec<Market>) -> MarketMap {
        let loaded = self.cache_mut().set_markets(markets);
        info!(exchange = %self.config.id, markets = loaded.len(), "Markets loaded");
        loaded
    }

    /// Whether markets are loaded.
    pub fn markets_loaded(&self) -> bool {
        self.cache().is_loaded()
    }

    /// All markets keyed by symbol.
    pub fn markets(&self) -> MarketMap {
        self.cache().markets()
    }

    /// Sorted unified symbols.
    pub fn symbols(&self) -> Vec<String> {
        self.cache().symbols().to_vec()
    }

    /// Market for a unified symbol.
    pub fn market(&self, symbol: &str) -> Result<Arc<Market>> {
        let cache = self.cache();
        if !cache.is_loaded() {
            return Err(Error::exchange(
                "-1",
                "Markets not loaded. Call load_markets() first.",
            ));
        }
        cache
            .get_market(symbol)
            .ok_or_else(|| Error::bad_symbol(format!("{} does not have market symbol {symbol}", self.config.id)))
    }

    /// Market for an exchange id.
    pub fn market_by_id(&self, id: &str) -> Result<Arc<Market>> {
        self.cache()
            .get_market_by_id(id)
            .ok_or_else(|| Error::bad_symbol(format!("Market with id {id} not found")))
    }

    /// Market for `id`, or a synthetic spot market when the id is unknown.
    /// With a `delimiter`, an unknown id such as `ETH-BTC` is split into
    /// base and quote; without one the symbol is the id itself.
    pub fn safe_market(&self, id: Option<&str>, delimiter: Option<&str>) -> Arc<Market> {
        let Some(id) = id else {
            return Arc::new(Market::default());
        };
        if let Some(market) = self.cache().get_market_by_id(id) {
            return market;
        }
        if let Some((base_id, quote_id)) = delimiter.and_then(|d| id.split_once(d)) {
            let base = self.safe_currency_code(base_id);
            let quote = self.safe_currency_code(quote_id);
            let mut market = Market::new_spot(id, base, quote);
            market.base_id = base_id.to_string();
            market.quote_id = quote_id.to_string();
            return Arc::new(market);
        }
        Arc::new(Market {
            id: id.to_string(),
            symbol: id.to_string(),
            ..Market::default()
        })
    }

    /// Symbol for `id`, falling back like [`safe_market`](Self::safe_market).
    pub fn safe_symbol(&self, id: Option<&str>, delimiter: Option<&str>) -> String {
        self.safe_market(id, delimiter).symbol.clone()
    }

    /// Unified currency code for an exchange currency id.
    pub fn safe_currency_code(&self, currency_id: &str) -> String {
        let upper = currency_id.to_uppercase();
        self.common_currencies.get(&upper).cloned().unwrap_or(upper)
    }

    /// Fails unless api key and secret are set. With `password_required`
    /// the passphrase is checked too.
    pub fn check_required_credentials(&self, password_required: bool) -> Result<()> {
        if self.config.api_key.is_none() {
            return Err(Error::authentication(format!(
                "{} requires \"apiKey\" credential",
                self.config.id
            )));
        }
        if self.config.secret.is_none() {
            return Err(Error::authentication(format!(
                "{} requires \"secret\" credential",
                self.config.id
            )));
        }
        if password_required && self.config.password.is_none() {
            return Err(Error::authentication(format!(
                "{} requires \"password\" credential",
                self.config.id
            )));
        }
        Ok(())
    }

    /// Api key and secret, after [`check_required_credentials`](Self::check_required_credentials).
    pub fn credentials(&self) -> Result<(&SecretString, &SecretString)> {
        self.check_required_credentials(false)?;
        match (&self.config.api_key, &self.config.secret) {
            (Some(key), Some(secret)) => Ok((key, secret)),
            _ => Err(Error::authentication("missing credentials")),
        }
    }

    /// Millisecond nonce.
    pub fn nonce(&self) -> i64 {
        crate::time::milliseconds()
    }

    /// Base URL for API group `key`, honouring overrides.
    pub fn url(&self, key: &str, default: &str) -> String {
        self.config
            .url_override(key)
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    /// Option value as a string.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.config.options.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn base() -> BaseExchange {
        BaseExchange::new(ExchangeConfig::builder().id("test").build()).unwrap()
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ExchangeConfig::builder().timeout(Duration::ZERO).build();
        assert!(BaseExchange::new(config).is_err());
    }

    #[test]
    fn test_market_lookup() {
        let exchange = base();
        assert!(exchange.market("BTC/USDT").is_err());
        exchange.set_markets(vec![Market::new_spot("BTCUSDT", "BTC", "USDT")]);
        assert_eq!(exchange.market("BTC/USDT").unwrap().id, "BTCUSDT");
        assert_eq!(exchange.market_by_id("BTCUSDT").unwrap().symbol, "BTC/USDT");
        assert!(matches!(
            exchange.market("ETH/USDT"),
            Err(Error::MarketNotFound(_))
        ));
        assert_eq!(exchange.symbols(), vec!["BTC/USDT".to_string()]);
    }

    #[test]
    fn test_safe_market_fallbacks() {
        let exchange = base();
        exchange.set_markets(vec![Market::new_spot("BTCUSDT", "BTC", "USDT")]);
        assert_eq!(exchange.safe_symbol(Some("BTCUSDT"), None), "BTC/USDT");
        assert_eq!(exchange.safe_symbol(Some("xbt-eur"), Some("-")), "BTC/EUR");
        assert_eq!(exchange.safe_symbol(Some("FOOBAR"), None), "FOOBAR");
        assert_eq!(exchange.safe_market(Some("eth-btc"), Some("-")).base_id, "eth");
    }

    #[test]
    fn test_safe_currency_code() {
        let exchange = base().with_common_currencies([("DRK", "DASH")]);
        assert_eq!(exchange.safe_currency_code("xbt"), "BTC");
        assert_eq!(exchange.safe_currency_code("drk"), "DASH");
        assert_eq!(exchange.safe_currency_code("eth"), "ETH");
    }

    #[test]
    fn test_check_required_credentials() {
        let exchange = base();
        assert!(exchange.check_required_credentials(false).unwrap_err().as_authentication().is_some());

        let config = ExchangeConfig::builder().api_key("k").secret("s").build();
        let exchange = BaseExchange::new(config).unwrap();
        assert!(exchange.check_required_credentials(false).is_ok());
        assert!(exchange.check_required_credentials(true).is_err());
    }

    #[test]
    fn test_url_override() {
        let config = ExchangeConfig::builder()
            .url_override("public", "http://127.0.0.1:9000/")
            .build();
        let exchange = BaseExchange::new(config).unwrap();
        assert_eq!(exchange.url("public", "https://api.example.com"), "http://127.0.0.1:9000");
        assert_eq!(exchange.url("private", "https://api.example.com"), "https://api.example.com");
    }

    #[tokio::test]
    async fn test_load_markets_single_flight() {
        let exchange = Arc::new(base());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let exchange = Arc::clone(&exchange);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                exchange
                    .load_markets_with(false, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(vec![Market::new_spot("BTCUSDT", "BTC", "USDT")])
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        exchange
            .load_markets_with(true, || async { Ok(Vec::new()) })
            .await
            .unwrap();
        assert!(exchange.markets().is_empty());
    }
}
