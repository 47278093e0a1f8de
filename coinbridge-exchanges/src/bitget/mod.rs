//! Bitget exchange implementation.
//!
//! REST market data, trading and account calls go through the v2 API. Streams
//! use the v1 WebSocket endpoint (`wss://ws.bitget.com/spot/v1/stream`), which
//! still addresses markets with the legacy `_SPBL`/`_UMCBL` ids; see
//! [`ws::ws_market_id`] and [`ws::market_id_from_arg`] for the mapping.

use coinbridge_core::types::{Market, Timeframe};
use coinbridge_core::{BaseExchange, ExchangeConfig, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod auth;
pub mod builder;
pub mod error;
mod exchange_impl;
pub mod parser;
pub mod rest;
pub mod ws;
mod ws_exchange_impl;

pub use auth::BitgetAuth;
pub use builder::BitgetBuilder;
pub use error::{BitgetErrorCode, is_error_response, parse_error, parse_ws_error};
pub use ws::{BitgetWs, BitgetWsState};

/// Production REST endpoint.
pub const REST_URL: &str = "https://api.bitget.com";

/// Production stream endpoint.
pub const WS_URL: &str = "wss://ws.bitget.com/spot/v1/stream";

/// Bitget exchange structure.
#[derive(Debug)]
pub struct Bitget {
    /// Base exchange instance.
    base: BaseExchange,
    /// Bitget-specific options.
    options: BitgetOptions,
    /// Stream connection and message state.
    ws: BitgetWs,
}

/// Bitget-specific options.
///
/// # Example
///
/// ```rust
/// use coinbridge_exchanges::bitget::BitgetOptions;
///
/// let options = BitgetOptions {
///     trades_limit: 500,
///     ..Default::default()
/// };
/// assert!(options.checksum);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitgetOptions {
    /// Default product type: `spot`, `umcbl` (USDT-M) or `dmcbl` (coin-M).
    pub product_type: String,
    /// Receive window in milliseconds.
    pub recv_window: u64,
    /// Capacity of each public trade cache.
    pub trades_limit: usize,
    /// Capacity of each candle cache.
    pub ohlcv_limit: usize,
    /// Capacity of the order caches.
    pub orders_limit: usize,
    /// Verify the CRC32 of incremental book updates.
    pub checksum: bool,
    /// Demo trading: contract ids and private `instType`s carry an `S`.
    pub sandbox: bool,
}

impl Default for BitgetOptions {
    fn default() -> Self {
        Self {
            product_type: "spot".to_string(),
            recv_window: 5000,
            trades_limit: 1000,
            ohlcv_limit: 1000,
            orders_limit: 1000,
            checksum: true,
            sandbox: false,
        }
    }
}

impl BitgetOptions {
    /// Whether the default product type is a contract type.
    pub fn is_contract_default(&self) -> bool {
        !self.product_type.eq_ignore_ascii_case("spot")
    }

    /// `instType` of private USDT-M contract channels.
    pub fn contract_inst_type(&self) -> &'static str {
        if self.sandbox { "SUMCBL" } else { "UMCBL" }
    }
}

/// Bitget endpoints after overrides.
#[derive(Debug, Clone)]
pub struct BitgetUrls {
    /// REST base URL.
    pub rest: String,
    /// WebSocket URL.
    pub ws: String,
}

impl Bitget {
    /// Creates a new Bitget instance using the builder pattern.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use coinbridge_exchanges::bitget::Bitget;
    ///
    /// let bitget = Bitget::builder()
    ///     .api_key("your-api-key")
    ///     .secret("your-secret")
    ///     .passphrase("your-passphrase")
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn builder() -> BitgetBuilder {
        BitgetBuilder::new()
    }

    /// Creates a new Bitget instance with default options.
    pub fn new(config: ExchangeConfig) -> Result<Self> {
        Self::new_with_options(config, BitgetOptions::default())
    }

    /// Creates a new Bitget instance with custom options.
    pub fn new_with_options(config: ExchangeConfig, mut options: BitgetOptions) -> Result<Self> {
        options.sandbox |= config.sandbox;
        let mut base = BaseExchange::new(config)?;
        base.http_client
            .set_error_hook(Arc::new(|_status, body| error::check_response(body)));
        let urls = Self::resolve_urls(&base);
        let state = BitgetWsState::new(
            Arc::clone(&base.market_cache),
            base.common_currencies.clone(),
            options.clone(),
        );
        let ws = BitgetWs::new(urls.ws, state);
        Ok(Self { base, options, ws })
    }

    fn resolve_urls(base: &BaseExchange) -> BitgetUrls {
        BitgetUrls {
            rest: base.url("rest", REST_URL),
            ws: base.url("ws", WS_URL),
        }
    }

    /// Returns a reference to the base exchange.
    pub fn base(&self) -> &BaseExchange {
        &self.base
    }

    /// Returns the Bitget options.
    pub fn options(&self) -> &BitgetOptions {
        &self.options
    }

    /// Stream connection.
    pub fn ws(&self) -> &BitgetWs {
        &self.ws
    }

    /// Endpoints in use.
    pub fn urls(&self) -> BitgetUrls {
        Self::resolve_urls(&self.base)
    }

    /// Returns the exchange ID.
    pub fn id(&self) -> &str {
        "bitget"
    }

    /// Returns the exchange name.
    pub fn name(&self) -> &str {
        "Bitget"
    }

    /// Market for a unified symbol. Markets must be loaded.
    pub fn market(&self, symbol: &str) -> Result<Arc<Market>> {
        self.base.market(symbol)
    }

    /// Granularity parameter for REST candles.
    pub fn rest_timeframe(timeframe: Timeframe) -> Option<&'static str> {
        Some(match timeframe {
            Timeframe::M1 => "1min",
            Timeframe::M3 => "3min",
            Timeframe::M5 => "5min",
            Timeframe::M15 => "15min",
            Timeframe::M30 => "30min",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::H6 => "6h",
            Timeframe::H12 => "12h",
            Timeframe::D1 => "1day",
            Timeframe::W1 => "1week",
            Timeframe::Mon1 => "1M",
            Timeframe::H2 => return None,
        })
    }

    /// Candle channel suffix on the stream.
    pub fn ws_timeframe(timeframe: Timeframe) -> Option<&'static str> {
        Some(match timeframe {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1H",
            Timeframe::H4 => "4H",
            Timeframe::H6 => "6H",
            Timeframe::H12 => "12H",
            Timeframe::D1 => "1D",
            Timeframe::W1 => "1W",
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitget_creation() {
        let bitget = Bitget::new(ExchangeConfig::builder().id("bitget").build()).unwrap();
        assert_eq!(bitget.id(), "bitget");
        assert_eq!(bitget.name(), "Bitget");
        assert_eq!(bitget.urls().rest, REST_URL);
        assert_eq!(bitget.urls().ws, WS_URL);
    }

    #[test]
    fn test_default_options() {
        let options = BitgetOptions::default();
        assert_eq!(options.trades_limit, 1000);
        assert_eq!(options.ohlcv_limit, 1000);
        assert_eq!(options.orders_limit, 1000);
        assert!(options.checksum);
        assert!(!options.is_contract_default());
        assert!(!options.sandbox);
        assert_eq!(options.contract_inst_type(), "UMCBL");
    }

    #[test]
    fn test_sandbox_from_config() {
        let bitget = Bitget::new(ExchangeConfig::builder().sandbox(true).build()).unwrap();
        assert!(bitget.options().sandbox);
        assert!(bitget.ws().state().options().sandbox);
        assert_eq!(bitget.options().contract_inst_type(), "SUMCBL");
    }

    #[test]
    fn test_url_override() {
        let config = ExchangeConfig::builder()
            .id("bitget")
            .url_override("rest", "http://127.0.0.1:9000/")
            .build();
        let bitget = Bitget::new(config).unwrap();
        assert_eq!(bitget.urls().rest, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_timeframe_maps() {
        assert_eq!(Bitget::ws_timeframe(Timeframe::H4), Some("4H"));
        assert_eq!(Bitget::ws_timeframe(Timeframe::M1), Some("1m"));
        assert_eq!(Bitget::ws_timeframe(Timeframe::M3), None);
        assert_eq!(Bitget::rest_timeframe(Timeframe::D1), Some("1day"));
        assert_eq!(Bitget::rest_timeframe(Timeframe::H2), None);
    }
}
