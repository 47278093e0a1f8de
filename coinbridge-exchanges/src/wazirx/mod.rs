//! WazirX exchange implementation.
//!
//! A Binance-style REST API under `/sapi/v1`. Private calls carry their
//! parameters in the query string, signed with HMAC-SHA256; see
//! [`WazirxAuth`].

use coinbridge_core::types::{Market, Timeframe};
use coinbridge_core::{BaseExchange, ExchangeConfig, Result};
use std::sync::Arc;

pub mod auth;
pub mod error;
mod exchange_impl;
pub mod parser;
mod rest;

pub use auth::WazirxAuth;
pub use error::WazirxErrorCode;

/// Production REST endpoint.
pub const REST_URL: &str = "https://api.wazirx.com/sapi/v1";

/// Default `recvWindow` in milliseconds.
pub const DEFAULT_RECV_WINDOW: u64 = 10_000;

/// WazirX exchange structure.
#[derive(Debug)]
pub struct Wazirx {
    base: BaseExchange,
}

impl Wazirx {
    /// Creates a new instance.
    ///
    /// The `rest` url override replaces the API base and the
    /// `recvWindow` option the receive window.
    ///
    /// ```rust
    /// use coinbridge_core::ExchangeConfig;
    /// use coinbridge_exchanges::wazirx::Wazirx;
    /// use serde_json::json;
    ///
    /// let config = ExchangeConfig::builder().option("recvWindow", json!(5000)).build();
    /// let exchange = Wazirx::new(config).unwrap();
    /// assert_eq!(exchange.recv_window(), 5000);
    /// ```
    pub fn new(config: ExchangeConfig) -> Result<Self> {
        let mut base = BaseExchange::new(config)?;
        base.http_client
            .set_error_hook(Arc::new(|_status, body| error::check_response(body)));
        Ok(Self { base })
    }

    /// Returns a reference to the base exchange.
    pub fn base(&self) -> &BaseExchange {
        &self.base
    }

    /// REST base URL in use.
    pub fn rest_url(&self) -> String {
        self.base.url("rest", REST_URL)
    }

    /// Receive window for signed requests.
    pub fn recv_window(&self) -> u64 {
        self.base
            .config
            .options
            .get("recvWindow")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_RECV_WINDOW)
    }

    /// Returns the exchange ID.
    pub fn id(&self) -> &str {
        "wazirx"
    }

    /// Returns the exchange name.
    pub fn name(&self) -> &str {
        "WazirX"
    }

    /// Market for a unified symbol. Markets must be loaded.
    pub fn market(&self, symbol: &str) -> Result<Arc<Market>> {
        self.base.market(symbol)
    }

    /// Kline `interval` parameter.
    pub fn interval(timeframe: Timeframe) -> Option<&'static str> {
        Some(match timeframe {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::H6 => "6h",
            Timeframe::H12 => "12h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
            _ => return None,
        })
    }
}
