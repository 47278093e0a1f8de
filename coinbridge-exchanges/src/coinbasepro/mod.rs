//! Coinbase Pro exchange implementation.
//!
//! Markets come from the public `/products` endpoint; the stream side
//! maintains level2 order books from the `snapshot`/`l2update` feed.

use coinbridge_core::types::Market;
use coinbridge_core::{BaseExchange, ExchangeConfig, Result};
use std::sync::Arc;

mod exchange_impl;
pub mod parser;
mod rest;
pub mod ws;
mod ws_exchange_impl;

pub use ws::{CoinbaseProWs, CoinbaseProWsState};

/// Production REST endpoint.
pub const REST_URL: &str = "https://api.pro.coinbase.com";

/// Production stream endpoint.
pub const WS_URL: &str = "wss://ws-feed.pro.coinbase.com";

/// Coinbase Pro exchange structure.
#[derive(Debug)]
pub struct CoinbasePro {
    base: BaseExchange,
    ws: CoinbaseProWs,
}

impl CoinbasePro {
    /// Creates a new instance. Endpoints can be replaced with the `rest`
    /// and `ws` url overrides.
    ///
    /// ```rust
    /// use coinbridge_core::ExchangeConfig;
    /// use coinbridge_exchanges::coinbasepro::CoinbasePro;
    ///
    /// let exchange = CoinbasePro::new(ExchangeConfig::default()).unwrap();
    /// assert_eq!(exchange.id(), "coinbasepro");
    /// ```
    pub fn new(config: ExchangeConfig) -> Result<Self> {
        let base = BaseExchange::new(config)?;
        let state = CoinbaseProWsState::new(
            Arc::clone(&base.market_cache),
            base.common_currencies.clone(),
        );
        let ws = CoinbaseProWs::new(base.url("ws", WS_URL), state);
        Ok(Self { base, ws })
    }

    /// Returns a reference to the base exchange.
    pub fn base(&self) -> &BaseExchange {
        &self.base
    }

    /// Stream connection.
    pub fn ws(&self) -> &CoinbaseProWs {
        &self.ws
    }

    /// REST base URL in use.
    pub fn rest_url(&self) -> String {
        self.base.url("rest", REST_URL)
    }

    /// Returns the exchange ID.
    pub fn id(&self) -> &str {
        "coinbasepro"
    }

    /// Returns the exchange name.
    pub fn name(&self) -> &str {
        "Coinbase Pro"
    }

    /// Market for a unified symbol. Markets must be loaded.
    pub fn market(&self, symbol: &str) -> Result<Arc<Market>> {
        self.base.market(symbol)
    }
}
