//! CoinSpot exchange implementation.
//!
//! CoinSpot has no market listing endpoint, so the AUD markets are a fixed
//! table. Public prices come from `pubapi/latest`; everything else is a
//! signed JSON `POST` under `api/`.

use coinbridge_core::types::Market;
use coinbridge_core::{BaseExchange, ExchangeConfig, Result};
use std::sync::Arc;

pub mod auth;
mod exchange_impl;
pub mod parser;
mod rest;

pub use auth::CoinspotAuth;

/// Public API base.
pub const PUBLIC_URL: &str = "https://www.coinspot.com.au/pubapi";

/// Private API base.
pub const PRIVATE_URL: &str = "https://www.coinspot.com.au/api";

/// Base currencies quoted in AUD.
const BASES: [&str; 14] = [
    "ADA", "BTC", "ETH", "XRP", "LTC", "DOGE", "RFOX", "POWR", "NEO", "TRX", "EOS", "XLM", "RHOC",
    "GAS",
];

/// CoinSpot exchange structure.
#[derive(Debug)]
pub struct Coinspot {
    base: BaseExchange,
}

impl Coinspot {
    /// Creates a new instance. The `public` and `private` url overrides
    /// replace the two API bases.
    ///
    /// ```rust
    /// use coinbridge_core::ExchangeConfig;
    /// use coinbridge_exchanges::coinspot::Coinspot;
    ///
    /// let exchange = Coinspot::new(ExchangeConfig::default()).unwrap();
    /// assert_eq!(exchange.base().safe_currency_code("drk"), "DASH");
    /// ```
    pub fn new(config: ExchangeConfig) -> Result<Self> {
        let mut base = BaseExchange::new(config)?.with_common_currencies([("DRK", "DASH")]);
        base.http_client
            .set_error_hook(Arc::new(|_status, body| rest::check_response(body)));
        Ok(Self { base })
    }

    /// Returns a reference to the base exchange.
    pub fn base(&self) -> &BaseExchange {
        &self.base
    }

    /// Public API base in use.
    pub fn public_url(&self) -> String {
        self.base.url("public", PUBLIC_URL)
    }

    /// Private API base in use.
    pub fn private_url(&self) -> String {
        self.base.url("private", PRIVATE_URL)
    }

    /// Returns the exchange ID.
    pub fn id(&self) -> &str {
        "coinspot"
    }

    /// Returns the exchange name.
    pub fn name(&self) -> &str {
        "CoinSpot"
    }

    /// Market for a unified symbol. Markets must be loaded.
    pub fn market(&self, symbol: &str) -> Result<Arc<Market>> {
        self.base.market(symbol)
    }

    /// The fixed market table.
    pub fn static_markets() -> Vec<Market> {
        BASES
            .iter()
            .map(|base| Market::new_spot(base.to_lowercase(), *base, "AUD"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_markets() {
        let markets = Coinspot::static_markets();
        assert_eq!(markets.len(), 14);
        let btc = markets.iter().find(|m| m.symbol == "BTC/AUD").unwrap();
        assert_eq!(btc.id, "btc");
        assert_eq!(btc.base_id, "btc");
        assert_eq!(btc.quote_id, "aud");
        assert!(markets.iter().all(|m| m.quote == "AUD" && m.is_spot()));
    }

    #[test]
    fn test_url_overrides() {
        let config = ExchangeConfig::builder()
            .url_override("public", "http://127.0.0.1:9000/pubapi/")
            .build();
        let exchange = Coinspot::new(config).unwrap();
        assert_eq!(exchange.public_url(), "http://127.0.0.1:9000/pubapi");
        assert_eq!(exchange.private_url(), PRIVATE_URL);
    }
}
