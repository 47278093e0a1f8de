//! BitMart exchange implementation.
//!
//! Spot REST API. Every response is wrapped in a
//! `{message, code, trace, data}` envelope where `code` 1000 means
//! success. Private calls are signed with the api key, the secret and the
//! account memo (the `uid` credential); see [`BitmartAuth`].

use coinbridge_core::types::{Market, Timeframe};
use coinbridge_core::{BaseExchange, Error, ExchangeConfig, Result};
use rust_decimal::Decimal;
use std::sync::Arc;

pub mod auth;
pub mod error;
mod exchange_impl;
pub mod parser;
mod rest;

pub use auth::BitmartAuth;
pub use error::BitmartErrorCode;

/// Production REST endpoint.
pub const REST_URL: &str = "https://api-cloud.bitmart.com";

/// Taker and maker fee applied to every spot market.
pub const DEFAULT_FEE: Decimal = Decimal::from_parts(25, 0, 0, false, 4);

/// Default page size for `fetch_my_trades`.
pub const DEFAULT_MY_TRADES_LIMIT: u32 = 200;

/// Currency ids that collide with better known assets.
const COMMON_CURRENCIES: [(&str, &str); 8] = [
    ("$GM", "GOLDMINER"),
    ("$HERO", "Step Hero"),
    ("$PAC", "PAC"),
    ("BP", "BEYOND"),
    ("GDT", "Gorilla Diamond"),
    ("GLD", "Goldario"),
    ("MVP", "MVP Coin"),
    ("TRU", "Truebit"),
];

/// BitMart exchange structure.
#[derive(Debug)]
pub struct Bitmart {
    base: BaseExchange,
}

impl Bitmart {
    /// Creates a new instance.
    ///
    /// ```rust
    /// use coinbridge_core::ExchangeConfig;
    /// use coinbridge_exchanges::bitmart::Bitmart;
    ///
    /// let config = ExchangeConfig::builder().uid("my-memo").build();
    /// let exchange = Bitmart::new(config).unwrap();
    /// assert_eq!(exchange.rest_url(), "https://api-cloud.bitmart.com");
    /// ```
    pub fn new(config: ExchangeConfig) -> Result<Self> {
        let mut base = BaseExchange::new(config)?.with_common_currencies(COMMON_CURRENCIES);
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

    /// Returns the exchange ID.
    pub fn id(&self) -> &str {
        "bitmart"
    }

    /// Returns the exchange name.
    pub fn name(&self) -> &str {
        "BitMart"
    }

    /// Market for a unified symbol. Markets must be loaded.
    pub fn market(&self, symbol: &str) -> Result<Arc<Market>> {
        self.base.market(symbol)
    }

    /// Fails unless api key, secret and memo are set.
    pub fn check_required_credentials(&self) -> Result<()> {
        self.base.check_required_credentials(false)?;
        if self.base.config.uid.as_deref().is_none_or(str::is_empty) {
            return Err(Error::authentication(
                "bitmart requires \"uid\" credential (the api memo)",
            ));
        }
        Ok(())
    }

    /// Kline `step` in minutes.
    pub fn step(timeframe: Timeframe) -> Option<u32> {
        Some(match timeframe {
            Timeframe::M1 => 1,
            Timeframe::M3 => 3,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H2 => 120,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
            Timeframe::W1 => 10080,
            Timeframe::Mon1 => 43200,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let exchange = Bitmart::new(ExchangeConfig::default()).unwrap();
        assert_eq!(exchange.rest_url(), REST_URL);
        assert_eq!(exchange.name(), "BitMart");
        assert_eq!(DEFAULT_FEE, dec!(0.0025));
    }

    #[test]
    fn test_common_currencies() {
        let exchange = Bitmart::new(ExchangeConfig::default()).unwrap();
        assert_eq!(exchange.base().safe_currency_code("gdt"), "Gorilla Diamond");
        assert_eq!(exchange.base().safe_currency_code("$GM"), "GOLDMINER");
        assert_eq!(exchange.base().safe_currency_code("btc"), "BTC");
    }

    #[test]
    fn test_memo_required() {
        let config = ExchangeConfig::builder().api_key("k").secret("s").build();
        let err = Bitmart::new(config).unwrap().check_required_credentials().unwrap_err();
        assert!(err.as_authentication().is_some_and(|m| m.contains("uid")));

        let config = ExchangeConfig::builder()
            .api_key("k")
            .secret("s")
            .uid("memo")
            .build();
        assert!(Bitmart::new(config).unwrap().check_required_credentials().is_ok());
    }

    #[test]
    fn test_step() {
        assert_eq!(Bitmart::step(Timeframe::M1), Some(1));
        assert_eq!(Bitmart::step(Timeframe::D1), Some(1440));
        assert_eq!(Bitmart::step(Timeframe::Mon1), Some(43200));
        assert_eq!(Bitmart::step(Timeframe::H6), None);
    }
}
