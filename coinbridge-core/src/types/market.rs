//! Market (trading pair) definitions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Symbol;

/// Kind of instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    /// Spot market.
    #[default]
    Spot,
    /// Perpetual swap.
    Swap,
    /// Dated future.
    Future,
}

impl std::fmt::Display for MarketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spot => f.write_str("spot"),
            Self::Swap => f.write_str("swap"),
            Self::Future => f.write_str("future"),
        }
    }
}

/// Lower and upper bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    /// Minimum value.
    pub min: Option<Decimal>,
    /// Maximum value.
    pub max: Option<Decimal>,
}

/// Tick sizes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketPrecision {
    /// Price tick.
    pub price: Option<Decimal>,
    /// Amount step.
    pub amount: Option<Decimal>,
}

/// Order parameter limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketLimits {
    /// Amount limits.
    pub amount: MinMax,
    /// Price limits.
    pub price: MinMax,
    /// Cost limits.
    pub cost: MinMax,
    /// Leverage limits.
    pub leverage: MinMax,
}

/// A tradable market.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    /// Exchange market id.
    pub id: String,
    /// Unified symbol such as `BTC/USDT` or `BTC/USDT:USDT`.
    pub symbol: Symbol,
    /// Base currency code.
    pub base: String,
    /// Quote currency code.
    pub quote: String,
    /// Settlement currency for contracts.
    pub settle: Option<String>,
    /// Exchange base currency id.
    pub base_id: String,
    /// Exchange quote currency id.
    pub quote_id: String,
    /// Exchange settlement currency id.
    pub settle_id: Option<String>,
    /// Instrument kind.
    #[serde(rename = "type")]
    pub market_type: MarketType,
    /// Open for trading.
    pub active: bool,
    /// Whether this is a derivative.
    pub contract: bool,
    /// Linear (quote-settled) contract.
    pub linear: Option<bool>,
    /// Contract multiplier.
    pub contract_size: Option<Decimal>,
    /// Tick sizes.
    pub precision: MarketPrecision,
    /// Order limits.
    pub limits: MarketLimits,
    /// Maker fee rate.
    pub maker: Option<Decimal>,
    /// Taker fee rate.
    pub taker: Option<Decimal>,
    /// Raw exchange payload.
    #[serde(default)]
    pub info: Value,
}

impl Market {
    /// Creates an active spot market.
    ///
    /// ```rust
    /// use coinbridge_core::types::Market;
    ///
    /// let market = Market::new_spot("btc", "BTC", "AUD");
    /// assert_eq!(market.symbol, "BTC/AUD");
    /// assert!(market.is_spot());
    /// ```
    pub fn new_spot(id: impl Into<String>, base: impl Into<String>, quote: impl Into<String>) -> Self {
        let base = base.into();
        let quote = quote.into();
        Self {
            id: id.into(),
            symbol: format!("{base}/{quote}"),
            base_id: base.to_lowercase(),
            quote_id: quote.to_lowercase(),
            base,
            quote,
            market_type: MarketType::Spot,
            active: true,
            ..Self::default()
        }
    }

    /// Creates an active linear or inverse perpetual swap.
    pub fn new_swap(
        id: impl Into<String>,
        base: impl Into<String>,
        quote: impl Into<String>,
        settle: impl Into<String>,
    ) -> Self {
        let base = base.into();
        let quote = quote.into();
        let settle = settle.into();
        Self {
            id: id.into(),
            symbol: format!("{base}/{quote}:{settle}"),
            base_id: base.clone(),
            quote_id: quote.clone(),
            settle_id: Some(settle.clone()),
            linear: Some(settle == quote),
            base,
            quote,
            settle: Some(settle),
            market_type: MarketType::Swap,
            active: true,
            contract: true,
            ..Self::default()
        }
    }

    /// Spot market.
    #[inline]
    pub fn is_spot(&self) -> bool {
        self.market_type == MarketType::Spot
    }

    /// Perpetual swap.
    #[inline]
    pub fn is_swap(&self) -> bool {
        self.market_type == MarketType::Swap
    }
}
