//! Public and private trade types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::financial::{Amount, Cost, Price};
use super::order::{OrderSide, OrderType};
use super::{Fee, Symbol, Timestamp};

/// Liquidity role of a fill.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TakerOrMaker {
    /// Added liquidity.
    Maker,
    /// Removed liquidity.
    Taker,
}

/// A single execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// Trade id.
    pub id: Option<String>,
    /// Owning order id, for private trades.
    pub order: Option<String>,
    /// Unified symbol.
    pub symbol: Symbol,
    /// Order type of the owning order.
    #[serde(rename = "type")]
    pub trade_type: Option<OrderType>,
    /// Aggressor side.
    pub side: Option<OrderSide>,
    /// Maker or taker.
    pub taker_or_maker: Option<TakerOrMaker>,
    /// Execution price.
    pub price: Price,
    /// Executed base amount.
    pub amount: Amount,
    /// Quote cost.
    pub cost: Option<Cost>,
    /// Fee charged.
    pub fee: Option<Fee>,
    /// Execution time in milliseconds.
    pub timestamp: Option<Timestamp>,
    /// ISO 8601 form of `timestamp`.
    pub datetime: Option<String>,
    /// Raw exchange payload.
    #[serde(default)]
    pub info: Value,
}

impl Trade {
    /// Creates a trade with cost derived from price and amount.
    pub fn new(
        symbol: impl Into<Symbol>,
        side: Option<OrderSide>,
        price: Price,
        amount: Amount,
        timestamp: Option<Timestamp>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            price,
            amount,
            cost: Some(price * amount),
            timestamp,
            datetime: timestamp.and_then(crate::time::iso8601),
            ..Self::default()
        }
    }

    /// Sets `cost` from price and amount when missing.
    pub fn calculate_cost(&mut self) {
        if self.cost.is_none() {
            self.cost = Some(self.price * self.amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_sets_cost_and_datetime() {
        let t = Trade::new(
            "BTC/USDT",
            Some(OrderSide::Buy),
            Price::new(dec!(100)),
            Amount::new(dec!(0.5)),
            Some(0),
        );
        assert_eq!(t.cost, Some(Cost::new(dec!(50.0))));
        assert_eq!(t.datetime.as_deref(), Some("1970-01-01T00:00:00.000Z"));
    }
}
