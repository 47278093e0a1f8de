//! Order type definitions

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::{Fee, Symbol, Timestamp};

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl OrderSide {
    /// Lowercase wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "buy" | "bid" => Ok(Self::Buy),
            "sell" | "ask" => Ok(Self::Sell),
            other => Err(crate::Error::invalid_value("side", other.to_string())),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Market order
    Market,
    /// Limit order
    Limit,
    /// Limit order that triggers at a stop price
    StopLimit,
    /// Market order that triggers at a stop price
    StopMarket,
}

impl OrderType {
    /// Snake case wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Limit => "limit",
            Self::StopLimit => "stop_limit",
            Self::StopMarket => "stop_market",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "market" => Ok(Self::Market),
            "limit" => Ok(Self::Limit),
            "stop_limit" => Ok(Self::StopLimit),
            "stop_market" => Ok(Self::StopMarket),
            other => Err(crate::Error::invalid_value("type", other.to_string())),
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Resting on the book
    Open,
    /// Fully filled
    Closed,
    /// Canceled by the user or the exchange
    Canceled,
    /// Expired
    Expired,
    /// Rejected by the matching engine
    Rejected,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Canceled => "canceled",
            Self::Expired => "expired",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Order structure
///
/// Fields the exchange did not report stay `None`. [`Order::complete`]
/// derives `remaining` and `cost` where possible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Exchange order id
    pub id: String,
    /// Client supplied id
    pub client_order_id: Option<String>,
    /// Creation time in milliseconds
    pub timestamp: Option<Timestamp>,
    /// ISO 8601 form of `timestamp`
    pub datetime: Option<String>,
    /// Time of the most recent fill
    pub last_trade_timestamp: Option<Timestamp>,
    /// Unified symbol
    pub symbol: Symbol,
    /// Order type
    #[serde(rename = "type")]
    pub order_type: Option<OrderType>,
    /// Time in force as sent by the exchange
    pub time_in_force: Option<String>,
    /// Post-only flag
    pub post_only: Option<bool>,
    /// Reduce-only flag
    pub reduce_only: Option<bool>,
    /// Order side
    pub side: Option<OrderSide>,
    /// Limit price
    pub price: Option<Decimal>,
    /// Trigger price for conditional orders
    pub trigger_price: Option<Decimal>,
    /// Original amount
    pub amount: Option<Decimal>,
    /// Filled amount
    pub filled: Option<Decimal>,
    /// Unfilled amount
    pub remaining: Option<Decimal>,
    /// Filled quote cost
    pub cost: Option<Decimal>,
    /// Average fill price
    pub average: Option<Decimal>,
    /// Order status
    pub status: Option<OrderStatus>,
    /// Fee charged so far
    pub fee: Option<Fee>,
    /// Raw exchange payload
    #[serde(default)]
    pub info: Value,
}

impl Order {
    /// Derives `remaining` from amount and filled, and `cost` from filled
    /// and average price.
    pub fn complete(&mut self) {
        if self.remaining.is_none() {
            if let (Some(amount), Some(filled)) = (self.amount, self.filled) {
                self.remaining = Some((amount - filled).max(Decimal::ZERO));
            }
        }
        if self.cost.is_none() {
            if let (Some(filled), Some(avg)) = (self.filled, self.average.or(self.price)) {
                self.cost = Some(filled * avg);
            }
        }
        if self.datetime.is_none() {
            self.datetime = self.timestamp.and_then(crate::time::iso8601);
        }
    }

    /// Open orders are still working.
    pub fn is_open(&self) -> bool {
        self.status == Some(OrderStatus::Open)
    }
}
