//! Unified data structures shared by every adapter.
//!
//! Markets, tickers, trades, orders, balances, candles, positions and
//! order books. Monetary values use `rust_decimal::Decimal`, wrapped in
//! [`Price`], [`Amount`] and [`Cost`] where the role is unambiguous.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod balance;
/// Price, amount and cost newtypes
pub mod financial;
pub mod market;
pub mod ohlcv;
pub mod order;
pub mod orderbook;
pub mod position;
pub mod status;
pub mod ticker;
pub mod timeframe;
pub mod trade;

pub use balance::{Balance, BalanceEntry};
pub use financial::{Amount, Cost, Price};
pub use market::{Market, MarketLimits, MarketPrecision, MarketType, MinMax};
pub use ohlcv::Ohlcv;
pub use order::{Order, OrderSide, OrderStatus, OrderType};
pub use orderbook::{BookSide, OrderBook, OrderBookEntry, SideKind};
pub use position::{MarginMode, Position, PositionSide};
pub use status::{ExchangeStatus, StatusKind};
pub use ticker::Ticker;
pub use timeframe::Timeframe;
pub use trade::{TakerOrMaker, Trade};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Unified symbol such as `BTC/USDT`.
pub type Symbol = String;

/// Fee charged on an order or trade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fee {
    /// Currency the fee is paid in.
    pub currency: String,
    /// Fee amount.
    pub cost: Decimal,
    /// Fee rate, when reported.
    pub rate: Option<Decimal>,
}

impl Fee {
    /// Fee without a rate.
    pub fn new(currency: impl Into<String>, cost: Decimal) -> Self {
        Self {
            currency: currency.into(),
            cost,
            rate: None,
        }
    }
}
