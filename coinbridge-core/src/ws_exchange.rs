//! # Streaming trait
//!
//! [`WsExchange`] watch calls subscribe on first use and resolve with the
//! next update for their subscription. Calling again waits for the update
//! after that, so a loop of `watch_*` calls follows the stream:
//!
//! ```rust,no_run
//! use coinbridge_core::ws_exchange::WsExchange;
//!
//! async fn follow(exchange: &dyn WsExchange) -> coinbridge_core::Result<()> {
//!     loop {
//!         let book = exchange.watch_order_book("BTC/USDT", Some(5)).await?;
//!         println!("{:?} / {:?}", book.best_bid(), book.best_ask());
//!     }
//! }
//! ```
//!
//! List results (trades, candles, orders) hold only what arrived since the
//! previous call, capped by `limit` and filtered by `since`.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::exchange::Exchange;
use crate::types::{Balance, Ohlcv, Order, OrderBook, Position, Ticker, Timeframe, Trade};
use crate::ws_client::WsConnectionState;

fn unsupported(exchange: &str, method: &str) -> Error {
    Error::not_supported(format!("{exchange} {method}() is not supported yet"))
}

/// Streaming operations of one venue.
#[async_trait]
pub trait WsExchange: Send + Sync {
    /// Lowercase identifier.
    fn ws_id(&self) -> &str;

    /// Opens the connection. Watch calls connect lazily as well.
    async fn ws_connect(&self) -> Result<()>;

    /// Closes the connection and fails pending watchers.
    async fn ws_close(&self) -> Result<()>;

    /// Connection state.
    fn ws_state(&self) -> WsConnectionState;

    /// Next ticker update.
    async fn watch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let _ = symbol;
        Err(unsupported(self.ws_id(), "watchTicker"))
    }

    /// Next ticker update for any of `symbols`.
    async fn watch_tickers(&self, symbols: &[String]) -> Result<Vec<Ticker>> {
        let _ = symbols;
        Err(unsupported(self.ws_id(), "watchTickers"))
    }

    /// Book after the next update, limited to `limit` levels.
    async fn watch_order_book(&self, symbol: &str, limit: Option<usize>) -> Result<OrderBook> {
        let _ = (symbol, limit);
        Err(unsupported(self.ws_id(), "watchOrderBook"))
    }

    /// Book of whichever of `symbols` updates next.
    async fn watch_order_book_for_symbols(
        &self,
        symbols: &[String],
        limit: Option<usize>,
    ) -> Result<OrderBook> {
        let _ = (symbols, limit);
        Err(unsupported(self.ws_id(), "watchOrderBookForSymbols"))
    }

    /// Public trades received since the previous call.
    async fn watch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Trade>> {
        let _ = (symbol, since, limit);
        Err(unsupported(self.ws_id(), "watchTrades"))
    }

    /// Trades of whichever of `symbols` updates next.
    async fn watch_trades_for_symbols(
        &self,
        symbols: &[String],
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Trade>> {
        let _ = (symbols, since, limit);
        Err(unsupported(self.ws_id(), "watchTradesForSymbols"))
    }

    /// Candles updated since the previous call.
    async fn watch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Ohlcv>> {
        let _ = (symbol, timeframe, since, limit);
        Err(unsupported(self.ws_id(), "watchOHLCV"))
    }

    /// Own orders changed since the previous call. `params` may select a
    /// market type (`{"type": "swap"}`) or trigger orders (`{"stop": true}`).
    async fn watch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
        params: Option<&Value>,
    ) -> Result<Vec<Order>> {
        let _ = (symbol, since, limit, params);
        Err(unsupported(self.ws_id(), "watchOrders"))
    }

    /// Own fills received since the previous call.
    async fn watch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
        params: Option<&Value>,
    ) -> Result<Vec<Trade>> {
        let _ = (symbol, since, limit, params);
        Err(unsupported(self.ws_id(), "watchMyTrades"))
    }

    /// Positions changed by the next update, restricted to `symbols`.
    async fn watch_positions(
        &self,
        symbols: Option<&[String]>,
        since: Option<i64>,
        limit: Option<usize>,
        params: Option<&Value>,
    ) -> Result<Vec<Position>> {
        let _ = (symbols, since, limit, params);
        Err(unsupported(self.ws_id(), "watchPositions"))
    }

    /// Balance after the next account update.
    async fn watch_balance(&self, params: Option<&Value>) -> Result<Balance> {
        let _ = params;
        Err(unsupported(self.ws_id(), "watchBalance"))
    }
}

/// REST and streaming together.
pub trait FullExchange: Exchange + WsExchange {}

impl<T: Exchange + WsExchange> FullExchange for T {}
