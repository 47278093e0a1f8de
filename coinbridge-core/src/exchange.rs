//! # Unified REST trait
//!
//! [`Exchange`] is the object-safe surface every adapter implements. Only
//! the metadata methods are required; every call an adapter does not
//! override fails with [`Error::NotSupported`], so callers can check an
//! adapter through [`Exchange::capabilities`] or simply try the call.
//!
//! ```rust,no_run
//! use coinbridge_core::exchange::Exchange;
//!
//! async fn last_price(exchange: &dyn Exchange, symbol: &str) -> coinbridge_core::Result<()> {
//!     if exchange.capabilities().has("fetchTicker") {
//!         let ticker = exchange.fetch_ticker(symbol).await?;
//!         println!("{} last {:?}", exchange.id(), ticker.last);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;

use crate::base_exchange::MarketMap;
use crate::capability::Capabilities;
use crate::error::{Error, Result};
use crate::types::{
    Balance, ExchangeStatus, Market, Ohlcv, Order, OrderBook, OrderSide, OrderType, Ticker,
    Timeframe, Trade,
};

fn unsupported(exchange: &str, method: &str) -> Error {
    Error::not_supported(format!("{exchange} {method}() is not supported yet"))
}

/// REST operations of one venue.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Lowercase identifier, e.g. `"bitget"`.
    fn id(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    /// Operations this adapter implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    /// Candle intervals accepted by [`fetch_ohlcv`](Self::fetch_ohlcv).
    fn timeframes(&self) -> Vec<Timeframe> {
        Vec::new()
    }

    // ==================== Market Data ====================

    /// Every market listed by the venue.
    async fn fetch_markets(&self) -> Result<Vec<Market>> {
        Err(unsupported(self.id(), "fetchMarkets"))
    }

    /// Markets keyed by symbol, fetched once and cached.
    async fn load_markets(&self, reload: bool) -> Result<MarketMap> {
        let _ = reload;
        Err(unsupported(self.id(), "loadMarkets"))
    }

    /// 24h ticker for `symbol`.
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let _ = symbol;
        Err(unsupported(self.id(), "fetchTicker"))
    }

    /// Tickers for `symbols`, or for every market with `None`.
    async fn fetch_tickers(&self, symbols: Option<&[String]>) -> Result<Vec<Ticker>> {
        let _ = symbols;
        Err(unsupported(self.id(), "fetchTickers"))
    }

    /// Order book with at most `limit` levels per side.
    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook> {
        let _ = (symbol, limit);
        Err(unsupported(self.id(), "fetchOrderBook"))
    }

    /// Recent public trades.
    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        let _ = (symbol, since, limit);
        Err(unsupported(self.id(), "fetchTrades"))
    }

    /// Candles for `symbol`.
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>> {
        let _ = (symbol, timeframe, since, limit);
        Err(unsupported(self.id(), "fetchOHLCV"))
    }

    /// Venue operating status.
    async fn fetch_status(&self) -> Result<ExchangeStatus> {
        Err(unsupported(self.id(), "fetchStatus"))
    }

    /// Server time in milliseconds.
    async fn fetch_time(&self) -> Result<i64> {
        Err(unsupported(self.id(), "fetchTime"))
    }

    // ==================== Account ====================

    /// Account balances.
    async fn fetch_balance(&self) -> Result<Balance> {
        Err(unsupported(self.id(), "fetchBalance"))
    }

    /// Own fills.
    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        let _ = (symbol, since, limit);
        Err(unsupported(self.id(), "fetchMyTrades"))
    }

    // ==================== Trading ====================

    /// Places an order. `params` carries venue extras such as a trigger
    /// price (`{"stopPrice": "..."}`).
    async fn create_order(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        amount: Decimal,
        price: Option<Decimal>,
        params: Option<&Value>,
    ) -> Result<Order> {
        let _ = (symbol, order_type, side, amount, price, params);
        Err(unsupported(self.id(), "createOrder"))
    }

    /// Cancels one order.
    async fn cancel_order(
        &self,
        id: &str,
        symbol: Option<&str>,
        params: Option<&Value>,
    ) -> Result<Order> {
        let _ = (id, symbol, params);
        Err(unsupported(self.id(), "cancelOrder"))
    }

    /// Cancels every open order, for one symbol where the venue needs it.
    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>> {
        let _ = symbol;
        Err(unsupported(self.id(), "cancelAllOrders"))
    }

    /// One order by id.
    async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> Result<Order> {
        let _ = (id, symbol);
        Err(unsupported(self.id(), "fetchOrder"))
    }

    /// Orders in any state.
    async fn fetch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>> {
        let _ = (symbol, since, limit);
        Err(unsupported(self.id(), "fetchOrders"))
    }

    /// Open orders.
    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>> {
        let _ = (symbol, since, limit);
        Err(unsupported(self.id(), "fetchOpenOrders"))
    }
}

/// Owned trait object.
pub type BoxedExchange = Box<dyn Exchange>;

/// Shared trait object.
pub type ArcExchange = Arc<dyn Exchange>;

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    #[async_trait]
    impl Exchange for Bare {
        fn id(&self) -> &str {
            "bare"
        }

        fn name(&self) -> &str {
            "Bare"
        }
    }

    #[tokio::test]
    async fn test_defaults_are_not_supported() {
        let exchange: BoxedExchange = Box::new(Bare);
        assert!(exchange.capabilities().is_empty());
        let err = exchange.fetch_ticker("BTC/USDT").await.unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
        assert!(err.to_string().contains("bare fetchTicker()"));
        assert!(matches!(
            exchange.cancel_all_orders(None).await,
            Err(Error::NotSupported(_))
        ));
    }
}
