//! Exchange trait implementation for BitMart

use async_trait::async_trait;
use coinbridge_core::{
    Capabilities, MarketMap, Result, capabilities,
    exchange::Exchange,
    types::{
        Balance, ExchangeStatus, Market, Ohlcv, Order, OrderBook, OrderSide, OrderType, Ticker,
        Timeframe, Trade,
    },
};
use rust_decimal::Decimal;
use serde_json::Value;

use super::Bitmart;

#[async_trait]
impl Exchange for Bitmart {
    // ==================== Metadata ====================

    fn id(&self) -> &str {
        Bitmart::id(self)
    }

    fn name(&self) -> &str {
        Bitmart::name(self)
    }

    fn capabilities(&self) -> Capabilities {
        capabilities!(
            MARKET_DATA | FETCH_STATUS | FETCH_TIME | FETCH_BALANCE | FETCH_MY_TRADES,
            CREATE_ORDER | CANCEL_ORDER | CANCEL_ALL_ORDERS | FETCH_ORDER | FETCH_OPEN_ORDERS
        )
    }

    fn timeframes(&self) -> Vec<Timeframe> {
        Timeframe::ALL
            .into_iter()
            .filter(|tf| Bitmart::step(*tf).is_some())
            .collect()
    }

    // ==================== Market Data ====================

    async fn fetch_markets(&self) -> Result<Vec<Market>> {
        Bitmart::fetch_markets(self).await
    }

    async fn load_markets(&self, reload: bool) -> Result<MarketMap> {
        Bitmart::load_markets(self, reload).await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        Bitmart::fetch_ticker(self, symbol).await
    }

    async fn fetch_tickers(&self, symbols: Option<&[String]>) -> Result<Vec<Ticker>> {
        Bitmart::fetch_tickers(self, symbols).await
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook> {
        Bitmart::fetch_order_book(self, symbol, limit).await
    }

    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        Bitmart::fetch_trades(self, symbol, since, limit).await
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>> {
        Bitmart::fetch_ohlcv(self, symbol, timeframe, since, limit).await
    }

    async fn fetch_status(&self) -> Result<ExchangeStatus> {
        Bitmart::fetch_status(self).await
    }

    async fn fetch_time(&self) -> Result<i64> {
        Bitmart::fetch_time(self).await
    }

    // ==================== Account ====================

    async fn fetch_balance(&self) -> Result<Balance> {
        Bitmart::fetch_balance(self).await
    }

    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        Bitmart::fetch_my_trades(self, symbol, since, limit).await
    }

    // ==================== Trading ====================

    async fn create_order(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        amount: Decimal,
        price: Option<Decimal>,
        params: Option<&Value>,
    ) -> Result<Order> {
        Bitmart::create_order(self, symbol, order_type, side, amount, price, params).await
    }

    async fn cancel_order(
        &self,
        id: &str,
        symbol: Option<&str>,
        params: Option<&Value>,
    ) -> Result<Order> {
        Bitmart::cancel_order(self, id, symbol, params).await
    }

    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>> {
        Bitmart::cancel_all_orders(self, symbol).await
    }

    async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> Result<Order> {
        Bitmart::fetch_order(self, id, symbol).await
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>> {
        Bitmart::fetch_open_orders(self, symbol, since, limit).await
    }
}
