//! Exchange trait implementation for WazirX

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

use super::Wazirx;

#[async_trait]
impl Exchange for Wazirx {
    // ==================== Metadata ====================

    fn id(&self) -> &str {
        Wazirx::id(self)
    }

    fn name(&self) -> &str {
        Wazirx::name(self)
    }

    fn capabilities(&self) -> Capabilities {
        capabilities!(
            MARKET_DATA | FETCH_STATUS | FETCH_TIME | FETCH_BALANCE,
            CREATE_ORDER | CANCEL_ORDER | CANCEL_ALL_ORDERS | FETCH_ORDERS | FETCH_OPEN_ORDERS
        )
    }

    fn timeframes(&self) -> Vec<Timeframe> {
        Timeframe::ALL
            .into_iter()
            .filter(|tf| Wazirx::interval(*tf).is_some())
            .collect()
    }

    // ==================== Market Data ====================

    async fn fetch_markets(&self) -> Result<Vec<Market>> {
        Wazirx::fetch_markets(self).await
    }

    async fn load_markets(&self, reload: bool) -> Result<MarketMap> {
        Wazirx::load_markets(self, reload).await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        Wazirx::fetch_ticker(self, symbol).await
    }

    async fn fetch_tickers(&self, symbols: Option<&[String]>) -> Result<Vec<Ticker>> {
        Wazirx::fetch_tickers(self, symbols).await
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook> {
        Wazirx::fetch_order_book(self, symbol, limit).await
    }

    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        Wazirx::fetch_trades(self, symbol, since, limit).await
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>> {
        Wazirx::fetch_ohlcv(self, symbol, timeframe, since, limit).await
    }

    async fn fetch_status(&self) -> Result<ExchangeStatus> {
        Wazirx::fetch_status(self).await
    }

    async fn fetch_time(&self) -> Result<i64> {
        Wazirx::fetch_time(self).await
    }

    // ==================== Account ====================

    async fn fetch_balance(&self) -> Result<Balance> {
        Wazirx::fetch_balance(self).await
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
        Wazirx::create_order(self, symbol, order_type, side, amount, price, params).await
    }

    async fn cancel_order(
        &self,
        id: &str,
        symbol: Option<&str>,
        params: Option<&Value>,
    ) -> Result<Order> {
        Wazirx::cancel_order(self, id, symbol, params).await
    }

    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>> {
        Wazirx::cancel_all_orders(self, symbol).await
    }

    async fn fetch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>> {
        Wazirx::fetch_orders(self, symbol, since, limit).await
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>> {
        Wazirx::fetch_open_orders(self, symbol, since, limit).await
    }
}
