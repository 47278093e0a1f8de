//! Exchange trait implementation for Bitget

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

use super::Bitget;

#[async_trait]
impl Exchange for Bitget {
    // ==================== Metadata ====================

    fn id(&self) -> &str {
        Bitget::id(self)
    }

    fn name(&self) -> &str {
        Bitget::name(self)
    }

    fn capabilities(&self) -> Capabilities {
        capabilities!(
            MARKET_DATA | FETCH_STATUS | FETCH_TIME,
            TRADING | FETCH_BALANCE | FETCH_MY_TRADES,
            WEBSOCKET_PUBLIC | WEBSOCKET_PRIVATE
        )
    }

    fn timeframes(&self) -> Vec<Timeframe> {
        Timeframe::ALL
            .into_iter()
            .filter(|tf| Bitget::rest_timeframe(*tf).is_some())
            .collect()
    }

    // ==================== Market Data ====================

    async fn fetch_markets(&self) -> Result<Vec<Market>> {
        Bitget::fetch_markets(self).await
    }

    async fn load_markets(&self, reload: bool) -> Result<MarketMap> {
        Bitget::load_markets(self, reload).await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        Bitget::fetch_ticker(self, symbol).await
    }

    async fn fetch_tickers(&self, symbols: Option<&[String]>) -> Result<Vec<Ticker>> {
        Bitget::fetch_tickers(self, symbols).await
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook> {
        Bitget::fetch_order_book(self, symbol, limit).await
    }

    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        Bitget::fetch_trades(self, symbol, since, limit).await
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>> {
        Bitget::fetch_ohlcv(self, symbol, timeframe, since, limit).await
    }

    async fn fetch_status(&self) -> Result<ExchangeStatus> {
        Bitget::fetch_status(self).await
    }

    async fn fetch_time(&self) -> Result<i64> {
        Bitget::fetch_time(self).await
    }

    // ==================== Account ====================

    async fn fetch_balance(&self) -> Result<Balance> {
        Bitget::fetch_balance(self).await
    }

    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        Bitget::fetch_my_trades(self, symbol, since, limit).await
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
        Bitget::create_order(self, symbol, order_type, side, amount, price, params).await
    }

    async fn cancel_order(
        &self,
        id: &str,
        symbol: Option<&str>,
        params: Option<&Value>,
    ) -> Result<Order> {
        Bitget::cancel_order(self, id, symbol, params).await
    }

    async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> Result<Order> {
        Bitget::fetch_order(self, id, symbol).await
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>> {
        Bitget::fetch_open_orders(self, symbol, since, limit).await
    }
}
