//! Exchange trait implementation for CoinSpot

use async_trait::async_trait;
use coinbridge_core::{
    Capabilities, MarketMap, Result, capabilities,
    exchange::Exchange,
    types::{Balance, Market, Order, OrderBook, OrderSide, OrderType, Ticker, Trade},
};
use rust_decimal::Decimal;
use serde_json::Value;

use super::Coinspot;

#[async_trait]
impl Exchange for Coinspot {
    fn id(&self) -> &str {
        Coinspot::id(self)
    }

    fn name(&self) -> &str {
        Coinspot::name(self)
    }

    fn capabilities(&self) -> Capabilities {
        capabilities!(
            FETCH_MARKETS | FETCH_TICKER | FETCH_TICKERS | FETCH_ORDER_BOOK | FETCH_TRADES,
            FETCH_BALANCE | FETCH_MY_TRADES | CREATE_ORDER | CANCEL_ORDER
        )
    }

    async fn fetch_markets(&self) -> Result<Vec<Market>> {
        Coinspot::fetch_markets(self).await
    }

    async fn load_markets(&self, reload: bool) -> Result<MarketMap> {
        Coinspot::load_markets(self, reload).await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        Coinspot::fetch_ticker(self, symbol).await
    }

    async fn fetch_tickers(&self, symbols: Option<&[String]>) -> Result<Vec<Ticker>> {
        Coinspot::fetch_tickers(self, symbols).await
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook> {
        Coinspot::fetch_order_book(self, symbol, limit).await
    }

    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        Coinspot::fetch_trades(self, symbol, since, limit).await
    }

    async fn fetch_balance(&self) -> Result<Balance> {
        Coinspot::fetch_balance(self).await
    }

    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        Coinspot::fetch_my_trades(self, symbol, since, limit).await
    }

    async fn create_order(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        amount: Decimal,
        price: Option<Decimal>,
        params: Option<&Value>,
    ) -> Result<Order> {
        Coinspot::create_order(self, symbol, order_type, side, amount, price, params).await
    }

    async fn cancel_order(
        &self,
        id: &str,
        symbol: Option<&str>,
        params: Option<&Value>,
    ) -> Result<Order> {
        Coinspot::cancel_order(self, id, symbol, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinbridge_core::ExchangeConfig;

    #[tokio::test]
    async fn test_trait_surface() {
        let exchange = Coinspot::new(ExchangeConfig::default()).unwrap();
        let exchange: &dyn Exchange = &exchange;
        assert_eq!(exchange.id(), "coinspot");
        assert!(exchange.capabilities().has("fetchMyTrades"));
        assert!(!exchange.capabilities().has("fetchOHLCV"));
        assert_eq!(exchange.load_markets(false).await.unwrap().len(), 14);

        let err = exchange.fetch_balance().await.unwrap_err();
        assert!(err.as_authentication().is_some());
    }
}
