//! WsExchange trait implementation for Coinbase Pro

use async_trait::async_trait;
use coinbridge_core::{
    Result, types::OrderBook, ws_client::WsConnectionState, ws_exchange::WsExchange,
};

use super::CoinbasePro;

#[async_trait]
impl WsExchange for CoinbasePro {
    fn ws_id(&self) -> &str {
        self.id()
    }

    async fn ws_connect(&self) -> Result<()> {
        self.ws.connect().await
    }

    async fn ws_close(&self) -> Result<()> {
        self.ws.close().await
    }

    fn ws_state(&self) -> WsConnectionState {
        self.ws.connection_state()
    }

    async fn watch_order_book(&self, symbol: &str, limit: Option<usize>) -> Result<OrderBook> {
        self.load_markets(false).await?;
        let market = self.market(symbol)?;
        self.ws.watch_order_book(&market, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinbridge_core::{Error, ExchangeConfig};

    #[tokio::test]
    async fn test_other_watches_are_not_supported() {
        let exchange = CoinbasePro::new(ExchangeConfig::default()).unwrap();
        let err = exchange.watch_ticker("BTC/USD").await.unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
        assert_eq!(exchange.ws_state(), WsConnectionState::Disconnected);
    }
}
