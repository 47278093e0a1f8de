//! Exchange trait implementation for Coinbase Pro

use async_trait::async_trait;
use coinbridge_core::{
    Capabilities, MarketMap, Result, exchange::Exchange, types::Market,
};

use super::CoinbasePro;

#[async_trait]
impl Exchange for CoinbasePro {
    fn id(&self) -> &str {
        CoinbasePro::id(self)
    }

    fn name(&self) -> &str {
        CoinbasePro::name(self)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FETCH_MARKETS | Capabilities::WATCH_ORDER_BOOK
    }

    async fn fetch_markets(&self) -> Result<Vec<Market>> {
        CoinbasePro::fetch_markets(self).await
    }

    async fn load_markets(&self, reload: bool) -> Result<MarketMap> {
        CoinbasePro::load_markets(self, reload).await
    }
}
