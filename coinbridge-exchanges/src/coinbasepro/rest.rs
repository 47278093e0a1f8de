//! Coinbase Pro public REST calls.

use super::{CoinbasePro, parser};
use coinbridge_core::types::Market;
use coinbridge_core::{Error, MarketMap, Result};
use tracing::{debug, info, warn};

impl CoinbasePro {
    /// Fetch all products.
    pub async fn fetch_markets(&self) -> Result<Vec<Market>> {
        let url = format!("{}/products", self.rest_url());
        debug!(url = %url, "Coinbase Pro public request");
        let response = self.base.http_client.get(&url, None).await?;
        let products = response
            .as_array()
            .ok_or_else(|| Error::invalid_value("products", "expected an array"))?;

        let mut markets = Vec::with_capacity(products.len());
        for product in products {
            match parser::parse_market(product) {
                Ok(market) => markets.push(market),
                Err(e) => warn!(error = %e, "Failed to parse product"),
            }
        }
        info!(count = markets.len(), "Fetched Coinbase Pro markets");
        Ok(markets)
    }

    /// Load and cache market data.
    pub async fn load_markets(&self, reload: bool) -> Result<MarketMap> {
        self.base
            .load_markets_with(reload, || self.fetch_markets())
            .await
    }
}
