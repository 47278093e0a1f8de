//! Loaded markets indexed by symbol and by exchange id.

use crate::types::Market;
use std::collections::HashMap;
use std::sync::Arc;

/// Market lookup tables.
#[derive(Debug, Clone, Default)]
pub struct MarketCache {
    markets: Arc<HashMap<String, Arc<Market>>>,
    markets_by_id: HashMap<String, Arc<Market>>,
    symbols: Vec<String>,
    loaded: bool,
}

impl MarketCache {
    /// Replaces the contents with `markets`.
    pub fn set_markets(&mut self, markets: Vec<Market>) -> Arc<HashMap<String, Arc<Market>>> {
        let mut by_symbol = HashMap::with_capacity(markets.len());
        self.markets_by_id.clear();
        self.symbols.clear();

        for market in markets {
            let market = Arc::new(market);
            self.symbols.push(market.symbol.clone());
            self.markets_by_id
                .insert(market.id.clone(), Arc::clone(&market));
            by_symbol.insert(market.symbol.clone(), market);
        }
        self.symbols.sort();
        self.markets = Arc::new(by_symbol);
        self.loaded = true;
        Arc::clone(&self.markets)
    }

    /// Whether markets were set at least once.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Markets keyed by symbol.
    pub fn markets(&self) -> Arc<HashMap<String, Arc<Market>>> {
        Arc::clone(&self.markets)
    }

    /// Market for a unified symbol.
    pub fn get_market(&self, symbol: &str) -> Option<Arc<Market>> {
        self.markets.get(symbol).cloned()
    }

    /// Market for an exchange id.
    pub fn get_market_by_id(&self, id: &str) -> Option<Arc<Market>> {
        self.markets_by_id.get(id).cloned()
    }

    /// Sorted unified symbols.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of markets.
    pub fn market_count(&self) -> usize {
        self.markets.len()
    }
}
