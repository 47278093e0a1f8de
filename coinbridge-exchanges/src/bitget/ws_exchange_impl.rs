//! WsExchange trait implementation for Bitget
//!
//! Every watch loads markets first. Private watches log in on the first
//! call of each connection.

use async_trait::async_trait;
use coinbridge_core::{
    Error, Result,
    parser_utils::{safe_bool, safe_string},
    types::{Balance, Market, Ohlcv, Order, OrderBook, Position, Ticker, Timeframe, Trade},
    ws_client::WsConnectionState,
    ws_exchange::WsExchange,
};
use serde_json::Value;
use std::sync::Arc;

use super::Bitget;
use super::ws::ws_market_id;

/// Private channel addressing for a market type.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PrivateTarget {
    inst_type: &'static str,
    inst_id: String,
}

impl Bitget {
    async fn ws_market(&self, symbol: &str) -> Result<Arc<Market>> {
        self.load_markets(false).await?;
        self.ws.state().market(symbol)
    }

    async fn ws_markets(&self, symbols: &[String]) -> Result<Vec<Arc<Market>>> {
        self.load_markets(false).await?;
        symbols
            .iter()
            .map(|symbol| self.ws.state().market(symbol))
            .collect()
    }

    /// Contract streams unless the market, `params.type` or the default
    /// product type say spot.
    fn is_contract_stream(&self, market: Option<&Market>, params: Option<&Value>) -> bool {
        if let Some(market) = market {
            return market.contract;
        }
        match params.and_then(|p| safe_string(p, "type")).as_deref() {
            Some("spot") => false,
            Some(_) => true,
            None => self.options.is_contract_default(),
        }
    }

    fn order_target(&self, market: Option<&Market>, params: Option<&Value>) -> Result<PrivateTarget> {
        if self.is_contract_stream(market, params) {
            return Ok(PrivateTarget {
                inst_type: self.options.contract_inst_type(),
                inst_id: "default".to_string(),
            });
        }
        let market = market.ok_or_else(|| {
            Error::arguments_required("bitget watch_orders requires a symbol for spot markets")
        })?;
        Ok(PrivateTarget {
            inst_type: "spbl",
            inst_id: format!("{}_SPBL", ws_market_id(market)),
        })
    }
}

/// `instType` of the positions channel for the first requested market.
fn positions_inst_type(markets: &[Arc<Market>], sandbox: bool) -> &'static str {
    match (markets.first().and_then(|m| m.settle.as_deref()), sandbox) {
        (None | Some("USDT"), false) => "umcbl",
        (Some("USDC"), false) => "cmcbl",
        (Some(_), false) => "dmcbl",
        (None | Some("USDT"), true) => "sumcbl",
        (Some("USDC"), true) => "scmcbl",
        (Some(_), true) => "sdmcbl",
    }
}

#[async_trait]
impl WsExchange for Bitget {
    // ==================== Connection Management ====================

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

    // ==================== Public Channels ====================

    async fn watch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let market = self.ws_market(symbol).await?;
        self.ws.watch_ticker(&market).await
    }

    async fn watch_tickers(&self, symbols: &[String]) -> Result<Vec<Ticker>> {
        if symbols.is_empty() {
            return Err(Error::arguments_required(
                "bitget watch_tickers requires a non-empty symbol list",
            ));
        }
        let markets = self.ws_markets(symbols).await?;
        self.ws.watch_tickers(&markets).await
    }

    async fn watch_order_book(&self, symbol: &str, limit: Option<usize>) -> Result<OrderBook> {
        let market = self.ws_market(symbol).await?;
        self.ws.watch_order_book(&market, limit).await
    }

    async fn watch_order_book_for_symbols(
        &self,
        symbols: &[String],
        limit: Option<usize>,
    ) -> Result<OrderBook> {
        if symbols.is_empty() {
            return Err(Error::arguments_required(
                "bitget watch_order_book_for_symbols requires a non-empty symbol list",
            ));
        }
        let markets = self.ws_markets(symbols).await?;
        self.ws.watch_order_book_for_symbols(&markets, limit).await
    }

    async fn watch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Trade>> {
        let market = self.ws_market(symbol).await?;
        self.ws.watch_trades(&market, since, limit).await
    }

    async fn watch_trades_for_symbols(
        &self,
        symbols: &[String],
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Trade>> {
        if symbols.is_empty() {
            return Err(Error::arguments_required(
                "bitget watch_trades_for_symbols requires a non-empty symbol list",
            ));
        }
        let markets = self.ws_markets(symbols).await?;
        self.ws.watch_trades_for_symbols(&markets, since, limit).await
    }

    async fn watch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Ohlcv>> {
        let market = self.ws_market(symbol).await?;
        self.ws.watch_ohlcv(&market, timeframe, since, limit).await
    }

    // ==================== Private Channels ====================

    async fn watch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
        params: Option<&Value>,
    ) -> Result<Vec<Order>> {
        let auth = self.get_auth()?;
        let market = match symbol {
            Some(symbol) => Some(self.ws_market(symbol).await?),
            None => {
                self.load_markets(false).await?;
                None
            }
        };
        let trigger = params.and_then(|p| safe_bool(p, "stop")).unwrap_or(false);
        let target = self.order_target(market.as_deref(), params)?;
        if trigger && target.inst_type == "spbl" {
            return Err(Error::not_supported(
                "bitget watch_orders does not support trigger orders for spot markets",
            ));
        }
        let symbol = market.as_ref().map(|m| m.symbol.as_str());
        self.ws
            .watch_orders(&auth, target.inst_type, &target.inst_id, trigger, symbol, since, limit)
            .await
    }

    async fn watch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
        params: Option<&Value>,
    ) -> Result<Vec<Trade>> {
        let auth = self.get_auth()?;
        let market = match symbol {
            Some(symbol) => Some(self.ws_market(symbol).await?),
            None => {
                self.load_markets(false).await?;
                None
            }
        };
        if !self.is_contract_stream(market.as_deref(), params) {
            return Err(Error::not_supported(
                "bitget watch_my_trades does not support spot markets",
            ));
        }
        let symbol = market.as_ref().map(|m| m.symbol.as_str());
        self.ws
            .watch_my_trades(&auth, self.options.contract_inst_type(), symbol, since, limit)
            .await
    }

    async fn watch_positions(
        &self,
        symbols: Option<&[String]>,
        since: Option<i64>,
        limit: Option<usize>,
        params: Option<&Value>,
    ) -> Result<Vec<Position>> {
        let _ = params;
        let auth = self.get_auth()?;
        let markets = self.ws_markets(symbols.unwrap_or_default()).await?;
        let inst_type = positions_inst_type(&markets, self.options.sandbox);
        let symbols: Vec<String> = markets.iter().map(|m| m.symbol.clone()).collect();
        let symbols = (!symbols.is_empty()).then_some(symbols.as_slice());
        self.ws
            .watch_positions(&auth, inst_type, symbols, since, limit)
            .await
    }

    async fn watch_balance(&self, params: Option<&Value>) -> Result<Balance> {
        let auth = self.get_auth()?;
        self.load_markets(false).await?;
        let inst_type = if self.is_contract_stream(None, params) {
            self.options.contract_inst_type()
        } else {
            "spbl"
        };
        self.ws.watch_balance(&auth, inst_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitget::BitgetOptions;
    use coinbridge_core::ExchangeConfig;
    use serde_json::json;

    fn bitget(product_type: &str) -> Bitget {
        Bitget::new_with_options(
            ExchangeConfig::default(),
            BitgetOptions {
                product_type: product_type.to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_order_target() {
        let bitget = bitget("spot");
        let spot = Market::new_spot("BTCUSDT", "BTC", "USDT");
        let target = bitget.order_target(Some(&spot), None).unwrap();
        assert_eq!(target.inst_type, "spbl");
        assert_eq!(target.inst_id, "BTCUSDT_SPBL");

        let err = bitget.order_target(None, None).unwrap_err();
        assert!(matches!(err, Error::ArgumentsRequired(_)));

        let swap = bitget
            .order_target(None, Some(&json!({"type": "swap"})))
            .unwrap();
        assert_eq!(swap.inst_type, "UMCBL");
        assert_eq!(swap.inst_id, "default");
    }

    #[test]
    fn test_contract_default() {
        let bitget = bitget("umcbl");
        assert!(bitget.is_contract_stream(None, None));
        assert!(!bitget.is_contract_stream(None, Some(&json!({"type": "spot"}))));
        let spot = Market::new_spot("BTCUSDT", "BTC", "USDT");
        assert!(!bitget.is_contract_stream(Some(&spot), None));
    }

    #[test]
    fn test_positions_inst_type() {
        let usdt = Arc::new(Market::new_swap("BTCUSDT_UMCBL", "BTC", "USDT", "USDT"));
        let usdc = Arc::new(Market::new_swap("BTCPERP_CMCBL", "BTC", "USDC", "USDC"));
        let coin = Arc::new(Market::new_swap("BTCUSD_DMCBL", "BTC", "USD", "BTC"));
        assert_eq!(positions_inst_type(&[], false), "umcbl");
        assert_eq!(positions_inst_type(&[usdt.clone()], false), "umcbl");
        assert_eq!(positions_inst_type(&[usdc.clone()], false), "cmcbl");
        assert_eq!(positions_inst_type(&[coin.clone()], false), "dmcbl");

        assert_eq!(positions_inst_type(&[], true), "sumcbl");
        assert_eq!(positions_inst_type(&[usdt], true), "sumcbl");
        assert_eq!(positions_inst_type(&[usdc], true), "scmcbl");
        assert_eq!(positions_inst_type(&[coin], true), "sdmcbl");
    }

    #[test]
    fn test_sandbox_order_target() {
        let bitget = Bitget::builder().sandbox(true).product_type("umcbl").build().unwrap();
        let target = bitget.order_target(None, None).unwrap();
        assert_eq!(target.inst_type, "SUMCBL");
        assert_eq!(target.inst_id, "default");

        let spot = Market::new_spot("BTCUSDT", "BTC", "USDT");
        assert_eq!(bitget.order_target(Some(&spot), None).unwrap().inst_type, "spbl");
    }

    #[tokio::test]
    async fn test_private_watch_requires_credentials() {
        let bitget = bitget("spot");
        let err = bitget.watch_balance(None).await.unwrap_err();
        assert!(err.as_authentication().is_some());
    }
}
