//! Market data endpoints for Bitget REST API.

use super::super::{Bitget, parser};
use super::{Params, response_array, response_data};
use coinbridge_core::parser_utils::safe_integer;
use coinbridge_core::types::{ExchangeStatus, Market, Ohlcv, OrderBook, StatusKind, Ticker, Timeframe, Trade};
use coinbridge_core::{Error, MarketMap, Result};
use tracing::{info, warn};

/// Largest depth the order book endpoint accepts.
const MAX_BOOK_LIMIT: u32 = 150;

impl Bitget {
    /// Fetch all spot markets.
    pub async fn fetch_markets(&self) -> Result<Vec<Market>> {
        let response = self
            .public_get("/api/v2/spot/public/symbols", &Params::new())
            .await?;

        let mut markets = Vec::new();
        for symbol in response_array(&response)? {
            match parser::parse_market(symbol) {
                Ok(market) => markets.push(market),
                Err(e) => warn!(error = %e, "Failed to parse market"),
            }
        }
        info!(count = markets.len(), "Fetched Bitget markets");
        Ok(markets)
    }

    /// Load and cache market data.
    pub async fn load_markets(&self, reload: bool) -> Result<MarketMap> {
        self.base()
            .load_markets_with(reload, || self.fetch_markets())
            .await
    }

    /// Fetch ticker for a single trading pair.
    pub async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let market = self.market(symbol)?;
        let mut params = Params::new();
        params.insert("symbol".into(), market.id.clone());

        let response = self
            .public_get("/api/v2/spot/market/tickers", &params)
            .await?;
        let first = response_array(&response)?
            .first()
            .ok_or_else(|| Error::bad_symbol(format!("No ticker data for {symbol}")))?;
        parser::parse_ticker(first, Some(&market))
    }

    /// Fetch tickers for all markets, or for `symbols` when given.
    pub async fn fetch_tickers(&self, symbols: Option<&[String]>) -> Result<Vec<Ticker>> {
        if !self.base().markets_loaded() {
            return Err(Error::exchange(
                "-1",
                "Markets not loaded. Call load_markets() first.",
            ));
        }
        let response = self
            .public_get("/api/v2/spot/market/tickers", &Params::new())
            .await?;

        let mut tickers = Vec::new();
        for data in response_array(&response)? {
            let Some(id) = data.get("symbol").and_then(|v| v.as_str()) else {
                continue;
            };
            let Ok(market) = self.base().market_by_id(id) else {
                continue;
            };
            if symbols.is_some_and(|wanted| !wanted.contains(&market.symbol)) {
                continue;
            }
            match parser::parse_ticker(data, Some(&market)) {
                Ok(ticker) => tickers.push(ticker),
                Err(e) => warn!(error = %e, symbol = %market.symbol, "Failed to parse ticker"),
            }
        }
        Ok(tickers)
    }

    /// Fetch the order book. `limit` is capped at 150 levels.
    pub async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook> {
        let market = self.market(symbol)?;
        let mut params = Params::new();
        params.insert("symbol".into(), market.id.clone());
        params.insert("type".into(), "step0".into());
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.min(MAX_BOOK_LIMIT).to_string());
        }

        let response = self
            .public_get("/api/v2/spot/market/orderbook", &params)
            .await?;
        let mut book = parser::parse_orderbook(response_data(&response)?, &market.symbol)?;
        book.limit(limit.map(|l| l as usize));
        Ok(book)
    }

    /// Fetch recent public trades, oldest first.
    pub async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        let market = self.market(symbol)?;
        let mut params = Params::new();
        params.insert("symbol".into(), market.id.clone());
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.to_string());
        }

        let response = self.public_get("/api/v2/spot/market/fills", &params).await?;
        let mut trades = response_array(&response)?
            .iter()
            .filter_map(|t| match parser::parse_trade(t, Some(&market)) {
                Ok(trade) => Some(trade),
                Err(e) => {
                    warn!(error = %e, "Failed to parse trade");
                    None
                }
            })
            .filter(|t| since.is_none_or(|s| t.timestamp.is_some_and(|ts| ts >= s)))
            .collect::<Vec<_>>();
        trades.sort_by_key(|t| t.timestamp);
        Ok(trades)
    }

    /// Fetch candles for `timeframe`.
    pub async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>> {
        let market = self.market(symbol)?;
        let granularity = Self::rest_timeframe(timeframe).ok_or_else(|| {
            Error::not_supported(format!("bitget fetch_ohlcv timeframe {timeframe}"))
        })?;
        let mut params = Params::new();
        params.insert("symbol".into(), market.id.clone());
        params.insert("granularity".into(), granularity.into());
        if let Some(since) = since {
            params.insert("startTime".into(), since.to_string());
        }
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.to_string());
        }

        let response = self
            .public_get("/api/v2/spot/market/candles", &params)
            .await?;
        response_array(&response)?
            .iter()
            .map(parser::parse_ohlcv)
            .collect()
    }

    /// Server time in milliseconds.
    pub async fn fetch_time(&self) -> Result<i64> {
        let response = self.public_get("/api/v2/public/time", &Params::new()).await?;
        safe_integer(response_data(&response)?, "serverTime")
            .ok_or_else(|| Error::missing_field("serverTime"))
    }

    /// Reachability check: `ok` when the time endpoint answers.
    pub async fn fetch_status(&self) -> Result<ExchangeStatus> {
        let updated = self.fetch_time().await?;
        Ok(ExchangeStatus {
            status: StatusKind::Ok,
            updated: Some(updated),
            ..ExchangeStatus::default()
        })
    }
}
