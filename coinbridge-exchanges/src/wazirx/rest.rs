//! WazirX REST calls.

use super::{Wazirx, WazirxAuth, parser};
use coinbridge_core::auth::keysort_urlencode;
use coinbridge_core::parser_utils::{safe_integer, safe_string, safe_value};
use coinbridge_core::types::{
    Balance, ExchangeStatus, Market, Ohlcv, Order, OrderBook, OrderSide, OrderType, Ticker,
    Timeframe, Trade,
};
use coinbridge_core::{Error, MarketMap, Result};
use reqwest::Method;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Query parameters, sorted for signing.
pub(crate) type Params = BTreeMap<String, String>;

/// Copies scalar members of a params object into `into`.
fn merge_params(into: &mut Params, extra: Option<&Value>) {
    let Some(Value::Object(map)) = extra else {
        return;
    };
    for (key, value) in map {
        let value = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        into.insert(key.clone(), value);
    }
}

/// Rounds `price` to the market's tick size.
fn price_to_precision(market: &Market, price: Decimal) -> Decimal {
    match market.precision.price {
        Some(tick) if !tick.is_zero() => ((price / tick)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            * tick)
            .normalize(),
        _ => price.normalize(),
    }
}

fn as_array<'a>(response: &'a Value, what: &'static str) -> Result<&'a [Value]> {
    response
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| Error::invalid_value(what, "expected an array"))
}

impl Wazirx {
    /// Signer built from the configured credentials.
    pub fn get_auth(&self) -> Result<WazirxAuth> {
        let (key, secret) = self.base.credentials()?;
        Ok(WazirxAuth::new(key.expose_secret(), secret.expose_secret()))
    }

    pub(crate) async fn public_get(&self, path: &str, params: &Params) -> Result<Value> {
        let mut url = format!("{}/{}", self.rest_url(), path);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&keysort_urlencode(params));
        }
        debug!(url = %url, "WazirX public request");
        self.base.http_client.get(&url, None).await
    }

    /// Signed request; parameters always travel in the query string.
    pub(crate) async fn private_request(
        &self,
        method: Method,
        path: &str,
        params: Params,
    ) -> Result<Value> {
        let auth = self.get_auth()?;
        let query = auth.signed_query(params, self.recv_window(), self.base.nonce())?;
        let headers = auth.headers()?;
        let url = format!("{}/{}?{}", self.rest_url(), path, query);
        debug!(method = %method, path, "WazirX private request");

        let client = &self.base.http_client;
        match method {
            Method::GET => client.get(&url, Some(headers)).await,
            Method::POST => client.post(&url, Some(headers), None).await,
            Method::DELETE => client.delete(&url, Some(headers), None).await,
            other => Err(Error::invalid_request(format!(
                "Unsupported HTTP method: {other}"
            ))),
        }
    }

    fn symbol_params(market: &Market) -> Params {
        let mut params = Params::new();
        params.insert("symbol".into(), market.id.clone());
        params
    }

    async fn loaded_market(&self, symbol: &str) -> Result<Arc<Market>> {
        self.load_markets(false).await?;
        self.market(symbol)
    }

    fn symbol_for(&self, data: &Value, market: Option<&Market>) -> String {
        match market {
            Some(m) => m.symbol.clone(),
            None => self
                .base
                .safe_symbol(safe_string(data, "symbol").as_deref(), None),
        }
    }

    /// Fetch all markets from `exchangeInfo`.
    pub async fn fetch_markets(&self) -> Result<Vec<Market>> {
        let response = self.public_get("exchangeInfo", &Params::new()).await?;
        let symbols = safe_value(&response, "symbols")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::missing_field("symbols"))?;
        let mut markets = Vec::with_capacity(symbols.len());
        for data in symbols {
            match parser::parse_market(data, |id| self.base.safe_currency_code(id)) {
                Ok(market) => markets.push(market),
                Err(e) => warn!(error = %e, "Failed to parse market"),
            }
        }
        info!(count = markets.len(), "Fetched WazirX markets");
        Ok(markets)
    }

    /// Load and cache market data.
    pub async fn load_markets(&self, reload: bool) -> Result<MarketMap> {
        self.base
            .load_markets_with(reload, || self.fetch_markets())
            .await
    }

    /// 24h statistics for one market.
    pub async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let market = self.loaded_market(symbol).await?;
        let response = self
            .public_get("ticker/24hr", &Self::symbol_params(&market))
            .await?;
        Ok(parser::parse_ticker(&response, &market.symbol))
    }

    /// 24h statistics for every market, optionally filtered by symbol.
    pub async fn fetch_tickers(&self, symbols: Option<&[String]>) -> Result<Vec<Ticker>> {
        self.load_markets(false).await?;
        let response = self.public_get("tickers/24hr", &Params::new()).await?;
        Ok(as_array(&response, "tickers")?
            .iter()
            .map(|data| parser::parse_ticker(data, &self.symbol_for(data, None)))
            .filter(|t| symbols.is_none_or(|s| s.contains(&t.symbol)))
            .collect())
    }

    /// Order book snapshot.
    pub async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook> {
        let market = self.loaded_market(symbol).await?;
        let mut params = Self::symbol_params(&market);
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.to_string());
        }
        let response = self.public_get("depth", &params).await?;
        Ok(parser::parse_order_book(&response, &market.symbol))
    }

    /// Recent public trades.
    pub async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        let market = self.loaded_market(symbol).await?;
        let mut params = Self::symbol_params(&market);
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.to_string());
        }
        let response = self.public_get("trades", &params).await?;
        let mut trades = Vec::new();
        for data in as_array(&response, "trades")? {
            match parser::parse_trade(data, &market.symbol) {
                Ok(trade) => trades.push(trade),
                Err(e) => warn!(error = %e, "Failed to parse trade"),
            }
        }
        trades.sort_by_key(|t| t.timestamp);
        if let Some(since) = since {
            trades.retain(|t| t.timestamp.is_some_and(|ts| ts >= since));
        }
        Ok(trades)
    }

    /// Candles. `since` is sent in seconds.
    pub async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>> {
        self.fetch_ohlcv_range(symbol, timeframe, since, None, limit)
            .await
    }

    /// Candles between `since` and `until` (milliseconds, both optional).
    /// The bounds are sent as `startTime`/`endTime` in seconds.
    pub async fn fetch_ohlcv_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        until: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>> {
        let interval = Self::interval(timeframe).ok_or_else(|| {
            Error::not_supported(format!("wazirx fetch_ohlcv timeframe {timeframe}"))
        })?;
        let market = self.loaded_market(symbol).await?;
        let mut params = Self::symbol_params(&market);
        params.insert("interval".into(), interval.into());
        if let Some(since) = since {
            params.insert("startTime".into(), (since / 1000).to_string());
        }
        if let Some(until) = until {
            params.insert("endTime".into(), (until / 1000).to_string());
        }
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.to_string());
        }
        let response = self.public_get("klines", &params).await?;
        as_array(&response, "klines")?
            .iter()
            .map(parser::parse_ohlcv)
            .collect()
    }

    /// System status.
    pub async fn fetch_status(&self) -> Result<ExchangeStatus> {
        let response = self.public_get("systemStatus", &Params::new()).await?;
        Ok(parser::parse_status(&response))
    }

    /// Server time in milliseconds.
    pub async fn fetch_time(&self) -> Result<i64> {
        let response = self.public_get("time", &Params::new()).await?;
        safe_integer(&response, "serverTime").ok_or_else(|| Error::missing_field("serverTime"))
    }

    /// Free and locked funds per asset.
    pub async fn fetch_balance(&self) -> Result<Balance> {
        self.load_markets(false).await?;
        let response = self
            .private_request(Method::GET, "funds", Params::new())
            .await?;
        Ok(parser::parse_balance(&response, |id| {
            self.base.safe_currency_code(id)
        }))
    }

    fn parse_orders(&self, response: &Value, market: Option<&Market>) -> Result<Vec<Order>> {
        let mut orders = Vec::new();
        for data in as_array(response, "orders")? {
            match parser::parse_order(data, &self.symbol_for(data, market)) {
                Ok(order) => orders.push(order),
                Err(e) => warn!(error = %e, "Failed to parse order"),
            }
        }
        Ok(orders)
    }

    /// Order history for `symbol`, which is required.
    pub async fn fetch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>> {
        let symbol = symbol
            .ok_or_else(|| Error::arguments_required("wazirx fetch_orders requires a symbol"))?;
        let market = self.loaded_market(symbol).await?;
        let mut params = Self::symbol_params(&market);
        if let Some(since) = since {
            params.insert("startTime".into(), since.to_string());
        }
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.to_string());
        }
        let response = self
            .private_request(Method::GET, "allOrders", params)
            .await?;
        let mut orders = self.parse_orders(&response, Some(&market))?;
        orders.retain(|o| o.symbol == market.symbol);
        Ok(orders)
    }

    /// Open orders, optionally for one symbol.
    pub async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>> {
        self.load_markets(false).await?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let params = market.as_deref().map(Self::symbol_params).unwrap_or_default();
        let response = self
            .private_request(Method::GET, "openOrders", params)
            .await?;
        let mut orders = self.parse_orders(&response, market.as_deref())?;
        if let Some(since) = since {
            orders.retain(|o| o.timestamp.is_some_and(|ts| ts >= since));
        }
        if let Some(limit) = limit {
            orders.truncate(limit as usize);
        }
        Ok(orders)
    }

    /// Cancel every open order of `symbol`, which is required.
    pub async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>> {
        let symbol = symbol.ok_or_else(|| {
            Error::arguments_required("wazirx cancel_all_orders requires a symbol")
        })?;
        let market = self.loaded_market(symbol).await?;
        let response = self
            .private_request(Method::DELETE, "openOrders", Self::symbol_params(&market))
            .await?;
        self.parse_orders(&response, Some(&market))
    }

    /// Cancel one order. `symbol` is required.
    pub async fn cancel_order(
        &self,
        id: &str,
        symbol: Option<&str>,
        params: Option<&Value>,
    ) -> Result<Order> {
        let symbol = symbol
            .ok_or_else(|| Error::arguments_required("wazirx cancel_order requires a symbol"))?;
        let market = self.loaded_market(symbol).await?;
        let mut request = Self::symbol_params(&market);
        request.insert("orderId".into(), id.to_string());
        merge_params(&mut request, params);
        let response = self
            .private_request(Method::DELETE, "order", request)
            .await?;
        parser::parse_order(&response, &market.symbol)
    }

    /// Place a limit or stop-limit order.
    ///
    /// A `stopPrice` in `params` makes it a `stop_limit` order.
    pub async fn create_order(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        amount: Decimal,
        price: Option<Decimal>,
        params: Option<&Value>,
    ) -> Result<Order> {
        if !matches!(order_type, OrderType::Limit | OrderType::StopLimit) {
            return Err(Error::invalid_order(format!(
                "wazirx create_order supports limit and stop_limit orders only, got {order_type}"
            )));
        }
        let price = price
            .ok_or_else(|| Error::arguments_required("wazirx create_order requires a price"))?;
        let stop_price = params.and_then(|p| safe_string(p, "stopPrice"));
        if order_type == OrderType::StopLimit && stop_price.is_none() {
            return Err(Error::arguments_required(
                "wazirx create_order requires a stopPrice for stop_limit orders",
            ));
        }

        let market = self.loaded_market(symbol).await?;
        let mut request = Self::symbol_params(&market);
        request.insert("side".into(), side.as_str().into());
        request.insert("quantity".into(), amount.normalize().to_string());
        request.insert(
            "price".into(),
            price_to_precision(&market, price).to_string(),
        );
        let wire_type = if stop_price.is_some() { "stop_limit" } else { "limit" };
        request.insert("type".into(), wire_type.into());
        merge_params(&mut request, params);

        let response = self
            .private_request(Method::POST, "order", request)
            .await?;
        parser::parse_order(&response, &market.symbol)
    }
}
