//! BitMart REST calls.

use super::{Bitmart, BitmartAuth, DEFAULT_MY_TRADES_LIMIT, parser};
use coinbridge_core::auth::keysort_urlencode;
use coinbridge_core::parser_utils::{
    safe_bool, safe_decimal, safe_integer, safe_string, safe_string_2, safe_string_index, safe_value,
};
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

/// Request parameters, sorted so signatures are reproducible.
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

/// Rounds `value` to a multiple of `step` with `strategy`.
fn to_step(value: Decimal, step: Option<Decimal>, strategy: RoundingStrategy) -> Decimal {
    match step {
        Some(step) if !step.is_zero() => {
            ((value / step).round_dp_with_strategy(0, strategy) * step).normalize()
        }
        _ => value.normalize(),
    }
}

fn price_to_precision(market: &Market, price: Decimal) -> Decimal {
    to_step(price, market.precision.price, RoundingStrategy::MidpointAwayFromZero)
}

fn amount_to_precision(market: &Market, amount: Decimal) -> Decimal {
    to_step(amount, market.precision.amount, RoundingStrategy::ToZero)
}

/// The `data` member of a response envelope.
fn response_data(response: &Value) -> Result<&Value> {
    safe_value(response, "data").ok_or_else(|| Error::missing_field("data"))
}

/// An array member of `data`, or `data` itself when `key` is `None`.
fn data_array<'a>(response: &'a Value, key: Option<&'static str>) -> Result<&'a [Value]> {
    let data = response_data(response)?;
    let list = match key {
        Some(key) => safe_value(data, key).ok_or_else(|| Error::missing_field(key))?,
        None => data,
    };
    list.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| Error::invalid_value(key.unwrap_or("data"), "expected an array"))
}

impl Bitmart {
    /// Signer built from the configured credentials.
    pub fn get_auth(&self) -> Result<BitmartAuth> {
        self.check_required_credentials()?;
        let (key, secret) = self.base.credentials()?;
        let memo = self.base.config.uid.clone().unwrap_or_default();
        Ok(BitmartAuth::new(key.expose_secret(), secret.expose_secret(), memo))
    }

    pub(crate) async fn public_get(&self, path: &str, params: &Params) -> Result<Value> {
        let mut url = format!("{}/{}", self.rest_url(), path);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&keysort_urlencode(params));
        }
        debug!(url = %url, "BitMart public request");
        self.base.http_client.get(&url, None).await
    }

    /// Signed request. GET parameters go in the query string and are
    /// signed as such; POST parameters are sent and signed as the JSON
    /// body.
    pub(crate) async fn private_request(
        &self,
        method: Method,
        path: &str,
        params: Params,
    ) -> Result<Value> {
        let auth = self.get_auth()?;
        let timestamp = self.base.nonce().to_string();
        let mut url = format!("{}/{}", self.rest_url(), path);

        let payload = if method == Method::GET {
            let query = keysort_urlencode(&params);
            if !query.is_empty() {
                url.push('?');
                url.push_str(&query);
            }
            query
        } else {
            let body: serde_json::Map<String, Value> = params
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            Value::Object(body).to_string()
        };

        let signature = auth.sign(&timestamp, &payload)?;
        let headers = auth.headers(&timestamp, &signature, self.base.option_str("brokerId"))?;
        debug!(method = %method, path, "BitMart private request");

        let client = &self.base.http_client;
        match method {
            Method::GET => client.get(&url, Some(headers)).await,
            Method::POST => client.post_raw(&url, Some(headers), payload).await,
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

    fn market_for(&self, data: &Value, market: Option<&Arc<Market>>) -> Arc<Market> {
        match market {
            Some(m) => Arc::clone(m),
            None => self
                .base
                .safe_market(safe_string(data, "symbol").as_deref(), Some("_")),
        }
    }

    /// Fetch all spot markets from `spot/v1/symbols/details`.
    pub async fn fetch_markets(&self) -> Result<Vec<Market>> {
        let response = self
            .public_get("spot/v1/symbols/details", &Params::new())
            .await?;
        let symbols = data_array(&response, Some("symbols"))?;
        let mut markets = Vec::with_capacity(symbols.len());
        for data in symbols {
            match parser::parse_market(data, |id| self.base.safe_currency_code(id)) {
                Ok(market) => markets.push(market),
                Err(e) => warn!(error = %e, "Failed to parse market"),
            }
        }
        info!(count = markets.len(), "Fetched BitMart markets");
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
            .public_get("spot/v1/ticker", &Self::symbol_params(&market))
            .await?;
        let data = data_array(&response, Some("tickers"))?
            .iter()
            .find(|t| safe_string(t, "symbol").as_deref() == Some(market.id.as_str()))
            .ok_or_else(|| Error::bad_symbol(format!("bitmart has no ticker for {symbol}")))?;
        Ok(parser::parse_ticker(data, &market.symbol))
    }

    /// 24h statistics for every market, optionally filtered by symbol.
    pub async fn fetch_tickers(&self, symbols: Option<&[String]>) -> Result<Vec<Ticker>> {
        self.load_markets(false).await?;
        let response = self.public_get("spot/v2/ticker", &Params::new()).await?;
        Ok(data_array(&response, Some("tickers"))?
            .iter()
            .map(|data| parser::parse_ticker(data, &self.market_for(data, None).symbol))
            .filter(|t| symbols.is_none_or(|s| s.contains(&t.symbol)))
            .collect())
    }

    /// Order book snapshot. The venue caps `limit` at 50.
    pub async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook> {
        let market = self.loaded_market(symbol).await?;
        let mut params = Self::symbol_params(&market);
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.to_string());
        }
        let response = self.public_get("spot/quotation/v3/books", &params).await?;
        Ok(parser::parse_order_book(
            response_data(&response)?,
            &market.symbol,
        ))
    }

    /// Recent public trades, oldest first.
    pub async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        let market = self.loaded_market(symbol).await?;
        let response = self
            .public_get("spot/v1/symbols/trades", &Self::symbol_params(&market))
            .await?;
        let trades = self.parse_trades(data_array(&response, Some("trades"))?, Some(&market));
        Ok(filter_trades(trades, since, limit))
    }

    fn parse_trades(&self, rows: &[Value], market: Option<&Arc<Market>>) -> Vec<Trade> {
        let mut trades = Vec::with_capacity(rows.len());
        for data in rows {
            match parser::parse_trade(data, &self.market_for(data, market)) {
                Ok(trade) => trades.push(trade),
                Err(e) => warn!(error = %e, "Failed to parse trade"),
            }
        }
        trades
    }

    /// Candles.
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
    /// They are sent as `after` (one second earlier, so the candle opening
    /// at `since` is included) and `before`, in seconds.
    pub async fn fetch_ohlcv_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        until: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>> {
        let step = Self::step(timeframe).ok_or_else(|| {
            Error::not_supported(format!("bitmart fetch_ohlcv timeframe {timeframe}"))
        })?;
        let market = self.loaded_market(symbol).await?;
        let mut params = Self::symbol_params(&market);
        params.insert("step".into(), step.to_string());
        if let Some(since) = since {
            params.insert("after".into(), (since / 1000 - 1).to_string());
        }
        if let Some(until) = until {
            params.insert("before".into(), (until / 1000).to_string());
        }
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.to_string());
        }
        let response = self
            .public_get("spot/quotation/v3/klines", &params)
            .await?;
        data_array(&response, None)?
            .iter()
            .map(parser::parse_ohlcv)
            .collect()
    }

    /// Spot service status.
    pub async fn fetch_status(&self) -> Result<ExchangeStatus> {
        let response = self.public_get("system/service", &Params::new()).await?;
        Ok(parser::parse_status(&response))
    }

    /// Server time in milliseconds.
    pub async fn fetch_time(&self) -> Result<i64> {
        let response = self.public_get("system/time", &Params::new()).await?;
        safe_integer(response_data(&response)?, "server_time")
            .ok_or_else(|| Error::missing_field("server_time"))
    }

    /// Spot wallet balances.
    pub async fn fetch_balance(&self) -> Result<Balance> {
        self.load_markets(false).await?;
        let response = self
            .private_request(Method::GET, "spot/v1/wallet", Params::new())
            .await?;
        Ok(parser::parse_balance(&response, |id| {
            self.base.safe_currency_code(id)
        }))
    }

    /// Own fills, newest page first as the venue returns them.
    /// `limit` defaults to 200.
    pub async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        self.load_markets(false).await?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let mut params = market.as_deref().map(Self::symbol_params).unwrap_or_default();
        params.insert(
            "limit".into(),
            limit.unwrap_or(DEFAULT_MY_TRADES_LIMIT).to_string(),
        );
        if let Some(since) = since {
            params.insert("startTime".into(), since.to_string());
        }
        let response = self
            .private_request(Method::POST, "spot/v4/query/trades", params)
            .await?;
        let trades = self.parse_trades(data_array(&response, None)?, market.as_ref());
        Ok(filter_trades(trades, since, limit))
    }

    fn parse_orders(&self, rows: &[Value], market: Option<&Arc<Market>>) -> Vec<Order> {
        let mut orders = Vec::with_capacity(rows.len());
        for data in rows {
            match parser::parse_order(data, &self.market_for(data, market).symbol) {
                Ok(order) => orders.push(order),
                Err(e) => warn!(error = %e, "Failed to parse order"),
            }
        }
        orders
    }

    /// One order by id. A `clientOrderId` in `params` looks the order up
    /// by client id instead.
    pub async fn fetch_order_with_params(
        &self,
        id: &str,
        symbol: Option<&str>,
        params: Option<&Value>,
    ) -> Result<Order> {
        self.load_markets(false).await?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let mut request = Params::new();
        let client_id = params.and_then(|p| safe_string(p, "clientOrderId"));
        let path = if client_id.is_some() {
            "spot/v4/query/client-order"
        } else {
            request.insert("orderId".into(), id.to_string());
            "spot/v4/query/order"
        };
        merge_params(&mut request, params);
        let response = self.private_request(Method::POST, path, request).await?;
        let data = response_data(&response)?;
        parser::parse_order(data, &self.market_for(data, market.as_ref()).symbol)
    }

    /// One order by id.
    pub async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> Result<Order> {
        self.fetch_order_with_params(id, symbol, None).await
    }

    /// Open orders, optionally for one symbol.
    pub async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>> {
        self.fetch_orders_from("spot/v4/query/open-orders", symbol, since, None, limit)
            .await
    }

    /// Filled and canceled orders, optionally for one symbol and up to
    /// `until` (milliseconds).
    pub async fn fetch_closed_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        until: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>> {
        self.fetch_orders_from("spot/v4/query/history-orders", symbol, since, until, limit)
            .await
    }

    async fn fetch_orders_from(
        &self,
        path: &str,
        symbol: Option<&str>,
        since: Option<i64>,
        until: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>> {
        self.load_markets(false).await?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let mut params = market.as_deref().map(Self::symbol_params).unwrap_or_default();
        if let Some(since) = since {
            params.insert("startTime".into(), since.to_string());
        }
        if let Some(until) = until {
            params.insert("endTime".into(), until.to_string());
        }
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.to_string());
        }
        let response = self.private_request(Method::POST, path, params).await?;
        Ok(self.parse_orders(data_array(&response, None)?, market.as_ref()))
    }

    /// Cancel one order. `symbol` is required; a `clientOrderId` in
    /// `params` cancels by client id.
    pub async fn cancel_order(
        &self,
        id: &str,
        symbol: Option<&str>,
        params: Option<&Value>,
    ) -> Result<Order> {
        let symbol = symbol
            .ok_or_else(|| Error::arguments_required("bitmart cancel_order requires a symbol"))?;
        let market = self.loaded_market(symbol).await?;
        let mut request = Self::symbol_params(&market);
        match params.and_then(|p| safe_string_2(p, "clientOrderId", "client_order_id")) {
            Some(client_id) => {
                request.insert("client_order_id".into(), client_id);
            }
            None => {
                request.insert("order_id".into(), id.to_string());
            }
        }
        if let Some(Value::Object(extra)) = params {
            let mut extra = extra.clone();
            extra.remove("clientOrderId");
            merge_params(&mut request, Some(&Value::Object(extra)));
        }
        let response = self
            .private_request(Method::POST, "spot/v3/cancel_order", request)
            .await?;

        let data = response_data(&response)?;
        let id = if data.as_bool() == Some(true) {
            id.to_string()
        } else if let Some(succeeded) = safe_value(data, "succeed") {
            safe_string_index(succeeded, 0).ok_or_else(|| {
                Error::invalid_order(format!("bitmart failed to cancel {symbol} order {id}"))
            })?
        } else if safe_bool(data, "result") == Some(true) {
            id.to_string()
        } else {
            return Err(Error::invalid_order(format!(
                "bitmart {symbol} order {id} is filled or canceled"
            )));
        };
        info!(order_id = %id, symbol, "Canceled BitMart order");
        Ok(Order {
            id,
            symbol: market.symbol.clone(),
            info: data.clone(),
            ..Order::default()
        })
    }

    /// Cancel every open order, optionally for one symbol. The venue does
    /// not list what it canceled, so the result is always empty.
    pub async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>> {
        self.load_markets(false).await?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let params = market.as_deref().map(Self::symbol_params).unwrap_or_default();
        self.private_request(Method::POST, "spot/v1/cancel_orders", params)
            .await?;
        info!(symbol = ?symbol, "Canceled BitMart open orders");
        Ok(Vec::new())
    }

    /// Place a market or limit order.
    ///
    /// `params` may carry `timeInForce` (`IOC`; `FOK` is rejected),
    /// `postOnly`, `clientOrderId`, and for market buys `cost`/`notional`,
    /// the quote amount to spend. Without one, a market buy spends
    /// `amount * price`.
    pub async fn create_order(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        amount: Decimal,
        price: Option<Decimal>,
        params: Option<&Value>,
    ) -> Result<Order> {
        if !matches!(order_type, OrderType::Limit | OrderType::Market) {
            return Err(Error::invalid_order(format!(
                "bitmart create_order supports market and limit orders only, got {order_type}"
            )));
        }
        let market = self.loaded_market(symbol).await?;
        let request = Self::order_request(&market, order_type, side, amount, price, params)?;
        let response = self
            .private_request(Method::POST, "spot/v2/submit_order", request)
            .await?;
        let mut order = parser::parse_order(response_data(&response)?, &market.symbol)?;
        order.order_type = Some(order_type);
        order.side = Some(side);
        order.amount = Some(amount);
        order.price = price;
        info!(order_id = %order.id, symbol, "Created BitMart order");
        Ok(order)
    }

    /// Body of `spot/v2/submit_order`.
    fn order_request(
        market: &Market,
        order_type: OrderType,
        side: OrderSide,
        amount: Decimal,
        price: Option<Decimal>,
        params: Option<&Value>,
    ) -> Result<Params> {
        let mut extra = match params {
            Some(Value::Object(map)) => map.clone(),
            _ => serde_json::Map::new(),
        };
        let time_in_force = extra
            .remove("timeInForce")
            .and_then(|v| v.as_str().map(str::to_uppercase));
        let post_only = extra
            .remove("postOnly")
            .is_some_and(|v| v.as_bool() == Some(true) || v.as_str() == Some("true"));
        if time_in_force.as_deref() == Some("FOK") {
            return Err(Error::invalid_order(
                "bitmart create_order accepts timeInForce IOC or PO only",
            ));
        }
        let post_only = post_only || time_in_force.as_deref() == Some("PO");
        let ioc = time_in_force.as_deref() == Some("IOC");
        if order_type == OrderType::Market && post_only {
            return Err(Error::invalid_order("bitmart market orders cannot be post only"));
        }

        let mut request = Self::symbol_params(market);
        request.insert("side".into(), side.as_str().into());
        let wire_type = if post_only {
            "limit_maker"
        } else if ioc {
            "ioc"
        } else {
            order_type.as_str()
        };
        request.insert("type".into(), wire_type.into());

        if order_type == OrderType::Limit {
            let price = price
                .ok_or_else(|| Error::arguments_required("bitmart create_order requires a price"))?;
            request.insert("size".into(), amount_to_precision(market, amount).to_string());
            request.insert("price".into(), price_to_precision(market, price).to_string());
        } else if side == OrderSide::Buy {
            let view = Value::Object(extra.clone());
            let given = safe_decimal(&view, "cost").or_else(|| safe_decimal(&view, "notional"));
            extra.remove("cost");
            extra.remove("notional");
            let notional = match given {
                Some(notional) => notional,
                None => {
                    let price = price.ok_or_else(|| {
                        Error::invalid_order(
                            "bitmart market buy needs a price or a cost param to compute the quote amount",
                        )
                    })?;
                    amount * price
                }
            };
            request.insert(
                "notional".into(),
                to_step(notional, market.precision.price, RoundingStrategy::ToZero).to_string(),
            );
        } else {
            request.insert("size".into(), amount_to_precision(market, amount).to_string());
        }

        if let Some(client_id) = extra.remove("clientOrderId") {
            let client_id = client_id.as_str().map_or_else(|| client_id.to_string(), str::to_string);
            request.insert("client_order_id".into(), client_id);
        }
        merge_params(&mut request, Some(&Value::Object(extra)));
        Ok(request)
    }
}

/// Oldest first. With `since`, the first `limit` trades from it;
/// without, the latest `limit`.
fn filter_trades(mut trades: Vec<Trade>, since: Option<i64>, limit: Option<u32>) -> Vec<Trade> {
    trades.sort_by_key(|t| t.timestamp);
    let Some(limit) = limit.map(|l| l as usize) else {
        if let Some(since) = since {
            trades.retain(|t| t.timestamp.is_some_and(|ts| ts >= since));
        }
        return trades;
    };
    match since {
        Some(since) => {
            trades.retain(|t| t.timestamp.is_some_and(|ts| ts >= since));
            trades.truncate(limit);
        }
        None => {
            let excess = trades.len().saturating_sub(limit);
            trades.drain(..excess);
        }
    }
    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn market() -> Market {
        let mut market = Market::new_spot("BTC_USDT", "BTC", "USDT");
        market.precision.price = Some(dec!(0.01));
        market.precision.amount = Some(dec!(0.00001));
        market
    }

    #[test]
    fn test_precision() {
        let market = market();
        assert_eq!(price_to_precision(&market, dec!(26000.126)), dec!(26000.13));
        assert_eq!(amount_to_precision(&market, dec!(0.123456)), dec!(0.12345));
        assert_eq!(to_step(dec!(1.50), None, RoundingStrategy::ToZero), dec!(1.5));
    }

    #[test]
    fn test_limit_request() {
        let request = Bitmart::order_request(
            &market(),
            OrderType::Limit,
            OrderSide::Sell,
            dec!(0.123456),
            Some(dec!(26000.126)),
            Some(&json!({"clientOrderId": "abc", "timeInForce": "IOC"})),
        )
        .unwrap();
        assert_eq!(request["symbol"], "BTC_USDT");
        assert_eq!(request["type"], "ioc");
        assert_eq!(request["size"], "0.12345");
        assert_eq!(request["price"], "26000.13");
        assert_eq!(request["client_order_id"], "abc");
        assert!(!request.contains_key("timeInForce"));
        assert!(!request.contains_key("clientOrderId"));
    }

    #[test]
    fn test_post_only_request() {
        let request = Bitmart::order_request(
            &market(),
            OrderType::Limit,
            OrderSide::Buy,
            dec!(1),
            Some(dec!(100)),
            Some(&json!({"postOnly": true})),
        )
        .unwrap();
        assert_eq!(request["type"], "limit_maker");
        assert!(!request.contains_key("postOnly"));
    }

    #[test]
    fn test_market_buy_notional() {
        let request = Bitmart::order_request(
            &market(),
            OrderType::Market,
            OrderSide::Buy,
            dec!(0.5),
            Some(dec!(26000.555)),
            None,
        )
        .unwrap();
        assert_eq!(request["notional"], "13000.27");
        assert!(!request.contains_key("size"));

        let request = Bitmart::order_request(
            &market(),
            OrderType::Market,
            OrderSide::Buy,
            dec!(0.5),
            None,
            Some(&json!({"cost": "25"})),
        )
        .unwrap();
        assert_eq!(request["notional"], "25");
        assert!(!request.contains_key("cost"));

        let err = Bitmart::order_request(&market(), OrderType::Market, OrderSide::Buy, dec!(1), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOrder(_)));
    }

    #[test]
    fn test_market_sell_and_rejections() {
        let request = Bitmart::order_request(
            &market(),
            OrderType::Market,
            OrderSide::Sell,
            dec!(0.000019),
            None,
            None,
        )
        .unwrap();
        assert_eq!(request["size"], "0.00001");
        assert_eq!(request["type"], "market");

        let fok = Bitmart::order_request(
            &market(),
            OrderType::Limit,
            OrderSide::Buy,
            dec!(1),
            Some(dec!(1)),
            Some(&json!({"timeInForce": "FOK"})),
        );
        assert!(matches!(fok, Err(Error::InvalidOrder(_))));
        let no_price =
            Bitmart::order_request(&market(), OrderType::Limit, OrderSide::Buy, dec!(1), None, None);
        assert!(matches!(no_price, Err(Error::ArgumentsRequired(_))));
    }

    #[test]
    fn test_filter_trades() {
        let trade = |ts: i64| {
            let mut t = Trade::default();
            t.timestamp = Some(ts);
            t
        };
        let trades = vec![trade(30), trade(10), trade(20), trade(40)];
        let stamps = |trades: Vec<Trade>| -> Vec<i64> {
            trades.iter().filter_map(|t| t.timestamp).collect()
        };
        assert_eq!(stamps(filter_trades(trades.clone(), Some(15), Some(2))), vec![20, 30]);
        assert_eq!(stamps(filter_trades(trades.clone(), None, Some(2))), vec![30, 40]);
        assert_eq!(stamps(filter_trades(trades, Some(25), None)), vec![30, 40]);
    }

    #[test]
    fn test_data_array() {
        let response = json!({"code": 1000, "data": {"tickers": [1, 2]}});
        assert_eq!(data_array(&response, Some("tickers")).unwrap().len(), 2);
        assert!(data_array(&response, None).is_err());
        assert!(data_array(&json!({"code": 1000}), None).is_err());
    }
}
