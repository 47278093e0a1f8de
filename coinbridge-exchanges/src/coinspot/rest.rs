//! CoinSpot REST calls.
//!
//! Failures come back as `{"status": "error", "message": ...}`, often with
//! HTTP 200; [`check_response`] maps them before callers see the payload.

use super::{Coinspot, CoinspotAuth, parser};
use coinbridge_core::parser_utils::{safe_string, safe_value};
use coinbridge_core::time::yyyymmdd;
use coinbridge_core::types::{Balance, Market, Order, OrderBook, OrderSide, OrderStatus, OrderType, Ticker, Trade};
use coinbridge_core::{Error, MarketMap, Result};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Maps an error envelope to an [`Error`].
pub(crate) fn check_response(body: &Value) -> Option<Error> {
    if safe_string(body, "status").as_deref() != Some("error") {
        return None;
    }
    let message = safe_string(body, "message").unwrap_or_else(|| body.to_string());
    let lower = message.to_lowercase();
    Some(if lower.contains("insufficient") {
        Error::insufficient_balance(message)
    } else if lower.contains("nonce") {
        Error::invalid_nonce(message)
    } else if lower.contains("api key") || lower.contains("sign") {
        Error::authentication(message)
    } else {
        Error::exchange("error", message)
    })
}

/// JSON number from a decimal.
fn number(field: &'static str, value: Decimal) -> Result<Value> {
    value
        .normalize()
        .to_string()
        .parse::<Number>()
        .map(Value::Number)
        .map_err(|e| Error::invalid_value(field, e.to_string()))
}

/// Copies the members of a params object into `body`, except `omit`.
fn extend(body: &mut Map<String, Value>, params: Option<&Value>, omit: &[&str]) {
    if let Some(Value::Object(map)) = params {
        for (key, value) in map {
            if !omit.contains(&key.as_str()) {
                body.insert(key.clone(), value.clone());
            }
        }
    }
}

impl Coinspot {
    /// Signer built from the configured credentials.
    pub fn get_auth(&self) -> Result<CoinspotAuth> {
        let (key, secret) = self.base.credentials()?;
        Ok(CoinspotAuth::new(key.expose_secret(), secret.expose_secret()))
    }

    async fn public_get(&self, path: &str) -> Result<Value> {
        let url = format!("{}/{}", self.public_url(), path);
        debug!(url = %url, "CoinSpot public request");
        self.base.http_client.get(&url, None).await
    }

    /// Signed POST of `{nonce, ...params}`.
    pub(crate) async fn private_post(&self, path: &str, params: Map<String, Value>) -> Result<Value> {
        let auth = self.get_auth()?;
        let mut body = Map::new();
        body.insert("nonce".into(), Value::from(self.base.nonce()));
        body.extend(params);
        let body = Value::Object(body).to_string();
        let headers = auth.headers(&body)?;

        let url = format!("{}/{}", self.private_url(), path);
        debug!(url = %url, "CoinSpot private request");
        self.base.http_client.post_raw(&url, Some(headers), body).await
    }

    /// The fixed AUD markets.
    pub async fn fetch_markets(&self) -> Result<Vec<Market>> {
        Ok(Self::static_markets())
    }

    /// Load and cache market data.
    pub async fn load_markets(&self, reload: bool) -> Result<MarketMap> {
        self.base
            .load_markets_with(reload, || self.fetch_markets())
            .await
    }

    async fn loaded_market(&self, symbol: &str) -> Result<Arc<Market>> {
        self.load_markets(false).await?;
        self.market(symbol)
    }

    fn cointype(market: &Market) -> Map<String, Value> {
        let mut request = Map::new();
        request.insert("cointype".into(), Value::String(market.id.clone()));
        request
    }

    /// Latest prices for one market.
    pub async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker> {
        let market = self.loaded_market(symbol).await?;
        let response = self.public_get("latest").await?;
        let ticker = safe_value(&response, "prices")
            .and_then(|prices| safe_value(prices, &market.id.to_lowercase()))
            .ok_or_else(|| Error::bad_symbol(format!("coinspot has no price for {symbol}")))?;
        Ok(parser::parse_ticker(ticker, &market))
    }

    /// Latest prices for the known markets, optionally filtered by symbol.
    pub async fn fetch_tickers(&self, symbols: Option<&[String]>) -> Result<Vec<Ticker>> {
        self.load_markets(false).await?;
        let response = self.public_get("latest").await?;
        let Some(Value::Object(prices)) = safe_value(&response, "prices") else {
            return Err(Error::missing_field("prices"));
        };
        let mut tickers = Vec::new();
        for (id, data) in prices {
            let Ok(market) = self.base.market_by_id(id) else {
                debug!(id = %id, "Skipping price for unknown market");
                continue;
            };
            if !market.is_spot() {
                continue;
            }
            if symbols.is_some_and(|s| !s.contains(&market.symbol)) {
                continue;
            }
            tickers.push(parser::parse_ticker(data, &market));
        }
        Ok(tickers)
    }

    /// Open buy and sell orders for a market.
    pub async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook> {
        let market = self.loaded_market(symbol).await?;
        let response = self.private_post("orders", Self::cointype(&market)).await?;
        let mut book = parser::parse_order_book(&response, &market.symbol);
        book.limit(limit.map(|l| l as usize));
        Ok(book)
    }

    /// Recently completed orders for a market.
    pub async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        let market = self.loaded_market(symbol).await?;
        let response = self
            .private_post("orders/history", Self::cointype(&market))
            .await?;
        let trades = self.parse_trades(safe_value(&response, "orders"), Some(&market));
        Ok(parser::filter_trades(trades, since, limit))
    }

    /// The account's buy and sell transactions.
    pub async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        self.load_markets(false).await?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let mut request = Map::new();
        if let Some(since) = since {
            request.insert("startdate".into(), Value::String(yyyymmdd(since, "-")?));
        }
        let response = self.private_post("ro/my/transactions", request).await?;

        let mut trades = Vec::new();
        for (key, side) in [("buyorders", OrderSide::Buy), ("sellorders", OrderSide::Sell)] {
            let mut parsed = self.parse_trades(safe_value(&response, key), market.as_deref());
            for trade in &mut parsed {
                trade.side = Some(side);
            }
            trades.append(&mut parsed);
        }
        if let Some(market) = &market {
            trades.retain(|t| t.symbol == market.symbol);
        }
        Ok(parser::filter_trades(trades, since, limit))
    }

    fn parse_trades(&self, rows: Option<&Value>, market: Option<&Market>) -> Vec<Trade> {
        let rows = rows.and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
        let mut trades = Vec::with_capacity(rows.len());
        for row in rows {
            let symbol = match market {
                Some(m) => m.symbol.clone(),
                None => self
                    .base
                    .safe_symbol(safe_string(row, "market").as_deref(), Some("/")),
            };
            match parser::parse_trade(row, &symbol) {
                Ok(trade) => trades.push(trade),
                Err(e) => warn!(error = %e, "Failed to parse trade"),
            }
        }
        trades
    }

    /// Account totals per currency.
    pub async fn fetch_balance(&self) -> Result<Balance> {
        self.load_markets(false).await?;
        let response = self.private_post("my/balances", Map::new()).await?;
        Ok(parser::parse_balance(&response, |id| self.base.safe_currency_code(id)))
    }

    /// Place a limit order. Market orders are rejected.
    pub async fn create_order(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        amount: Decimal,
        price: Option<Decimal>,
        params: Option<&Value>,
    ) -> Result<Order> {
        if order_type != OrderType::Limit {
            return Err(Error::invalid_order(format!(
                "coinspot create_order allows limit orders only, got {order_type}"
            )));
        }
        let price = price.ok_or_else(|| {
            Error::arguments_required("coinspot create_order requires a price")
        })?;
        let market = self.loaded_market(symbol).await?;
        let mut request = Self::cointype(&market);
        request.insert("amount".into(), number("amount", amount)?);
        request.insert("rate".into(), number("rate", price)?);
        extend(&mut request, params, &[]);

        let response = self
            .private_post(&format!("my/{}", side.as_str()), request)
            .await?;
        let mut order = Order {
            id: safe_string(&response, "id").unwrap_or_default(),
            symbol: market.symbol.clone(),
            order_type: Some(OrderType::Limit),
            side: Some(side),
            price: Some(price),
            amount: Some(amount),
            status: Some(OrderStatus::Open),
            info: response,
            ..Order::default()
        };
        order.complete();
        Ok(order)
    }

    /// Cancel an order. `params.side` must be `buy` or `sell`.
    pub async fn cancel_order(
        &self,
        id: &str,
        symbol: Option<&str>,
        params: Option<&Value>,
    ) -> Result<Order> {
        let side = match params.and_then(|p| safe_string(p, "side")).as_deref() {
            Some("buy") => OrderSide::Buy,
            Some("sell") => OrderSide::Sell,
            _ => {
                return Err(Error::arguments_required(
                    "coinspot cancel_order requires a side parameter, \"buy\" or \"sell\"",
                ));
            }
        };
        let mut request = Map::new();
        request.insert("id".into(), Value::String(id.to_string()));
        extend(&mut request, params, &["side"]);

        let response = self
            .private_post(&format!("my/{}/cancel", side.as_str()), request)
            .await?;
        Ok(Order {
            id: id.to_string(),
            symbol: symbol.unwrap_or_default().to_string(),
            side: Some(side),
            status: Some(OrderStatus::Canceled),
            info: response,
            ..Order::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinbridge_core::ExchangeConfig;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn exchange(server: &MockServer) -> Coinspot {
        let config = ExchangeConfig::builder()
            .api_key("key")
            .secret("secret")
            .url_override("public", format!("{}/pubapi", server.uri()))
            .url_override("private", format!("{}/api", server.uri()))
            .build();
        Coinspot::new(config).unwrap()
    }

    #[test]
    fn test_check_response() {
        assert!(check_response(&json!({"status": "ok"})).is_none());
        let err = check_response(&json!({"status": "error", "message": "Invalid API key"})).unwrap();
        assert!(err.as_authentication().is_some());
        let err = check_response(&json!({"status": "error", "message": "Insufficient funds"})).unwrap();
        assert!(matches!(err, Error::InsufficientBalance(_)));
        let err = check_response(&json!({"status": "error", "message": "Coin not found"})).unwrap();
        assert_eq!(err.exchange_code(), Some("error"));
    }

    #[test]
    fn test_number() {
        assert_eq!(number("amount", dec!(0.50)).unwrap(), json!(0.5));
        assert_eq!(number("rate", dec!(90000)).unwrap(), json!(90000));
    }

    #[tokio::test]
    async fn test_fetch_ticker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pubapi/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "prices": {
                    "btc": {"bid": "90000", "ask": "90100", "last": "90050"},
                    "eth": {"bid": "5000", "ask": "5010", "last": "5005"},
                    "unknown": {"bid": "1", "ask": "2", "last": "1"}
                }
            })))
            .mount(&server)
            .await;

        let exchange = exchange(&server);
        let ticker = exchange.fetch_ticker("BTC/AUD").await.unwrap();
        assert_eq!(ticker.last.unwrap().as_decimal(), dec!(90050));

        let tickers = exchange.fetch_tickers(None).await.unwrap();
        assert_eq!(tickers.len(), 2);
        let only_eth = exchange
            .fetch_tickers(Some(&["ETH/AUD".to_string()]))
            .await
            .unwrap();
        assert_eq!(only_eth.len(), 1);
        assert_eq!(only_eth[0].symbol, "ETH/AUD");
    }

    #[tokio::test]
    async fn test_fetch_balance_signed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/my/balances"))
            .and(header_exists("sign"))
            .and(header_exists("key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "balance": {"aud": "1200.5", "drk": "3"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let balance = exchange(&server).fetch_balance().await.unwrap();
        assert_eq!(balance.get("AUD").unwrap().total, Some(dec!(1200.5)));
        assert_eq!(balance.get("DASH").unwrap().total, Some(dec!(3)));
    }

    #[tokio::test]
    async fn test_fetch_my_trades_merges_sides() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ro/my/transactions"))
            .and(body_partial_json(json!({"startdate": "2024-01-01"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "buyorders": [{
                    "market": "BTC/AUD", "amount": "0.1", "total": "9000",
                    "created": "2024-01-02T00:00:00.000Z", "audfeeExGst": "9", "audGst": "0.9"
                }],
                "sellorders": [{
                    "market": "ETH/AUD", "amount": "1", "audtotal": "5000",
                    "created": "2024-01-03T00:00:00.000Z", "audfeeExGst": "5", "audGst": "0.5"
                }]
            })))
            .mount(&server)
            .await;

        let trades = exchange(&server)
            .fetch_my_trades(None, Some(1_704_067_200_000), None)
            .await
            .unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].symbol, "BTC/AUD");
        assert_eq!(trades[0].side, Some(OrderSide::Buy));
        assert_eq!(trades[0].price.as_decimal(), dec!(90000));
        assert_eq!(trades[1].symbol, "ETH/AUD");
        assert_eq!(trades[1].side, Some(OrderSide::Sell));
    }

    #[tokio::test]
    async fn test_create_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/my/buy"))
            .and(body_partial_json(json!({"cointype": "btc", "amount": 0.5, "rate": 90000})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok", "id": "abc123", "coin": "BTC", "market": "BTC/AUD"
            })))
            .mount(&server)
            .await;

        let exchange = exchange(&server);
        let order = exchange
            .create_order("BTC/AUD", OrderType::Limit, OrderSide::Buy, dec!(0.5), Some(dec!(90000)), None)
            .await
            .unwrap();
        assert_eq!(order.id, "abc123");
        assert_eq!(order.status, Some(OrderStatus::Open));

        let err = exchange
            .create_order("BTC/AUD", OrderType::Market, OrderSide::Buy, dec!(0.5), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOrder(_)));
    }

    #[tokio::test]
    async fn test_cancel_order_requires_side() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/my/sell/cancel"))
            .and(body_partial_json(json!({"id": "abc123"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let exchange = exchange(&server);
        let err = exchange.cancel_order("abc123", None, None).await.unwrap_err();
        assert!(matches!(err, Error::ArgumentsRequired(_)));

        let order = exchange
            .cancel_order("abc123", Some("BTC/AUD"), Some(&json!({"side": "sell"})))
            .await
            .unwrap();
        assert_eq!(order.status, Some(OrderStatus::Canceled));
        assert_eq!(order.side, Some(OrderSide::Sell));
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/my/balances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "error", "message": "Invalid API key"
            })))
            .mount(&server)
            .await;

        let err = exchange(&server).fetch_balance().await.unwrap_err();
        assert!(err.as_authentication().is_some());
    }
}
