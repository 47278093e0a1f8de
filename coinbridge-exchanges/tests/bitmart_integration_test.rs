//! BitMart integration tests.
//!
//! Requests run against a local mock server through the `rest` url
//! override. Signed calls are checked by recomputing `X-BM-SIGN` from the
//! request the server received.

use coinbridge_core::ExchangeConfig;
use coinbridge_core::auth::{DigestFormat, HashAlgorithm, hmac_sign};
use coinbridge_core::error::Error;
use coinbridge_core::exchange::Exchange;
use coinbridge_core::types::{OrderSide, OrderStatus, OrderType, Price, Timeframe};
use coinbridge_exchanges::bitmart::Bitmart;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const MEMO: &str = "test-memo";
const SECRET: &str = "test-secret";

fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "message": "OK",
        "code": 1000,
        "trace": "886fb6ae-456b-4654-b4e0-d681ac05cea1",
        "data": data
    }))
}

/// Whether `X-BM-SIGN` is the HMAC of `timestamp#memo#payload`, where the
/// payload is the query for GET and the body otherwise.
fn signed_correctly(request: &Request) -> bool {
    let header_str = |name: &str| {
        request
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let (Some(timestamp), Some(signature)) = (header_str("X-BM-TIMESTAMP"), header_str("X-BM-SIGN"))
    else {
        return false;
    };
    let payload = if request.method.as_str() == "GET" {
        request.url.query().unwrap_or_default().to_string()
    } else {
        String::from_utf8_lossy(&request.body).into_owned()
    };
    hmac_sign(
        &format!("{timestamp}#{MEMO}#{payload}"),
        SECRET,
        HashAlgorithm::Sha256,
        DigestFormat::Hex,
    )
    .is_ok_and(|expected| expected == signature)
}

async fn mount_symbols(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/spot/v1/symbols/details"))
        .respond_with(ok(json!({"symbols": [
            {
                "symbol": "BTC_USDT", "symbol_id": 53, "base_currency": "BTC",
                "quote_currency": "USDT", "base_min_size": "0.00001",
                "base_max_size": "100000000", "price_max_precision": 2,
                "min_buy_amount": "5", "min_sell_amount": "5", "trade_status": "trading"
            },
            {
                "symbol": "GDT_USDT", "symbol_id": 900, "base_currency": "GDT",
                "quote_currency": "USDT", "base_min_size": "1", "price_max_precision": 6,
                "trade_status": "trading"
            },
            {"symbol": "BROKEN"}
        ]})))
        .mount(server)
        .await;
}

async fn public_exchange(server: &MockServer) -> Bitmart {
    mount_symbols(server).await;
    let config = ExchangeConfig::builder()
        .url_override("rest", server.uri())
        .build();
    Bitmart::new(config).unwrap()
}

async fn private_exchange(server: &MockServer) -> Bitmart {
    mount_symbols(server).await;
    let config = ExchangeConfig::builder()
        .api_key("test-key")
        .secret(SECRET)
        .uid(MEMO)
        .url_override("rest", server.uri())
        .build();
    Bitmart::new(config).unwrap()
}

#[tokio::test]
async fn test_markets_use_common_currencies() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let exchange = public_exchange(&server).await;

    let markets = exchange.load_markets(false).await?;
    assert_eq!(markets.len(), 2);
    let btc = exchange.market("BTC/USDT")?;
    assert_eq!(btc.id, "BTC_USDT");
    assert_eq!(btc.precision.price, Some(dec!(0.01)));
    assert!(exchange.market("Gorilla Diamond/USDT").is_ok());
    Ok(())
}

#[tokio::test]
async fn test_fetch_ticker_picks_requested_symbol() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spot/v1/ticker"))
        .and(query_param("symbol", "BTC_USDT"))
        .respond_with(ok(json!({"tickers": [{
            "symbol": "BTC_USDT", "last_price": "26000.5", "quote_volume_24h": "1000",
            "base_volume_24h": "0.04", "high_24h": "26500", "low_24h": "25500",
            "open_24h": "25800", "close_24h": "26000.5", "best_ask": "26001",
            "best_ask_size": "0.5", "best_bid": "26000", "best_bid_size": "0.7",
            "fluctuation": "0.0078"
        }]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/spot/v2/ticker"))
        .respond_with(ok(json!({"tickers": [
            {"symbol": "BTC_USDT", "close_24h": "26000.5"},
            {"symbol": "GDT_USDT", "close_24h": "0.11"}
        ]})))
        .mount(&server)
        .await;

    let exchange = public_exchange(&server).await;
    let ticker = exchange.fetch_ticker("BTC/USDT").await?;
    assert_eq!(ticker.symbol, "BTC/USDT");
    assert_eq!(ticker.bid, Some(Price::new(dec!(26000))));
    assert_eq!(ticker.percentage, Some(dec!(0.78)));

    let tickers = exchange
        .fetch_tickers(Some(&["Gorilla Diamond/USDT".to_string()]))
        .await?;
    assert_eq!(tickers.len(), 1);
    assert_eq!(tickers[0].last, Some(Price::new(dec!(0.11))));
    Ok(())
}

#[tokio::test]
async fn test_order_book_and_trades() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spot/quotation/v3/books"))
        .and(query_param("symbol", "BTC_USDT"))
        .and(query_param("limit", "2"))
        .respond_with(ok(json!({
            "ts": "1695264191808", "symbol": "BTC_USDT",
            "asks": [["26942.57", "0.06492"], ["26942.73", "0.05447"]],
            "bids": [["26942.56", "0.19425"], ["26941.53", "0.00300"]]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/spot/v1/symbols/trades"))
        .respond_with(ok(json!({"trades": [
            {"amount": "52", "order_time": 1_599_652_045_394_i64, "price": "26000", "count": "0.002", "type": "sell"},
            {"amount": "26", "order_time": 1_599_652_040_000_i64, "price": "26000", "count": "0.001", "type": "buy"}
        ]})))
        .mount(&server)
        .await;

    let exchange = public_exchange(&server).await;
    let book = exchange.fetch_order_book("BTC/USDT", Some(2)).await?;
    assert_eq!(book.timestamp, Some(1_695_264_191_808));
    assert!(book.best_bid().unwrap().price < book.best_ask().unwrap().price);

    let trades = exchange.fetch_trades("BTC/USDT", None, None).await?;
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].side, Some(OrderSide::Buy));
    assert_eq!(trades[1].timestamp, Some(1_599_652_045_394));
    Ok(())
}

#[tokio::test]
async fn test_fetch_ohlcv_sends_step_and_seconds() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spot/quotation/v3/klines"))
        .and(query_param("step", "60"))
        .and(query_param("after", "1699999999"))
        .and(query_param("before", "1700007200"))
        .respond_with(ok(json!([
            ["1700000000", "36746.49", "36758.71", "36736.13", "36755.99", "2.83965", "104353.57"],
            ["1700003600", "36756.00", "36758.70", "36737.14", "36737.63", "1.96070", "72047.10"]
        ])))
        .mount(&server)
        .await;

    let exchange = public_exchange(&server).await;
    let candles = exchange
        .fetch_ohlcv_range(
            "BTC/USDT",
            Timeframe::H1,
            Some(1_700_000_000_000),
            Some(1_700_007_200_500),
            None,
        )
        .await?;
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[1].timestamp, 1_700_003_600_000);

    let err = exchange
        .fetch_ohlcv("BTC/USDT", Timeframe::H12, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotSupported(_)));
    Ok(())
}

#[tokio::test]
async fn test_signed_get_balance() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spot/v1/wallet"))
        .and(header("X-BM-KEY", "test-key"))
        .and(signed_correctly)
        .respond_with(ok(json!({"wallet": [
            {"id": "BTC", "available": "0.5", "frozen": "0.25"},
            {"id": "GDT", "available": "10", "frozen": "0"}
        ]})))
        .mount(&server)
        .await;

    let exchange = private_exchange(&server).await;
    let balance = exchange.fetch_balance().await?;
    assert_eq!(balance.get("BTC").unwrap().total, Some(dec!(0.75)));
    assert_eq!(balance.get("Gorilla Diamond").unwrap().free, Some(dec!(10)));
    Ok(())
}

#[tokio::test]
async fn test_create_limit_order_signs_body() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/spot/v2/submit_order"))
        .and(body_partial_json(json!({
            "symbol": "BTC_USDT", "side": "buy", "type": "limit_maker",
            "size": "0.12345", "price": "26000.13"
        })))
        .and(signed_correctly)
        .respond_with(ok(json!({"order_id": "2707217580"})))
        .mount(&server)
        .await;

    let exchange = private_exchange(&server).await;
    let order = exchange
        .create_order(
            "BTC/USDT",
            OrderType::Limit,
            OrderSide::Buy,
            dec!(0.123456),
            Some(dec!(26000.126)),
            Some(&json!({"postOnly": true})),
        )
        .await?;
    assert_eq!(order.id, "2707217580");
    assert_eq!(order.symbol, "BTC/USDT");
    assert_eq!(order.order_type, Some(OrderType::Limit));
    assert_eq!(order.amount, Some(dec!(0.123456)));
    Ok(())
}

#[tokio::test]
async fn test_error_codes_are_mapped() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/spot/v2/submit_order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Balance not enough", "code": 50020,
            "trace": "7c709d6a-3292-462c-98c5-32362540aeef", "data": {}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/spot/v4/query/order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Order not found", "code": 50005, "data": {}
        })))
        .mount(&server)
        .await;

    let exchange = private_exchange(&server).await;
    let err = exchange
        .create_order("BTC/USDT", OrderType::Market, OrderSide::Sell, dec!(1), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientBalance(_)), "{err}");

    let err = exchange.fetch_order("42", Some("BTC/USDT")).await.unwrap_err();
    assert!(matches!(err, Error::OrderNotFound(_)), "{err}");
    Ok(())
}

#[tokio::test]
async fn test_missing_memo_fails_before_request() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_symbols(&server).await;
    let config = ExchangeConfig::builder()
        .api_key("test-key")
        .secret(SECRET)
        .url_override("rest", server.uri())
        .build();
    let exchange = Bitmart::new(config)?;

    let err = exchange.fetch_balance().await.unwrap_err();
    assert!(err.as_authentication().is_some(), "{err}");
    Ok(())
}

#[tokio::test]
async fn test_fetch_order_and_open_orders() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let order = json!({
        "orderId": "118100034543076010", "clientOrderId": "c-1", "symbol": "BTC_USDT",
        "side": "sell", "orderMode": "spot", "type": "limit", "state": "filled",
        "price": "26000", "priceAvg": "26000", "size": "0.01", "filledSize": "0.01",
        "notional": "260", "filledNotional": "260", "createTime": 1_681_701_557_927_i64,
        "updateTime": 1_681_701_559_408_i64
    });
    Mock::given(method("POST"))
        .and(path("/spot/v4/query/order"))
        .and(body_partial_json(json!({"orderId": "118100034543076010"})))
        .and(signed_correctly)
        .respond_with(ok(order.clone()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/spot/v4/query/open-orders"))
        .and(signed_correctly)
        .respond_with(ok(json!([
            {"orderId": "1", "symbol": "BTC_USDT", "side": "buy", "type": "limit",
             "state": "new", "price": "25000", "size": "0.01", "filledSize": "0"},
            {"orderId": "2", "symbol": "GDT_USDT", "side": "buy", "type": "ioc",
             "state": "partially_filled", "price": "0.1", "size": "10", "filledSize": "4"}
        ])))
        .mount(&server)
        .await;

    let exchange = private_exchange(&server).await;
    let fetched = exchange.fetch_order("118100034543076010", None).await?;
    assert_eq!(fetched.symbol, "BTC/USDT");
    assert_eq!(fetched.status, Some(OrderStatus::Closed));
    assert_eq!(fetched.client_order_id.as_deref(), Some("c-1"));

    let open = exchange.fetch_open_orders(None, None, None).await?;
    assert_eq!(open.len(), 2);
    assert_eq!(open[1].symbol, "Gorilla Diamond/USDT");
    assert_eq!(open[1].time_in_force.as_deref(), Some("IOC"));
    assert_eq!(open[1].remaining, Some(dec!(6)));
    Ok(())
}

#[tokio::test]
async fn test_cancel_order_outcomes() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/spot/v3/cancel_order"))
        .and(body_partial_json(json!({"order_id": "100"})))
        .respond_with(ok(json!({"result": true})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/spot/v3/cancel_order"))
        .and(body_partial_json(json!({"order_id": "200"})))
        .respond_with(ok(json!({"result": false})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/spot/v1/cancel_orders"))
        .and(body_partial_json(json!({"symbol": "BTC_USDT"})))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let exchange = private_exchange(&server).await;
    let canceled = exchange.cancel_order("100", Some("BTC/USDT"), None).await?;
    assert_eq!(canceled.id, "100");
    assert_eq!(canceled.symbol, "BTC/USDT");

    let err = exchange
        .cancel_order("200", Some("BTC/USDT"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOrder(_)));

    let err = exchange.cancel_order("1", None, None).await.unwrap_err();
    assert!(matches!(err, Error::ArgumentsRequired(_)));

    assert!(exchange.cancel_all_orders(Some("BTC/USDT")).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_my_trades_through_trait() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/spot/v4/query/trades"))
        .and(body_partial_json(json!({"symbol": "BTC_USDT", "limit": "200"})))
        .respond_with(ok(json!([
            {"tradeId": "2", "orderId": "9", "symbol": "BTC_USDT", "side": "buy", "type": "limit",
             "price": "26000", "size": "0.001", "notional": "26", "fee": "0.0000025",
             "feeCoinName": "BTC", "tradeRole": "maker", "createTime": 1_695_658_457_900_i64},
            {"tradeId": "1", "orderId": "9", "symbol": "BTC_USDT", "side": "buy", "type": "limit",
             "price": "26000", "size": "0.002", "notional": "52", "fee": "0.000005",
             "feeCoinName": "BTC", "tradeRole": "maker", "createTime": 1_695_658_457_836_i64}
        ])))
        .mount(&server)
        .await;

    let exchange = private_exchange(&server).await;
    let exchange: &dyn Exchange = &exchange;
    let trades = exchange.fetch_my_trades(Some("BTC/USDT"), None, None).await?;
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].id.as_deref(), Some("1"));
    assert_eq!(trades[1].order.as_deref(), Some("9"));
    Ok(())
}

#[tokio::test]
async fn test_public_calls_send_no_query_when_empty() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/system/time"))
        .and(query_param_is_missing("symbol"))
        .respond_with(ok(json!({"server_time": 1_700_000_000_000_i64})))
        .mount(&server)
        .await;

    let exchange = public_exchange(&server).await;
    assert_eq!(exchange.fetch_time().await?, 1_700_000_000_000);
    Ok(())
}
