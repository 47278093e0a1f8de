//! Coinbase Pro integration tests.
//!
//! Products come from a mock REST server; the level2 feed is served by a
//! local WebSocket server that answers a subscribe with a snapshot and
//! then streams `l2update` frames.

use coinbridge_core::error::Error;
use coinbridge_core::exchange::Exchange;
use coinbridge_core::types::Price;
use coinbridge_core::ws_client::WsConnectionState;
use coinbridge_core::ws_exchange::WsExchange;
use coinbridge_core::ExchangeConfig;
use coinbridge_exchanges::coinbasepro::CoinbasePro;
use futures_util::{SinkExt, StreamExt};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{Duration, interval, timeout};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn products() -> Value {
    json!([
        {
            "id": "BTC-USD", "base_currency": "BTC", "quote_currency": "USD",
            "base_min_size": "0.001", "base_max_size": "10000",
            "quote_increment": "0.01", "base_increment": "0.00000001",
            "min_market_funds": "10", "status": "online", "trading_disabled": false
        },
        {
            "id": "ETH-EUR", "base_currency": "ETH", "quote_currency": "EUR",
            "quote_increment": "0.01", "status": "online", "trading_disabled": true
        },
        {"id": "BROKEN"}
    ])
}

async fn mount_products(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products()))
        .mount(server)
        .await;
}

/// Serves the level2 feed. Subscribe frames are forwarded to the returned
/// channel. After the snapshot, one update per tick moves the best ask.
async fn spawn_feed() -> (String, mpsc::UnboundedReceiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else {
                    return;
                };
                let mut ticker = interval(Duration::from_millis(50));
                let mut subscribed = false;
                let mut sequence = 0u32;
                loop {
                    tokio::select! {
                        msg = ws.next() => {
                            let text = match msg {
                                Some(Ok(Message::Text(text))) => text,
                                Some(Ok(_)) => continue,
                                _ => break,
                            };
                            let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) else {
                                continue;
                            };
                            let _ = tx.send(frame);
                            let snapshot = json!({
                                "type": "snapshot",
                                "product_id": "BTC-USD",
                                "bids": [["10101.10", "0.45054140"], ["10100.00", "1.0"], ["10099.00", "2.5"]],
                                "asks": [["10102.55", "0.57753524"], ["10103.00", "1.0"]]
                            });
                            if ws.send(Message::Text(snapshot.to_string().into())).await.is_err() {
                                break;
                            }
                            subscribed = true;
                        }
                        _ = ticker.tick(), if subscribed => {
                            sequence += 1;
                            let update = json!({
                                "type": "l2update",
                                "product_id": "BTC-USD",
                                "time": "2019-08-14T20:42:27.265Z",
                                "changes": [
                                    ["buy", "10100.00", "0"],
                                    ["sell", "10102.55", format!("{sequence}.0")]
                                ]
                            });
                            if ws.send(Message::Text(update.to_string().into())).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }
    });

    (url, rx)
}

async fn exchange(rest: &MockServer, ws_url: &str) -> CoinbasePro {
    mount_products(rest).await;
    let config = ExchangeConfig::builder()
        .url_override("rest", rest.uri())
        .url_override("ws", ws_url)
        .build();
    CoinbasePro::new(config).unwrap()
}

// ==================== Markets ====================

#[tokio::test]
async fn test_load_markets_from_products() {
    let rest = MockServer::start().await;
    let exchange = exchange(&rest, "ws://127.0.0.1:1").await;

    let markets = Exchange::load_markets(&exchange, false).await.unwrap();
    assert_eq!(markets.len(), 2);

    let btc = exchange.market("BTC/USD").unwrap();
    assert_eq!(btc.id, "BTC-USD");
    assert!(btc.active);
    assert_eq!(btc.precision.price, Some(dec!(0.01)));
    assert_eq!(btc.limits.amount.min, Some(dec!(0.001)));
    assert_eq!(btc.limits.cost.min, Some(dec!(10)));

    assert!(!exchange.market("ETH/EUR").unwrap().active);
    assert!(exchange.capabilities().has("watchOrderBook"));
}

#[tokio::test]
async fn test_unknown_symbol_fails_before_connecting() {
    let rest = MockServer::start().await;
    let exchange = exchange(&rest, "ws://127.0.0.1:1").await;

    let err = exchange.watch_order_book("DOGE/USD", None).await.unwrap_err();
    assert!(matches!(err, Error::MarketNotFound(_)), "got {err}");
    assert_eq!(exchange.ws_state(), WsConnectionState::Disconnected);
}

// ==================== Level2 Stream ====================

#[tokio::test]
async fn test_watch_order_book_snapshot_then_updates() {
    let rest = MockServer::start().await;
    let (ws_url, mut subscriptions) = spawn_feed().await;
    let exchange = exchange(&rest, &ws_url).await;

    let book = timeout(Duration::from_secs(5), exchange.watch_order_book("BTC/USD", None))
        .await
        .expect("snapshot")
        .unwrap();
    assert_eq!(book.symbol, "BTC/USD");
    assert_eq!(book.bids.len(), 3);
    assert_eq!(book.best_bid().unwrap().price, Price::new(dec!(10101.10)));
    assert_eq!(book.best_ask().unwrap().price, Price::new(dec!(10102.55)));

    let frame = subscriptions.recv().await.unwrap();
    assert_eq!(
        frame,
        json!({"type": "subscribe", "product_ids": ["BTC-USD"], "channels": ["level2"]})
    );

    let book = timeout(Duration::from_secs(5), exchange.watch_order_book("BTC/USD", None))
        .await
        .expect("update")
        .unwrap();
    assert_eq!(book.bids.len(), 2);
    assert!(book.bids.iter().all(|level| level.price != Price::new(dec!(10100))));
    assert!(book.timestamp.is_some());

    // Second watch reuses the subscription.
    assert!(subscriptions.try_recv().is_err());

    exchange.ws_close().await.unwrap();
    assert_eq!(exchange.ws_state(), WsConnectionState::Disconnected);
}

#[tokio::test]
async fn test_watch_order_book_applies_limit() {
    let rest = MockServer::start().await;
    let (ws_url, _subscriptions) = spawn_feed().await;
    let exchange = exchange(&rest, &ws_url).await;

    let book = timeout(Duration::from_secs(5), exchange.watch_order_book("BTC/USD", Some(1)))
        .await
        .expect("snapshot")
        .unwrap();
    assert_eq!(book.bids.len(), 1);
    assert_eq!(book.asks.len(), 1);

    let cached = exchange.ws().state().order_book("BTC/USD").unwrap();
    assert!(cached.bids.len() > 1);
    exchange.ws_close().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_feed_reports_error() {
    let rest = MockServer::start().await;
    let exchange = exchange(&rest, "ws://127.0.0.1:1").await;

    let result = timeout(Duration::from_secs(30), exchange.watch_order_book("BTC/USD", None))
        .await
        .expect("connect attempt finishes");
    assert!(result.is_err());
}
