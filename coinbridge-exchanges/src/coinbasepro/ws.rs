//! Coinbase Pro level2 stream.
//!
//! A `snapshot` message starts a book, `l2update` messages apply
//! `[side, price, size]` changes to it. Books are dropped when the
//! connection closes; the replayed subscription brings a fresh snapshot.

use super::parser::symbol_from_product_id;
use coinbridge_core::parser_utils::{parse_bid_ask, safe_string, safe_string_index, safe_value};
use coinbridge_core::time::parse8601;
use coinbridge_core::types::{Market, OrderBook};
use coinbridge_core::ws_client::{AutoReconnectCoordinator, wait};
use coinbridge_core::{
    CancellationToken, Error, MarketCache, MessageHub, Result, WsClient, WsConfig,
    WsConnectionState, WsEvent,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Levels returned when no limit is requested.
pub const DEFAULT_DEPTH: usize = 50;

const LEVEL2: &str = "level2";

/// `level2:PRODUCT-ID`
pub fn level2_hash(market_id: &str) -> String {
    format!("{LEVEL2}:{market_id}")
}

/// Books and pending book watchers.
#[derive(Debug)]
pub struct CoinbaseProWsState {
    market_cache: Arc<RwLock<MarketCache>>,
    common_currencies: HashMap<String, String>,
    order_books: Mutex<HashMap<String, OrderBook>>,
    hub: MessageHub<OrderBook>,
}

impl CoinbaseProWsState {
    /// State sharing the exchange's market cache and currency aliases.
    pub fn new(
        market_cache: Arc<RwLock<MarketCache>>,
        common_currencies: HashMap<String, String>,
    ) -> Self {
        Self {
            market_cache,
            common_currencies,
            order_books: Mutex::new(HashMap::new()),
            hub: MessageHub::new(),
        }
    }

    /// Book watchers.
    pub fn hub(&self) -> &MessageHub<OrderBook> {
        &self.hub
    }

    fn books(&self) -> MutexGuard<'_, HashMap<String, OrderBook>> {
        self.order_books
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Stored book for `symbol`.
    pub fn order_book(&self, symbol: &str) -> Option<OrderBook> {
        self.books().get(symbol).cloned()
    }

    /// Drops every stored book.
    pub fn clear(&self) {
        self.books().clear();
    }

    /// Unified symbol for a product id; unknown ids are split on `-`.
    pub fn symbol_for_id(&self, id: &str) -> String {
        let cache = self
            .market_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match cache.get_market_by_id(id) {
            Some(market) => market.symbol.clone(),
            None => symbol_from_product_id(id, |currency| {
                let upper = currency.to_uppercase();
                self.common_currencies.get(&upper).cloned().unwrap_or(upper)
            }),
        }
    }

    /// Applies one decoded frame.
    pub fn handle_message(&self, message: &Value) {
        match safe_string(message, "type").as_deref() {
            Some("snapshot") => self.handle_snapshot(message),
            Some("l2update") => self.handle_update(message),
            Some("subscriptions") => trace!(?message, "Coinbase Pro subscriptions"),
            Some("error") => {
                let reason = safe_string(message, "reason")
                    .or_else(|| safe_string(message, "message"))
                    .unwrap_or_default();
                warn!(reason = %reason, "Coinbase Pro stream error");
                self.hub
                    .reject_all(|| Error::exchange("error", format!("coinbasepro {reason}")));
            }
            other => debug!(kind = ?other, "Unhandled Coinbase Pro message"),
        }
    }

    fn handle_snapshot(&self, message: &Value) {
        let Some(market_id) = safe_string(message, "product_id") else {
            return;
        };
        let symbol = self.symbol_for_id(&market_id);
        let mut book = OrderBook::new(symbol.clone());
        for (key, side) in [("asks", &mut book.asks), ("bids", &mut book.bids)] {
            let rows = safe_value(message, key)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for (price, amount) in rows.iter().filter_map(|row| parse_bid_ask(row, 0, 1)) {
                if let Err(e) = side.store_raw(&price, &amount) {
                    warn!(error = %e, "Invalid Coinbase Pro book level");
                }
            }
        }
        book.limit(Some(DEFAULT_DEPTH));
        self.books().insert(symbol, book.clone());
        self.hub.resolve(&level2_hash(&market_id), &book);
    }

    fn handle_update(&self, message: &Value) {
        let Some(market_id) = safe_string(message, "product_id") else {
            return;
        };
        let symbol = self.symbol_for_id(&market_id);
        let book = {
            let mut books = self.books();
            let Some(book) = books.get_mut(&symbol) else {
                warn!(symbol = %symbol, "Coinbase Pro update for a book without snapshot");
                return;
            };
            let changes = safe_value(message, "changes")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for change in changes {
                let side = match safe_string_index(change, 0).as_deref() {
                    Some("buy") => &mut book.bids,
                    Some("sell") => &mut book.asks,
                    _ => continue,
                };
                let (Some(price), Some(amount)) =
                    (safe_string_index(change, 1), safe_string_index(change, 2))
                else {
                    continue;
                };
                if let Err(e) = side.store_raw(&price, &amount) {
                    warn!(error = %e, "Invalid Coinbase Pro book change");
                }
            }
            book.limit(Some(DEFAULT_DEPTH));
            book.set_timestamp(safe_string(message, "time").as_deref().and_then(parse8601));
            book.clone()
        };
        self.hub.resolve(&level2_hash(&market_id), &book);
    }
}

#[derive(Default)]
struct Lifecycle {
    reconnect: Option<AutoReconnectCoordinator>,
    reader: Option<(JoinHandle<()>, CancellationToken)>,
}

/// Coinbase Pro stream connection.
pub struct CoinbaseProWs {
    client: Arc<WsClient>,
    state: Arc<CoinbaseProWsState>,
    lifecycle: tokio::sync::Mutex<Lifecycle>,
}

impl fmt::Debug for CoinbaseProWs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinbaseProWs")
            .field("url", &self.client.config().url)
            .field("state", &self.client.state())
            .finish_non_exhaustive()
    }
}

impl CoinbaseProWs {
    /// Connection to `url` feeding `state`.
    pub fn new(url: impl Into<String>, state: CoinbaseProWsState) -> Self {
        let client = Arc::new(WsClient::new(WsConfig::new(url)));
        let state = Arc::new(state);

        let events = Arc::clone(&state);
        client.set_event_callback(Arc::new(move |event: WsEvent| {
            if let WsEvent::Disconnected { .. } | WsEvent::ReconnectExhausted { .. } = event {
                events.clear();
                events
                    .hub()
                    .reject_all(|| Error::network(format!("coinbasepro stream: {event}")));
            }
        }));

        Self {
            client,
            state,
            lifecycle: tokio::sync::Mutex::new(Lifecycle::default()),
        }
    }

    /// Message state shared with the reader task.
    pub fn state(&self) -> &Arc<CoinbaseProWsState> {
        &self.state
    }

    /// Connection state.
    pub fn connection_state(&self) -> WsConnectionState {
        self.client.state()
    }

    /// Opens the connection, starting the reader and reconnect tasks.
    pub async fn connect(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle
            .reader
            .as_ref()
            .is_none_or(|(handle, _)| handle.is_finished())
        {
            let token = CancellationToken::new();
            let client = Arc::clone(&self.client);
            let state = Arc::clone(&self.state);
            let stop = token.clone();
            let handle = tokio::spawn(async move {
                loop {
                    tokio::select! {
                        biased;
                        () = stop.cancelled() => break,
                        message = client.receive() => match message {
                            Some(message) => state.handle_message(&message),
                            None => break,
                        },
                    }
                }
                debug!("Coinbase Pro reader stopped");
            });
            lifecycle.reader = Some((handle, token));
        }

        self.client.connect().await?;
        lifecycle
            .reconnect
            .get_or_insert_with(|| AutoReconnectCoordinator::new(Arc::clone(&self.client)))
            .start()
            .await;
        Ok(())
    }

    /// Closes the connection and fails every pending watch.
    pub async fn close(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Some(coordinator) = lifecycle.reconnect.take() {
            coordinator.stop().await;
        }
        self.client.shutdown().await;
        if let Some((handle, token)) = lifecycle.reader.take() {
            token.cancel();
            let _ = handle.await;
        }
        self.state.clear();
        self.state
            .hub()
            .reject_all(|| Error::cancelled("coinbasepro stream closed"));
        info!("Coinbase Pro stream closed");
        Ok(())
    }

    /// Book of `market` after its next update, limited to `limit` levels
    /// (50 by default).
    pub async fn watch_order_book(&self, market: &Market, limit: Option<usize>) -> Result<OrderBook> {
        self.connect().await?;
        let hash = level2_hash(&market.id);
        let rx = self.state.hub().future(hash.as_str());
        let frame = json!({
            "type": "subscribe",
            "product_ids": [market.id],
            "channels": [LEVEL2],
        });
        self.client.subscribe(&hash, frame).await?;
        let book = wait(rx).await?;
        Ok(book.limited(Some(limit.unwrap_or(DEFAULT_DEPTH))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinbridge_core::types::Price;
    use rust_decimal_macros::dec;

    fn state() -> CoinbaseProWsState {
        let cache = Arc::new(RwLock::new(MarketCache::default()));
        cache
            .write()
            .unwrap()
            .set_markets(vec![Market::new_spot("BTC-USD", "BTC", "USD")]);
        let aliases = HashMap::from([("XBT".to_string(), "BTC".to_string())]);
        CoinbaseProWsState::new(cache, aliases)
    }

    fn snapshot(product: &str) -> Value {
        json!({
            "type": "snapshot",
            "product_id": product,
            "bids": [["10101.10", "0.45054140"], ["10100.00", "1"]],
            "asks": [["10102.55", "0.57753524"]]
        })
    }

    #[tokio::test]
    async fn test_snapshot_resolves_without_timestamp() {
        let state = state();
        let rx = state.hub().future(level2_hash("BTC-USD"));
        state.handle_message(&snapshot("BTC-USD"));
        let book = wait(rx).await.unwrap();
        assert_eq!(book.symbol, "BTC/USD");
        assert_eq!(book.timestamp, None);
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.best_ask().unwrap().price, Price::new(dec!(10102.55)));
    }

    #[test]
    fn test_stored_book_is_capped() {
        let state = state();
        let levels = |base: i64, step: i64| -> Vec<Value> {
            (0..120_i64)
                .map(|i| json!([(base + step * i).to_string(), "1"]))
                .collect()
        };
        state.handle_message(&json!({
            "type": "snapshot",
            "product_id": "BTC-USD",
            "bids": levels(10000, -1),
            "asks": levels(10001, 1)
        }));
        let book = state.order_book("BTC/USD").unwrap();
        assert_eq!(book.bids.len(), DEFAULT_DEPTH);
        assert_eq!(book.asks.len(), DEFAULT_DEPTH);
        assert_eq!(book.best_bid().unwrap().price, Price::new(dec!(10000)));
        assert_eq!(book.best_ask().unwrap().price, Price::new(dec!(10001)));

        let changes: Vec<Value> = (0..30)
            .map(|i| json!(["buy", (10100 + i).to_string(), "2"]))
            .collect();
        state.handle_message(&json!({
            "type": "l2update",
            "product_id": "BTC-USD",
            "time": "2019-08-14T20:42:27.265Z",
            "changes": changes
        }));
        let book = state.order_book("BTC/USD").unwrap();
        assert_eq!(book.bids.len(), DEFAULT_DEPTH);
        assert_eq!(book.best_bid().unwrap().price, Price::new(dec!(10129)));
        assert_eq!(book.limited(Some(200)).bids.len(), DEFAULT_DEPTH);
    }

    #[tokio::test]
    async fn test_l2update_applies_changes() {
        let state = state();
        state.handle_message(&snapshot("BTC-USD"));
        let rx = state.hub().future(level2_hash("BTC-USD"));
        state.handle_message(&json!({
            "type": "l2update",
            "product_id": "BTC-USD",
            "time": "2019-08-14T20:42:27.265Z",
            "changes": [
                ["buy", "10101.80000000", "0.162567"],
                ["buy", "10100.00", "0"],
                ["sell", "10103.00", "2"]
            ]
        }));
        let book = wait(rx).await.unwrap();
        assert_eq!(book.best_bid().unwrap().price, Price::new(dec!(10101.8)));
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.asks.len(), 2);
        assert_eq!(book.timestamp, Some(1_565_815_347_265));
    }

    #[test]
    fn test_update_without_snapshot_is_ignored() {
        let state = state();
        let _rx = state.hub().future(level2_hash("ETH-USD"));
        state.handle_message(&json!({
            "type": "l2update",
            "product_id": "ETH-USD",
            "time": "2019-08-14T20:42:27.265Z",
            "changes": [["buy", "1", "1"]]
        }));
        assert!(state.order_book("ETH/USD").is_none());
        assert!(state.hub().has_waiters(&level2_hash("ETH-USD")));
    }

    #[test]
    fn test_unknown_product_symbol() {
        let state = state();
        assert_eq!(state.symbol_for_id("XBT-EUR"), "BTC/EUR");
        state.handle_message(&snapshot("ETH-EUR"));
        assert!(state.order_book("ETH/EUR").is_some());
    }

    #[tokio::test]
    async fn test_error_rejects_watchers() {
        let state = state();
        let rx = state.hub().future(level2_hash("BTC-USD"));
        state.handle_message(&json!({"type": "error", "message": "Failed to subscribe", "reason": "bad product"}));
        let err = wait(rx).await.unwrap_err();
        assert!(err.to_string().contains("bad product"));
    }

    #[test]
    fn test_subscriptions_ack_is_ignored() {
        let state = state();
        state.handle_message(&json!({
            "type": "subscriptions",
            "channels": [{"name": "level2", "product_ids": ["BTC-USD"]}]
        }));
        assert!(state.order_book("BTC/USD").is_none());
    }
}
