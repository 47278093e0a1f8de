//! Bitget WebSocket implementation.
//!
//! One connection carries every subscription. A reader task feeds incoming
//! frames into [`BitgetWsState`]; watch calls register a waiter on the
//! state's hubs, subscribe, and read the result from the caches once the
//! waiter fires. Public subscriptions are replayed by the client after a
//! reconnect; private ones are sent again on the next watch after login.

mod parser;
mod state;

pub use parser::{
    WS_TIMEFRAMES, contract_market_from_id, contract_market_from_symbol, market_id_from_arg,
    parse_ws_my_trade, parse_ws_ohlcv, parse_ws_order, parse_ws_order_status, parse_ws_position,
    parse_ws_ticker, parse_ws_trade, public_inst_type, strip_suffix, timeframe_from_channel,
    ws_market_id,
};
pub use state::{
    AUTH_HASH, BitgetWsCaches, BitgetWsState, BookResync, balance_hash, candles_hash, multi_hash,
    my_trades_hash, orderbook_hash, orders_hash, positions_hash, ticker_hash, trade_hash,
};

use crate::bitget::{Bitget, BitgetAuth};
use coinbridge_core::time::seconds;
use coinbridge_core::types::{
    Balance, Market, Ohlcv, Order, OrderBook, Position, Ticker, Timeframe, Trade,
};
use coinbridge_core::ws_cache::filter_by_since_limit;
use coinbridge_core::ws_client::{AutoReconnectCoordinator, wait};
use coinbridge_core::{
    CancellationToken, Error, Result, WsClient, WsConfig, WsConnectionState, WsEvent,
};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Keep-alive interval in milliseconds.
const PING_INTERVAL_MS: u64 = 30_000;

/// Depths with a dedicated snapshot channel.
const FIXED_BOOK_DEPTHS: [usize; 3] = [1, 5, 15];

#[derive(Default)]
struct Lifecycle {
    reconnect: Option<AutoReconnectCoordinator>,
    reader: Option<(JoinHandle<()>, CancellationToken)>,
}

/// Bitget stream connection.
pub struct BitgetWs {
    client: Arc<WsClient>,
    state: Arc<BitgetWsState>,
    lifecycle: Mutex<Lifecycle>,
    login_lock: Mutex<()>,
}

impl fmt::Debug for BitgetWs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitgetWs")
            .field("url", &self.client.config().url)
            .field("state", &self.client.state())
            .finish_non_exhaustive()
    }
}

fn subscribe_frame(inst_type: &str, channel: &str, inst_id: &str) -> Value {
    op_frame("subscribe", inst_type, channel, inst_id)
}

fn op_frame(op: &str, inst_type: &str, channel: &str, inst_id: &str) -> Value {
    json!({
        "op": op,
        "args": [{"instType": inst_type, "channel": channel, "instId": inst_id}],
    })
}

fn public_key(inst_type: &str, channel: &str, inst_id: &str) -> String {
    format!("{inst_type}:{channel}:{inst_id}")
}

/// Book channel for a requested depth.
pub fn book_channel(limit: Option<usize>) -> String {
    match limit {
        Some(depth) if FIXED_BOOK_DEPTHS.contains(&depth) => format!("books{depth}"),
        _ => "books".to_string(),
    }
}

impl BitgetWs {
    /// Connection to `url` feeding `state`. Nothing is opened until the
    /// first watch or [`connect`](Self::connect).
    pub fn new(url: impl Into<String>, state: BitgetWsState) -> Self {
        let config = WsConfig {
            ping_interval: PING_INTERVAL_MS,
            app_ping: Some("ping".to_string()),
            ..WsConfig::new(url)
        };
        let client = Arc::new(WsClient::new(config));
        let state = Arc::new(state);

        let events = Arc::clone(&state);
        client.set_event_callback(Arc::new(move |event: WsEvent| match event {
            WsEvent::Connected => events.reset_session(),
            WsEvent::Disconnected { reason } => {
                events.reset_session();
                let reason = reason.unwrap_or_else(|| "connection closed".to_string());
                events.reject_all(|| Error::network(format!("bitget stream: {reason}")));
            }
            WsEvent::ReconnectExhausted { attempts } => {
                events.reject_all(|| {
                    Error::network(format!("bitget stream: gave up after {attempts} reconnects"))
                });
            }
            _ => {}
        }));

        Self {
            client,
            state,
            lifecycle: Mutex::new(Lifecycle::default()),
            login_lock: Mutex::new(()),
        }
    }

    /// Message state shared with the reader task.
    pub fn state(&self) -> &Arc<BitgetWsState> {
        &self.state
    }

    /// Connection state.
    pub fn connection_state(&self) -> WsConnectionState {
        self.client.state()
    }

    /// Whether the socket is open.
    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
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
            let handle = tokio::spawn(Self::read_loop(
                Arc::clone(&self.client),
                Arc::clone(&self.state),
                token.clone(),
            ));
            lifecycle.reader = Some((handle, token));
        }

        self.client.connect().await?;

        let coordinator = lifecycle
            .reconnect
            .get_or_insert_with(|| AutoReconnectCoordinator::new(Arc::clone(&self.client)));
        coordinator.start().await;
        Ok(())
    }

    async fn read_loop(client: Arc<WsClient>, state: Arc<BitgetWsState>, token: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                message = client.receive() => match message {
                    Some(message) => {
                        state.handle_message(&message);
                        for resync in state.take_resyncs() {
                            Self::resubscribe_book(&client, &resync).await;
                        }
                    }
                    None => break,
                },
            }
        }
        debug!("Bitget reader stopped");
    }

    /// Unsubscribes and subscribes `books` again so the server sends a new
    /// snapshot.
    async fn resubscribe_book(client: &WsClient, resync: &BookResync) {
        let BookResync { inst_type, inst_id } = resync;
        let key = public_key(inst_type, "books", inst_id);
        if let Err(e) = client
            .unsubscribe(&key, op_frame("unsubscribe", inst_type, "books", inst_id))
            .await
        {
            warn!(error = %e, inst_id = %inst_id, "Bitget book unsubscribe failed");
        }
        match client
            .subscribe(&key, subscribe_frame(inst_type, "books", inst_id))
            .await
        {
            Ok(()) => info!(inst_id = %inst_id, "Bitget book resubscribed after checksum mismatch"),
            Err(e) => warn!(error = %e, inst_id = %inst_id, "Bitget book resubscribe failed"),
        }
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
        self.state.reset_session();
        self.state
            .reject_all(|| Error::cancelled("bitget stream closed"));
        info!("Bitget stream closed");
        Ok(())
    }

    /// Logs in once per connection.
    pub async fn authenticate(&self, auth: &BitgetAuth) -> Result<()> {
        if self.state.is_authenticated() {
            return Ok(());
        }
        let _guard = self.login_lock.lock().await;
        if self.state.is_authenticated() {
            return Ok(());
        }
        let rx = self.state.auth_hub().future(AUTH_HASH);
        let frame = auth.ws_login_frame(&seconds().to_string())?;
        self.client.send_json(&frame).await?;
        wait(rx).await?;
        debug!("Bitget stream authenticated");
        Ok(())
    }

    async fn subscribe_public(&self, inst_type: &str, channel: &str, inst_id: &str) -> Result<()> {
        let key = public_key(inst_type, channel, inst_id);
        self.client
            .subscribe(&key, subscribe_frame(inst_type, channel, inst_id))
            .await
    }

    async fn subscribe_market(&self, channel: &str, market: &Market) -> Result<()> {
        self.subscribe_public(public_inst_type(market), channel, &ws_market_id(market))
            .await
    }

    async fn subscribe_private(&self, inst_type: &str, channel: &str, inst_id: &str) -> Result<()> {
        let key = format!("{inst_type}:{channel}:{inst_id}");
        if !self.state.add_private_subscription(&key) {
            return Ok(());
        }
        if let Err(e) = self
            .client
            .send_json(&subscribe_frame(inst_type, channel, inst_id))
            .await
        {
            self.state.remove_private_subscription(&key);
            return Err(e);
        }
        Ok(())
    }

    // ==================== Public Channels ====================

    /// Next ticker of `market`.
    pub async fn watch_ticker(&self, market: &Market) -> Result<Ticker> {
        self.connect().await?;
        let rx = self.state.ticker_hub().future(ticker_hash(&market.symbol));
        self.subscribe_market("ticker", market).await?;
        wait(rx).await
    }

    /// Next ticker of any of `markets`.
    pub async fn watch_tickers(&self, markets: &[Arc<Market>]) -> Result<Vec<Ticker>> {
        self.connect().await?;
        let symbols: Vec<String> = markets.iter().map(|m| m.symbol.clone()).collect();
        let rx = self
            .state
            .ticker_hub()
            .future(multi_hash("tickers", &symbols));
        for market in markets {
            self.subscribe_market("ticker", market).await?;
        }
        Ok(vec![wait(rx).await?])
    }

    /// Book of `market` after its next update.
    pub async fn watch_order_book(&self, market: &Market, limit: Option<usize>) -> Result<OrderBook> {
        self.connect().await?;
        let rx = self
            .state
            .order_book_hub()
            .future(orderbook_hash(&market.symbol));
        self.subscribe_market(&book_channel(limit), market).await?;
        Ok(wait(rx).await?.limited(limit))
    }

    /// Book of whichever of `markets` updates next.
    pub async fn watch_order_book_for_symbols(
        &self,
        markets: &[Arc<Market>],
        limit: Option<usize>,
    ) -> Result<OrderBook> {
        self.connect().await?;
        let symbols: Vec<String> = markets.iter().map(|m| m.symbol.clone()).collect();
        let rx = self
            .state
            .order_book_hub()
            .future(multi_hash("multipleOrderbooks", &symbols));
        let channel = book_channel(limit);
        for market in markets {
            self.subscribe_market(&channel, market).await?;
        }
        Ok(wait(rx).await?.limited(limit))
    }

    /// Public trades of `market` since the previous call.
    pub async fn watch_trades(
        &self,
        market: &Market,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Trade>> {
        self.connect().await?;
        let rx = self.state.update_hub().future(trade_hash(&market.symbol));
        self.subscribe_market("trade", market).await?;
        let symbol = wait(rx).await?;
        Ok(self.state.take_trades(&symbol, since, limit))
    }

    /// Trades of whichever of `markets` updates next.
    pub async fn watch_trades_for_symbols(
        &self,
        markets: &[Arc<Market>],
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Trade>> {
        if markets.is_empty() {
            return Err(Error::arguments_required(
                "bitget watch_trades_for_symbols requires a non-empty symbol list",
            ));
        }
        self.connect().await?;
        let symbols: Vec<String> = markets.iter().map(|m| m.symbol.clone()).collect();
        let rx = self
            .state
            .update_hub()
            .future(multi_hash("multipleTrades", &symbols));
        for market in markets {
            self.subscribe_market("trade", market).await?;
        }
        let symbol = wait(rx).await?;
        Ok(self.state.take_trades(&symbol, since, limit))
    }

    /// Candles of `market` updated since the previous call.
    pub async fn watch_ohlcv(
        &self,
        market: &Market,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Ohlcv>> {
        let interval = Bitget::ws_timeframe(timeframe).ok_or_else(|| {
            Error::not_supported(format!("bitget watch_ohlcv timeframe {timeframe}"))
        })?;
        self.connect().await?;
        let rx = self
            .state
            .update_hub()
            .future(candles_hash(timeframe, &market.symbol));
        self.subscribe_market(&format!("candle{interval}"), market)
            .await?;
        wait(rx).await?;
        Ok(self.state.take_ohlcv(&market.symbol, timeframe, since, limit))
    }

    // ==================== Private Channels ====================

    /// Orders changed since the previous call on the `orders` (or, for
    /// `trigger`, `ordersAlgo`) channel of `inst_type`/`inst_id`.
    #[allow(clippy::too_many_arguments)]
    pub async fn watch_orders(
        &self,
        auth: &BitgetAuth,
        inst_type: &str,
        inst_id: &str,
        trigger: bool,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Order>> {
        self.connect().await?;
        self.authenticate(auth).await?;
        let rx = self.state.update_hub().future(orders_hash(trigger, symbol));
        let channel = if trigger { "ordersAlgo" } else { "orders" };
        self.subscribe_private(inst_type, channel, inst_id).await?;
        wait(rx).await?;
        Ok(self.state.take_orders(trigger, symbol, since, limit))
    }

    /// Own contract fills since the previous call.
    pub async fn watch_my_trades(
        &self,
        auth: &BitgetAuth,
        inst_type: &str,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Trade>> {
        self.connect().await?;
        self.authenticate(auth).await?;
        let rx = self.state.update_hub().future(my_trades_hash(symbol));
        self.subscribe_private(inst_type, "orders", "default").await?;
        wait(rx).await?;
        Ok(self.state.take_my_trades(symbol, since, limit))
    }

    /// Positions of `inst_type` after the next update touching `symbols`.
    pub async fn watch_positions(
        &self,
        auth: &BitgetAuth,
        inst_type: &str,
        symbols: Option<&[String]>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Position>> {
        self.connect().await?;
        self.authenticate(auth).await?;
        let hash = match symbols {
            Some(symbols) if !symbols.is_empty() => {
                format!("{}::{}", positions_hash(inst_type), symbols.join(","))
            }
            _ => positions_hash(inst_type),
        };
        let rx = self.state.position_hub().future(hash);
        self.subscribe_private(inst_type, "positions", "default")
            .await?;
        let positions = wait(rx).await?;
        Ok(filter_by_since_limit(&positions, since, limit, true))
    }

    /// Balance after the next `account` update of `inst_type`.
    pub async fn watch_balance(&self, auth: &BitgetAuth, inst_type: &str) -> Result<Balance> {
        self.connect().await?;
        self.authenticate(auth).await?;
        let rx = self.state.balance_hub().future(balance_hash(inst_type));
        self.subscribe_private(inst_type, "account", "default")
            .await?;
        match wait(rx).await {
            Ok(balance) => Ok(balance),
            Err(e) => {
                warn!(error = %e, inst_type, "Bitget balance watch failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinbridge_core::MarketCache;
    use crate::bitget::BitgetOptions;
    use std::collections::HashMap;
    use std::sync::RwLock;

    fn ws() -> BitgetWs {
        let state = BitgetWsState::new(
            Arc::new(RwLock::new(MarketCache::default())),
            HashMap::new(),
            BitgetOptions::default(),
        );
        BitgetWs::new("wss://127.0.0.1:1/stream", state)
    }

    #[test]
    fn test_book_channel() {
        assert_eq!(book_channel(Some(5)), "books5");
        assert_eq!(book_channel(Some(15)), "books15");
        assert_eq!(book_channel(Some(1)), "books1");
        assert_eq!(book_channel(Some(10)), "books");
        assert_eq!(book_channel(None), "books");
    }

    #[test]
    fn test_subscribe_frame() {
        let frame = subscribe_frame("sp", "ticker", "BTCUSDT");
        assert_eq!(frame["op"], "subscribe");
        assert_eq!(frame["args"][0]["instType"], "sp");
        assert_eq!(frame["args"][0]["channel"], "ticker");
        assert_eq!(frame["args"][0]["instId"], "BTCUSDT");
    }

    #[test]
    fn test_new_connection_is_idle() {
        let ws = ws();
        assert!(!ws.is_connected());
        assert_eq!(ws.connection_state(), WsConnectionState::Disconnected);
        assert_eq!(ws.client.config().app_ping.as_deref(), Some("ping"));
    }

    #[tokio::test]
    async fn test_empty_symbol_list_is_rejected() {
        let err = ws()
            .watch_trades_for_symbols(&[], None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ArgumentsRequired(_)));
    }

    #[tokio::test]
    async fn test_close_rejects_pending_watchers() {
        let ws = ws();
        let rx = ws.state().ticker_hub().future(ticker_hash("BTC/USDT"));
        ws.close().await.unwrap();
        assert!(wait(rx).await.unwrap_err().as_cancelled().is_some());
    }
}
