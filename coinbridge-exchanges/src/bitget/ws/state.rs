//! Stream message handling.
//!
//! [`BitgetWsState`] owns the caches and the pending watchers. Incoming
//! frames are applied by [`BitgetWsState::handle_message`], which never
//! touches the network; watch calls register on a hub, wait, and then read
//! their result from the caches.

use super::parser::{
    contract_market_from_id, contract_market_from_symbol, market_id_from_arg, parse_ws_my_trade,
    parse_ws_ohlcv, parse_ws_order, parse_ws_position, parse_ws_ticker, parse_ws_trade,
    strip_suffix, timeframe_from_channel,
};
use crate::bitget::BitgetOptions;
use crate::bitget::error::parse_ws_error;
use coinbridge_core::checksum;
use coinbridge_core::parser_utils::{
    parse_bid_ask, safe_decimal, safe_integer, safe_string, safe_string_2, safe_value,
};
use coinbridge_core::types::{
    Balance, BalanceEntry, Market, Ohlcv, Order, OrderBook, Position, Ticker, Timeframe, Trade,
};
use coinbridge_core::ws_cache::{
    ArrayCache, ArrayCacheBySymbolById, ArrayCacheBySymbolBySide, ArrayCacheByTimestamp,
    filter_by_since_limit, filter_by_symbol_since_limit,
};
use coinbridge_core::{Error, MarketCache, MessageHub, Result};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, trace, warn};

/// Levels covered by the book checksum.
const CHECKSUM_DEPTH: usize = 25;

/// Hash resolved by a successful login.
pub const AUTH_HASH: &str = "authenticated";

/// `ticker:SYMBOL`
pub fn ticker_hash(symbol: &str) -> String {
    format!("ticker:{symbol}")
}

/// `orderbook:SYMBOL`
pub fn orderbook_hash(symbol: &str) -> String {
    format!("orderbook:{symbol}")
}

/// `trade:SYMBOL`
pub fn trade_hash(symbol: &str) -> String {
    format!("trade:{symbol}")
}

/// `candles:TF:SYMBOL`
pub fn candles_hash(timeframe: Timeframe, symbol: &str) -> String {
    format!("candles:{timeframe}:{symbol}")
}

/// `order`/`triggerOrder`, with `:SYMBOL` when given.
pub fn orders_hash(trigger: bool, symbol: Option<&str>) -> String {
    let prefix = if trigger { "triggerOrder" } else { "order" };
    match symbol {
        Some(symbol) => format!("{prefix}:{symbol}"),
        None => prefix.to_string(),
    }
}

/// `myTrades`, with `:SYMBOL` when given.
pub fn my_trades_hash(symbol: Option<&str>) -> String {
    match symbol {
        Some(symbol) => format!("myTrades:{symbol}"),
        None => "myTrades".to_string(),
    }
}

/// `insttype:positions`
pub fn positions_hash(inst_type: &str) -> String {
    format!("{}:positions", inst_type.to_lowercase())
}

/// `balance:insttype`
pub fn balance_hash(inst_type: &str) -> String {
    format!("balance:{}", inst_type.to_lowercase())
}

/// `prefix::S1,S2` hash for a multi-symbol watch.
pub fn multi_hash(prefix: &str, symbols: &[String]) -> String {
    format!("{prefix}::{}", symbols.join(","))
}

/// Symbols listed after `::` in a multi-symbol hash.
fn listed_symbols(hash: &str) -> Vec<&str> {
    hash.split_once("::")
        .map(|(_, list)| list.split(',').collect())
        .unwrap_or_default()
}

fn data_array(message: &Value) -> &[Value] {
    safe_value(message, "data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Cached stream data.
#[derive(Debug, Default)]
pub struct BitgetWsCaches {
    /// Latest ticker per symbol.
    pub tickers: HashMap<String, Ticker>,
    /// Books per symbol.
    pub order_books: HashMap<String, OrderBook>,
    /// Public trades per symbol.
    pub trades: HashMap<String, ArrayCache<Trade>>,
    /// Candles per symbol and timeframe.
    pub ohlcvs: HashMap<(String, Timeframe), ArrayCacheByTimestamp<Ohlcv>>,
    /// Regular orders.
    pub orders: Option<ArrayCacheBySymbolById<Order>>,
    /// Trigger orders.
    pub trigger_orders: Option<ArrayCacheBySymbolById<Order>>,
    /// Own fills.
    pub my_trades: Option<ArrayCache<Trade>>,
    /// Positions per lowercase instType.
    pub positions: HashMap<String, ArrayCacheBySymbolBySide<Position>>,
    /// Merged account balance.
    pub balance: Balance,
}

/// Book stream that lost sync and must be subscribed again for a fresh
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookResync {
    /// Wire instType of the subscription (`sp`, `mc`).
    pub inst_type: String,
    /// Wire instId of the subscription.
    pub inst_id: String,
}

/// Caches, pending watchers and session flags of one stream connection.
#[derive(Debug)]
pub struct BitgetWsState {
    market_cache: Arc<RwLock<MarketCache>>,
    common_currencies: HashMap<String, String>,
    options: BitgetOptions,
    caches: Mutex<BitgetWsCaches>,
    authenticated: AtomicBool,
    private_subscriptions: Mutex<HashSet<String>>,
    resyncs: Mutex<Vec<BookResync>>,
    tickers: MessageHub<Ticker>,
    order_books: MessageHub<OrderBook>,
    updates: MessageHub<String>,
    positions: MessageHub<Vec<Position>>,
    balances: MessageHub<Balance>,
    auth: MessageHub<bool>,
}

impl BitgetWsState {
    /// State sharing the exchange's market cache and currency aliases.
    pub fn new(
        market_cache: Arc<RwLock<MarketCache>>,
        common_currencies: HashMap<String, String>,
        options: BitgetOptions,
    ) -> Self {
        Self {
            market_cache,
            common_currencies,
            options,
            caches: Mutex::new(BitgetWsCaches::default()),
            authenticated: AtomicBool::new(false),
            private_subscriptions: Mutex::new(HashSet::new()),
            resyncs: Mutex::new(Vec::new()),
            tickers: MessageHub::new(),
            order_books: MessageHub::new(),
            updates: MessageHub::new(),
            positions: MessageHub::new(),
            balances: MessageHub::new(),
            auth: MessageHub::new(),
        }
    }

    /// Locked caches.
    pub fn caches(&self) -> MutexGuard<'_, BitgetWsCaches> {
        self.caches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stream options.
    pub fn options(&self) -> &BitgetOptions {
        &self.options
    }

    /// Ticker watchers.
    pub fn ticker_hub(&self) -> &MessageHub<Ticker> {
        &self.tickers
    }

    /// Order book watchers.
    pub fn order_book_hub(&self) -> &MessageHub<OrderBook> {
        &self.order_books
    }

    /// Watchers of cached lists (trades, candles, orders, fills); resolved
    /// with the updated symbol.
    pub fn update_hub(&self) -> &MessageHub<String> {
        &self.updates
    }

    /// Position watchers.
    pub fn position_hub(&self) -> &MessageHub<Vec<Position>> {
        &self.positions
    }

    /// Balance watchers.
    pub fn balance_hub(&self) -> &MessageHub<Balance> {
        &self.balances
    }

    /// Login watchers.
    pub fn auth_hub(&self) -> &MessageHub<bool> {
        &self.auth
    }

    /// Whether the current connection is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    /// Forgets the login and private subscriptions of a closed connection.
    pub fn reset_session(&self) {
        self.authenticated.store(false, Ordering::Release);
        self.private_subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Records a private subscription. `false` when already subscribed.
    pub fn add_private_subscription(&self, key: &str) -> bool {
        self.private_subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string())
    }

    /// Drops a private subscription record.
    pub fn remove_private_subscription(&self, key: &str) {
        self.private_subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Drains the book streams queued for a resubscribe.
    pub fn take_resyncs(&self) -> Vec<BookResync> {
        std::mem::take(&mut *self.resyncs.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn queue_resync(&self, arg: &Value) {
        let (Some(inst_type), Some(inst_id)) =
            (safe_string(arg, "instType"), safe_string(arg, "instId"))
        else {
            return;
        };
        let resync = BookResync { inst_type, inst_id };
        let mut resyncs = self.resyncs.lock().unwrap_or_else(PoisonError::into_inner);
        if !resyncs.contains(&resync) {
            resyncs.push(resync);
        }
    }

    /// Fails every pending watcher.
    pub fn reject_all(&self, make_err: impl Fn() -> Error) {
        self.tickers.reject_all(&make_err);
        self.order_books.reject_all(&make_err);
        self.updates.reject_all(&make_err);
        self.positions.reject_all(&make_err);
        self.balances.reject_all(&make_err);
        self.auth.reject_all(&make_err);
    }

    fn market_cache(&self) -> std::sync::RwLockReadGuard<'_, MarketCache> {
        self.market_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Market for a unified symbol; contract symbols not in the loaded
    /// markets are derived from the symbol.
    pub fn market(&self, symbol: &str) -> Result<Arc<Market>> {
        if let Some(market) = self.market_cache().get_market(symbol) {
            return Ok(market);
        }
        contract_market_from_symbol(symbol)
            .map(Arc::new)
            .ok_or_else(|| Error::bad_symbol(format!("bitget does not have market symbol {symbol}")))
    }

    /// Market for a legacy or v2 id.
    pub fn market_by_id(&self, id: &str) -> Arc<Market> {
        {
            let cache = self.market_cache();
            if let Some(market) = cache
                .get_market_by_id(id)
                .or_else(|| cache.get_market_by_id(strip_suffix(id)))
            {
                return market;
            }
        }
        Arc::new(contract_market_from_id(id).unwrap_or_else(|| Market {
            id: id.to_string(),
            symbol: strip_suffix(id).to_string(),
            ..Market::default()
        }))
    }

    fn market_from_arg(&self, arg: &Value) -> Option<Arc<Market>> {
        market_id_from_arg(arg, self.options.sandbox).map(|id| self.market_by_id(&id))
    }

    fn currency_code(&self, id: &str) -> String {
        let upper = id.to_uppercase();
        self.common_currencies.get(&upper).cloned().unwrap_or(upper)
    }

    // ==================== Dispatch ====================

    /// Applies one decoded frame.
    pub fn handle_message(&self, message: &Value) {
        match safe_string(message, "event").as_deref() {
            Some("error") => return self.handle_error(message),
            Some("login") => return self.handle_login(),
            Some("subscribe" | "unsubscribe") => {
                trace!(?message, "Bitget subscription acknowledged");
                return;
            }
            _ => {}
        }
        let Some(arg) = safe_value(message, "arg") else {
            debug!(?message, "Bitget frame without arg");
            return;
        };
        let channel = safe_string(arg, "channel").unwrap_or_default();
        match channel.as_str() {
            "ticker" => self.handle_ticker(message, arg),
            "trade" => self.handle_trades(message, arg),
            "orders" | "ordersAlgo" => self.handle_orders(message, arg, channel == "ordersAlgo"),
            "account" => self.handle_balance(message, arg),
            "positions" => self.handle_positions(message, arg),
            c if c.starts_with("candle") => self.handle_ohlcv(message, arg, c),
            c if c.starts_with("books") => self.handle_order_book(message, arg, c),
            other => debug!(channel = other, "Unhandled Bitget channel"),
        }
    }

    fn handle_login(&self) {
        self.authenticated.store(true, Ordering::Release);
        self.auth.resolve(AUTH_HASH, &true);
    }

    fn handle_error(&self, message: &Value) {
        let error = parse_ws_error(message);
        warn!(error = %error, "Bitget stream error");
        if error.as_authentication().is_some() {
            self.authenticated.store(false, Ordering::Release);
            self.auth.reject(AUTH_HASH, || parse_ws_error(message));
        } else {
            self.reject_all(|| parse_ws_error(message));
        }
    }

    fn handle_ticker(&self, message: &Value, arg: &Value) {
        let Some(market) = self.market_from_arg(arg) else {
            return;
        };
        for entry in data_array(message) {
            let ticker = parse_ws_ticker(entry, &market);
            let symbol = ticker.symbol.clone();
            self.caches().tickers.insert(symbol.clone(), ticker.clone());
            self.tickers.resolve(&ticker_hash(&symbol), &ticker);
            for hash in self.tickers.find_hashes("tickers::") {
                if listed_symbols(&hash).contains(&symbol.as_str()) {
                    self.tickers.resolve(&hash, &ticker);
                }
            }
        }
    }

    fn handle_ohlcv(&self, message: &Value, arg: &Value, channel: &str) {
        let Some(timeframe) = timeframe_from_channel(channel) else {
            debug!(channel, "Unknown Bitget candle channel");
            return;
        };
        let Some(market) = self.market_from_arg(arg) else {
            return;
        };
        let symbol = market.symbol.clone();
        {
            let mut caches = self.caches();
            let cache = caches
                .ohlcvs
                .entry((symbol.clone(), timeframe))
                .or_insert_with(|| ArrayCacheByTimestamp::new(self.options.ohlcv_limit));
            for row in data_array(message) {
                match parse_ws_ohlcv(row) {
                    Ok(candle) => cache.append(candle),
                    Err(e) => warn!(error = %e, "Failed to parse Bitget candle"),
                }
            }
        }
        self.updates.resolve(&candles_hash(timeframe, &symbol), &symbol);
    }

    fn handle_order_book(&self, message: &Value, arg: &Value, channel: &str) {
        let Some(market) = self.market_from_arg(arg) else {
            return;
        };
        let Some(data) = data_array(message).first() else {
            return;
        };
        let symbol = market.symbol.clone();
        let hash = orderbook_hash(&symbol);
        let timestamp = safe_integer(data, "ts");

        let book = {
            let mut caches = self.caches();
            if channel == "books" {
                let is_snapshot = safe_string(message, "action").as_deref() == Some("snapshot");
                if !is_snapshot && !caches.order_books.contains_key(&symbol) {
                    // waiting for the snapshot of a resubscribe
                    trace!(symbol = %symbol, "Bitget book delta without snapshot ignored");
                    return;
                }
                let book = caches
                    .order_books
                    .entry(symbol.clone())
                    .or_insert_with(|| OrderBook::new(symbol.clone()));
                if is_snapshot {
                    book.reset();
                }
                store_levels(book, data);
                book.set_timestamp(timestamp);

                if self.options.checksum && !is_snapshot {
                    if let Some(expected) = safe_integer(data, "checksum") {
                        let payload = book.checksum_payload(CHECKSUM_DEPTH);
                        if !checksum::verify(&payload, expected) {
                            caches.order_books.remove(&symbol);
                            drop(caches);
                            warn!(symbol = %symbol, expected, "Bitget order book checksum mismatch");
                            self.queue_resync(arg);
                            self.order_books
                                .reject(&hash, || Error::invalid_nonce("bitget invalid checksum"));
                            return;
                        }
                    }
                }
                book.clone()
            } else {
                let mut book = OrderBook::new(symbol.clone());
                store_levels(&mut book, data);
                book.set_timestamp(timestamp);
                caches.order_books.insert(symbol.clone(), book.clone());
                book
            }
        };

        self.order_books.resolve(&hash, &book);
        for multi in self.order_books.find_hashes("multipleOrderbooks::") {
            if listed_symbols(&multi).contains(&symbol.as_str()) {
                self.order_books.resolve(&multi, &book);
            }
        }
    }

    fn handle_trades(&self, message: &Value, arg: &Value) {
        let Some(market) = self.market_from_arg(arg) else {
            return;
        };
        let symbol = market.symbol.clone();
        {
            let mut caches = self.caches();
            let cache = caches
                .trades
                .entry(symbol.clone())
                .or_insert_with(|| ArrayCache::new(self.options.trades_limit));
            // newest first on the wire
            for row in data_array(message).iter().rev() {
                match parse_ws_trade(row, &market) {
                    Ok(trade) => cache.append(trade),
                    Err(e) => warn!(error = %e, "Failed to parse Bitget trade"),
                }
            }
        }
        self.updates.resolve(&trade_hash(&symbol), &symbol);
        for multi in self.updates.find_hashes("multipleTrades::") {
            if listed_symbols(&multi).contains(&symbol.as_str()) {
                self.updates.resolve(&multi, &symbol);
            }
        }
    }

    fn handle_orders(&self, message: &Value, arg: &Value, trigger: bool) {
        let inst_type = safe_string(arg, "instType").unwrap_or_default();
        let is_contract_update = inst_type.eq_ignore_ascii_case(self.options.contract_inst_type());
        let mut order_symbols = BTreeSet::new();
        let mut trade_symbols = BTreeSet::new();
        {
            let mut caches = self.caches();
            let limit = self.options.orders_limit;
            let trades_limit = self.options.trades_limit;
            let mut fills = Vec::new();
            let orders = if trigger {
                caches
                    .trigger_orders
                    .get_or_insert_with(|| ArrayCacheBySymbolById::new(limit))
            } else {
                caches
                    .orders
                    .get_or_insert_with(|| ArrayCacheBySymbolById::new(limit))
            };
            for entry in data_array(message) {
                let market = match safe_string(entry, "instId") {
                    Some(id) => self.market_by_id(&id),
                    None => match self.market_from_arg(arg) {
                        Some(market) => market,
                        None => continue,
                    },
                };
                let order = parse_ws_order(entry, &market);
                order_symbols.insert(order.symbol.clone());
                orders.append(order);

                if is_contract_update && safe_string(entry, "execType").as_deref() == Some("T") {
                    match parse_ws_my_trade(entry, &market) {
                        Ok(trade) => fills.push(trade),
                        Err(e) => warn!(error = %e, "Failed to parse Bitget fill"),
                    }
                }
            }
            if !fills.is_empty() {
                let my_trades = caches
                    .my_trades
                    .get_or_insert_with(|| ArrayCache::new(trades_limit));
                for trade in fills {
                    trade_symbols.insert(trade.symbol.clone());
                    my_trades.append(trade);
                }
            }
        }

        for symbol in &order_symbols {
            self.updates.resolve(&orders_hash(trigger, Some(symbol)), symbol);
        }
        self.updates.resolve(&orders_hash(trigger, None), &String::new());
        if !trade_symbols.is_empty() {
            for symbol in &trade_symbols {
                self.updates.resolve(&my_trades_hash(Some(symbol)), symbol);
            }
            self.updates.resolve(&my_trades_hash(None), &String::new());
        }
    }

    fn handle_positions(&self, message: &Value, arg: &Value) {
        let inst_type = safe_string(arg, "instType")
            .unwrap_or_default()
            .to_lowercase();
        let data = data_array(message);
        if data.is_empty() {
            return;
        }
        let positions: Vec<Position> = data
            .iter()
            .map(|entry| {
                let market = self.market_by_id(&safe_string(entry, "instId").unwrap_or_default());
                parse_ws_position(entry, &market)
            })
            .collect();
        {
            let mut caches = self.caches();
            let cache = caches.positions.entry(inst_type.clone()).or_default();
            for position in &positions {
                cache.append(position.clone());
            }
        }

        let hash = positions_hash(&inst_type);
        for multi in self.positions.find_hashes(&format!("{hash}::")) {
            let wanted = listed_symbols(&multi);
            let subset: Vec<Position> = positions
                .iter()
                .filter(|p| wanted.contains(&p.symbol.as_str()))
                .cloned()
                .collect();
            if !subset.is_empty() {
                self.positions.resolve(&multi, &subset);
            }
        }
        self.positions.resolve(&hash, &positions);
    }

    fn handle_balance(&self, message: &Value, arg: &Value) {
        let inst_type = safe_string(arg, "instType").unwrap_or_default();
        let balance = {
            let mut caches = self.caches();
            for entry in data_array(message) {
                let Some(currency_id) = safe_string_2(entry, "coinName", "marginCoin") else {
                    continue;
                };
                let balance_entry = BalanceEntry {
                    free: safe_decimal(entry, "available"),
                    used: safe_decimal(entry, "frozen"),
                    total: safe_decimal(entry, "equity"),
                };
                caches
                    .balance
                    .set(self.currency_code(&currency_id), balance_entry);
            }
            caches.balance.info = message.clone();
            let balance = std::mem::take(&mut caches.balance).safe_balance();
            caches.balance = balance.clone();
            balance
        };
        self.balances.resolve(&balance_hash(&inst_type), &balance);
    }

    // ==================== Readers ====================

    /// Public trades for `symbol` received since the previous read.
    pub fn take_trades(&self, symbol: &str, since: Option<i64>, limit: Option<usize>) -> Vec<Trade> {
        let mut caches = self.caches();
        let Some(cache) = caches.trades.get_mut(symbol) else {
            return Vec::new();
        };
        let limit = cache.get_limit(Some(symbol), limit);
        filter_by_since_limit(&cache.to_vec(), since, limit, true)
    }

    /// Candles for `symbol` and `timeframe` updated since the previous read.
    pub fn take_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Vec<Ohlcv> {
        let mut caches = self.caches();
        let Some(cache) = caches.ohlcvs.get_mut(&(symbol.to_string(), timeframe)) else {
            return Vec::new();
        };
        let limit = cache.get_limit(limit);
        filter_by_since_limit(&cache.to_vec(), since, Some(limit), true)
    }

    /// Orders changed since the previous read.
    pub fn take_orders(
        &self,
        trigger: bool,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Vec<Order> {
        let mut caches = self.caches();
        let cache = if trigger {
            caches.trigger_orders.as_mut()
        } else {
            caches.orders.as_mut()
        };
        let Some(cache) = cache else {
            return Vec::new();
        };
        let limit = cache.get_limit(symbol, limit);
        filter_by_symbol_since_limit(&cache.to_vec(), symbol, since, limit, true)
    }

    /// Own fills received since the previous read.
    pub fn take_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Vec<Trade> {
        let mut caches = self.caches();
        let Some(cache) = caches.my_trades.as_mut() else {
            return Vec::new();
        };
        let limit = cache.get_limit(symbol, limit);
        filter_by_symbol_since_limit(&cache.to_vec(), symbol, since, limit, true)
    }

    /// Stored book for `symbol`.
    pub fn order_book(&self, symbol: &str) -> Option<OrderBook> {
        self.caches().order_books.get(symbol).cloned()
    }
}

/// Applies the `bids`/`asks` rows of a book message, keeping wire strings.
fn store_levels(book: &mut OrderBook, data: &Value) {
    for (key, side) in [("bids", &mut book.bids), ("asks", &mut book.asks)] {
        let rows = safe_value(data, key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for row in rows {
            let Some((price, amount)) = parse_bid_ask(row, 0, 1) else {
                continue;
            };
            if let Err(e) = side.store_raw(&price, &amount) {
                warn!(error = %e, price, amount, "Invalid Bitget book level");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinbridge_core::ws_client::wait;
    use coinbridge_core::types::{OrderStatus, PositionSide, Price};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn state() -> BitgetWsState {
        let cache = Arc::new(RwLock::new(MarketCache::default()));
        cache.write().unwrap().set_markets(vec![
            Market::new_spot("BTCUSDT", "BTC", "USDT"),
            Market::new_spot("ETHUSDT", "ETH", "USDT"),
        ]);
        BitgetWsState::new(cache, HashMap::new(), BitgetOptions::default())
    }

    fn book_message(action: &str, bids: Value, asks: Value, checksum: Option<i64>) -> Value {
        let mut data = json!({"bids": bids, "asks": asks, "ts": "1665645128291"});
        if let Some(checksum) = checksum {
            data["checksum"] = json!(checksum);
        }
        json!({
            "action": action,
            "arg": {"instType": "sp", "channel": "books", "instId": "BTCUSDT"},
            "data": [data]
        })
    }

    #[tokio::test]
    async fn test_ticker_resolves_single_and_multi_hashes() {
        let state = state();
        let single = state.ticker_hub().future(ticker_hash("BTC/USDT"));
        let multi = state
            .ticker_hub()
            .future(multi_hash("tickers", &["ETH/USDT".into(), "BTC/USDT".into()]));
        let other = state
            .ticker_hub()
            .future(multi_hash("tickers", &["ETH/USDT".into()]));

        state.handle_message(&json!({
            "action": "snapshot",
            "arg": {"instType": "sp", "channel": "ticker", "instId": "BTCUSDT"},
            "data": [{"instId": "BTCUSDT", "last": "20000", "ts": 1665645128291_i64}]
        }));

        assert_eq!(wait(single).await.unwrap().last, Some(Price::new(dec!(20000))));
        assert_eq!(wait(multi).await.unwrap().symbol, "BTC/USDT");
        assert!(state.ticker_hub().has_waiters("tickers::ETH/USDT"));
        drop(other);
    }

    #[tokio::test]
    async fn test_book_snapshot_then_delta() {
        let state = state();
        state.handle_message(&book_message(
            "snapshot",
            json!([["100", "1"], ["99", "2"]]),
            json!([["101", "1"]]),
            None,
        ));
        let book = state.order_book("BTC/USDT").unwrap();
        assert_eq!(book.bids.len(), 2);

        let delta_book = {
            let mut expected = book.clone();
            expected.bids.store_raw("100", "0").unwrap();
            expected.asks.store_raw("102", "3").unwrap();
            expected
        };
        let checksum = i64::from(checksum::crc32_signed(&delta_book.checksum_payload(25)));
        let rx = state.order_book_hub().future(orderbook_hash("BTC/USDT"));
        state.handle_message(&book_message(
            "update",
            json!([["100", "0"]]),
            json!([["102", "3"]]),
            Some(checksum),
        ));
        let book = wait(rx).await.unwrap();
        assert_eq!(book.best_bid().unwrap().price, Price::new(dec!(99)));
        assert_eq!(book.asks.len(), 2);
    }

    #[tokio::test]
    async fn test_book_checksum_mismatch_rejects_and_drops_book() {
        let state = state();
        state.handle_message(&book_message("snapshot", json!([["100", "1"]]), json!([["101", "1"]]), None));
        let rx = state.order_book_hub().future(orderbook_hash("BTC/USDT"));
        state.handle_message(&book_message("update", json!([["100", "2"]]), json!([]), Some(12345)));

        let err = wait(rx).await.unwrap_err();
        assert!(matches!(err, Error::InvalidNonce(_)));
        assert!(err.to_string().contains("invalid checksum"));
        assert!(state.order_book("BTC/USDT").is_none());
        assert_eq!(
            state.take_resyncs(),
            vec![BookResync { inst_type: "sp".into(), inst_id: "BTCUSDT".into() }]
        );
        assert!(state.take_resyncs().is_empty());
    }

    #[tokio::test]
    async fn test_book_recovers_after_checksum_mismatch() {
        let state = state();
        state.handle_message(&book_message("snapshot", json!([["100", "1"]]), json!([["101", "1"]]), None));
        state.handle_message(&book_message("update", json!([["100", "2"]]), json!([]), Some(1)));
        assert_eq!(state.take_resyncs().len(), 1);

        // deltas before the new snapshot are dropped
        let rx = state.order_book_hub().future(orderbook_hash("BTC/USDT"));
        for _ in 0..3 {
            state.handle_message(&book_message("update", json!([["99", "1"]]), json!([]), Some(0)));
        }
        assert!(state.order_book("BTC/USDT").is_none());
        assert!(state.take_resyncs().is_empty());

        state.handle_message(&book_message("snapshot", json!([["100", "3"]]), json!([["101", "1"]]), None));
        assert_eq!(wait(rx).await.unwrap().bids.len(), 1);

        let mut expected = state.order_book("BTC/USDT").unwrap();
        expected.bids.store_raw("99", "4").unwrap();
        let checksum = i64::from(checksum::crc32_signed(&expected.checksum_payload(25)));
        let rx = state.order_book_hub().future(orderbook_hash("BTC/USDT"));
        state.handle_message(&book_message("update", json!([["99", "4"]]), json!([]), Some(checksum)));

        let book = wait(rx).await.unwrap();
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.best_bid().unwrap().price, Price::new(dec!(100)));
        assert!(state.take_resyncs().is_empty());
    }

    #[tokio::test]
    async fn test_book_snapshot_resets_levels() {
        let state = state();
        state.handle_message(&book_message("snapshot", json!([["100", "1"]]), json!([]), None));
        state.handle_message(&book_message("snapshot", json!([["98", "1"]]), json!([]), None));
        let book = state.order_book("BTC/USDT").unwrap();
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.best_bid().unwrap().price, Price::new(dec!(98)));
    }

    #[test]
    fn test_fixed_depth_books_replace() {
        let state = state();
        for bids in [json!([["100", "1"], ["99", "1"]]), json!([["97", "1"]])] {
            state.handle_message(&json!({
                "action": "snapshot",
                "arg": {"instType": "sp", "channel": "books5", "instId": "BTCUSDT"},
                "data": [{"bids": bids, "asks": [], "ts": "1"}]
            }));
        }
        let book = state.order_book("BTC/USDT").unwrap();
        assert_eq!(book.bids.len(), 1);
    }

    #[tokio::test]
    async fn test_trades_cache_and_multi_hash() {
        let state = state();
        let rx = state
            .update_hub()
            .future(multi_hash("multipleTrades", &["BTC/USDT".into(), "ETH/USDT".into()]));
        state.handle_message(&json!({
            "action": "snapshot",
            "arg": {"instType": "sp", "channel": "trade", "instId": "BTCUSDT"},
            "data": [
                ["1665645128293", "101", "1", "buy"],
                ["1665645128291", "100", "2", "sell"]
            ]
        }));
        assert_eq!(wait(rx).await.unwrap(), "BTC/USDT");
        let trades = state.take_trades("BTC/USDT", None, None);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].timestamp, Some(1_665_645_128_291));
        assert!(state.take_trades("BTC/USDT", None, None).is_empty());
    }

    #[tokio::test]
    async fn test_candles_resolve_by_timeframe() {
        let state = state();
        let rx = state
            .update_hub()
            .future(candles_hash(Timeframe::M5, "BTC/USDT"));
        state.handle_message(&json!({
            "arg": {"instType": "sp", "channel": "candle5m", "instId": "BTCUSDT"},
            "data": [["1665645000000", "1", "2", "0.5", "1.5", "10"]]
        }));
        wait(rx).await.unwrap();
        let candles = state.take_ohlcv("BTC/USDT", Timeframe::M5, None, None);
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].close, dec!(1.5));
    }

    #[tokio::test]
    async fn test_contract_order_with_fill_feeds_my_trades() {
        let state = state();
        let orders = state.update_hub().future(orders_hash(false, None));
        let fills = state
            .update_hub()
            .future(my_trades_hash(Some("BTC/USDT:USDT")));
        state.handle_message(&json!({
            "action": "snapshot",
            "arg": {"instType": "umcbl", "channel": "orders", "instId": "default"},
            "data": [{
                "instId": "BTCUSDT_UMCBL",
                "ordId": "1",
                "sz": "2",
                "px": "20000",
                "side": "open_long",
                "status": "partial-fill",
                "execType": "T",
                "tradeId": "t1",
                "fillPx": "20000",
                "fillSz": "1",
                "fillTime": "1665645128291",
                "fillFee": "-0.1",
                "fillFeeCcy": "USDT",
                "cTime": 1665645128000_i64
            }]
        }));
        wait(orders).await.unwrap();
        assert_eq!(wait(fills).await.unwrap(), "BTC/USDT:USDT");

        let cached = state.take_orders(false, Some("BTC/USDT:USDT"), None, None);
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].status, Some(OrderStatus::Open));
        let trades = state.take_my_trades(None, None, None);
        assert_eq!(trades[0].id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_spot_order_is_not_a_fill() {
        let state = state();
        state.handle_message(&json!({
            "arg": {"instType": "spbl", "channel": "orders", "instId": "BTCUSDT_SPBL"},
            "data": [{"instId": "BTCUSDT_SPBL", "ordId": "1", "execType": "T", "fillPx": "1", "fillSz": "1"}]
        }));
        assert_eq!(state.take_orders(false, Some("BTC/USDT"), None, None).len(), 1);
        assert!(state.caches().my_trades.is_none());
    }

    #[test]
    fn test_sandbox_contract_fills() {
        let cache = Arc::new(RwLock::new(MarketCache::default()));
        cache
            .write()
            .unwrap()
            .set_markets(vec![Market::new_swap("SBTCSUSDT_SUMCBL", "SBTC", "SUSDT", "SUSDT")]);
        let options = BitgetOptions { sandbox: true, ..Default::default() };
        let state = BitgetWsState::new(cache, HashMap::new(), options);
        let fill = |inst_type: &str, id: &str| {
            json!({
                "arg": {"instType": inst_type, "channel": "orders", "instId": "default"},
                "data": [{
                    "instId": "SBTCSUSDT_SUMCBL", "ordId": id, "side": "open_long",
                    "execType": "T", "tradeId": id, "fillPx": "20000", "fillSz": "1"
                }]
            })
        };

        state.handle_message(&fill("umcbl", "1"));
        assert!(state.caches().my_trades.is_none());

        state.handle_message(&fill("sumcbl", "2"));
        let trades = state.take_my_trades(None, None, None);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].symbol, "SBTC/SUSDT:SUSDT");
        assert_eq!(state.take_orders(false, Some("SBTC/SUSDT:SUSDT"), None, None).len(), 2);
    }

    #[tokio::test]
    async fn test_sandbox_public_arg_maps_to_demo_market() {
        let options = BitgetOptions { sandbox: true, ..Default::default() };
        let state = BitgetWsState::new(Arc::new(RwLock::new(MarketCache::default())), HashMap::new(), options);
        let rx = state.ticker_hub().future(ticker_hash("ETH/USDT:USDT"));
        state.handle_message(&json!({
            "action": "snapshot",
            "arg": {"instType": "mc", "channel": "ticker", "instId": "ETHUSDT"},
            "data": [{"instId": "ETHUSDT", "last": "1800", "ts": 1665645128291_i64}]
        }));
        let ticker = wait(rx).await.unwrap();
        assert_eq!(ticker.symbol, "ETH/USDT:USDT");
        assert_eq!(ticker.last, Some(Price::new(dec!(1800))));
    }

    #[tokio::test]
    async fn test_positions_resolve_subsets() {
        let state = state();
        let all = state.position_hub().future(positions_hash("umcbl"));
        let eth = state.position_hub().future(format!(
            "{}::ETH/USDT:USDT",
            positions_hash("umcbl")
        ));
        let btc = state.position_hub().future(format!(
            "{}::BTC/USDT:USDT",
            positions_hash("umcbl")
        ));
        state.handle_message(&json!({
            "action": "snapshot",
            "arg": {"instType": "umcbl", "channel": "positions", "instId": "default"},
            "data": [{
                "posId": "1", "instId": "BTCUSDT_UMCBL", "holdSide": "long",
                "marginMode": "crossed", "holdMode": "single_hold", "total": "1",
                "uTime": "1665645128291"
            }]
        }));
        assert_eq!(wait(all).await.unwrap().len(), 1);
        let subset = wait(btc).await.unwrap();
        assert_eq!(subset[0].side, Some(PositionSide::Long));
        assert!(state.position_hub().has_waiters("umcbl:positions::ETH/USDT:USDT"));
        drop(eth);
    }

    #[test]
    fn test_empty_positions_are_ignored() {
        let state = state();
        let _rx = state.position_hub().future(positions_hash("umcbl"));
        state.handle_message(&json!({
            "arg": {"instType": "umcbl", "channel": "positions", "instId": "default"},
            "data": []
        }));
        assert!(state.position_hub().has_waiters("umcbl:positions"));
    }

    #[tokio::test]
    async fn test_balance_merges_updates() {
        let state = state();
        state.handle_message(&json!({
            "arg": {"instType": "spbl", "channel": "account", "instId": "default"},
            "data": [{"coinName": "USDT", "available": "100", "frozen": "5"}]
        }));
        let rx = state.balance_hub().future(balance_hash("SPBL"));
        state.handle_message(&json!({
            "arg": {"instType": "spbl", "channel": "account", "instId": "default"},
            "data": [{"coinName": "BTC", "available": "1"}]
        }));
        let balance = wait(rx).await.unwrap();
        assert_eq!(balance.get("USDT").unwrap().total, Some(dec!(105)));
        assert_eq!(balance.get("BTC").unwrap().free, Some(dec!(1)));
    }

    #[tokio::test]
    async fn test_login_and_auth_error() {
        let state = state();
        let rx = state.auth_hub().future(AUTH_HASH);
        state.handle_message(&json!({"event": "login", "code": 0}));
        assert!(wait(rx).await.unwrap());
        assert!(state.is_authenticated());

        let rx = state.auth_hub().future(AUTH_HASH);
        let ticker = state.ticker_hub().future(ticker_hash("BTC/USDT"));
        state.handle_message(&json!({"event": "error", "code": 30005, "msg": "Login failed"}));
        assert!(wait(rx).await.unwrap_err().as_authentication().is_some());
        assert!(!state.is_authenticated());
        assert!(state.ticker_hub().has_waiters(&ticker_hash("BTC/USDT")));
        drop(ticker);
    }

    #[tokio::test]
    async fn test_other_errors_reject_everything() {
        let state = state();
        let ticker = state.ticker_hub().future(ticker_hash("BTC/USDT"));
        let trades = state.update_hub().future(trade_hash("BTC/USDT"));
        state.handle_message(&json!({"event": "error", "code": 30006, "msg": "request too many"}));
        assert!(matches!(wait(ticker).await.unwrap_err(), Error::RateLimit { .. }));
        assert!(matches!(wait(trades).await.unwrap_err(), Error::RateLimit { .. }));
    }

    #[test]
    fn test_market_lookup() {
        let state = state();
        assert_eq!(state.market_by_id("BTCUSDT_SPBL").symbol, "BTC/USDT");
        assert_eq!(state.market_by_id("ETHUSDT_UMCBL").symbol, "ETH/USDT:USDT");
        assert_eq!(state.market_by_id("XYZ_SPBL").symbol, "XYZ");
        assert_eq!(state.market("BTC/USDT:USDT").unwrap().id, "BTCUSDT_UMCBL");
        assert!(state.market("DOGE/EUR").is_err());
    }

    #[test]
    fn test_private_subscription_bookkeeping() {
        let state = state();
        assert!(state.add_private_subscription("orders"));
        assert!(!state.add_private_subscription("orders"));
        state.reset_session();
        assert!(state.add_private_subscription("orders"));
        state.remove_private_subscription("orders");
        assert!(state.add_private_subscription("orders"));
    }
}
