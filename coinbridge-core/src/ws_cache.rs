//! Bounded caches for streamed trades, candles, orders and positions.
//!
//! Every cache counts how many entries arrived since a consumer last asked.
//! [`get_limit`](ArrayCache::get_limit) reports that count (capped by the
//! caller's limit) and arms a reset that takes effect on the next append,
//! so repeated reads before new data see the same count.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::{Ohlcv, Order, Position, Trade};

/// Entry with an exchange timestamp.
pub trait Timestamped {
    /// Milliseconds since the epoch.
    fn timestamp(&self) -> Option<i64>;
}

/// Entry that belongs to a symbol.
pub trait HasSymbol {
    /// Unified symbol.
    fn symbol(&self) -> &str;
}

/// Entry with a stable id.
pub trait HasId: HasSymbol {
    /// Identifier, unique per symbol.
    fn id(&self) -> &str;
}

/// Entry keyed by a side within its symbol.
pub trait HasSide: HasSymbol {
    /// Side key (`long`, `short`).
    fn side_key(&self) -> &str;
}

impl Timestamped for Trade {
    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

impl HasSymbol for Trade {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl HasId for Trade {
    fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }
}

impl Timestamped for Order {
    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

impl HasSymbol for Order {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl HasId for Order {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Timestamped for Ohlcv {
    fn timestamp(&self) -> Option<i64> {
        Some(self.timestamp)
    }
}

impl Timestamped for Position {
    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

impl HasSymbol for Position {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl HasSide for Position {
    fn side_key(&self) -> &str {
        self.side.map_or("", |s| s.as_str())
    }
}

#[derive(Debug, Clone, Default)]
struct UpdateCounter {
    by_symbol: HashMap<String, usize>,
    clear_symbols: HashSet<String>,
    all: usize,
    clear_all: bool,
}

impl UpdateCounter {
    fn prepare(&mut self, symbol: &str) -> bool {
        if self.clear_all {
            self.clear_all = false;
            self.clear_symbols.clear();
            self.by_symbol.clear();
            self.all = 0;
        }
        self.clear_symbols.remove(symbol)
    }

    fn bump(&mut self, symbol: &str) {
        if self.prepare(symbol) {
            self.by_symbol.insert(symbol.to_string(), 0);
        }
        *self.by_symbol.entry(symbol.to_string()).or_default() += 1;
        self.all += 1;
    }

    fn take(&mut self, symbol: Option<&str>, limit: Option<usize>) -> Option<usize> {
        let fresh = match symbol {
            None => {
                self.clear_all = true;
                Some(self.all)
            }
            Some(symbol) => {
                let count = self.by_symbol.get(symbol).copied();
                if count.is_some() {
                    self.clear_symbols.insert(symbol.to_string());
                }
                count
            }
        };
        match (fresh, limit) {
            (None, limit) => limit,
            (Some(n), Some(limit)) => Some(n.min(limit)),
            (Some(n), None) => Some(n),
        }
    }
}

/// Bounded FIFO; appending to a full cache evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct ArrayCache<T> {
    items: VecDeque<T>,
    max_size: usize,
    updates: UpdateCounter,
}

impl<T: HasSymbol + Clone> ArrayCache<T> {
    /// Cache holding at most `max_size` entries.
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
            updates: UpdateCounter::default(),
        }
    }

    /// Appends `item`, evicting the oldest entry when full.
    pub fn append(&mut self, item: T) {
        if self.max_size == 0 {
            return;
        }
        if self.items.len() == self.max_size {
            self.items.pop_front();
        }
        self.updates.bump(item.symbol());
        self.items.push_back(item);
    }

    /// New entries for `symbol` (or all symbols) since the previous call,
    /// capped at `limit`. `None` when nothing was counted and no limit
    /// was given.
    pub fn get_limit(&mut self, symbol: Option<&str>, limit: Option<usize>) -> Option<usize> {
        self.updates.take(symbol, limit)
    }

    /// Entries oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    /// Entries for `symbol`, oldest first.
    pub fn for_symbol(&self, symbol: &str) -> Vec<T> {
        self.items
            .iter()
            .filter(|i| i.symbol() == symbol)
            .cloned()
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// No entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Capacity.
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

/// Bounded cache keyed by timestamp; an entry with a known timestamp
/// replaces the stored one in place.
#[derive(Debug, Clone)]
pub struct ArrayCacheByTimestamp<T> {
    items: VecDeque<T>,
    max_size: usize,
    fresh: HashSet<i64>,
    clear_fresh: bool,
}

impl<T: Timestamped + Clone> ArrayCacheByTimestamp<T> {
    /// Cache holding at most `max_size` entries.
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
            fresh: HashSet::new(),
            clear_fresh: false,
        }
    }

    /// Inserts or replaces by timestamp.
    pub fn append(&mut self, item: T) {
        let Some(ts) = item.timestamp() else {
            return;
        };
        if self.max_size == 0 {
            return;
        }
        if let Some(slot) = self.items.iter_mut().find(|i| i.timestamp() == Some(ts)) {
            *slot = item;
        } else {
            if self.items.len() == self.max_size {
                self.items.pop_front();
            }
            self.items.push_back(item);
        }
        if self.clear_fresh {
            self.clear_fresh = false;
            self.fresh.clear();
        }
        self.fresh.insert(ts);
    }

    /// Distinct timestamps touched since the previous call, capped at `limit`.
    pub fn get_limit(&mut self, limit: Option<usize>) -> usize {
        self.clear_fresh = true;
        let n = self.fresh.len();
        limit.map_or(n, |l| n.min(l))
    }

    /// Entries oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// No entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Bounded cache keyed by `(symbol, id)`. A known key is replaced and
/// moved to the newest position.
#[derive(Debug, Clone)]
pub struct ArrayCacheBySymbolById<T> {
    items: VecDeque<T>,
    max_size: usize,
    fresh: HashMap<String, HashSet<String>>,
    all: usize,
    clear_symbols: HashSet<String>,
    clear_all: bool,
}

impl<T: HasId + Clone> ArrayCacheBySymbolById<T> {
    /// Cache holding at most `max_size` entries.
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
            fresh: HashMap::new(),
            all: 0,
            clear_symbols: HashSet::new(),
            clear_all: false,
        }
    }

    /// Inserts or replaces by `(symbol, id)`.
    pub fn append(&mut self, item: T) {
        if self.max_size == 0 {
            return;
        }
        let existing = self
            .items
            .iter()
            .position(|i| i.symbol() == item.symbol() && i.id() == item.id());
        if let Some(index) = existing {
            self.items.remove(index);
        } else if self.items.len() == self.max_size {
            self.items.pop_front();
        }
        self.track(item.symbol(), item.id());
        self.items.push_back(item);
    }

    fn track(&mut self, symbol: &str, id: &str) {
        if self.clear_all {
            self.clear_all = false;
            self.clear_symbols.clear();
            self.fresh.clear();
            self.all = 0;
        }
        if self.clear_symbols.remove(symbol) {
            self.fresh.remove(symbol);
        }
        if self
            .fresh
            .entry(symbol.to_string())
            .or_default()
            .insert(id.to_string())
        {
            self.all += 1;
        }
    }

    /// Distinct ids updated for `symbol` (or overall) since the previous
    /// call, capped at `limit`.
    pub fn get_limit(&mut self, symbol: Option<&str>, limit: Option<usize>) -> Option<usize> {
        let fresh = match symbol {
            None => {
                self.clear_all = true;
                Some(self.all)
            }
            Some(symbol) => self.fresh.get(symbol).map(|ids| {
                self.clear_symbols.insert(symbol.to_string());
                ids.len()
            }),
        };
        match (fresh, limit) {
            (None, limit) => limit,
            (Some(n), Some(limit)) => Some(n.min(limit)),
            (Some(n), None) => Some(n),
        }
    }

    /// Entry with `id` under `symbol`.
    pub fn get(&self, symbol: &str, id: &str) -> Option<&T> {
        self.items
            .iter()
            .find(|i| i.symbol() == symbol && i.id() == id)
    }

    /// Entries oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    /// Entries for `symbol`, oldest first.
    pub fn for_symbol(&self, symbol: &str) -> Vec<T> {
        self.items
            .iter()
            .filter(|i| i.symbol() == symbol)
            .cloned()
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// No entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cache keyed by `(symbol, side)`, one entry per key, replaced in place.
/// The key space is small so the cache is unbounded.
#[derive(Debug, Clone, Default)]
pub struct ArrayCacheBySymbolBySide<T> {
    items: Vec<T>,
    updates: UpdateCounter,
}

impl<T: HasSide + Clone> ArrayCacheBySymbolBySide<T> {
    /// Empty cache.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            updates: UpdateCounter::default(),
        }
    }

    /// Inserts or replaces by `(symbol, side)`.
    pub fn append(&mut self, item: T) {
        let slot = self
            .items
            .iter_mut()
            .find(|i| i.symbol() == item.symbol() && i.side_key() == item.side_key());
        self.updates.bump(item.symbol());
        match slot {
            Some(slot) => *slot = item,
            None => self.items.push(item),
        }
    }

    /// New entries for `symbol` (or all) since the previous call.
    pub fn get_limit(&mut self, symbol: Option<&str>, limit: Option<usize>) -> Option<usize> {
        self.updates.take(symbol, limit)
    }

    /// Entries in insertion order.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// No entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Keeps items with `timestamp >= since`, then the last (`tail`) or
/// first `limit` of them.
pub fn filter_by_since_limit<T: Timestamped + Clone>(
    items: &[T],
    since: Option<i64>,
    limit: Option<usize>,
    tail: bool,
) -> Vec<T> {
    let mut out: Vec<T> = match since {
        Some(since) => items
            .iter()
            .filter(|i| i.timestamp().is_some_and(|ts| ts >= since))
            .cloned()
            .collect(),
        None => items.to_vec(),
    };
    if let Some(limit) = limit {
        if out.len() > limit {
            if tail {
                out.drain(..out.len() - limit);
            } else {
                out.truncate(limit);
            }
        }
    }
    out
}

/// [`filter_by_since_limit`] restricted to `symbol`.
pub fn filter_by_symbol_since_limit<T: Timestamped + HasSymbol + Clone>(
    items: &[T],
    symbol: Option<&str>,
    since: Option<i64>,
    limit: Option<usize>,
    tail: bool,
) -> Vec<T> {
    match symbol {
        Some(symbol) => {
            let matching: Vec<T> = items
                .iter()
                .filter(|i| i.symbol() == symbol)
                .cloned()
                .collect();
            filter_by_since_limit(&matching, since, limit, tail)
        }
        None => filter_by_since_limit(items, since, limit, tail),
    }
}
