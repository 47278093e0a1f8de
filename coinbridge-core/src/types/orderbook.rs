//! Order book with price-sorted sides.
//!
//! Each side keeps its levels in a `BTreeMap` keyed by price. Levels
//! received as strings keep those strings so checksum payloads can be
//! rebuilt byte for byte as the exchange sent them.

use rust_decimal::Decimal;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::{Amount, Price, Symbol, Timestamp};

/// One price level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    /// Level price.
    pub price: Price,
    /// Resting amount.
    pub amount: Amount,
    #[serde(skip)]
    raw: Option<(String, String)>,
}

impl OrderBookEntry {
    /// Level without wire strings.
    pub fn new(price: Price, amount: Amount) -> Self {
        Self {
            price,
            amount,
            raw: None,
        }
    }

    /// Price as the exchange sent it, or the decimal rendering.
    pub fn raw_price(&self) -> String {
        self.raw
            .as_ref()
            .map_or_else(|| self.price.to_string(), |(p, _)| p.clone())
    }

    /// Amount as the exchange sent it, or the decimal rendering.
    pub fn raw_amount(&self) -> String {
        self.raw
            .as_ref()
            .map_or_else(|| self.amount.to_string(), |(_, a)| a.clone())
    }
}

/// Which side of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SideKind {
    /// Buy side, best is highest.
    #[default]
    Bids,
    /// Sell side, best is lowest.
    Asks,
}

/// One side of an order book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookSide {
    kind: SideKind,
    levels: BTreeMap<Decimal, OrderBookEntry>,
}

impl BookSide {
    /// Empty side.
    pub fn new(kind: SideKind) -> Self {
        Self {
            kind,
            levels: BTreeMap::new(),
        }
    }

    /// Side kind.
    pub fn kind(&self) -> SideKind {
        self.kind
    }

    /// Sets the amount at `price`. Zero removes the level.
    pub fn store(&mut self, price: Decimal, amount: Decimal) {
        if amount.is_zero() {
            self.levels.remove(&price);
        } else {
            self.levels
                .insert(price, OrderBookEntry::new(Price(price), Amount(amount)));
        }
    }

    /// Like [`store`](Self::store) but parses and keeps the wire strings.
    pub fn store_raw(&mut self, price: &str, amount: &str) -> crate::Result<()> {
        let p = Price::from_str(price)?.0;
        let a = Amount::from_str(amount)?.0;
        if a.is_zero() {
            self.levels.remove(&p);
        } else {
            self.levels.insert(
                p,
                OrderBookEntry {
                    price: Price(p),
                    amount: Amount(a),
                    raw: Some((price.to_string(), amount.to_string())),
                },
            );
        }
        Ok(())
    }

    /// Levels from best to worst.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &OrderBookEntry> + '_> {
        match self.kind {
            SideKind::Bids => Box::new(self.levels.values().rev()),
            SideKind::Asks => Box::new(self.levels.values()),
        }
    }

    /// Owned levels from best to worst.
    pub fn levels(&self) -> Vec<OrderBookEntry> {
        self.iter().cloned().collect()
    }

    /// Best level.
    pub fn best(&self) -> Option<&OrderBookEntry> {
        match self.kind {
            SideKind::Bids => self.levels.values().next_back(),
            SideKind::Asks => self.levels.values().next(),
        }
    }

    /// Level at position `index` counted from the best.
    pub fn get(&self, index: usize) -> Option<&OrderBookEntry> {
        self.iter().nth(index)
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// No levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Drops the worst levels until at most `depth` remain.
    pub fn limit(&mut self, depth: usize) {
        while self.levels.len() > depth {
            match self.kind {
                SideKind::Bids => self.levels.pop_first(),
                SideKind::Asks => self.levels.pop_last(),
            };
        }
    }

    /// Removes every level.
    pub fn clear(&mut self) {
        self.levels.clear();
    }

    /// Sum of amounts on this side.
    pub fn volume(&self) -> Amount {
        self.levels.values().map(|l| l.amount).sum()
    }
}

impl Serialize for BookSide {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for level in self.iter() {
            seq.serialize_element(&[level.price.0, level.amount.0])?;
        }
        seq.end()
    }
}

/// Two-sided order book for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBook {
    /// Unified symbol.
    pub symbol: Symbol,
    /// Exchange timestamp of the last update.
    pub timestamp: Option<Timestamp>,
    /// ISO 8601 form of `timestamp`.
    pub datetime: Option<String>,
    /// Sequence number, when the exchange sends one.
    pub nonce: Option<i64>,
    /// Buy side.
    pub bids: BookSide,
    /// Sell side.
    pub asks: BookSide,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new(Symbol::new())
    }
}

impl OrderBook {
    /// Empty book.
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp: None,
            datetime: None,
            nonce: None,
            bids: BookSide::new(SideKind::Bids),
            asks: BookSide::new(SideKind::Asks),
        }
    }

    /// Book built from full snapshot levels.
    pub fn from_snapshot<B, A>(
        symbol: impl Into<Symbol>,
        bids: B,
        asks: A,
        timestamp: Option<Timestamp>,
    ) -> Self
    where
        B: IntoIterator<Item = (Decimal, Decimal)>,
        A: IntoIterator<Item = (Decimal, Decimal)>,
    {
        let mut book = Self::new(symbol);
        for (p, a) in bids {
            book.bids.store(p, a);
        }
        for (p, a) in asks {
            book.asks.store(p, a);
        }
        book.set_timestamp(timestamp);
        book
    }

    /// Sets `timestamp` and the matching `datetime`.
    pub fn set_timestamp(&mut self, timestamp: Option<Timestamp>) {
        self.timestamp = timestamp;
        self.datetime = timestamp.and_then(crate::time::iso8601);
    }

    /// Clears both sides and the sequence state.
    pub fn reset(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.nonce = None;
        self.set_timestamp(None);
    }

    /// Highest bid.
    pub fn best_bid(&self) -> Option<&OrderBookEntry> {
        self.bids.best()
    }

    /// Lowest ask.
    pub fn best_ask(&self) -> Option<&OrderBookEntry> {
        self.asks.best()
    }

    /// Best ask minus best bid.
    pub fn spread(&self) -> Option<Price> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }

    /// Midpoint of the best bid and ask.
    pub fn mid_price(&self) -> Option<Price> {
        let bid = self.best_bid()?.price.0;
        let ask = self.best_ask()?.price.0;
        Some(Price((bid + ask) / Decimal::TWO))
    }

    /// Truncates both sides to `depth` levels. `None` keeps everything.
    pub fn limit(&mut self, depth: Option<usize>) {
        if let Some(depth) = depth {
            self.bids.limit(depth);
            self.asks.limit(depth);
        }
    }

    /// Copy truncated to `depth` levels.
    #[must_use]
    pub fn limited(&self, depth: Option<usize>) -> Self {
        let mut book = self.clone();
        book.limit(depth);
        book
    }

    /// Interleaves `bid price:bid amount:ask price:ask amount` for the top
    /// `depth` levels, skipping whichever side has run out.
    pub fn checksum_payload(&self, depth: usize) -> String {
        let mut parts = Vec::with_capacity(depth * 4);
        let mut bids = self.bids.iter();
        let mut asks = self.asks.iter();
        for _ in 0..depth {
            let bid = bids.next();
            let ask = asks.next();
            if bid.is_none() && ask.is_none() {
                break;
            }
            if let Some(level) = bid {
                parts.push(level.raw_price());
                parts.push(level.raw_amount());
            }
            if let Some(level) = ask {
                parts.push(level.raw_price());
                parts.push(level.raw_amount());
            }
        }
        parts.join(":")
    }
}
