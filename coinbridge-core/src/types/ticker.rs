//! Ticker type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Amount, Price, Symbol, Timestamp};

/// 24h statistics and top of book for one market.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    /// Unified symbol.
    pub symbol: Symbol,
    /// Exchange timestamp in milliseconds.
    pub timestamp: Option<Timestamp>,
    /// ISO 8601 form of `timestamp`.
    pub datetime: Option<String>,
    /// 24h high.
    pub high: Option<Price>,
    /// 24h low.
    pub low: Option<Price>,
    /// Best bid.
    pub bid: Option<Price>,
    /// Best bid size.
    pub bid_volume: Option<Amount>,
    /// Best ask.
    pub ask: Option<Price>,
    /// Best ask size.
    pub ask_volume: Option<Amount>,
    /// 24h volume weighted average price.
    pub vwap: Option<Price>,
    /// 24h open.
    pub open: Option<Price>,
    /// Close (equal to `last`).
    pub close: Option<Price>,
    /// Last traded price.
    pub last: Option<Price>,
    /// Previous close.
    pub previous_close: Option<Price>,
    /// Absolute change since open.
    pub change: Option<Price>,
    /// Percentage change since open.
    pub percentage: Option<Decimal>,
    /// Average of open and last.
    pub average: Option<Price>,
    /// 24h base volume.
    pub base_volume: Option<Amount>,
    /// 24h quote volume.
    pub quote_volume: Option<Amount>,
    /// Raw exchange payload.
    #[serde(default)]
    pub info: Value,
}

impl Ticker {
    /// Fills `close`, `change`, `percentage` and `average` from the other
    /// fields where the exchange left them out.
    pub fn complete(&mut self) {
        if self.close.is_none() {
            self.close = self.last;
        }
        if self.last.is_none() {
            self.last = self.close;
        }
        if let (Some(open), Some(last)) = (self.open, self.last) {
            if self.change.is_none() {
                self.change = Some(last - open);
            }
            if self.percentage.is_none() && !open.is_zero() {
                self.percentage = Some((last.0 - open.0) / open.0 * Decimal::ONE_HUNDRED);
            }
            if self.average.is_none() {
                self.average = Some(Price((last.0 + open.0) / Decimal::TWO));
            }
        }
    }
}
