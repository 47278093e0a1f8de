//! Candlesticks.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Timestamp;

/// One candle: `[timestamp, open, high, low, close, volume]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ohlcv {
    /// Candle open time in milliseconds.
    pub timestamp: Timestamp,
    /// Open.
    pub open: Decimal,
    /// High.
    pub high: Decimal,
    /// Low.
    pub low: Decimal,
    /// Close.
    pub close: Decimal,
    /// Base volume.
    pub volume: Decimal,
}

impl Ohlcv {
    /// Builds a candle.
    pub fn new(
        timestamp: Timestamp,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Parses the common `[ts, o, h, l, c, v]` array layout, where the
    /// numeric columns may be strings or numbers. `ts_scale` multiplies
    /// the first column (1000 for exchanges that send seconds).
    pub fn from_row(row: &serde_json::Value, ts_scale: i64) -> crate::Result<Self> {
        use crate::parser_utils::{safe_decimal_index, safe_integer_index};

        let timestamp = safe_integer_index(row, 0)
            .ok_or_else(|| crate::Error::missing_field("timestamp"))?
            * ts_scale;
        let col = |i: usize, name: &'static str| {
            safe_decimal_index(row, i).ok_or_else(|| crate::Error::missing_field(name))
        };
        Ok(Self {
            timestamp,
            open: col(1, "open")?,
            high: col(2, "high")?,
            low: col(3, "low")?,
            close: col(4, "close")?,
            volume: col(5, "volume")?,
        })
    }
}
