//! What an adapter can do, as bitflags.
//!
//! ```rust
//! use coinbridge_core::capability::Capabilities;
//!
//! let caps = Capabilities::FETCH_TICKER | Capabilities::WATCH_ORDER_BOOK;
//! assert!(caps.has("fetchTicker"));
//! assert!(caps.has("watchOrderBook"));
//! assert!(!caps.has("createOrder"));
//! ```

#![allow(missing_docs)]

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Supported operations, one bit each.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u64 {
        // public REST
        const FETCH_MARKETS     = 1 << 0;
        const FETCH_TICKER      = 1 << 1;
        const FETCH_TICKERS     = 1 << 2;
        const FETCH_ORDER_BOOK  = 1 << 3;
        const FETCH_TRADES      = 1 << 4;
        const FETCH_OHLCV       = 1 << 5;
        const FETCH_STATUS      = 1 << 6;
        const FETCH_TIME        = 1 << 7;

        // private REST
        const FETCH_BALANCE     = 1 << 8;
        const CREATE_ORDER      = 1 << 9;
        const CANCEL_ORDER      = 1 << 10;
        const CANCEL_ALL_ORDERS = 1 << 11;
        const FETCH_ORDER       = 1 << 12;
        const FETCH_ORDERS      = 1 << 13;
        const FETCH_OPEN_ORDERS = 1 << 14;
        const FETCH_MY_TRADES   = 1 << 15;

        // streaming
        const WATCH_TICKER      = 1 << 16;
        const WATCH_TICKERS     = 1 << 17;
        const WATCH_ORDER_BOOK  = 1 << 18;
        const WATCH_ORDER_BOOK_FOR_SYMBOLS = 1 << 19;
        const WATCH_TRADES      = 1 << 20;
        const WATCH_TRADES_FOR_SYMBOLS = 1 << 21;
        const WATCH_OHLCV       = 1 << 22;
        const WATCH_ORDERS      = 1 << 23;
        const WATCH_MY_TRADES   = 1 << 24;
        const WATCH_POSITIONS   = 1 << 25;
        const WATCH_BALANCE     = 1 << 26;

        const MARKET_DATA = Self::FETCH_MARKETS.bits()
            | Self::FETCH_TICKER.bits()
            | Self::FETCH_TICKERS.bits()
            | Self::FETCH_ORDER_BOOK.bits()
            | Self::FETCH_TRADES.bits()
            | Self::FETCH_OHLCV.bits();

        const TRADING = Self::CREATE_ORDER.bits()
            | Self::CANCEL_ORDER.bits()
            | Self::FETCH_ORDER.bits()
            | Self::FETCH_OPEN_ORDERS.bits();

        const WEBSOCKET_PUBLIC = Self::WATCH_TICKER.bits()
            | Self::WATCH_TICKERS.bits()
            | Self::WATCH_ORDER_BOOK.bits()
            | Self::WATCH_ORDER_BOOK_FOR_SYMBOLS.bits()
            | Self::WATCH_TRADES.bits()
            | Self::WATCH_TRADES_FOR_SYMBOLS.bits()
            | Self::WATCH_OHLCV.bits();

        const WEBSOCKET_PRIVATE = Self::WATCH_ORDERS.bits()
            | Self::WATCH_MY_TRADES.bits()
            | Self::WATCH_POSITIONS.bits()
            | Self::WATCH_BALANCE.bits();
    }
}

const NAMES: [(Capabilities, &str); 27] = [
    (Capabilities::FETCH_MARKETS, "fetchMarkets"),
    (Capabilities::FETCH_TICKER, "fetchTicker"),
    (Capabilities::FETCH_TICKERS, "fetchTickers"),
    (Capabilities::FETCH_ORDER_BOOK, "fetchOrderBook"),
    (Capabilities::FETCH_TRADES, "fetchTrades"),
    (Capabilities::FETCH_OHLCV, "fetchOHLCV"),
    (Capabilities::FETCH_STATUS, "fetchStatus"),
    (Capabilities::FETCH_TIME, "fetchTime"),
    (Capabilities::FETCH_BALANCE, "fetchBalance"),
    (Capabilities::CREATE_ORDER, "createOrder"),
    (Capabilities::CANCEL_ORDER, "cancelOrder"),
    (Capabilities::CANCEL_ALL_ORDERS, "cancelAllOrders"),
    (Capabilities::FETCH_ORDER, "fetchOrder"),
    (Capabilities::FETCH_ORDERS, "fetchOrders"),
    (Capabilities::FETCH_OPEN_ORDERS, "fetchOpenOrders"),
    (Capabilities::FETCH_MY_TRADES, "fetchMyTrades"),
    (Capabilities::WATCH_TICKER, "watchTicker"),
    (Capabilities::WATCH_TICKERS, "watchTickers"),
    (Capabilities::WATCH_ORDER_BOOK, "watchOrderBook"),
    (
        Capabilities::WATCH_ORDER_BOOK_FOR_SYMBOLS,
        "watchOrderBookForSymbols",
    ),
    (Capabilities::WATCH_TRADES, "watchTrades"),
    (Capabilities::WATCH_TRADES_FOR_SYMBOLS, "watchTradesForSymbols"),
    (Capabilities::WATCH_OHLCV, "watchOHLCV"),
    (Capabilities::WATCH_ORDERS, "watchOrders"),
    (Capabilities::WATCH_MY_TRADES, "watchMyTrades"),
    (Capabilities::WATCH_POSITIONS, "watchPositions"),
    (Capabilities::WATCH_BALANCE, "watchBalance"),
];

impl Capabilities {
    /// Checks a capability by its camelCase method name.
    pub fn has(&self, name: &str) -> bool {
        NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .is_some_and(|(flag, _)| self.contains(*flag))
    }

    /// camelCase names of the set flags.
    pub fn supported_capabilities(&self) -> Vec<&'static str> {
        NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, n)| *n)
            .collect()
    }

    /// Number of set flags.
    #[inline]
    pub fn count(&self) -> u32 {
        self.bits().count_ones()
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.supported_capabilities().join(", "))
    }
}

/// Builds [`Capabilities`] from flag names.
///
/// ```rust
/// use coinbridge_core::capabilities;
///
/// let caps = capabilities!(MARKET_DATA | FETCH_BALANCE, WATCH_TICKER);
/// assert!(caps.has("fetchBalance"));
/// ```
#[macro_export]
macro_rules! capabilities {
    ($cap:ident) => {
        $crate::capability::Capabilities::$cap
    };
    ($cap:ident | $($rest:tt)+) => {
        $crate::capability::Capabilities::$cap | $crate::capabilities!($($rest)+)
    };
    ($cap:ident, $($rest:tt)+) => {
        $crate::capability::Capabilities::$cap | $crate::capabilities!($($rest)+)
    };
}
