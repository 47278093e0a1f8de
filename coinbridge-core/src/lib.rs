//! Core of the coinbridge exchange clients.
//!
//! Unified market types, the error type, HTTP and WebSocket transports,
//! request signing, the streaming caches and order book, and the
//! [`Exchange`]/[`WsExchange`] traits adapters implement.
//!
//! ```rust
//! use coinbridge_core::prelude::*;
//!
//! let mut book = OrderBook::new("BTC/USDT");
//! book.bids.store(Decimal::from(100), Decimal::ONE);
//! book.asks.store(Decimal::from(101), Decimal::ONE);
//! assert_eq!(book.spread(), Some(Price::new(Decimal::ONE)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::unreadable_literal)]

pub use rust_decimal;
pub use serde;
pub use serde_json;

pub mod auth;
pub mod base_exchange;
pub mod capability;
pub mod checksum;
pub mod credentials;
pub mod error;
pub mod exchange;
pub mod http_client;
pub mod logging;
pub mod parser_utils;
pub mod rate_limiter;
pub mod retry_strategy;
pub mod time;
pub mod types;
pub mod ws_cache;
pub mod ws_client;
pub mod ws_exchange;

pub use base_exchange::{BaseExchange, ExchangeConfig, ExchangeConfigBuilder, MarketCache, MarketMap};
pub use capability::Capabilities;
pub use credentials::SecretString;
pub use error::{ContextExt, Error, ExchangeErrorDetails, NetworkError, ParseError, Result};
pub use exchange::{ArcExchange, BoxedExchange, Exchange};
pub use types::{
    Amount, Balance, BalanceEntry, BookSide, Cost, ExchangeStatus, Fee, MarginMode, Market,
    MarketLimits, MarketPrecision, MarketType, MinMax, Ohlcv, Order, OrderBook, OrderBookEntry,
    OrderSide, OrderStatus, OrderType, Position, PositionSide, Price, SideKind, StatusKind,
    TakerOrMaker, Ticker, Timeframe, Trade,
};
pub use ws_client::{MessageHub, WsClient, WsConfig, WsConnectionState, WsEvent};
pub use ws_exchange::{FullExchange, WsExchange};
pub use tokio_util::sync::CancellationToken;

/// Common imports.
pub mod prelude {
    pub use crate::auth::{DigestFormat, HashAlgorithm, hmac_sign};
    pub use crate::base_exchange::{BaseExchange, ExchangeConfig, ExchangeConfigBuilder};
    pub use crate::capability::Capabilities;
    pub use crate::error::{ContextExt, Error, Result};
    pub use crate::exchange::{ArcExchange, BoxedExchange, Exchange};
    pub use crate::http_client::{HttpClient, HttpConfig};
    pub use crate::logging::{LogConfig, LogFormat, LogLevel, init_logging, try_init_logging};
    pub use crate::rate_limiter::{RateLimiter, RateLimiterConfig};
    pub use crate::retry_strategy::{RetryConfig, RetryStrategy, RetryStrategyType};
    pub use crate::time::{iso8601, milliseconds, parse8601, seconds, yyyymmdd};
    pub use crate::types::{
        Amount, Balance, BalanceEntry, Cost, ExchangeStatus, Fee, Market, MarketType, Ohlcv,
        Order, OrderBook, OrderBookEntry, OrderSide, OrderStatus, OrderType, Position, Price,
        Symbol, TakerOrMaker, Ticker, Timeframe, Timestamp, Trade,
    };
    pub use crate::ws_cache::{
        ArrayCache, ArrayCacheBySymbolById, ArrayCacheBySymbolBySide, ArrayCacheByTimestamp,
    };
    pub use crate::ws_client::{WsClient, WsConfig, WsConnectionState, WsEvent};
    pub use crate::ws_exchange::{FullExchange, WsExchange};
    pub use rust_decimal::Decimal;
    pub use serde::{Deserialize, Serialize};
    pub use tokio_util::sync::CancellationToken;
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "coinbridge-core");
    }
}
