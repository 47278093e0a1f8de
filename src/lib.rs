//! # coinbridge
//!
//! Async clients for cryptocurrency exchanges behind one set of types.
//!
//! Every adapter implements [`Exchange`] for REST calls; adapters with a
//! stream implement [`WsExchange`] as well. Markets use unified symbols
//! such as `BTC/USDT` or `BTC/USDT:USDT`, amounts are [`rust_decimal`]
//! decimals, and failures are one [`Error`] enum.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coinbridge::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let exchange = Bitget::builder().build()?;
//!     let ticker = exchange.fetch_ticker("BTC/USDT").await?;
//!     println!("{} last {:?}", ticker.symbol, ticker.last);
//!
//!     exchange.ws_connect().await?;
//!     let book = exchange.watch_order_book("BTC/USDT", Some(5)).await?;
//!     println!("best bid {:?}", book.best_bid());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub use coinbridge_core::{
    error::{Error, Result},
    exchange::Exchange,
    types::*,
    ws_exchange::WsExchange,
};

pub use coinbridge_core;
pub use coinbridge_exchanges::{bitget, bitmart, coinbasepro, coinspot, wazirx};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use coinbridge_exchanges::prelude::*;
}
