//! HTTP transport shared by REST adapters.
//!
//! Wraps `reqwest` with a total timeout, retries with backoff, an optional
//! token bucket throttle and a response size cap. Bodies are decoded as
//! JSON; anything else is returned as a JSON string.
//!
//! Adapters install an [`ErrorHook`] to turn vendor error payloads into
//! typed errors before the generic status mapping runs.
//!
//! ```rust,no_run
//! use coinbridge_core::http_client::{HttpClient, HttpConfig};
//!
//! # async fn example() -> coinbridge_core::Result<()> {
//! let client = HttpClient::new(HttpConfig::default())?;
//! let time = client.get("https://api.wazirx.com/sapi/v1/time", None).await?;
//! # let _ = time;
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod headers;
mod request;
mod response;
mod retry;


pub use builder::{ErrorHook, HttpClient};
pub use config::HttpConfig;
pub use headers::header_map;
pub use request::RequestBody;
