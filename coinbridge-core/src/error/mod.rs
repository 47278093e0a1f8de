//! # Error handling
//!
//! Every fallible operation in coinbridge returns [`Result<T>`], whose error
//! side is the [`Error`] enum below. Adapters translate vendor error codes
//! into these variants so callers can react to, say, a rate limit the same
//! way regardless of the exchange that raised it.
//!
//! ```text
//! Error
//! ├── Exchange            - vendor error code that maps to nothing more specific
//! ├── Network             - transport failures (via NetworkError)
//! ├── Authentication      - bad key, signature or passphrase
//! ├── PermissionDenied    - key lacks the permission for this endpoint
//! ├── RateLimit           - throttled, optionally with a retry hint
//! ├── InvalidRequest      - malformed parameters (BadRequest)
//! ├── ArgumentsRequired   - a call needs an argument that was not supplied
//! ├── InsufficientBalance
//! ├── InvalidOrder
//! ├── OrderNotFound
//! ├── MarketNotFound      - unknown symbol (BadSymbol)
//! ├── InvalidNonce        - stale nonce or order-book checksum mismatch
//! ├── Parse               - payload did not have the expected shape
//! ├── WebSocket           - stream transport failure
//! ├── Timeout
//! ├── NotSupported        - exchange does not offer this operation
//! ├── Cancelled
//! └── Context             - another error with context attached
//! ```
//!
//! ```rust
//! use coinbridge_core::error::{ContextExt, Error, Result};
//!
//! fn load(symbol: &str) -> Result<()> {
//!     if symbol.is_empty() {
//!         return Err(Error::arguments_required("symbol"));
//!     }
//!     Ok(())
//! }
//!
//! let err = load("").context("loading market").unwrap_err();
//! assert!(err.report().contains("symbol"));
//! ```

mod context;
mod convert;
mod details;
mod network;
mod parse;

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use context::ContextExt;
pub use details::ExchangeErrorDetails;
pub use network::NetworkError;
pub use parse::ParseError;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Exchange-reported error with no more specific mapping.
    #[error("Exchange error: {0}")]
    Exchange(Box<ExchangeErrorDetails>),

    /// Transport failure.
    #[error("Network error: {0}")]
    Network(Box<NetworkError>),

    /// Credentials rejected.
    #[error("Authentication error: {0}")]
    Authentication(Cow<'static, str>),

    /// Credentials accepted but not allowed to perform the call.
    #[error("Permission denied: {0}")]
    PermissionDenied(Cow<'static, str>),

    /// Request throttled.
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        /// Exchange message.
        message: Cow<'static, str>,
        /// Suggested wait before retrying.
        retry_after: Option<Duration>,
    },

    /// Malformed request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(Cow<'static, str>),

    /// A required argument was not supplied.
    #[error("Arguments required: {0}")]
    ArgumentsRequired(Cow<'static, str>),

    /// Not enough funds.
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(Cow<'static, str>),

    /// Order rejected as invalid.
    #[error("Invalid order: {0}")]
    InvalidOrder(Cow<'static, str>),

    /// Order id unknown to the exchange.
    #[error("Order not found: {0}")]
    OrderNotFound(Cow<'static, str>),

    /// Symbol unknown to the exchange.
    #[error("Market not found: {0}")]
    MarketNotFound(Cow<'static, str>),

    /// Sequence or checksum validation failed.
    #[error("Invalid nonce: {0}")]
    InvalidNonce(Cow<'static, str>),

    /// Payload could not be parsed.
    #[error("Parse error: {0}")]
    Parse(Box<ParseError>),

    /// WebSocket transport failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[source] Box<dyn StdError + Send + Sync + 'static>),

    /// Operation timed out.
    #[error("Timeout: {0}")]
    Timeout(Cow<'static, str>),

    /// Operation not offered by the exchange.
    #[error("Not supported: {0}")]
    NotSupported(Cow<'static, str>),

    /// Operation cancelled through a token or shutdown.
    #[error("Cancelled: {0}")]
    Cancelled(Cow<'static, str>),

    /// Error wrapped with additional context.
    #[error("{context}")]
    Context {
        /// Context message.
        context: String,
        /// Wrapped error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Exchange error with code and message.
    pub fn exchange(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Exchange(Box::new(ExchangeErrorDetails::new(code, message)))
    }

    /// Exchange error carrying the raw response.
    pub fn exchange_with_data(
        code: impl Into<String>,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self::Exchange(Box::new(ExchangeErrorDetails::with_data(
            code, message, data,
        )))
    }

    /// Rate limit error.
    pub fn rate_limit(
        message: impl Into<Cow<'static, str>>,
        retry_after: Option<Duration>,
    ) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Authentication error.
    pub fn authentication(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Permission error.
    pub fn permission_denied(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Connection-level network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(Box::new(NetworkError::ConnectionFailed(msg.into())))
    }

    /// Unknown market.
    pub fn market_not_found(symbol: impl Into<Cow<'static, str>>) -> Self {
        Self::MarketNotFound(symbol.into())
    }

    /// Unknown market, reported with the offending symbol.
    pub fn bad_symbol(symbol: impl Into<String>) -> Self {
        Self::MarketNotFound(Cow::Owned(format!("bad symbol {}", symbol.into())))
    }

    /// Unsupported operation.
    pub fn not_supported(feature: impl Into<Cow<'static, str>>) -> Self {
        Self::NotSupported(feature.into())
    }

    /// Cancellation.
    pub fn cancelled(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Bad request.
    pub fn invalid_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Missing argument.
    pub fn arguments_required(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::ArgumentsRequired(msg.into())
    }

    /// Invalid order.
    pub fn invalid_order(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidOrder(msg.into())
    }

    /// Order not found.
    pub fn order_not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::OrderNotFound(msg.into())
    }

    /// Insufficient funds.
    pub fn insufficient_balance(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InsufficientBalance(msg.into())
    }

    /// Sequence or checksum failure.
    pub fn invalid_nonce(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidNonce(msg.into())
    }

    /// Timeout.
    pub fn timeout(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Timeout(msg.into())
    }

    /// WebSocket error from a message.
    pub fn websocket(msg: impl Into<String>) -> Self {
        Self::WebSocket(Box::new(SimpleError(msg.into())))
    }

    /// Parse error for a missing field.
    pub fn missing_field(field: &'static str) -> Self {
        Self::Parse(Box::new(ParseError::missing_field(field)))
    }

    /// Parse error for an invalid field value.
    pub fn invalid_value(
        field: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::Parse(Box::new(ParseError::invalid_value(field, message)))
    }

    /// Wraps this error with context.
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    fn iter_chain(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |err| match err {
            Error::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        })
    }

    /// Innermost error beneath all context layers.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        self.iter_chain().last().unwrap_or(self)
    }

    /// Full chain rendered one cause per line.
    #[must_use]
    pub fn report(&self) -> String {
        use std::fmt::Write;

        let mut report = self.to_string();
        let mut current: Option<&(dyn StdError + 'static)> = self.source();
        while let Some(err) = current {
            let _ = write!(report, "\nCaused by: {err}");
            current = err.source();
        }
        report
    }

    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.root_cause() {
            Error::Network(ne) => match ne.as_ref() {
                NetworkError::Timeout | NetworkError::ConnectionFailed(_) => true,
                NetworkError::RequestFailed { status, .. } => *status >= 500,
                NetworkError::Transport(_) => false,
            },
            Error::RateLimit { .. } | Error::Timeout(_) => true,
            _ => false,
        }
    }

    /// Retry hint carried by a rate limit error.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self.root_cause() {
            Error::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Authentication message, looking through context layers.
    #[must_use]
    pub fn as_authentication(&self) -> Option<&str> {
        match self.root_cause() {
            Error::Authentication(msg) => Some(msg.as_ref()),
            _ => None,
        }
    }

    /// Cancellation message, looking through context layers.
    #[must_use]
    pub fn as_cancelled(&self) -> Option<&str> {
        match self.root_cause() {
            Error::Cancelled(msg) => Some(msg.as_ref()),
            _ => None,
        }
    }

    /// Exchange error code, looking through context layers.
    #[must_use]
    pub fn exchange_code(&self) -> Option<&str> {
        match self.root_cause() {
            Error::Exchange(details) => Some(details.code.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct SimpleError(String);

impl fmt::Display for SimpleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for SimpleError {}
