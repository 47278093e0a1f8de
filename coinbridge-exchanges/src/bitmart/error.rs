//! BitMart error handling.
//!
//! Failures keep the success envelope but carry a `code` other than 1000
//! or a `message` other than `OK`/`success`:
//! `{"message": "Balance not enough", "code": 50020, "trace": "...", "data": {}}`.

use coinbridge_core::error::Error;
use serde_json::Value;
use std::time::Duration;

/// Code of a successful response.
pub const SUCCESS_CODE: &str = "1000";

/// BitMart error codes grouped by the error they map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmartErrorCode {
    /// Bad key, signature, timestamp or memo.
    Authentication,
    /// Account frozen or disabled.
    AccountSuspended,
    /// Key lacks the permission, or the action is forbidden.
    PermissionDenied,
    /// Too many requests.
    RateLimitExceeded,
    /// Service unavailable or in maintenance.
    ExchangeNotAvailable,
    /// Malformed or rejected parameters.
    BadRequest,
    /// Not enough funds.
    InsufficientFunds,
    /// Bad withdrawal address.
    InvalidAddress,
    /// Unknown or delisted symbol.
    BadSymbol,
    /// No such order.
    OrderNotFound,
    /// Order rejected by validation.
    InvalidOrder,
    /// Request timestamp outside the window.
    InvalidNonce,
    /// Anything else.
    Unknown,
}

impl BitmartErrorCode {
    /// Exact code lookup.
    pub fn from_code(code: &str) -> Self {
        let Ok(code) = code.parse::<u32>() else {
            return Self::Unknown;
        };
        match code {
            30001 | 30002 | 30004..=30008 | 30011 | 30012 => Self::Authentication,
            30003 | 53000 | 53001 => Self::AccountSuspended,
            30010 | 60020..=60022 | 40006 | 40028 | 53002 | 53003 | 53005..=53010 => {
                Self::PermissionDenied
            }
            30013 => Self::RateLimitExceeded,
            30014 | 50022 => Self::ExchangeNotAvailable,
            60000..=60002 | 60030 | 60031 | 61003 | 50000 | 50002..=50004 | 50014..=50019
            | 50021 | 57001 | 58001 | 40007 | 40009..=40011 => Self::BadRequest,
            60008 | 61001 | 50020 | 51004 | 40027 => Self::InsufficientFunds,
            60007 | 60011 => Self::InvalidAddress,
            50001 | 50023 | 40014 | 40015 | 40034 => Self::BadSymbol,
            50005 | 50032 => Self::OrderNotFound,
            50006..=50013 | 50029 | 50030 | 50034 | 50035 | 51011 | 40016..=40018 | 40020
            | 40029..=40033 => Self::InvalidOrder,
            40008 => Self::InvalidNonce,
            _ => Self::Unknown,
        }
    }
}

fn code_of(response: &Value) -> Option<String> {
    match response.get("code")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Converts an error envelope into an [`Error`].
///
/// ```rust
/// use coinbridge_exchanges::bitmart::error::parse_error;
/// use serde_json::json;
///
/// let error = parse_error(&json!({"code": 50020, "message": "Balance not enough"}));
/// assert!(matches!(error, coinbridge_core::Error::InsufficientBalance(_)));
/// ```
pub fn parse_error(response: &Value) -> Error {
    let code = code_of(response).unwrap_or_else(|| "unknown".to_string());
    let feedback = format!("bitmart {response}");
    match BitmartErrorCode::from_code(&code) {
        BitmartErrorCode::Authentication => Error::authentication(feedback),
        BitmartErrorCode::AccountSuspended | BitmartErrorCode::PermissionDenied => {
            Error::permission_denied(feedback)
        }
        BitmartErrorCode::RateLimitExceeded => {
            Error::rate_limit(feedback, Some(Duration::from_secs(1)))
        }
        BitmartErrorCode::ExchangeNotAvailable => Error::network(feedback),
        BitmartErrorCode::BadRequest | BitmartErrorCode::InvalidAddress => {
            Error::invalid_request(feedback)
        }
        BitmartErrorCode::InsufficientFunds => Error::insufficient_balance(feedback),
        BitmartErrorCode::BadSymbol => Error::bad_symbol(feedback),
        BitmartErrorCode::OrderNotFound => Error::order_not_found(feedback),
        BitmartErrorCode::InvalidOrder => Error::invalid_order(feedback),
        BitmartErrorCode::InvalidNonce => Error::invalid_nonce(feedback),
        BitmartErrorCode::Unknown => Error::exchange_with_data(code, feedback, response.clone()),
    }
}

/// Whether an envelope reports a failure.
pub fn is_error_response(response: &Value) -> bool {
    let bad_code = code_of(response).is_some_and(|code| code != SUCCESS_CODE);
    let bad_message = response
        .get("message")
        .and_then(Value::as_str)
        .is_some_and(|m| !m.eq_ignore_ascii_case("ok") && !m.eq_ignore_ascii_case("success"));
    bad_code || bad_message
}

/// Response hook for the HTTP client.
pub fn check_response(response: &Value) -> Option<Error> {
    response.as_object()?;
    is_error_response(response).then(|| parse_error(response))
}
