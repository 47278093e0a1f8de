//! WazirX error handling.
//!
//! Failed calls answer `{"code": 2002, "message": "..."}`. Successful
//! payloads never carry a `code` member.

use coinbridge_core::error::Error;
use serde_json::Value;
use std::time::Duration;

/// WazirX error codes with a dedicated mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WazirxErrorCode {
    /// Unknown symbol.
    BadSymbol,
    /// Malformed or rejected parameters.
    BadRequest,
    /// Not enough funds.
    InsufficientFunds,
    /// Key lacks the permission.
    PermissionDenied,
    /// Order rejected by validation.
    InvalidOrder,
    /// Too many requests.
    RateLimitExceeded,
    /// Anything else.
    Unknown,
}

impl WazirxErrorCode {
    /// Exact code lookup.
    pub fn from_code(code: &str) -> Self {
        match code {
            "-1121" => Self::BadSymbol,
            "1999" | "2005" | "2098" | "2113" | "2115" => Self::BadRequest,
            "2002" => Self::InsufficientFunds,
            "2078" => Self::PermissionDenied,
            "2031" | "94001" => Self::InvalidOrder,
            "2136" => Self::RateLimitExceeded,
            _ => Self::Unknown,
        }
    }
}

/// Converts a `{code, message}` body into an [`Error`].
///
/// ```rust
/// use coinbridge_exchanges::wazirx::error::parse_error;
/// use serde_json::json;
///
/// let error = parse_error(&json!({"code": 2078, "message": "Permission denied"}));
/// assert!(matches!(error, coinbridge_core::Error::PermissionDenied(_)));
/// ```
pub fn parse_error(response: &Value) -> Error {
    let code = match response.get("code") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "unknown".to_string(),
    };
    let feedback = format!("wazirx {response}");
    match WazirxErrorCode::from_code(&code) {
        WazirxErrorCode::BadSymbol => Error::bad_symbol(feedback),
        WazirxErrorCode::BadRequest => Error::invalid_request(feedback),
        WazirxErrorCode::InsufficientFunds => Error::insufficient_balance(feedback),
        WazirxErrorCode::PermissionDenied => Error::permission_denied(feedback),
        WazirxErrorCode::InvalidOrder => Error::invalid_order(feedback),
        WazirxErrorCode::RateLimitExceeded => {
            Error::rate_limit(feedback, Some(Duration::from_secs(1)))
        }
        WazirxErrorCode::Unknown => Error::exchange(code, feedback),
    }
}

/// Response hook for the HTTP client.
pub fn check_response(response: &Value) -> Option<Error> {
    response.as_object()?.get("code")?;
    Some(parse_error(response))
}
