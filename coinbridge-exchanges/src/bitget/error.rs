//! Bitget-specific error handling.
//!
//! REST responses wrap every payload as `{code, msg, data}`; any code other
//! than `"00000"` is an error. Stream errors arrive as
//! `{"event":"error","code":30xxx,"msg":...}`.

use coinbridge_core::error::Error;
use serde_json::Value;
use std::time::Duration;

/// REST success code.
pub const SUCCESS_CODE: &str = "00000";

/// Bitget REST error codes.
///
/// Reference: https://www.bitget.com/api-doc/common/error-code/restapi
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitgetErrorCode {
    /// Missing or invalid api key, signature or passphrase.
    Authentication,
    /// Timestamp outside the receive window.
    InvalidNonce,
    /// Key lacks the permission for this endpoint.
    PermissionDenied,
    /// Too many requests.
    RateLimitExceeded,
    /// Invalid request parameters.
    InvalidRequest,
    /// Insufficient funds.
    InsufficientFunds,
    /// Unknown or delisted trading pair.
    BadSymbol,
    /// Order rejected by validation.
    InvalidOrder,
    /// Order not found.
    OrderNotFound,
    /// Unknown error code.
    Unknown(i64),
}

impl BitgetErrorCode {
    /// Parses a Bitget error code string.
    pub fn from_code(code: &str) -> Self {
        match code.parse::<i64>() {
            Ok(40001 | 40002 | 40006 | 40009 | 40011 | 40012 | 40037) => Self::Authentication,
            Ok(40005 | 40008) => Self::InvalidNonce,
            Ok(40014 | 40018) => Self::PermissionDenied,
            Ok(429 | 40010 | 43111) => Self::RateLimitExceeded,
            Ok(40003 | 40017 | 40019 | 40020 | 40034 | 40808) => Self::InvalidRequest,
            Ok(40754 | 43012 | 43117) => Self::InsufficientFunds,
            Ok(40309 | 43113) => Self::BadSymbol,
            Ok(43004 | 43005 | 43006 | 43007 | 43008 | 45110 | 45111) => Self::InvalidOrder,
            Ok(40109 | 43001 | 43025) => Self::OrderNotFound,
            Ok(n) => Self::Unknown(n),
            Err(_) => Self::Unknown(0),
        }
    }
}

/// Converts an error response into an [`Error`].
///
/// ```rust
/// use coinbridge_exchanges::bitget::error::parse_error;
/// use serde_json::json;
///
/// let error = parse_error(&json!({"code": "40006", "msg": "Invalid ACCESS_KEY"}));
/// assert!(error.as_authentication().is_some());
/// ```
pub fn parse_error(response: &Value) -> Error {
    let code = extract_error_code(response);
    let msg = extract_error_message(response);
    let feedback = format!("bitget {msg}");

    match BitgetErrorCode::from_code(&code) {
        BitgetErrorCode::Authentication => Error::authentication(feedback),
        BitgetErrorCode::InvalidNonce => Error::invalid_nonce(feedback),
        BitgetErrorCode::PermissionDenied => Error::permission_denied(feedback),
        BitgetErrorCode::RateLimitExceeded => {
            Error::rate_limit(feedback, Some(Duration::from_secs(1)))
        }
        BitgetErrorCode::InvalidRequest => Error::invalid_request(feedback),
        BitgetErrorCode::InsufficientFunds => Error::insufficient_balance(feedback),
        BitgetErrorCode::BadSymbol => Error::bad_symbol(feedback),
        BitgetErrorCode::InvalidOrder => Error::invalid_order(feedback),
        BitgetErrorCode::OrderNotFound => Error::order_not_found(feedback),
        BitgetErrorCode::Unknown(_) => Error::exchange_with_data(code, msg, response.clone()),
    }
}

/// Whether a REST response carries a failure code. Responses without a
/// code are treated as errors.
pub fn is_error_response(response: &Value) -> bool {
    response
        .get("code")
        .map(|code| code_string(code) != SUCCESS_CODE)
        .unwrap_or(true)
}

/// Response hook for the HTTP client: maps coded failures, lets
/// everything else through to the status mapping.
pub fn check_response(response: &Value) -> Option<Error> {
    response.get("code")?;
    is_error_response(response).then(|| parse_error(response))
}

/// Maps a stream `error` event.
///
/// | codes | error |
/// |---|---|
/// | 30001, 30003, 30014, 30016 | invalid request |
/// | 30002, 30004, 30005, 30011, 30012, 30013, 30015 | authentication |
/// | 30006, 30007 | rate limit |
/// | other | exchange |
pub fn parse_ws_error(message: &Value) -> Error {
    let code = extract_error_code(message);
    let feedback = format!("bitget {message}");
    match code.as_str() {
        "30001" | "30003" | "30014" | "30016" => Error::invalid_request(feedback),
        "30002" | "30004" | "30005" | "30011" | "30012" | "30013" | "30015" => {
            Error::authentication(feedback)
        }
        "30006" | "30007" => Error::rate_limit(feedback, None),
        _ => Error::exchange(code, feedback),
    }
}

/// Error code as a string, or `"unknown"`.
pub fn extract_error_code(response: &Value) -> String {
    response
        .get("code")
        .map(code_string)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Error message, or `"Unknown error"`.
pub fn extract_error_message(response: &Value) -> &str {
    response
        .get("msg")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown error")
}

fn code_string(code: &Value) -> String {
    match code {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_authentication_error() {
        let error = parse_error(&json!({"code": "40006", "msg": "Invalid ACCESS_KEY"}));
        assert!(error.as_authentication().is_some());
        assert!(error.to_string().contains("Invalid ACCESS_KEY"));
    }

    #[test]
    fn test_parse_rate_limit_error() {
        let error = parse_error(&json!({"code": "429", "msg": "Too Many Requests"}));
        assert!(matches!(error, Error::RateLimit { .. }));
        assert_eq!(error.retry_after(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_parse_order_errors() {
        assert!(matches!(
            parse_error(&json!({"code": "43001", "msg": "order does not exist"})),
            Error::OrderNotFound(_)
        ));
        assert!(matches!(
            parse_error(&json!({"code": "43012", "msg": "Insufficient balance"})),
            Error::InsufficientBalance(_)
        ));
        assert!(matches!(
            parse_error(&json!({"code": "45110", "msg": "less than the minimum order quantity"})),
            Error::InvalidOrder(_)
        ));
    }

    #[test]
    fn test_parse_unknown_error_keeps_code() {
        let error = parse_error(&json!({"code": "99999", "msg": "Some unknown error"}));
        assert_eq!(error.exchange_code(), Some("99999"));
        assert!(error.to_string().contains("Some unknown error"));
    }

    #[test]
    fn test_parse_error_missing_fields() {
        let error = parse_error(&json!({"msg": "Error without code"}));
        assert!(error.to_string().contains("Error without code"));
        let error = parse_error(&json!({"code": "99998"}));
        assert!(error.to_string().contains("Unknown error"));
    }

    #[test]
    fn test_is_error_response() {
        assert!(!is_error_response(&json!({"code": "00000", "msg": "success", "data": {}})));
        assert!(is_error_response(&json!({"code": "40001", "msg": "x"})));
        assert!(is_error_response(&json!({"msg": "No code field"})));
    }

    #[test]
    fn test_check_response_passes_uncoded_bodies() {
        assert!(check_response(&json!({"status": "ok"})).is_none());
        assert!(check_response(&json!({"code": "00000", "data": []})).is_none());
        assert!(check_response(&json!({"code": "40017", "msg": "bad"})).is_some());
    }

    #[test]
    fn test_ws_error_codes() {
        let err = |code: i64| parse_ws_error(&json!({"event": "error", "code": code, "msg": "x"}));
        for code in [30001, 30003, 30014, 30016] {
            assert!(matches!(err(code), Error::InvalidRequest(_)), "{code}");
        }
        for code in [30002, 30004, 30005, 30011, 30012, 30013, 30015] {
            assert!(err(code).as_authentication().is_some(), "{code}");
        }
        for code in [30006, 30007] {
            assert!(matches!(err(code), Error::RateLimit { .. }), "{code}");
        }
        assert_eq!(err(30099).exchange_code(), Some("30099"));
    }

    #[test]
    fn test_error_code_from_code() {
        assert_eq!(BitgetErrorCode::from_code("40009"), BitgetErrorCode::Authentication);
        assert_eq!(BitgetErrorCode::from_code("40014"), BitgetErrorCode::PermissionDenied);
        assert_eq!(BitgetErrorCode::from_code("12345"), BitgetErrorCode::Unknown(12345));
        assert_eq!(BitgetErrorCode::from_code("invalid"), BitgetErrorCode::Unknown(0));
    }
}
