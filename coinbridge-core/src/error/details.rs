//! Exchange error payload.

use serde_json::Value;

/// Error reported by an exchange in its own vocabulary.
#[derive(Debug)]
#[non_exhaustive]
pub struct ExchangeErrorDetails {
    /// Exchange error code as sent on the wire.
    pub code: String,
    /// Exchange error message.
    pub message: String,
    /// Raw response, when available.
    pub data: Option<Value>,
}

impl ExchangeErrorDetails {
    /// Creates details without a raw payload.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    /// Creates details carrying the raw payload.
    pub fn with_data(code: impl Into<String>, message: impl Into<String>, data: Value) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: Some(data),
        }
    }
}

impl std::fmt::Display for ExchangeErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)
    }
}
