//! Response parsing failures.

use std::borrow::Cow;
use thiserror::Error;

/// Failure while turning an exchange payload into a unified structure.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// A decimal string could not be parsed.
    #[error("Failed to parse decimal: {0}")]
    Decimal(#[from] rust_decimal::Error),

    /// The payload was not valid JSON or did not match the expected shape.
    #[error("Failed to deserialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A timestamp or date string could not be parsed.
    #[error("Failed to parse timestamp: {0}")]
    Timestamp(Cow<'static, str>),

    /// A required field is absent.
    #[error("Missing required field: {0}")]
    MissingField(Cow<'static, str>),

    /// A field is present but holds an unusable value.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        /// Field name.
        field: Cow<'static, str>,
        /// What was wrong with it.
        message: Cow<'static, str>,
    },
}

impl ParseError {
    /// Missing field with a static name.
    #[must_use]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField(Cow::Borrowed(field))
    }

    /// Missing field with a computed name.
    #[must_use]
    pub fn missing_field_owned(field: String) -> Self {
        Self::MissingField(Cow::Owned(field))
    }

    /// Invalid value for a field.
    pub fn invalid_value(
        field: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Unparseable timestamp.
    pub fn timestamp(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Timestamp(message.into())
    }
}
