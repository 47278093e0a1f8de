//! Property-based tests for the error system.
//!
//! Every variant renders, survives boxing, and keeps its classification
//! (retryable, exchange code, retry hint) when wrapped in context layers.

use coinbridge_core::error::{ContextExt, Error, NetworkError, ParseError};
use proptest::prelude::*;
use std::error::Error as StdError;
use std::time::Duration;

// ============================================================================
// Test Generators
// ============================================================================

fn error_message_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _-]{1,100}".prop_map(|s| s.to_string())
}

/// Vendor codes seen across the adapters, plus arbitrary numeric ones.
fn error_code_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("-1121".to_string()),
        Just("2002".to_string()),
        Just("40012".to_string()),
        Just("43025".to_string()),
        Just("error".to_string()),
        "[0-9]{1,5}".prop_map(|s| s.to_string()),
    ]
}

fn retry_duration_strategy() -> impl Strategy<Value = Option<Duration>> {
    prop_oneof![
        Just(None),
        (1u64..3600).prop_map(|secs| Some(Duration::from_secs(secs))),
    ]
}

fn error_strategy() -> impl Strategy<Value = Error> {
    prop_oneof![
        (error_code_strategy(), error_message_strategy())
            .prop_map(|(code, msg)| Error::exchange(code, msg)),
        error_message_strategy().prop_map(Error::network),
        error_message_strategy().prop_map(Error::authentication),
        error_message_strategy().prop_map(Error::permission_denied),
        (error_message_strategy(), retry_duration_strategy())
            .prop_map(|(msg, retry)| Error::rate_limit(msg, retry)),
        error_message_strategy().prop_map(Error::invalid_request),
        error_message_strategy().prop_map(Error::arguments_required),
        error_message_strategy().prop_map(Error::insufficient_balance),
        error_message_strategy().prop_map(Error::invalid_order),
        error_message_strategy().prop_map(Error::order_not_found),
        error_message_strategy().prop_map(Error::bad_symbol),
        error_message_strategy().prop_map(Error::invalid_nonce),
        error_message_strategy().prop_map(Error::timeout),
        error_message_strategy().prop_map(Error::not_supported),
        error_message_strategy().prop_map(Error::websocket),
    ]
}

fn network_error_strategy() -> impl Strategy<Value = NetworkError> {
    prop_oneof![
        (400u16..600, error_message_strategy())
            .prop_map(|(status, message)| NetworkError::RequestFailed { status, message }),
        proptest::strategy::LazyJust::new(|| NetworkError::Timeout),
        error_message_strategy().prop_map(NetworkError::ConnectionFailed),
    ]
}

fn parse_error_strategy() -> impl Strategy<Value = ParseError> {
    prop_oneof![
        proptest::strategy::LazyJust::new(|| ParseError::missing_field("price")),
        (error_message_strategy(), error_message_strategy())
            .prop_map(|(field, msg)| ParseError::invalid_value(field, msg)),
        error_message_strategy().prop_map(ParseError::timestamp),
    ]
}

// ============================================================================
// Rendering
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_error_display_non_empty(error in error_strategy()) {
        prop_assert!(!error.to_string().is_empty(), "empty display for {:?}", error);
        prop_assert!(!format!("{error:?}").is_empty(), "empty debug for {:?}", error);
    }

    #[test]
    fn prop_error_box_conversion(error in error_strategy()) {
        let boxed: Box<dyn StdError + Send + Sync + 'static> = Box::new(error);
        prop_assert!(!boxed.to_string().is_empty());
    }

    #[test]
    fn prop_network_error_converts(error in network_error_strategy()) {
        let status = error.status();
        let converted: Error = error.into();
        prop_assert!(converted.to_string().starts_with("Network error"));
        if let Some(status) = status {
            prop_assert_eq!(converted.is_retryable(), status >= 500);
        }
    }

    #[test]
    fn prop_parse_error_converts(error in parse_error_strategy()) {
        let converted: Error = error.into();
        prop_assert!(converted.to_string().starts_with("Parse error"));
        prop_assert!(!converted.is_retryable());
    }

    #[test]
    fn prop_error_report_non_empty(error in error_strategy()) {
        prop_assert!(!error.report().is_empty());
    }
}

// ============================================================================
// Context layers
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_error_context_preserved(
        base_error in error_strategy(),
        context_msg in error_message_strategy()
    ) {
        let inner = base_error.to_string();
        let with_context = base_error.context(context_msg.clone());

        prop_assert!(with_context.to_string().contains(&context_msg));
        prop_assert!(with_context.report().contains(&inner));
    }

    #[test]
    fn prop_classification_survives_context(
        base_error in error_strategy(),
        layers in proptest::collection::vec(error_message_strategy(), 1..4)
    ) {
        let retryable = base_error.is_retryable();
        let code = base_error.exchange_code().map(str::to_string);
        let retry_after = base_error.retry_after();

        let wrapped = layers
            .into_iter()
            .fold(base_error, |err, layer| err.context(layer));

        prop_assert_eq!(wrapped.is_retryable(), retryable);
        prop_assert_eq!(wrapped.exchange_code().map(str::to_string), code);
        prop_assert_eq!(wrapped.retry_after(), retry_after);
    }

    #[test]
    fn prop_rate_limit_retry_after_retrievable(
        msg in error_message_strategy(),
        secs in 1u64..3600
    ) {
        let duration = Duration::from_secs(secs);
        let error = Error::rate_limit(msg, Some(duration));
        prop_assert_eq!(error.retry_after(), Some(duration));
        prop_assert!(error.is_retryable());
    }

    #[test]
    fn prop_exchange_code_round_trips(
        code in error_code_strategy(),
        msg in error_message_strategy()
    ) {
        let error = Error::exchange(code.clone(), msg);
        prop_assert_eq!(error.exchange_code(), Some(code.as_str()));
        prop_assert!(!error.is_retryable());
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_error_context_chain() {
        let err = Error::network("Connection refused").context("Failed to fetch ticker");
        let report = err.report();
        assert!(report.contains("Failed to fetch ticker"));
        assert!(report.contains("Connection refused"));
    }

    #[test]
    fn test_result_context_ext() {
        let failed: std::result::Result<(), Error> = Err(Error::authentication("bad sign"));
        let err = failed.context("fetching balance").unwrap_err();
        assert_eq!(err.as_authentication(), Some("bad sign"));
    }

    #[test]
    fn test_bad_symbol_mentions_symbol() {
        let err = Error::bad_symbol("DOGE/XYZ");
        assert!(matches!(err, Error::MarketNotFound(_)));
        assert!(err.to_string().contains("DOGE/XYZ"));
    }
}
