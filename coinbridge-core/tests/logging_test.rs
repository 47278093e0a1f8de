//! Logging setup integration tests.
//!
//! The global subscriber can be installed once per process, so every test
//! goes through `setup_logging`.

use coinbridge_core::logging::{LogConfig, LogFormat, LogLevel, try_init_logging};
use std::sync::Once;

static INIT: Once = Once::new();

fn setup_logging(config: &LogConfig) {
    INIT.call_once(|| {
        let _ = try_init_logging(config);
    });
}

#[test]
fn test_log_config_default() {
    let config = LogConfig::default();
    assert_eq!(config.level, LogLevel::Info);
    assert_eq!(config.format, LogFormat::Pretty);
    assert!(config.show_target);
    assert!(!config.show_span_events);
}

#[test]
fn test_log_config_development() {
    let config = LogConfig::development();
    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.format, LogFormat::Pretty);
    assert!(config.show_span_events);
}

#[test]
fn test_log_config_production() {
    let config = LogConfig::production();
    assert_eq!(config.level, LogLevel::Info);
    assert_eq!(config.format, LogFormat::Json);
    assert!(config.show_thread_ids);
}

#[test]
fn test_log_config_test() {
    let config = LogConfig::test();
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(config.format, LogFormat::Compact);
    assert!(!config.show_target);
}

#[test]
fn test_second_install_is_rejected() {
    setup_logging(&LogConfig::test());
    assert!(try_init_logging(&LogConfig::test()).is_err());
}

#[test]
fn test_structured_events_after_install() {
    use tracing::{debug, error, info, warn};

    setup_logging(&LogConfig::test());

    info!(exchange = "bitget", symbol = "BTC/USDT", "Loaded markets");
    warn!(attempt = 2, delay_ms = 2_000u64, "Reconnecting");
    error!(error = %"invalid checksum", "Dropping order book");
    debug!(channel = "books", "Subscribed");
}

#[test]
fn test_spans_do_not_panic() {
    setup_logging(&LogConfig::test());

    let span = tracing::info_span!("http_request", method = "GET", url = "https://api.wazirx.com");
    let _guard = span.enter();
    tracing::info!(status = 200, "Request completed");
}
