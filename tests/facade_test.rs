// Facade crate tests: re-exports resolve and adapters work through the
// top-level paths.

use coinbridge::prelude::*;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_version_is_set() {
    assert!(!coinbridge::VERSION.is_empty());
}

#[test]
fn test_adapters_from_prelude() {
    let exchanges: Vec<BoxedExchange> = vec![
        Box::new(Bitget::builder().build().unwrap()),
        Box::new(Bitmart::new(ExchangeConfig::default()).unwrap()),
        Box::new(CoinbasePro::new(ExchangeConfig::default()).unwrap()),
        Box::new(Coinspot::new(ExchangeConfig::default()).unwrap()),
        Box::new(Wazirx::new(ExchangeConfig::default()).unwrap()),
    ];
    let ids: Vec<&str> = exchanges.iter().map(|e| e.id()).collect();
    assert_eq!(ids, ["bitget", "bitmart", "coinbasepro", "coinspot", "wazirx"]);
}

#[test]
fn test_root_reexports() {
    let price: coinbridge::Price = Price::new(dec!(2));
    let cost = price * Amount::new(dec!(3));
    assert_eq!(cost, coinbridge::Cost::new(dec!(6)));

    let err: coinbridge::Error = Error::bad_symbol("XYZ/ABC");
    let result: coinbridge::Result<()> = Err(err);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_ticker_through_facade() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exchangeInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbols": [{
                "symbol": "btcinr", "status": "trading", "baseAsset": "btc", "quoteAsset": "inr",
                "filters": []
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ticker/24hr"))
        .and(query_param("symbol", "btcinr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "btcinr", "lastPrice": "3000000", "bidPrice": "2999000",
            "askPrice": "3001000", "at": 1_700_000_000_000_i64
        })))
        .mount(&server)
        .await;

    let config = ExchangeConfig::builder()
        .url_override("rest", server.uri())
        .build();
    let exchange = coinbridge::wazirx::Wazirx::new(config)?;
    let ticker = Exchange::fetch_ticker(&exchange, "BTC/INR").await?;
    assert_eq!(ticker.last, Some(Price::new(dec!(3000000))));
    assert_eq!(ticker.timestamp, Some(1_700_000_000_000));
    Ok(())
}
