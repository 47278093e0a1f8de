//! Coinbase Pro payload parsers.

use coinbridge_core::parser_utils::{safe_bool, safe_decimal, safe_string};
use coinbridge_core::types::{Market, MarketLimits, MarketPrecision, MinMax};
use coinbridge_core::{Error, Result};
use serde_json::Value;

/// Parses a `/products` entry.
///
/// ```rust
/// use coinbridge_exchanges::coinbasepro::parser::parse_market;
/// use serde_json::json;
///
/// let market = parse_market(&json!({
///     "id": "BTC-USD",
///     "base_currency": "BTC",
///     "quote_currency": "USD",
///     "status": "online"
/// }))
/// .unwrap();
/// assert_eq!(market.symbol, "BTC/USD");
/// ```
pub fn parse_market(data: &Value) -> Result<Market> {
    let id = safe_string(data, "id").ok_or_else(|| Error::missing_field("id"))?;
    let base_id =
        safe_string(data, "base_currency").ok_or_else(|| Error::missing_field("base_currency"))?;
    let quote_id = safe_string(data, "quote_currency")
        .ok_or_else(|| Error::missing_field("quote_currency"))?;

    let mut market = Market::new_spot(&id, base_id.to_uppercase(), quote_id.to_uppercase());
    market.base_id = base_id;
    market.quote_id = quote_id;
    market.active = safe_string(data, "status").as_deref() == Some("online")
        && !safe_bool(data, "trading_disabled").unwrap_or(false);
    market.precision = MarketPrecision {
        price: safe_decimal(data, "quote_increment"),
        amount: safe_decimal(data, "base_increment"),
    };
    market.limits = MarketLimits {
        amount: MinMax {
            min: safe_decimal(data, "base_min_size"),
            max: safe_decimal(data, "base_max_size"),
        },
        price: MinMax {
            min: safe_decimal(data, "quote_increment"),
            max: None,
        },
        cost: MinMax {
            min: safe_decimal(data, "min_market_funds"),
            max: safe_decimal(data, "max_market_funds"),
        },
        ..MarketLimits::default()
    };
    market.info = data.clone();
    Ok(market)
}

/// Unified symbol for a `BASE-QUOTE` product id, with `code` mapping each
/// currency id.
pub fn symbol_from_product_id(id: &str, code: impl Fn(&str) -> String) -> String {
    match id.split_once('-') {
        Some((base, quote)) => format!("{}/{}", code(base), code(quote)),
        None => id.to_string(),
    }
}
