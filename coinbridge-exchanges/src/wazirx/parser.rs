//! WazirX response parsers.

use coinbridge_core::parser_utils::{
    parse_bids_asks, safe_bool, safe_decimal, safe_integer, safe_string, safe_string_lower,
    safe_value,
};
use coinbridge_core::time::iso8601;
use coinbridge_core::types::{
    Amount, Balance, BalanceEntry, Cost, ExchangeStatus, Market, Ohlcv, Order,
    OrderBook, OrderSide, OrderStatus, OrderType, Price, StatusKind, Ticker, Trade,
};
use coinbridge_core::{Error, Result};
use rust_decimal::Decimal;
use serde_json::Value;

/// `10^-digits`, e.g. `4` → `0.0001`.
pub fn precision_from_digits(digits: &str) -> Option<Decimal> {
    let digits: u32 = digits.parse().ok()?;
    Some(Decimal::new(1, digits))
}

/// Parses an `exchangeInfo` symbol. `currency_code` maps asset ids to
/// unified codes.
pub fn parse_market(data: &Value, currency_code: impl Fn(&str) -> String) -> Result<Market> {
    let id = safe_string(data, "symbol").ok_or_else(|| Error::missing_field("symbol"))?;
    let base_id = safe_string(data, "baseAsset").ok_or_else(|| Error::missing_field("baseAsset"))?;
    let quote_id =
        safe_string(data, "quoteAsset").ok_or_else(|| Error::missing_field("quoteAsset"))?;
    let base = currency_code(&base_id);
    let quote = currency_code(&quote_id);

    let min_price = safe_value(data, "filters")
        .and_then(Value::as_array)
        .and_then(|filters| {
            filters
                .iter()
                .find(|f| safe_string(f, "filterType").as_deref() == Some("PRICE_FILTER"))
        })
        .and_then(|f| safe_decimal(f, "minPrice"));
    let fee = if quote == "WRX" {
        Decimal::ZERO
    } else {
        Decimal::new(2, 3)
    };

    let mut market = Market::new_spot(id, base, quote);
    market.base_id = base_id;
    market.quote_id = quote_id;
    market.active = safe_string(data, "status").as_deref() == Some("trading");
    market.precision.amount =
        safe_string(data, "baseAssetPrecision").and_then(|p| precision_from_digits(&p));
    market.precision.price =
        safe_string(data, "quoteAssetPrecision").and_then(|p| precision_from_digits(&p));
    market.limits.price.min = min_price;
    market.taker = Some(fee);
    market.maker = Some(fee);
    market.info = data.clone();
    Ok(market)
}

/// Parses a `ticker/24hr` entry.
pub fn parse_ticker(data: &Value, symbol: &str) -> Ticker {
    let price = |key: &str| safe_decimal(data, key).map(Price::new);
    let timestamp = safe_integer(data, "at");
    let mut ticker = Ticker {
        symbol: symbol.to_string(),
        timestamp,
        datetime: timestamp.and_then(iso8601),
        high: price("highPrice"),
        low: price("lowPrice"),
        bid: price("bidPrice"),
        ask: price("askPrice"),
        open: price("openPrice"),
        last: price("lastPrice"),
        base_volume: safe_decimal(data, "volume").map(Amount::new),
        info: data.clone(),
        ..Ticker::default()
    };
    ticker.complete();
    ticker
}

/// Parses a `depth` response.
pub fn parse_order_book(data: &Value, symbol: &str) -> OrderBook {
    OrderBook::from_snapshot(
        symbol,
        parse_bids_asks(safe_value(data, "bids"), 0, 1),
        parse_bids_asks(safe_value(data, "asks"), 0, 1),
        safe_integer(data, "timestamp"),
    )
}

/// Parses a public trade. The taker side is the opposite of the maker:
/// `isBuyerMaker` means a sell.
pub fn parse_trade(data: &Value, symbol: &str) -> Result<Trade> {
    let price = safe_decimal(data, "price").ok_or_else(|| Error::missing_field("price"))?;
    let amount = safe_decimal(data, "qty").ok_or_else(|| Error::missing_field("qty"))?;
    let side = if safe_bool(data, "isBuyerMaker").unwrap_or(false) {
        OrderSide::Sell
    } else {
        OrderSide::Buy
    };
    let mut trade = Trade::new(
        symbol,
        Some(side),
        Price::new(price),
        Amount::new(amount),
        safe_integer(data, "time"),
    );
    trade.id = safe_string(data, "id");
    if let Some(cost) = safe_decimal(data, "quoteQty") {
        trade.cost = Some(Cost::new(cost));
    }
    trade.info = data.clone();
    Ok(trade)
}

/// Parses a kline row. The open time is in seconds.
pub fn parse_ohlcv(row: &Value) -> Result<Ohlcv> {
    Ohlcv::from_row(row, 1000)
}

/// Parses `systemStatus`.
pub fn parse_status(data: &Value) -> ExchangeStatus {
    let status = match safe_string(data, "status").as_deref() {
        Some("normal") => StatusKind::Ok,
        _ => StatusKind::Maintenance,
    };
    ExchangeStatus {
        status,
        info: data.clone(),
        ..ExchangeStatus::default()
    }
}

/// Parses the `funds` list of `{asset, free, locked}`.
pub fn parse_balance(data: &Value, currency_code: impl Fn(&str) -> String) -> Balance {
    let mut balance = Balance::new(data.clone());
    for entry in data.as_array().map(Vec::as_slice).unwrap_or_default() {
        let Some(asset) = safe_string(entry, "asset") else {
            continue;
        };
        let free = safe_decimal(entry, "free").unwrap_or(Decimal::ZERO);
        let used = safe_decimal(entry, "locked").unwrap_or(Decimal::ZERO);
        balance.set(currency_code(&asset), BalanceEntry::new(free, used));
    }
    balance.safe_balance()
}

/// Maps an order status; unknown values stay open.
pub fn parse_order_status(status: &str) -> OrderStatus {
    match status {
        "done" => OrderStatus::Closed,
        "cancel" => OrderStatus::Canceled,
        _ => OrderStatus::Open,
    }
}

/// Parses an order. `symbol` overrides the lookup of the `symbol` id.
pub fn parse_order(data: &Value, symbol: &str) -> Result<Order> {
    let id = safe_string(data, "id").ok_or_else(|| Error::missing_field("id"))?;
    let order_type = match safe_string_lower(data, "type").as_deref() {
        Some("limit") => Some(OrderType::Limit),
        Some("stop_limit") => Some(OrderType::StopLimit),
        Some("market") => Some(OrderType::Market),
        _ => None,
    };
    let mut order = Order {
        id,
        timestamp: safe_integer(data, "createdTime"),
        last_trade_timestamp: safe_integer(data, "updatedTime"),
        symbol: symbol.to_string(),
        order_type,
        side: safe_string_lower(data, "side").and_then(|s| s.parse().ok()),
        price: safe_decimal(data, "price"),
        trigger_price: safe_decimal(data, "stopPrice").filter(|p| !p.is_zero()),
        amount: safe_decimal(data, "origQty").or_else(|| safe_decimal(data, "quantity")),
        filled: safe_decimal(data, "executedQty"),
        status: safe_string(data, "status").map(|s| parse_order_status(&s)),
        info: data.clone(),
        ..Order::default()
    };
    order.complete();
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_market() {
        let data = json!({
            "symbol": "btcinr",
            "status": "trading",
            "baseAsset": "btc",
            "quoteAsset": "inr",
            "baseAssetPrecision": 5,
            "quoteAssetPrecision": 0,
            "orderTypes": ["limit", "stop_limit"],
            "isSpotTradingAllowed": true,
            "filters": [{"filterType": "PRICE_FILTER", "minPrice": "1", "tickSize": "1"}]
        });
        let market = parse_market(&data, str::to_uppercase).unwrap();
        assert_eq!(market.id, "btcinr");
        assert_eq!(market.symbol, "BTC/INR");
        assert!(market.active);
        assert_eq!(market.precision.amount, Some(dec!(0.00001)));
        assert_eq!(market.precision.price, Some(dec!(1)));
        assert_eq!(market.limits.price.min, Some(dec!(1)));
        assert_eq!(market.taker, Some(dec!(0.002)));
    }

    #[test]
    fn test_parse_market_halted_wrx_quote() {
        let data = json!({
            "symbol": "ethwrx", "status": "halt", "baseAsset": "eth", "quoteAsset": "wrx",
            "baseAssetPrecision": 4, "quoteAssetPrecision": 2, "filters": []
        });
        let market = parse_market(&data, str::to_uppercase).unwrap();
        assert!(!market.active);
        assert_eq!(market.maker, Some(Decimal::ZERO));
        assert_eq!(market.limits.price.min, None);
    }

    #[test]
    fn test_parse_ticker() {
        let data = json!({
            "symbol": "btcinr", "baseAsset": "btc", "quoteAsset": "inr",
            "openPrice": "3000000", "lowPrice": "2900000", "highPrice": "3100000",
            "lastPrice": "3050000", "volume": "12.5", "bidPrice": "3049000",
            "askPrice": "3051000", "at": 1_700_000_000_000_i64
        });
        let ticker = parse_ticker(&data, "BTC/INR");
        assert_eq!(ticker.timestamp, Some(1_700_000_000_000));
        assert_eq!(ticker.high, Some(Price::new(dec!(3100000))));
        assert_eq!(ticker.close, Some(Price::new(dec!(3050000))));
        assert_eq!(ticker.base_volume, Some(Amount::new(dec!(12.5))));
        assert!(ticker.change.is_some());
    }

    #[test]
    fn test_parse_trade_side() {
        let data = json!({
            "id": 28457, "price": "4.00000100", "qty": "12.00000000",
            "quoteQty": "48.000012", "time": 1_499_865_549_590_i64, "isBuyerMaker": true
        });
        let trade = parse_trade(&data, "BTC/INR").unwrap();
        assert_eq!(trade.side, Some(OrderSide::Sell));
        assert_eq!(trade.id.as_deref(), Some("28457"));
        assert_eq!(trade.cost, Some(Cost::new(dec!(48.000012))));

        let data = json!({"id": 1, "price": "1", "qty": "1", "time": 1, "isBuyerMaker": false});
        assert_eq!(parse_trade(&data, "BTC/INR").unwrap().side, Some(OrderSide::Buy));
    }

    #[test]
    fn test_parse_ohlcv_scales_seconds() {
        let row = json!([1_700_000_000, "1", "2", "0.5", "1.5", "100"]);
        let candle = parse_ohlcv(&row).unwrap();
        assert_eq!(candle.timestamp, 1_700_000_000_000);
        assert_eq!(candle.close, dec!(1.5));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(&json!({"status": "normal"})).status, StatusKind::Ok);
        assert_eq!(
            parse_status(&json!({"status": "system_maintenance"})).status,
            StatusKind::Maintenance
        );
    }

    #[test]
    fn test_parse_balance() {
        let data = json!([
            {"asset": "inr", "free": "1000.5", "locked": "200"},
            {"asset": "btc", "free": "0.1", "locked": "0"}
        ]);
        let balance = parse_balance(&data, str::to_uppercase);
        let inr = balance.get("INR").unwrap();
        assert_eq!(inr.free, Some(dec!(1000.5)));
        assert_eq!(inr.used, Some(dec!(200)));
        assert_eq!(inr.total, Some(dec!(1200.5)));
    }

    #[test]
    fn test_parse_order() {
        let data = json!({
            "id": 30, "symbol": "wrxinr", "price": "9293.0", "origQty": "10.0",
            "executedQty": "8.2", "status": "wait", "type": "limit", "side": "sell",
            "createdTime": 1_499_827_319_559_i64, "updatedTime": 1_499_827_319_559_i64
        });
        let order = parse_order(&data, "WRX/INR").unwrap();
        assert_eq!(order.id, "30");
        assert_eq!(order.status, Some(OrderStatus::Open));
        assert_eq!(order.side, Some(OrderSide::Sell));
        assert_eq!(order.order_type, Some(OrderType::Limit));
        assert_eq!(order.remaining, Some(dec!(1.8)));
        assert_eq!(parse_order_status("done"), OrderStatus::Closed);
        assert_eq!(parse_order_status("cancel"), OrderStatus::Canceled);
    }
}
