//! Bitget REST response parsers.
//!
//! Converts v2 API payloads (the `data` member of `{code, msg, data}`)
//! into the unified types.

use coinbridge_core::parser_utils::{
    parse_bids_asks, safe_decimal, safe_decimal_2, safe_integer, safe_integer_2, safe_string,
    safe_string_2, safe_value,
};
use coinbridge_core::types::{
    Amount, Balance, BalanceEntry, Cost, Fee, Market, MarketLimits, MarketPrecision, MinMax,
    Ohlcv, Order, OrderBook, OrderSide, OrderStatus, OrderType, Price, TakerOrMaker, Ticker,
    Trade,
};
use coinbridge_core::{Error, Result};
use rust_decimal::Decimal;
use serde_json::Value;

fn price(data: &Value, key: &str) -> Option<Price> {
    safe_decimal(data, key).map(Price::new)
}

fn amount(data: &Value, key: &str) -> Option<Amount> {
    safe_decimal(data, key).map(Amount::new)
}

/// Tick size for a count of decimals: `2` gives `0.01`.
pub fn precision_from_decimals(decimals: &str) -> Option<Decimal> {
    let scale: u32 = decimals.parse().ok()?;
    Some(Decimal::new(1, scale))
}

// ============================================================================
// Market Data Parser Functions
// ============================================================================

/// Parses a spot symbol from `/api/v2/spot/public/symbols`.
///
/// ```rust
/// use coinbridge_exchanges::bitget::parser::parse_market;
/// use serde_json::json;
///
/// let market = parse_market(&json!({
///     "symbol": "BTCUSDT",
///     "baseCoin": "BTC",
///     "quoteCoin": "USDT",
///     "status": "online",
///     "pricePrecision": "2",
///     "quantityPrecision": "4"
/// }))
/// .unwrap();
/// assert_eq!(market.symbol, "BTC/USDT");
/// assert!(market.active);
/// ```
pub fn parse_market(data: &Value) -> Result<Market> {
    let id = safe_string(data, "symbol").ok_or_else(|| Error::missing_field("symbol"))?;
    let base_id = safe_string(data, "baseCoin").ok_or_else(|| Error::missing_field("baseCoin"))?;
    let quote_id =
        safe_string(data, "quoteCoin").ok_or_else(|| Error::missing_field("quoteCoin"))?;

    let mut market = Market::new_spot(&id, base_id.to_uppercase(), quote_id.to_uppercase());
    market.base_id = base_id;
    market.quote_id = quote_id;
    market.active = safe_string(data, "status").as_deref() == Some("online");
    market.precision = MarketPrecision {
        price: safe_string(data, "pricePrecision")
            .as_deref()
            .and_then(precision_from_decimals),
        amount: safe_string(data, "quantityPrecision")
            .as_deref()
            .and_then(precision_from_decimals),
    };
    market.limits = MarketLimits {
        amount: MinMax {
            min: safe_decimal(data, "minTradeAmount"),
            max: safe_decimal(data, "maxTradeAmount").filter(|v| !v.is_zero()),
        },
        cost: MinMax {
            min: safe_decimal(data, "minTradeUSDT"),
            max: None,
        },
        ..MarketLimits::default()
    };
    market.maker = safe_decimal(data, "makerFeeRate");
    market.taker = safe_decimal(data, "takerFeeRate");
    market.info = data.clone();
    Ok(market)
}

/// Parses a v2 ticker.
pub fn parse_ticker(data: &Value, market: Option<&Market>) -> Result<Ticker> {
    let symbol = match market {
        Some(m) => m.symbol.clone(),
        None => safe_string(data, "symbol").ok_or_else(|| Error::missing_field("symbol"))?,
    };
    let timestamp = safe_integer(data, "ts");
    let mut ticker = Ticker {
        symbol,
        timestamp,
        datetime: timestamp.and_then(coinbridge_core::time::iso8601),
        high: price(data, "high24h"),
        low: price(data, "low24h"),
        bid: price(data, "bidPr"),
        bid_volume: amount(data, "bidSz"),
        ask: price(data, "askPr"),
        ask_volume: amount(data, "askSz"),
        open: price(data, "open"),
        last: price(data, "lastPr"),
        base_volume: amount(data, "baseVolume"),
        quote_volume: amount(data, "quoteVolume"),
        info: data.clone(),
        ..Ticker::default()
    };
    ticker.complete();
    Ok(ticker)
}

/// Parses `{asks, bids, ts}`.
pub fn parse_orderbook(data: &Value, symbol: &str) -> Result<OrderBook> {
    let timestamp = safe_integer(data, "ts");
    let bids = parse_bids_asks(safe_value(data, "bids"), 0, 1);
    let asks = parse_bids_asks(safe_value(data, "asks"), 0, 1);
    Ok(OrderBook::from_snapshot(symbol, bids, asks, timestamp))
}

/// Parses a public fill from `/market/fills`.
pub fn parse_trade(data: &Value, market: Option<&Market>) -> Result<Trade> {
    let symbol = match market {
        Some(m) => m.symbol.clone(),
        None => safe_string(data, "symbol").unwrap_or_default(),
    };
    let price = price(data, "price").ok_or_else(|| Error::missing_field("price"))?;
    let amount = amount(data, "size").ok_or_else(|| Error::missing_field("size"))?;
    let side = safe_string(data, "side").and_then(|s| s.parse::<OrderSide>().ok());
    let mut trade = Trade::new(symbol, side, price, amount, safe_integer(data, "ts"));
    trade.id = safe_string(data, "tradeId");
    trade.info = data.clone();
    Ok(trade)
}

/// Parses `[ts, open, high, low, close, baseVolume, ...]`.
pub fn parse_ohlcv(data: &Value) -> Result<Ohlcv> {
    Ohlcv::from_row(data, 1)
}

// ============================================================================
// Order and Balance Parser Functions
// ============================================================================

/// Maps a v2 order status.
pub fn parse_order_status(status: &str) -> OrderStatus {
    match status.to_lowercase().as_str() {
        "filled" | "full_fill" | "full-fill" => OrderStatus::Closed,
        "cancelled" | "canceled" | "cancel" => OrderStatus::Canceled,
        "expired" | "expire" => OrderStatus::Expired,
        "rejected" | "reject" => OrderStatus::Rejected,
        _ => OrderStatus::Open,
    }
}

/// Parses an order from `orderInfo`, `unfilled-orders` or the place/cancel
/// acknowledgements (which carry only `orderId` and `clientOid`).
pub fn parse_order(data: &Value, market: Option<&Market>) -> Result<Order> {
    let id = safe_string(data, "orderId").ok_or_else(|| Error::missing_field("orderId"))?;
    let symbol = match market {
        Some(m) => m.symbol.clone(),
        None => safe_string(data, "symbol").unwrap_or_default(),
    };
    let order_type = match safe_string_2(data, "orderType", "type").as_deref() {
        Some("market") => Some(OrderType::Market),
        Some("limit") => Some(OrderType::Limit),
        _ => None,
    };
    let fee = safe_value(data, "feeDetail").and_then(parse_fee_detail);

    let mut order = Order {
        id,
        client_order_id: safe_string(data, "clientOid"),
        timestamp: safe_integer(data, "cTime"),
        last_trade_timestamp: safe_integer(data, "uTime"),
        symbol,
        order_type,
        time_in_force: safe_string(data, "force").map(|s| s.to_uppercase()),
        post_only: safe_string(data, "force").map(|f| f == "post_only"),
        side: safe_string(data, "side").and_then(|s| s.parse().ok()),
        price: safe_decimal(data, "price").filter(|p| !p.is_zero()),
        amount: safe_decimal(data, "size"),
        filled: safe_decimal(data, "baseVolume"),
        cost: safe_decimal(data, "quoteVolume"),
        average: safe_decimal(data, "priceAvg").filter(|p| !p.is_zero()),
        status: safe_string(data, "status").map(|s| parse_order_status(&s)),
        fee,
        info: data.clone(),
        ..Order::default()
    };
    order.complete();
    Ok(order)
}

/// `feeDetail` is a JSON string on some endpoints and an object on others.
fn parse_fee_detail(detail: &Value) -> Option<Fee> {
    let owned;
    let detail = match detail {
        Value::String(s) => {
            owned = serde_json::from_str::<Value>(s).ok()?;
            &owned
        }
        other => other,
    };
    let currency = safe_string(detail, "feeCoin")?;
    let cost = safe_decimal(detail, "totalFee")?;
    Some(Fee::new(currency, cost.abs()))
}

/// Parses a private fill from `/trade/fills`.
pub fn parse_my_trade(data: &Value, market: Option<&Market>) -> Result<Trade> {
    let symbol = match market {
        Some(m) => m.symbol.clone(),
        None => safe_string(data, "symbol").unwrap_or_default(),
    };
    let price = safe_decimal_2(data, "priceAvg", "price")
        .map(Price::new)
        .ok_or_else(|| Error::missing_field("priceAvg"))?;
    let amount = amount(data, "size").ok_or_else(|| Error::missing_field("size"))?;
    let side = safe_string(data, "side").and_then(|s| s.parse::<OrderSide>().ok());
    let mut trade = Trade::new(
        symbol,
        side,
        price,
        amount,
        safe_integer_2(data, "cTime", "ts"),
    );
    trade.id = safe_string(data, "tradeId");
    trade.order = safe_string(data, "orderId");
    trade.trade_type = match safe_string(data, "orderType").as_deref() {
        Some("market") => Some(OrderType::Market),
        Some("limit") => Some(OrderType::Limit),
        _ => None,
    };
    trade.taker_or_maker = match safe_string(data, "tradeScope").as_deref() {
        Some("taker") => Some(TakerOrMaker::Taker),
        Some("maker") => Some(TakerOrMaker::Maker),
        _ => None,
    };
    if let Some(cost) = safe_decimal(data, "amount") {
        trade.cost = Some(Cost::new(cost));
    }
    trade.fee = safe_value(data, "feeDetail").and_then(parse_fee_detail);
    trade.info = data.clone();
    Ok(trade)
}

/// Parses `/account/assets`. `currency_code` maps coin ids to unified codes.
pub fn parse_balance(data: &Value, currency_code: impl Fn(&str) -> String) -> Balance {
    let mut balance = Balance::new(data.clone());
    for entry in data.as_array().map(Vec::as_slice).unwrap_or_default() {
        let Some(coin) = safe_string(entry, "coin") else {
            continue;
        };
        let free = safe_decimal(entry, "available").unwrap_or(Decimal::ZERO);
        let used = safe_decimal(entry, "frozen").unwrap_or(Decimal::ZERO)
            + safe_decimal(entry, "locked").unwrap_or(Decimal::ZERO);
        balance.set(currency_code(&coin), BalanceEntry::new(free, used));
        if let Some(ts) = safe_integer(entry, "uTime") {
            balance.timestamp = Some(balance.timestamp.map_or(ts, |t| t.max(ts)));
        }
    }
    balance.safe_balance()
}
