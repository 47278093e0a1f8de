//! BitMart response parsers.

use super::DEFAULT_FEE;
use coinbridge_core::parser_utils::{
    omit_zero, parse_bids_asks, safe_decimal, safe_decimal_2, safe_integer, safe_integer_2,
    safe_string, safe_string_2, safe_string_lower, safe_value,
};
use coinbridge_core::time::iso8601;
use coinbridge_core::types::{
    Amount, Balance, BalanceEntry, Cost, ExchangeStatus, Fee, Market, Ohlcv, Order, OrderBook,
    OrderSide, OrderStatus, OrderType, Price, StatusKind, TakerOrMaker, Ticker, Trade,
};
use coinbridge_core::{Error, Result};
use rust_decimal::Decimal;
use serde_json::Value;

/// `10^-digits`, e.g. `6` → `0.000001`.
pub fn precision_from_digits(digits: &str) -> Option<Decimal> {
    let digits: u32 = digits.parse().ok()?;
    Some(Decimal::new(1, digits))
}

/// Parses a `spot/v1/symbols/details` entry. `currency_code` maps
/// currency ids to unified codes.
pub fn parse_market(data: &Value, currency_code: impl Fn(&str) -> String) -> Result<Market> {
    let id = safe_string(data, "symbol").ok_or_else(|| Error::missing_field("symbol"))?;
    let base_id =
        safe_string(data, "base_currency").ok_or_else(|| Error::missing_field("base_currency"))?;
    let quote_id = safe_string(data, "quote_currency")
        .ok_or_else(|| Error::missing_field("quote_currency"))?;
    let min_size = safe_decimal(data, "base_min_size");
    let min_cost = match (
        safe_decimal(data, "min_buy_amount"),
        safe_decimal(data, "min_sell_amount"),
    ) {
        (Some(buy), Some(sell)) => Some(buy.max(sell)),
        (buy, sell) => buy.or(sell),
    };

    let mut market = Market::new_spot(id, currency_code(&base_id), currency_code(&quote_id));
    market.base_id = base_id;
    market.quote_id = quote_id;
    market.active = safe_string_lower(data, "trade_status").is_none_or(|s| s == "trading");
    market.precision.amount = min_size;
    market.precision.price =
        safe_string(data, "price_max_precision").and_then(|p| precision_from_digits(&p));
    market.limits.amount.min = min_size;
    market.limits.amount.max = safe_decimal(data, "base_max_size");
    market.limits.cost.min = min_cost;
    market.taker = Some(DEFAULT_FEE);
    market.maker = Some(DEFAULT_FEE);
    market.info = data.clone();
    Ok(market)
}

/// `fluctuation` is a ratio (`-0.0882`); the unified percentage is
/// `-8.82`.
fn percentage(data: &Value) -> Option<Decimal> {
    safe_decimal(data, "fluctuation").map(|ratio| (ratio * Decimal::ONE_HUNDRED).normalize())
}

/// Parses a spot ticker from `spot/v1/ticker` or `spot/v2/ticker`.
pub fn parse_ticker(data: &Value, symbol: &str) -> Ticker {
    let price = |key: &str| safe_decimal(data, key).map(Price::new);
    let amount = |key: &str| safe_decimal(data, key).map(Amount::new);
    let timestamp = safe_integer(data, "timestamp");
    let last = safe_decimal_2(data, "close_24h", "last_price").map(Price::new);
    let mut ticker = Ticker {
        symbol: symbol.to_string(),
        timestamp,
        datetime: timestamp.and_then(iso8601),
        high: price("high_24h"),
        low: price("low_24h"),
        bid: price("best_bid"),
        bid_volume: amount("best_bid_size"),
        ask: price("best_ask"),
        ask_volume: amount("best_ask_size"),
        open: price("open_24h"),
        close: last,
        last,
        percentage: percentage(data),
        average: price("avg_price"),
        base_volume: amount("base_volume_24h"),
        quote_volume: amount("quote_volume_24h"),
        info: data.clone(),
        ..Ticker::default()
    };
    ticker.complete();
    ticker
}

/// Parses a `spot/quotation/v3/books` payload.
pub fn parse_order_book(data: &Value, symbol: &str) -> OrderBook {
    OrderBook::from_snapshot(
        symbol,
        parse_bids_asks(safe_value(data, "bids"), 0, 1),
        parse_bids_asks(safe_value(data, "asks"), 0, 1),
        safe_integer_2(data, "ts", "timestamp"),
    )
}

/// Maps a side, including the numeric contract sides 1-4.
pub fn parse_order_side(side: &str) -> Option<OrderSide> {
    match side {
        "1" | "2" => Some(OrderSide::Buy),
        "3" | "4" => Some(OrderSide::Sell),
        other => other.parse().ok(),
    }
}

/// Parses a public trade (`order_time`, `count`, `amount` as cost) or an
/// account fill from `spot/v4/query/trades`.
pub fn parse_trade(data: &Value, market: &Market) -> Result<Trade> {
    let price = safe_decimal(data, "price").ok_or_else(|| Error::missing_field("price"))?;
    let public = data.get("order_time").is_some();
    let (amount, cost, side) = if public {
        (
            safe_decimal(data, "count"),
            safe_decimal(data, "amount"),
            safe_string(data, "type").and_then(|s| parse_order_side(&s)),
        )
    } else {
        (
            safe_decimal(data, "size"),
            safe_decimal(data, "notional"),
            safe_string(data, "side").and_then(|s| parse_order_side(&s)),
        )
    };
    let amount = amount.ok_or_else(|| Error::missing_field("size"))?;
    let timestamp = safe_integer(data, "order_time").or_else(|| safe_integer(data, "createTime"));

    let mut trade = Trade::new(
        market.symbol.clone(),
        side,
        Price::new(price),
        Amount::new(amount),
        timestamp,
    );
    if let Some(cost) = cost {
        trade.cost = Some(Cost::new(cost));
    }
    trade.id = safe_string(data, "tradeId");
    trade.order = safe_string(data, "orderId");
    if !public {
        trade.trade_type = safe_string(data, "type").and_then(|t| t.parse().ok());
    }
    trade.taker_or_maker = match safe_string_lower(data, "tradeRole").as_deref() {
        Some("taker") => Some(TakerOrMaker::Taker),
        Some("maker") => Some(TakerOrMaker::Maker),
        _ => None,
    };
    if let Some(fee) = safe_decimal(data, "fee") {
        let currency = safe_string(data, "feeCoinName").unwrap_or_else(|| {
            if side == Some(OrderSide::Buy) {
                market.base.clone()
            } else {
                market.quote.clone()
            }
        });
        trade.fee = Some(Fee::new(currency, fee));
    }
    trade.info = data.clone();
    Ok(trade)
}

/// Parses a `spot/quotation/v3/klines` row. The open time is in seconds.
pub fn parse_ohlcv(row: &Value) -> Result<Ohlcv> {
    Ohlcv::from_row(row, 1000)
}

/// Picks the `spot` entry of `system/service`. Status 2 is live;
/// anything else is maintenance ending at `end_time`. No entry means no
/// notice, which reads as live.
pub fn parse_status(response: &Value) -> ExchangeStatus {
    let service = safe_value(response, "data")
        .and_then(|d| safe_value(d, "service"))
        .and_then(Value::as_array)
        .and_then(|services| {
            services
                .iter()
                .find(|s| safe_string(s, "service_type").as_deref() == Some("spot"))
        });
    let (status, eta) = match service {
        Some(s) if safe_integer(s, "status") == Some(2) => (StatusKind::Ok, None),
        Some(s) => (StatusKind::Maintenance, safe_integer(s, "end_time")),
        None => (StatusKind::Ok, None),
    };
    ExchangeStatus {
        status,
        eta,
        info: response.clone(),
        ..ExchangeStatus::default()
    }
}

/// Parses the `data.wallet` list of `spot/v1/wallet`.
pub fn parse_balance(response: &Value, currency_code: impl Fn(&str) -> String) -> Balance {
    let mut balance = Balance::new(response.clone());
    let wallet = safe_value(response, "data")
        .and_then(|d| safe_value(d, "wallet"))
        .and_then(Value::as_array);
    for entry in wallet.map(Vec::as_slice).unwrap_or_default() {
        let Some(id) = safe_string_2(entry, "id", "currency") else {
            continue;
        };
        let free = safe_decimal_2(entry, "available", "available_balance").unwrap_or(Decimal::ZERO);
        let used = safe_decimal_2(entry, "frozen", "frozen_balance").unwrap_or(Decimal::ZERO);
        balance.set(currency_code(&id), BalanceEntry::new(free, used));
    }
    balance.safe_balance()
}

/// Maps a spot order status, numeric (v2) or named (v4). Unknown values
/// stay open.
pub fn parse_order_status(status: &str) -> OrderStatus {
    match status {
        "1" | "3" | "failed" => OrderStatus::Rejected,
        "6" | "filled" => OrderStatus::Closed,
        "7" | "8" | "canceled" | "partially_canceled" => OrderStatus::Canceled,
        _ => OrderStatus::Open,
    }
}

/// Parses an order from the v2/v4 query endpoints or the `{order_id}`
/// acknowledgement of `submit_order`.
pub fn parse_order(data: &Value, symbol: &str) -> Result<Order> {
    let id = safe_string_2(data, "order_id", "orderId").ok_or_else(|| Error::missing_field("orderId"))?;
    let timestamp = safe_integer_2(data, "create_time", "createTime");
    let wire_type = safe_string_lower(data, "type");
    let (order_type, time_in_force, post_only) = match wire_type.as_deref() {
        Some("limit_maker") => (Some(OrderType::Limit), Some("PO"), Some(true)),
        Some("ioc") => (Some(OrderType::Limit), Some("IOC"), None),
        Some(other) => (other.parse().ok(), None, None),
        None => (None, None, None),
    };
    let price = safe_string(data, "price")
        .filter(|p| p != "market price")
        .and_then(|p| p.parse::<Decimal>().ok());

    let mut order = Order {
        id,
        client_order_id: safe_string_2(data, "client_order_id", "clientOrderId"),
        timestamp,
        datetime: timestamp.and_then(iso8601),
        last_trade_timestamp: safe_integer_2(data, "update_time", "updateTime"),
        symbol: symbol.to_string(),
        order_type,
        time_in_force: time_in_force.map(str::to_string),
        post_only,
        side: safe_string(data, "side").and_then(|s| parse_order_side(&s)),
        price: omit_zero(price),
        amount: omit_zero(safe_decimal(data, "size")),
        cost: safe_decimal_2(data, "filled_notional", "filledNotional"),
        average: safe_decimal_2(data, "price_avg", "priceAvg"),
        filled: safe_decimal_2(data, "filled_size", "filledSize"),
        status: safe_string_2(data, "status", "state").map(|s| parse_order_status(&s)),
        info: data.clone(),
        ..Order::default()
    };
    order.complete();
    Ok(order)
}
