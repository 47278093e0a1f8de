//! CoinSpot response parsers.

use coinbridge_core::parser_utils::{safe_decimal, safe_integer, safe_string, safe_value};
use coinbridge_core::time::{iso8601, parse8601};
use coinbridge_core::types::{
    Amount, Balance, BalanceEntry, Cost, Fee, Market, OrderBook, OrderSide, Price, Ticker, Trade,
};
use coinbridge_core::{Error, Result};
use rust_decimal::Decimal;
use serde_json::Value;

/// Parses a `prices` entry of `pubapi/latest`. Only bid, ask and last are
/// reported.
pub fn parse_ticker(data: &Value, market: &Market) -> Ticker {
    let price = |key: &str| safe_decimal(data, key).map(Price::new);
    let mut ticker = Ticker {
        symbol: market.symbol.clone(),
        bid: price("bid"),
        ask: price("ask"),
        last: price("last"),
        info: data.clone(),
        ..Ticker::default()
    };
    ticker.complete();
    ticker
}

/// Parses `{buyorders, sellorders}` with `rate`/`amount` levels.
pub fn parse_order_book(data: &Value, symbol: &str) -> OrderBook {
    let levels = |key: &str| {
        safe_value(data, key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|row| Some((safe_decimal(row, "rate")?, safe_decimal(row, "amount")?)))
            .collect::<Vec<_>>()
    };
    OrderBook::from_snapshot(symbol, levels("buyorders"), levels("sellorders"), None)
}

/// Parses a public history entry or a private transaction.
///
/// Public entries carry `solddate` and `rate`. Private transactions only
/// have a total, so the price is `total / amount` and the AUD fee is the
/// fee plus GST.
pub fn parse_trade(data: &Value, symbol: &str) -> Result<Trade> {
    let amount = safe_decimal(data, "amount").ok_or_else(|| Error::missing_field("amount"))?;
    let cost = safe_decimal(data, "total").or_else(|| safe_decimal(data, "audtotal"));
    let side = safe_string(data, "side").and_then(|s| s.parse::<OrderSide>().ok());

    let (price, timestamp, fee) = match safe_integer(data, "solddate") {
        Some(solddate) => {
            let rate = safe_decimal(data, "rate").ok_or_else(|| Error::missing_field("rate"))?;
            (rate, Some(solddate), None)
        }
        None => {
            let cost = cost.ok_or_else(|| Error::missing_field("total"))?;
            let price = cost
                .checked_div(amount)
                .ok_or_else(|| Error::invalid_value("amount", "zero amount"))?;
            let timestamp = safe_string(data, "created").and_then(|s| parse8601(&s));
            let fee_cost = safe_decimal(data, "audfeeExGst").unwrap_or(Decimal::ZERO)
                + safe_decimal(data, "audGst").unwrap_or(Decimal::ZERO);
            (price, timestamp, Some(Fee::new("AUD", fee_cost)))
        }
    };

    Ok(Trade {
        symbol: symbol.to_string(),
        side,
        price: Price::new(price),
        amount: Amount::new(amount),
        cost: cost.map(Cost::new),
        fee,
        timestamp,
        datetime: timestamp.and_then(iso8601),
        info: data.clone(),
        ..Trade::default()
    })
}

/// Parses `my/balances`.
///
/// The payload is either `{"balance": {"btc": "1.5"}}` or
/// `{"balances": [{"btc": {"balance": 1.5, ...}}, ...]}`. Only totals are
/// reported.
pub fn parse_balance(data: &Value, currency_code: impl Fn(&str) -> String) -> Balance {
    let mut balance = Balance::new(data.clone());
    let entries = safe_value(data, "balance").or_else(|| safe_value(data, "balances"));
    match entries {
        Some(Value::Array(list)) => {
            for currencies in list.iter().filter_map(Value::as_object) {
                for (id, entry) in currencies {
                    if let Some(total) = safe_decimal(entry, "balance") {
                        balance.set(currency_code(id), BalanceEntry::from_total(total));
                    }
                }
            }
        }
        Some(Value::Object(map)) => {
            for id in map.keys() {
                if let Some(total) = entries.and_then(|e| safe_decimal(e, id)) {
                    balance.set(currency_code(id), BalanceEntry::from_total(total));
                }
            }
        }
        _ => {}
    }
    balance.safe_balance()
}

/// Sorts by time, drops trades before `since` and keeps the first `limit`.
pub fn filter_trades(mut trades: Vec<Trade>, since: Option<i64>, limit: Option<u32>) -> Vec<Trade> {
    trades.sort_by_key(|t| t.timestamp);
    if let Some(since) = since {
        trades.retain(|t| t.timestamp.is_some_and(|ts| ts >= since));
    }
    if let Some(limit) = limit {
        trades.truncate(limit as usize);
    }
    trades
}
