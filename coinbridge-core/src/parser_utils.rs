//! Tolerant accessors for exchange JSON.
//!
//! Exchanges are inconsistent about sending numbers as strings or as JSON
//! numbers, and about using `""` or `null` for absent values. The `safe_*`
//! helpers accept every one of those shapes and return `None` rather than
//! an error when a value is absent or unusable.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

fn as_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_decimal(v: &Value) -> Option<Decimal> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(&s)
        .or_else(|_| Decimal::from_scientific(&s))
        .ok()
}

fn as_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(|f| f.trunc().to_i64())),
        Value::String(s) => s
            .parse::<i64>()
            .ok()
            .or_else(|| as_decimal(v).and_then(|d| d.trunc().to_i64())),
        _ => None,
    }
}

/// String at `key`. Numbers are rendered with their JSON text.
pub fn safe_string(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(as_string)
}

/// First present of `key1`, `key2`.
pub fn safe_string_2(data: &Value, key1: &str, key2: &str) -> Option<String> {
    safe_string(data, key1).or_else(|| safe_string(data, key2))
}

/// Lowercased string at `key`.
pub fn safe_string_lower(data: &Value, key: &str) -> Option<String> {
    safe_string(data, key).map(|s| s.to_lowercase())
}

/// Integer at `key`; decimal strings are truncated.
pub fn safe_integer(data: &Value, key: &str) -> Option<i64> {
    data.get(key).and_then(as_integer)
}

/// First present of `key1`, `key2`.
pub fn safe_integer_2(data: &Value, key1: &str, key2: &str) -> Option<i64> {
    safe_integer(data, key1).or_else(|| safe_integer(data, key2))
}

/// Seconds at `key` scaled to milliseconds.
pub fn safe_timestamp(data: &Value, key: &str) -> Option<i64> {
    data.get(key)
        .and_then(as_decimal)
        .and_then(|d| (d * Decimal::ONE_THOUSAND).trunc().to_i64())
}

/// Decimal at `key`, from a string or a number.
pub fn safe_decimal(data: &Value, key: &str) -> Option<Decimal> {
    data.get(key).and_then(as_decimal)
}

/// First present of `key1`, `key2`.
pub fn safe_decimal_2(data: &Value, key1: &str, key2: &str) -> Option<Decimal> {
    safe_decimal(data, key1).or_else(|| safe_decimal(data, key2))
}

/// Boolean at `key`. Accepts `"true"`/`"false"` strings.
pub fn safe_bool(data: &Value, key: &str) -> Option<bool> {
    match data.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Non-null value at `key`.
pub fn safe_value<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    data.get(key).filter(|v| !v.is_null())
}

/// String at array position `index`.
pub fn safe_string_index(row: &Value, index: usize) -> Option<String> {
    row.get(index).and_then(as_string)
}

/// Integer at array position `index`.
pub fn safe_integer_index(row: &Value, index: usize) -> Option<i64> {
    row.get(index).and_then(as_integer)
}

/// Decimal at array position `index`.
pub fn safe_decimal_index(row: &Value, index: usize) -> Option<Decimal> {
    row.get(index).and_then(as_decimal)
}

/// Converts a JSON object into a map; anything else gives an empty map.
pub fn value_to_hashmap(data: &Value) -> HashMap<String, Value> {
    data.as_object()
        .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

/// `None` for zero, otherwise the value.
pub fn omit_zero(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| !v.is_zero())
}

/// Strips a leading minus sign from a numeric string.
pub fn string_abs(value: &str) -> String {
    value.strip_prefix('-').unwrap_or(value).to_string()
}

/// Reads `[price, amount]` wire strings from a level row. Rows may be
/// arrays (by index) or objects (by key name via [`parse_bid_ask_keyed`]).
pub fn parse_bid_ask(row: &Value, price_index: usize, amount_index: usize) -> Option<(String, String)> {
    Some((
        safe_string_index(row, price_index)?,
        safe_string_index(row, amount_index)?,
    ))
}

/// Object form of [`parse_bid_ask`].
pub fn parse_bid_ask_keyed(row: &Value, price_key: &str, amount_key: &str) -> Option<(String, String)> {
    Some((safe_string(row, price_key)?, safe_string(row, amount_key)?))
}

/// Parses every row of `rows` with [`parse_bid_ask`] into decimals,
/// skipping malformed rows.
pub fn parse_bids_asks(rows: Option<&Value>, price_index: usize, amount_index: usize) -> Vec<(Decimal, Decimal)> {
    rows.and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some((
                        safe_decimal_index(row, price_index)?,
                        safe_decimal_index(row, amount_index)?,
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}
