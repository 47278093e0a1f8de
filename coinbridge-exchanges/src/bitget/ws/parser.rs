//! Stream payload parsers and market id mapping.
//!
//! The v1 stream addresses spot markets by symbol name (`BTCUSDT`) with
//! `instType: "sp"`, and contracts by the legacy id without its product
//! suffix (`BTCUSDT` for `BTCUSDT_UMCBL`) with `instType: "mc"`. Private
//! channels carry the full legacy ids (`BTCUSDT_SPBL`, `BTCUSDT_UMCBL`).

use coinbridge_core::parser_utils::{
    omit_zero, safe_decimal, safe_decimal_2, safe_decimal_index, safe_integer, safe_integer_2,
    safe_integer_index, safe_string, safe_string_2, safe_string_index, safe_value,
};
use coinbridge_core::types::{
    Amount, Fee, MarginMode, Market, Ohlcv, Order, OrderSide, OrderStatus, OrderType, Position,
    PositionSide, Price, Ticker, Timeframe, Trade,
};
use coinbridge_core::{Error, Result};
use serde_json::Value;

use super::super::Bitget;

/// Suffixes of the legacy market ids.
const SPOT_SUFFIX: &str = "_SPBL";
const USDT_CONTRACT_SUFFIX: &str = "_UMCBL";
const COIN_CONTRACT_SUFFIX: &str = "_DMCBL";
const USDC_CONTRACT_SUFFIX: &str = "_CMCBL";
const SANDBOX_USDT_CONTRACT_SUFFIX: &str = "_SUMCBL";
const SANDBOX_COIN_CONTRACT_SUFFIX: &str = "_SDMCBL";
const SANDBOX_USDC_CONTRACT_SUFFIX: &str = "_SCMCBL";

/// Timeframes with a stream candle channel.
pub const WS_TIMEFRAMES: [Timeframe; 10] = [
    Timeframe::M1,
    Timeframe::M5,
    Timeframe::M15,
    Timeframe::M30,
    Timeframe::H1,
    Timeframe::H4,
    Timeframe::H6,
    Timeframe::H12,
    Timeframe::D1,
    Timeframe::W1,
];

/// `id` without its product suffix.
pub fn strip_suffix(id: &str) -> &str {
    [
        SPOT_SUFFIX,
        USDT_CONTRACT_SUFFIX,
        COIN_CONTRACT_SUFFIX,
        USDC_CONTRACT_SUFFIX,
        SANDBOX_USDT_CONTRACT_SUFFIX,
        SANDBOX_COIN_CONTRACT_SUFFIX,
        SANDBOX_USDC_CONTRACT_SUFFIX,
    ]
    .iter()
    .find_map(|suffix| id.strip_suffix(suffix))
    .unwrap_or(id)
}

/// Stream `instId` for a market.
///
/// ```rust
/// use coinbridge_core::types::Market;
/// use coinbridge_exchanges::bitget::ws::ws_market_id;
///
/// let swap = Market::new_swap("BTCUSDT_UMCBL", "BTC", "USDT", "USDT");
/// assert_eq!(ws_market_id(&swap), "BTCUSDT");
/// ```
pub fn ws_market_id(market: &Market) -> String {
    strip_suffix(&market.id).to_string()
}

/// Stream `instType` for public channels: `sp` or `mc`.
pub fn public_inst_type(market: &Market) -> &'static str {
    if market.contract { "mc" } else { "sp" }
}

/// Legacy market id for the `arg` of a public channel message.
///
/// `sp` ids get `_SPBL`; contract ids get `_UMCBL` when they contain
/// `USDT`, `_CMCBL` when they contain `PERP` and `_DMCBL` otherwise. In
/// sandbox mode contract suffixes carry an `S` (`_SUMCBL`).
pub fn market_id_from_arg(arg: &Value, sandbox: bool) -> Option<String> {
    let inst_id = safe_string(arg, "instId")?;
    let inst_type = safe_string(arg, "instType").unwrap_or_default();
    let suffix = match (inst_type == "sp", sandbox) {
        (true, _) => SPOT_SUFFIX,
        (false, false) if inst_id.contains("USDT") => USDT_CONTRACT_SUFFIX,
        (false, false) if inst_id.contains("PERP") => USDC_CONTRACT_SUFFIX,
        (false, false) => COIN_CONTRACT_SUFFIX,
        (false, true) if inst_id.contains("USDT") => SANDBOX_USDT_CONTRACT_SUFFIX,
        (false, true) if inst_id.contains("PERP") => SANDBOX_USDC_CONTRACT_SUFFIX,
        (false, true) => SANDBOX_COIN_CONTRACT_SUFFIX,
    };
    Some(format!("{inst_id}{suffix}"))
}

/// Perpetual market described by a legacy contract id.
///
/// `LTCUSDT_UMCBL` is `LTC/USDT:USDT`, `BTCPERP_CMCBL` is `BTC/USDC:USDC`
/// and `BTCUSD_DMCBL` is `BTC/USD:BTC`.
pub fn contract_market_from_id(id: &str) -> Option<Market> {
    let suffixed = |live: &str, sandbox: &str| {
        id.strip_suffix(live).or_else(|| id.strip_suffix(sandbox))
    };
    if let Some(name) = suffixed(USDT_CONTRACT_SUFFIX, SANDBOX_USDT_CONTRACT_SUFFIX) {
        let base = name.strip_suffix("USDT")?;
        Some(Market::new_swap(id, base, "USDT", "USDT"))
    } else if let Some(name) = suffixed(USDC_CONTRACT_SUFFIX, SANDBOX_USDC_CONTRACT_SUFFIX) {
        let base = name.strip_suffix("PERP")?;
        Some(Market::new_swap(id, base, "USDC", "USDC"))
    } else if let Some(name) = suffixed(COIN_CONTRACT_SUFFIX, SANDBOX_COIN_CONTRACT_SUFFIX) {
        let base = name.strip_suffix("USD")?;
        Some(Market::new_swap(id, base, "USD", base))
    } else {
        None
    }
    .filter(|m| !m.base.is_empty())
}

/// Perpetual market for a unified contract symbol such as `BTC/USDT:USDT`.
pub fn contract_market_from_symbol(symbol: &str) -> Option<Market> {
    let (pair, settle) = symbol.split_once(':')?;
    let (base, quote) = pair.split_once('/')?;
    let id = match (quote, settle) {
        ("USDT", "USDT") => format!("{base}USDT{USDT_CONTRACT_SUFFIX}"),
        ("USDC", "USDC") => format!("{base}PERP{USDC_CONTRACT_SUFFIX}"),
        ("USD", s) if s == base => format!("{base}USD{COIN_CONTRACT_SUFFIX}"),
        _ => return None,
    };
    contract_market_from_id(&id)
}

/// Timeframe of a `candle*` channel.
pub fn timeframe_from_channel(channel: &str) -> Option<Timeframe> {
    let interval = channel.strip_prefix("candle")?;
    WS_TIMEFRAMES
        .into_iter()
        .find(|tf| Bitget::ws_timeframe(*tf) == Some(interval))
}

fn price(data: &Value, key: &str) -> Option<Price> {
    safe_decimal(data, key).map(Price::new)
}

fn amount(data: &Value, key: &str) -> Option<Amount> {
    safe_decimal(data, key).map(Amount::new)
}

/// Parses a `ticker` channel entry.
pub fn parse_ws_ticker(data: &Value, market: &Market) -> Ticker {
    let timestamp = safe_integer_2(data, "ts", "systemTime");
    let mut ticker = Ticker {
        symbol: market.symbol.clone(),
        timestamp,
        high: price(data, "high24h"),
        low: price(data, "low24h"),
        bid: price(data, "bestBid"),
        bid_volume: amount(data, "bidSz"),
        ask: price(data, "bestAsk"),
        ask_volume: amount(data, "askSz"),
        open: price(data, "open24h"),
        last: price(data, "last"),
        base_volume: amount(data, "baseVolume"),
        quote_volume: amount(data, "quoteVolume"),
        info: data.clone(),
        ..Ticker::default()
    };
    ticker.complete();
    ticker
}

/// Parses a `trade` channel row: `[ts, price, size, side]`.
pub fn parse_ws_trade(row: &Value, market: &Market) -> Result<Trade> {
    let price = safe_decimal_index(row, 1).ok_or_else(|| Error::missing_field("price"))?;
    let size = safe_decimal_index(row, 2).ok_or_else(|| Error::missing_field("size"))?;
    let side = safe_string_index(row, 3).and_then(|s| s.parse::<OrderSide>().ok());
    let mut trade = Trade::new(
        market.symbol.clone(),
        side,
        Price::new(price),
        Amount::new(size),
        safe_integer_index(row, 0),
    );
    trade.info = row.clone();
    Ok(trade)
}

/// Parses a `candle*` row: `[ts, open, high, low, close, volume]`.
pub fn parse_ws_ohlcv(row: &Value) -> Result<Ohlcv> {
    Ohlcv::from_row(row, 1)
}

/// Order side from `side`, falling back to the contract `posSide`.
fn parse_order_side(data: &Value) -> Option<OrderSide> {
    match safe_string(data, "side").as_deref() {
        Some("buy" | "open_long" | "close_short") => Some(OrderSide::Buy),
        Some("sell" | "close_long" | "open_short") => Some(OrderSide::Sell),
        _ => match safe_string(data, "posSide").as_deref() {
            Some("long") => Some(OrderSide::Buy),
            Some("short") => Some(OrderSide::Sell),
            _ => None,
        },
    }
}

/// Maps a stream order status.
pub fn parse_ws_order_status(status: &str) -> OrderStatus {
    match status {
        "full-fill" | "filled" => OrderStatus::Closed,
        "cancelled" | "canceled" => OrderStatus::Canceled,
        _ => OrderStatus::Open,
    }
}

/// Parses an `orders`/`ordersAlgo` channel entry.
pub fn parse_ws_order(data: &Value, market: &Market) -> Order {
    let fee = safe_value(data, "orderFee")
        .and_then(|fees| fees.get(0))
        .and_then(|fee| {
            let cost = safe_decimal(fee, "fee")?;
            Some(Fee::new(safe_string(fee, "feeCcy")?, cost.abs()))
        });
    let order_type = match safe_string(data, "ordType").as_deref() {
        Some("market") => Some(OrderType::Market),
        Some("limit") => Some(OrderType::Limit),
        _ => None,
    };
    let force = safe_string(data, "force");
    let mut order = Order {
        id: safe_string_2(data, "ordId", "id").unwrap_or_default(),
        client_order_id: safe_string_2(data, "clOrdId", "cOid"),
        timestamp: safe_integer(data, "cTime"),
        last_trade_timestamp: safe_integer(data, "uTime"),
        symbol: market.symbol.clone(),
        order_type,
        post_only: force.as_deref().map(|f| f == "post_only"),
        time_in_force: force,
        side: parse_order_side(data),
        price: safe_decimal_2(data, "px", "actualPx"),
        trigger_price: safe_decimal(data, "triggerPx"),
        amount: safe_decimal(data, "sz"),
        filled: safe_decimal_2(data, "accFillSz", "fillSz"),
        cost: safe_decimal_2(data, "notional", "notionalUsd"),
        average: omit_zero(safe_decimal(data, "avgPx")),
        status: safe_string_2(data, "status", "state").map(|s| parse_ws_order_status(&s)),
        fee,
        info: data.clone(),
        ..Order::default()
    };
    order.complete();
    order
}

/// Parses an order update that reports a fill.
pub fn parse_ws_my_trade(data: &Value, market: &Market) -> Result<Trade> {
    let price = safe_decimal(data, "fillPx").ok_or_else(|| Error::missing_field("fillPx"))?;
    let size = safe_decimal(data, "fillSz").ok_or_else(|| Error::missing_field("fillSz"))?;
    let mut trade = Trade::new(
        market.symbol.clone(),
        parse_order_side(data),
        Price::new(price),
        Amount::new(size),
        safe_integer_2(data, "fillTime", "uTime"),
    );
    trade.id = safe_string(data, "tradeId");
    trade.order = safe_string_2(data, "ordId", "id");
    trade.trade_type = match safe_string(data, "ordType").as_deref() {
        Some("market") => Some(OrderType::Market),
        Some("limit") => Some(OrderType::Limit),
        _ => None,
    };
    if let (Some(fee), Some(currency)) = (
        safe_decimal(data, "fillFee"),
        safe_string(data, "fillFeeCcy"),
    ) {
        trade.fee = Some(Fee::new(currency, fee.abs()));
    }
    trade.info = data.clone();
    Ok(trade)
}

/// Parses a `positions` channel entry.
pub fn parse_ws_position(data: &Value, market: &Market) -> Position {
    let timestamp = safe_integer_2(data, "uTime", "cTime");
    Position {
        id: safe_string(data, "posId"),
        symbol: market.symbol.clone(),
        side: match safe_string(data, "holdSide").as_deref() {
            Some("long") => Some(PositionSide::Long),
            Some("short") => Some(PositionSide::Short),
            _ => None,
        },
        margin_mode: match safe_string(data, "marginMode").as_deref() {
            Some("crossed") => Some(MarginMode::Cross),
            Some("fixed") => Some(MarginMode::Isolated),
            _ => None,
        },
        hedged: match safe_string(data, "holdMode").as_deref() {
            Some("double_hold") => Some(true),
            Some("single_hold") => Some(false),
            _ => None,
        },
        contracts: safe_decimal(data, "total"),
        contract_size: market.contract_size,
        entry_price: safe_decimal(data, "averageOpenPrice"),
        mark_price: safe_decimal(data, "markPrice"),
        leverage: safe_decimal(data, "leverage"),
        collateral: safe_decimal(data, "margin"),
        unrealized_pnl: safe_decimal(data, "upl"),
        liquidation_price: safe_decimal(data, "liqPx"),
        maintenance_margin_percentage: safe_decimal(data, "keepMarginRate"),
        margin_ratio: safe_decimal(data, "marginRate"),
        percentage: safe_decimal(data, "uplRate"),
        timestamp,
        datetime: timestamp.and_then(coinbridge_core::time::iso8601),
        info: data.clone(),
        ..Position::default()
    }
}
