//! Property-based tests for order book maintenance and checksums.
//!
//! A book fed a snapshot plus a stream of deltas must equal a plain
//! price-to-amount map fed the same updates, and the checksum payload
//! must be built from the wire strings of the top levels.

use coinbridge_core::checksum;
use coinbridge_core::types::{Amount, Cost, OrderBook, Price};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

// ============================================================================
// Test Generators
// ============================================================================

/// `(price ticks, amount, is_bid)`; amount zero deletes the level.
fn delta_strategy() -> impl Strategy<Value = (u32, u32, bool)> {
    (1u32..200, prop_oneof![Just(0u32), 1u32..1_000], any::<bool>())
}

fn level_strategy() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((1u32..200, 1u32..1_000), 0..40)
}

fn decimal_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000, 0u32..8).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn to_decimal(ticks: u32) -> Decimal {
    Decimal::new(i64::from(ticks), 1)
}

fn apply(model: &mut BTreeMap<Decimal, Decimal>, price: Decimal, amount: Decimal) {
    if amount.is_zero() {
        model.remove(&price);
    } else {
        model.insert(price, amount);
    }
}

// ============================================================================
// Delta application
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_deltas_match_model(
        bids in level_strategy(),
        asks in level_strategy(),
        deltas in prop::collection::vec(delta_strategy(), 0..200),
    ) {
        let mut book = OrderBook::from_snapshot(
            "BTC/USDT",
            bids.iter().map(|(p, a)| (to_decimal(*p), Decimal::from(*a))),
            asks.iter().map(|(p, a)| (to_decimal(*p), Decimal::from(*a))),
            Some(1_700_000_000_000),
        );
        let mut bid_model = BTreeMap::new();
        let mut ask_model = BTreeMap::new();
        for (p, a) in &bids {
            apply(&mut bid_model, to_decimal(*p), Decimal::from(*a));
        }
        for (p, a) in &asks {
            apply(&mut ask_model, to_decimal(*p), Decimal::from(*a));
        }

        for (p, a, is_bid) in deltas {
            let (price, amount) = (to_decimal(p), Decimal::from(a));
            if is_bid {
                book.bids.store(price, amount);
                apply(&mut bid_model, price, amount);
            } else {
                book.asks.store(price, amount);
                apply(&mut ask_model, price, amount);
            }
        }

        let expected_bids: Vec<_> = bid_model.iter().rev().map(|(p, a)| (*p, *a)).collect();
        let expected_asks: Vec<_> = ask_model.iter().map(|(p, a)| (*p, *a)).collect();
        let actual_bids: Vec<_> = book.bids.iter().map(|l| (l.price.0, l.amount.0)).collect();
        let actual_asks: Vec<_> = book.asks.iter().map(|l| (l.price.0, l.amount.0)).collect();

        prop_assert_eq!(actual_bids, expected_bids);
        prop_assert_eq!(actual_asks, expected_asks);
        prop_assert_eq!(
            book.best_bid().map(|l| l.price.0),
            bid_model.keys().next_back().copied()
        );
        prop_assert_eq!(
            book.best_ask().map(|l| l.price.0),
            ask_model.keys().next().copied()
        );
    }

    #[test]
    fn prop_limited_keeps_best_levels(
        bids in level_strategy(),
        asks in level_strategy(),
        depth in 0usize..20,
    ) {
        let book = OrderBook::from_snapshot(
            "ETH/USDT",
            bids.iter().map(|(p, a)| (to_decimal(*p), Decimal::from(*a))),
            asks.iter().map(|(p, a)| (to_decimal(*p), Decimal::from(*a))),
            None,
        );
        let limited = book.limited(Some(depth));

        let full_bids = book.bids.levels();
        let full_asks = book.asks.levels();
        prop_assert_eq!(limited.bids.levels(), full_bids.into_iter().take(depth).collect::<Vec<_>>());
        prop_assert_eq!(limited.asks.levels(), full_asks.into_iter().take(depth).collect::<Vec<_>>());
        prop_assert_eq!(book.limited(None), book.clone());
    }

    #[test]
    fn prop_reset_then_snapshot_discards_old_levels(
        old in level_strategy(),
        fresh in level_strategy(),
    ) {
        let mut book = OrderBook::from_snapshot(
            "BTC/USDT",
            old.iter().map(|(p, a)| (to_decimal(*p), Decimal::from(*a))),
            Vec::new(),
            Some(1),
        );
        book.nonce = Some(42);
        book.reset();
        for (p, a) in &fresh {
            book.bids.store(to_decimal(*p), Decimal::from(*a));
        }

        let expected = OrderBook::from_snapshot(
            "BTC/USDT",
            fresh.iter().map(|(p, a)| (to_decimal(*p), Decimal::from(*a))),
            Vec::new(),
            None,
        );
        prop_assert_eq!(book.bids.levels(), expected.bids.levels());
        prop_assert_eq!(book.nonce, None);
    }
}

// ============================================================================
// Checksums
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_checksum_payload_uses_wire_strings(
        bids in prop::collection::btree_map(1u32..1_000, 1u32..1_000, 0..30),
        asks in prop::collection::btree_map(1_000u32..2_000, 1u32..1_000, 0..30),
        depth in 1usize..30,
    ) {
        let mut book = OrderBook::new("BTC/USDT");
        // Trailing zeros must survive into the payload.
        let wire = |n: u32| format!("{n}.50");
        for (p, a) in &bids {
            book.bids.store_raw(&wire(*p), &format!("{a}.000")).unwrap();
        }
        for (p, a) in &asks {
            book.asks.store_raw(&wire(*p), &format!("{a}.000")).unwrap();
        }

        let payload = book.checksum_payload(depth);
        let fields: Vec<&str> = if payload.is_empty() {
            Vec::new()
        } else {
            payload.split(':').collect()
        };
        let expected_levels = bids.len().min(depth) + asks.len().min(depth);
        prop_assert_eq!(fields.len(), expected_levels * 2);
        prop_assert!(fields.iter().all(|f| f.ends_with(".50") || f.ends_with(".000")));

        if let (Some((best_bid, _)), Some((best_ask, _))) = (bids.iter().next_back(), asks.iter().next()) {
            prop_assert_eq!(fields[0], wire(*best_bid));
            prop_assert_eq!(fields[2], wire(*best_ask));
        }
    }

    #[test]
    fn prop_verify_accepts_signed_and_unsigned(payload in "[0-9.:]{0,200}") {
        let unsigned = checksum::crc32(&payload);
        let signed = checksum::crc32_signed(&payload);
        prop_assert!(checksum::verify(&payload, i64::from(unsigned)));
        prop_assert!(checksum::verify(&payload, i64::from(signed)));
        prop_assert_eq!(signed as u32, unsigned);
    }

    #[test]
    fn prop_checksum_detects_changed_level(
        bids in prop::collection::btree_map(1u32..1_000, 1u32..1_000, 1..30),
        bump in 1u32..1_000,
    ) {
        let mut book = OrderBook::new("BTC/USDT");
        for (p, a) in &bids {
            book.bids.store_raw(&p.to_string(), &a.to_string()).unwrap();
        }
        let before = checksum::crc32(&book.checksum_payload(25));

        let (best, amount) = bids.iter().next_back().unwrap();
        book.bids.store_raw(&best.to_string(), &(amount + bump).to_string()).unwrap();
        let after = book.checksum_payload(25);

        prop_assert!(!checksum::verify(&after, i64::from(before)));
    }
}

// ============================================================================
// Financial newtypes
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_price_times_amount_is_cost(price in decimal_strategy(), amount in decimal_strategy()) {
        let cost = Price::new(price) * Amount::new(amount);
        prop_assert_eq!(cost, Cost::new(price * amount));
        prop_assert_eq!(Amount::new(amount) * Price::new(price), cost);
    }

    #[test]
    fn prop_cost_over_amount_recovers_price(price in decimal_strategy(), amount in 1i64..1_000_000) {
        let amount = Amount::new(Decimal::from(amount));
        let cost = Price::new(price) * amount;
        let recovered = cost.checked_div_amount(amount).unwrap();
        prop_assert_eq!(recovered.as_decimal().normalize(), price.normalize());
    }

    #[test]
    fn prop_amount_parses_from_display(value in decimal_strategy()) {
        let amount = Amount::new(value);
        let parsed: Amount = amount.to_string().parse().unwrap();
        prop_assert_eq!(parsed, amount);
    }
}

#[test]
fn test_cost_over_zero_amount_is_none() {
    let cost = Cost::new(Decimal::from(10));
    assert_eq!(cost.checked_div_amount(Amount::default()), None);
}
