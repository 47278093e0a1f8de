//! Account balances.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Balance of one currency. Missing parts are filled by
/// [`Balance::safe_balance`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BalanceEntry {
    /// Available for trading.
    pub free: Option<Decimal>,
    /// Locked in orders.
    pub used: Option<Decimal>,
    /// Free plus used.
    pub total: Option<Decimal>,
}

impl BalanceEntry {
    /// Entry from free and used.
    pub fn new(free: Decimal, used: Decimal) -> Self {
        Self {
            free: Some(free),
            used: Some(used),
            total: Some(free + used),
        }
    }

    /// Entry where only the total is known.
    pub fn from_total(total: Decimal) -> Self {
        Self {
            total: Some(total),
            ..Self::default()
        }
    }

    /// Derives whichever of free/used/total is missing from the other two.
    pub fn complete(&mut self) {
        match (self.free, self.used, self.total) {
            (Some(free), Some(used), None) => self.total = Some(free + used),
            (Some(free), None, Some(total)) => self.used = Some(total - free),
            (None, Some(used), Some(total)) => self.free = Some(total - used),
            _ => {}
        }
    }
}

/// Balances keyed by unified currency code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Balance {
    /// Per-currency entries.
    #[serde(flatten)]
    pub balances: HashMap<String, BalanceEntry>,
    /// Exchange timestamp.
    pub timestamp: Option<i64>,
    /// ISO 8601 form of `timestamp`.
    pub datetime: Option<String>,
    /// Raw exchange payload.
    #[serde(default)]
    pub info: Value,
}

impl Balance {
    /// Empty balance carrying the raw response.
    pub fn new(info: Value) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }

    /// Sets the entry for `currency`.
    pub fn set(&mut self, currency: impl Into<String>, entry: BalanceEntry) {
        self.balances.insert(currency.into(), entry);
    }

    /// Entry for `currency`.
    pub fn get(&self, currency: &str) -> Option<&BalanceEntry> {
        self.balances.get(currency)
    }

    /// Completes every entry.
    #[must_use]
    pub fn safe_balance(mut self) -> Self {
        for entry in self.balances.values_mut() {
            entry.complete();
        }
        if self.datetime.is_none() {
            self.datetime = self.timestamp.and_then(crate::time::iso8601);
        }
        self
    }

    /// Currency to free amount.
    pub fn free(&self) -> HashMap<String, Decimal> {
        self.view(|e| e.free)
    }

    /// Currency to used amount.
    pub fn used(&self) -> HashMap<String, Decimal> {
        self.view(|e| e.used)
    }

    /// Currency to total amount.
    pub fn total(&self) -> HashMap<String, Decimal> {
        self.view(|e| e.total)
    }

    fn view(&self, pick: impl Fn(&BalanceEntry) -> Option<Decimal>) -> HashMap<String, Decimal> {
        self.balances
            .iter()
            .filter_map(|(code, entry)| pick(entry).map(|v| (code.clone(), v)))
            .collect()
    }
}
