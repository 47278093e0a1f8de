//! Derivative positions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Margin mode of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginMode {
    /// Position margin is ring-fenced.
    Isolated,
    /// Position shares the account margin.
    Cross,
}

impl std::fmt::Display for MarginMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Isolated => f.write_str("isolated"),
            Self::Cross => f.write_str("cross"),
        }
    }
}

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    /// Long.
    Long,
    /// Short.
    Short,
}

impl PositionSide {
    /// Lowercase wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }
}

/// Open position on a contract market.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Position id.
    pub id: Option<String>,
    /// Unified symbol.
    pub symbol: String,
    /// Long or short.
    pub side: Option<PositionSide>,
    /// Cross or isolated.
    pub margin_mode: Option<MarginMode>,
    /// Hedge mode (both sides held at once).
    pub hedged: Option<bool>,
    /// Size in contracts.
    pub contracts: Option<Decimal>,
    /// Contract multiplier.
    pub contract_size: Option<Decimal>,
    /// Average entry price.
    pub entry_price: Option<Decimal>,
    /// Mark price.
    pub mark_price: Option<Decimal>,
    /// Notional value.
    pub notional: Option<Decimal>,
    /// Leverage.
    pub leverage: Option<Decimal>,
    /// Posted margin.
    pub collateral: Option<Decimal>,
    /// Initial margin.
    pub initial_margin: Option<Decimal>,
    /// Maintenance margin.
    pub maintenance_margin: Option<Decimal>,
    /// Maintenance margin rate.
    pub maintenance_margin_percentage: Option<Decimal>,
    /// Unrealised profit and loss.
    pub unrealized_pnl: Option<Decimal>,
    /// Liquidation price.
    pub liquidation_price: Option<Decimal>,
    /// Margin ratio.
    pub margin_ratio: Option<Decimal>,
    /// Return on margin in percent.
    pub percentage: Option<Decimal>,
    /// Update time in milliseconds.
    pub timestamp: Option<i64>,
    /// ISO 8601 form of `timestamp`.
    pub datetime: Option<String>,
    /// Raw exchange payload.
    #[serde(default)]
    pub info: Value,
}
