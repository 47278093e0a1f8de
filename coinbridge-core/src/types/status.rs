//! Exchange availability.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operational state reported by `fetch_status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// Fully operational.
    #[default]
    Ok,
    /// Under maintenance.
    Maintenance,
}

/// Result of `fetch_status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeStatus {
    /// Current state.
    pub status: StatusKind,
    /// Time of the last status change, when known.
    pub updated: Option<i64>,
    /// Expected end of an outage.
    pub eta: Option<i64>,
    /// Status page.
    pub url: Option<String>,
    /// Raw exchange payload.
    #[serde(default)]
    pub info: Value,
}
