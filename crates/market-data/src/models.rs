//! Shared models for market data lookups.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifies a concrete data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProviderId {
    Yahoo,
    Frankfurter,
    #[default]
    Manual,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Yahoo => "YAHOO",
            ProviderId::Frankfurter => "FRANKFURTER",
            ProviderId::Manual => "MANUAL",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observation returned by a provider.
///
/// `actual_date` is the trading day the value belongs to, which may be
/// earlier than the requested date when the market was closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderObservation {
    pub symbol: String,
    pub actual_date: NaiveDate,
    pub value: Decimal,
    pub currency: Option<String>,
    pub provider: ProviderId,
}

/// Per-provider chain configuration.
///
/// Lower `priority` is tried first. Disabled providers are skipped without
/// being counted as failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    pub id: ProviderId,
    pub priority: i32,
    pub enabled: bool,
}

impl ProviderSettings {
    pub fn new(id: ProviderId, priority: i32) -> Self {
        Self {
            id,
            priority,
            enabled: true,
        }
    }
}
