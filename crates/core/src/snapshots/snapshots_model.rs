use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use folioperf_market_data::{ProviderId, ProviderObservation};

/// A cached historical price or exchange-rate observation.
///
/// Snapshots are append-only: once written for a (symbol, date) bucket they
/// are never silently replaced by a later automatic fetch. A snapshot with
/// `not_available = true` is a negative cache entry recording that every
/// provider was tried and failed, so repeat requests short-circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    /// Provider-resolvable symbol: "AAPL", "^GSPC", or an FX pair "EURUSD".
    pub symbol: String,
    /// The date the caller asked about (the cache bucket).
    pub date: NaiveDate,
    pub value: Option<Decimal>,
    /// Trading day the value actually belongs to; on/before `date`.
    pub actual_date: Option<NaiveDate>,
    pub currency: Option<String>,
    pub source: ProviderId,
    pub not_available: bool,
    pub fetched_at: DateTime<Utc>,
}

impl PriceSnapshot {
    /// `symbol` is the cache key, which may differ from the provider's own
    /// notation (an FX pair is cached as "EURUSD" whatever the source
    /// called it).
    pub fn from_observation(
        symbol: impl Into<String>,
        requested_date: NaiveDate,
        obs: &ProviderObservation,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date: requested_date,
            value: Some(obs.value),
            actual_date: Some(obs.actual_date),
            currency: obs.currency.clone(),
            source: obs.provider,
            not_available: false,
            fetched_at: Utc::now(),
        }
    }

    pub fn unavailable(symbol: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            value: None,
            actual_date: None,
            currency: None,
            source: ProviderId::default(),
            not_available: true,
            fetched_at: Utc::now(),
        }
    }

    pub fn manual(
        symbol: impl Into<String>,
        date: NaiveDate,
        value: Decimal,
        currency: Option<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            value: Some(value),
            actual_date: Some(date),
            currency,
            source: ProviderId::Manual,
            not_available: false,
            fetched_at: Utc::now(),
        }
    }
}

/// Symbol under which an FX pair is cached.
pub fn fx_symbol(from: &str, to: &str) -> String {
    format!("{}{}", from, to)
}
