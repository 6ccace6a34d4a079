//! Layered resolution of historical prices and exchange rates.
//!
//! Resolution order for a (symbol, date) request:
//! 1. exact-date snapshot cache (a negative marker short-circuits);
//! 2. for Dec-31 of a completed calendar year, the shared year-end bucket;
//! 3. cache re-check, then the external provider chain (nearest trading day
//!    on/before the date);
//! 4. persist a positive snapshot on success or a negative marker on total
//!    chain failure.
//!
//! Writes go through `SnapshotStore::try_insert`, so concurrent callers for
//! the same key converge on whichever snapshot landed first; the external
//! fact is idempotent, which makes the occasional duplicate fetch harmless.
//! Dropping the future of an in-flight call abandons it before anything is
//! persisted.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::errors::Result;
use crate::snapshots::{fx_symbol, PriceSnapshot, SnapshotStore};
use folioperf_market_data::{ProviderId, QuoteProvider};

use super::pricing_errors::PricingError;

/// A successfully resolved value with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedValue {
    pub value: Decimal,
    /// Trading day the value belongs to; on/before the requested date.
    pub actual_date: NaiveDate,
    pub currency: Option<String>,
    pub source: ProviderId,
}

impl ResolvedValue {
    fn from_snapshot(snapshot: &PriceSnapshot) -> Option<Self> {
        snapshot.value.map(|value| Self {
            value,
            actual_date: snapshot.actual_date.unwrap_or(snapshot.date),
            currency: snapshot.currency.clone(),
            source: snapshot.source,
        })
    }
}

pub struct PricingService {
    store: Arc<dyn SnapshotStore>,
    providers: Arc<dyn QuoteProvider>,
}

enum Lookup<'a> {
    Price { symbol: &'a str },
    Rate { from: &'a str, to: &'a str },
}

impl Lookup<'_> {
    fn cache_symbol(&self) -> String {
        match self {
            Lookup::Price { symbol } => symbol.to_string(),
            Lookup::Rate { from, to } => fx_symbol(from, to),
        }
    }
}

impl PricingService {
    pub fn new(store: Arc<dyn SnapshotStore>, providers: Arc<dyn QuoteProvider>) -> Self {
        Self { store, providers }
    }

    /// Historical closing price for a security symbol.
    pub async fn get_or_fetch_price(&self, symbol: &str, date: NaiveDate) -> Result<ResolvedValue> {
        self.resolve(Lookup::Price { symbol }, date).await
    }

    /// Historical exchange rate for a currency pair. A same-currency pair
    /// resolves to 1 without touching the cache or any provider.
    pub async fn get_or_fetch_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<ResolvedValue> {
        validate_currency_code(from)?;
        validate_currency_code(to)?;

        if from == to {
            return Ok(ResolvedValue {
                value: Decimal::ONE,
                actual_date: date,
                currency: Some(to.to_string()),
                source: ProviderId::Manual,
            });
        }

        self.resolve(Lookup::Rate { from, to }, date).await
    }

    /// Cache-only price lookup; never goes external. A negative marker
    /// counts as absent here, since there is nothing usable either way.
    pub fn get_cached_price(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<ResolvedValue>> {
        match self.check_cache(symbol, date)? {
            Some(Ok(resolved)) => Ok(Some(resolved)),
            _ => Ok(None),
        }
    }

    /// Persist a user-supplied price as the authoritative snapshot for
    /// (symbol, date). Replaces an existing snapshot, including a negative
    /// marker.
    pub async fn set_manual_price(
        &self,
        symbol: &str,
        date: NaiveDate,
        value: Decimal,
    ) -> Result<PriceSnapshot> {
        validate_manual_value(value)?;
        self.store
            .put_override(PriceSnapshot::manual(symbol, date, value, None))
            .await
    }

    /// Persist a user-supplied exchange rate as the authoritative snapshot.
    pub async fn set_manual_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
        value: Decimal,
    ) -> Result<PriceSnapshot> {
        validate_currency_code(from)?;
        validate_currency_code(to)?;
        validate_manual_value(value)?;
        self.store
            .put_override(PriceSnapshot::manual(
                fx_symbol(from, to),
                date,
                value,
                Some(to.to_string()),
            ))
            .await
    }

    async fn resolve(&self, lookup: Lookup<'_>, date: NaiveDate) -> Result<ResolvedValue> {
        let symbol = lookup.cache_symbol();

        if let Some(resolved) = self.check_cache(&symbol, date)? {
            return resolved;
        }

        // Shared year-end bucket for completed calendar years.
        if is_completed_year_end(date) {
            if let Some(snapshot) = self.store.get_year_end(&symbol, date.year())? {
                if let Some(resolved) = snapshot_to_result(&symbol, date, &snapshot) {
                    return resolved;
                }
            }
        }

        // Re-check before going external: another task may have finished a
        // fetch for the same key in the meantime. Best effort, not a lock.
        if let Some(resolved) = self.check_cache(&symbol, date)? {
            return resolved;
        }

        let fetched = match &lookup {
            Lookup::Price { symbol } => self.providers.get_stock_price(symbol, date).await,
            Lookup::Rate { from, to } => self.providers.get_exchange_rate(from, to, date).await,
        };

        match fetched {
            Ok(observation) => {
                let stored = self
                    .store
                    .try_insert(PriceSnapshot::from_observation(symbol.as_str(), date, &observation))
                    .await?;
                match ResolvedValue::from_snapshot(&stored) {
                    Some(resolved) => Ok(resolved),
                    // Lost the race against a negative marker; report what
                    // the cache now says rather than our own fetch.
                    None => Err(PricingError::NotAvailable { symbol, date }.into()),
                }
            }
            Err(e) => {
                log::warn!("All providers failed for {} on {}: {}", symbol, date, e);
                self.store
                    .try_insert(PriceSnapshot::unavailable(&symbol, date))
                    .await?;
                Err(PricingError::NotAvailable { symbol, date }.into())
            }
        }
    }

    fn check_cache(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<Result<ResolvedValue>>> {
        match self.store.get(symbol, date)? {
            Some(snapshot) => Ok(snapshot_to_result(symbol, date, &snapshot)),
            None => Ok(None),
        }
    }
}

fn snapshot_to_result(
    symbol: &str,
    date: NaiveDate,
    snapshot: &PriceSnapshot,
) -> Option<Result<ResolvedValue>> {
    if snapshot.not_available {
        return Some(Err(PricingError::NotAvailable {
            symbol: symbol.to_string(),
            date,
        }
        .into()));
    }
    ResolvedValue::from_snapshot(snapshot).map(Ok)
}

fn validate_currency_code(code: &str) -> std::result::Result<(), PricingError> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(PricingError::InvalidCurrencyCode(code.to_string()));
    }
    Ok(())
}

fn validate_manual_value(value: Decimal) -> std::result::Result<(), PricingError> {
    if value <= Decimal::ZERO {
        return Err(PricingError::InvalidManualValue(format!(
            "must be positive, got {}",
            value
        )));
    }
    Ok(())
}

/// Dec-31 of a calendar year that has fully elapsed.
fn is_completed_year_end(date: NaiveDate) -> bool {
    date.month() == 12 && date.day() == 31 && date < Utc::now().date_naive()
}
