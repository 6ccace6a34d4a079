use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use folioperf_core::pricing::PricingService;
use folioperf_core::snapshots::MemorySnapshotStore;
use folioperf_market_data::{
    MarketDataError, ProviderId, ProviderObservation, QuoteProvider, Result as ProviderResult,
};

/// Provider backed by a fixed price table, counting external calls so tests
/// can assert on cache behavior.
pub struct TableProvider {
    prices: HashMap<(String, NaiveDate), Decimal>,
    calls: AtomicUsize,
}

impl TableProvider {
    pub fn new(prices: &[(&str, NaiveDate, Decimal)]) -> Self {
        Self {
            prices: prices
                .iter()
                .map(|(s, d, v)| ((s.to_string(), *d), *v))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, symbol: &str, date: NaiveDate) -> ProviderResult<ProviderObservation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.prices.get(&(symbol.to_string(), date)) {
            Some(value) => Ok(ProviderObservation {
                symbol: symbol.to_string(),
                actual_date: date,
                value: *value,
                currency: Some("USD".to_string()),
                provider: ProviderId::Yahoo,
            }),
            None => Err(MarketDataError::AllProvidersFailed {
                symbol: symbol.to_string(),
                date,
            }),
        }
    }
}

#[async_trait]
impl QuoteProvider for TableProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    async fn get_stock_price(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> ProviderResult<ProviderObservation> {
        self.lookup(symbol, date)
    }

    async fn get_exchange_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> ProviderResult<ProviderObservation> {
        self.lookup(&format!("{}{}", from, to), date)
    }

    async fn get_month_end_price(
        &self,
        symbol: &str,
        year: i32,
        month: u32,
    ) -> ProviderResult<ProviderObservation> {
        let date = NaiveDate::from_ymd_opt(year, month, 28).ok_or_else(|| {
            MarketDataError::NoData {
                provider: "table".to_string(),
                symbol: symbol.to_string(),
                date: NaiveDate::MIN,
            }
        })?;
        self.lookup(symbol, date)
    }
}

pub fn pricing_with(provider: Arc<TableProvider>) -> Arc<PricingService> {
    Arc::new(PricingService::new(
        Arc::new(MemorySnapshotStore::new()),
        provider,
    ))
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
