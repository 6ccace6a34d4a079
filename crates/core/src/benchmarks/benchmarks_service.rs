//! Calendar-year benchmark returns from year-end closing prices.
//!
//! Endpoint prices come from the snapshot cache first. A miss is fetched
//! lazily (and cached, positively or negatively) only when the endpoint's
//! year has fully elapsed; for the running year the cache is all there is,
//! so manual values show up but nothing goes external.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::PERCENT_PRECISION;
use crate::errors::{Error, Result};
use crate::pricing::{PricingError, PricingService};
use crate::splits::{cumulative_ratio_between, SplitRepositoryTrait, StockSplit};

use super::benchmarks_model::{BenchmarkReturnsResponse, BenchmarkSelection};
use super::benchmarks_traits::BenchmarkRepositoryTrait;

pub struct BenchmarkService {
    pricing: Arc<PricingService>,
    benchmarks: Arc<dyn BenchmarkRepositoryTrait>,
    splits: Arc<dyn SplitRepositoryTrait>,
}

impl BenchmarkService {
    pub fn new(
        pricing: Arc<PricingService>,
        benchmarks: Arc<dyn BenchmarkRepositoryTrait>,
        splits: Arc<dyn SplitRepositoryTrait>,
    ) -> Self {
        Self {
            pricing,
            benchmarks,
            splits,
        }
    }

    /// Year returns for the requested benchmark keys.
    ///
    /// Keys with no configured selection report `None` without touching the
    /// availability flags.
    pub async fn compute_for_year(
        &self,
        user_id: &str,
        year: i32,
        keys: &[String],
        as_of: NaiveDate,
    ) -> Result<BenchmarkReturnsResponse> {
        let start_date = year_end_date(year - 1)?;
        let end_date = year_end_date(year)?;

        let configured = self.benchmarks.get_benchmark_selections(user_id)?;
        let selected: Vec<&BenchmarkSelection> = keys
            .iter()
            .filter_map(|key| configured.iter().find(|s| &s.key == key))
            .collect();

        let all_splits = if selected.iter().any(|s| s.has_splits) {
            self.splits.get_all_splits()?
        } else {
            Vec::new()
        };

        let mut returns: HashMap<String, Option<Decimal>> = HashMap::new();
        let mut has_start_prices = true;
        let mut has_end_prices = true;

        for key in keys {
            if !selected.iter().any(|s| &s.key == key) {
                log::warn!("no benchmark configured for key {}", key);
                returns.insert(key.clone(), None);
            }
        }

        for selection in selected {
            let start = self
                .endpoint_price(&selection.symbol, start_date, as_of)
                .await?;
            let end = self
                .endpoint_price(&selection.symbol, end_date, as_of)
                .await?;
            has_start_prices &= start.is_some();
            has_end_prices &= end.is_some();

            let year_return = match (start, end) {
                (Some(start_price), Some(end_price)) => self.year_return(
                    selection,
                    start_price,
                    end_price,
                    start_date,
                    end_date,
                    &all_splits,
                ),
                _ => None,
            };
            returns.insert(selection.key.clone(), year_return);
        }

        Ok(BenchmarkReturnsResponse {
            year,
            returns,
            has_start_prices,
            has_end_prices,
        })
    }

    /// `None` when the adjusted start price is not positive: provider
    /// observations are not validated the way manual values are, and a
    /// ratio against a zero base is meaningless.
    fn year_return(
        &self,
        selection: &BenchmarkSelection,
        start_price: Decimal,
        end_price: Decimal,
        start_date: NaiveDate,
        end_date: NaiveDate,
        all_splits: &[StockSplit],
    ) -> Option<Decimal> {
        let adjusted_start = if selection.has_splits {
            let ratio = cumulative_ratio_between(
                &selection.symbol,
                &selection.market,
                start_date,
                end_date,
                all_splits,
            );
            start_price / ratio
        } else {
            start_price
        };
        if adjusted_start <= Decimal::ZERO {
            log::warn!(
                "non-positive start price {} for benchmark {}",
                adjusted_start,
                selection.key
            );
            return None;
        }
        Some(
            ((end_price / adjusted_start - Decimal::ONE) * Decimal::ONE_HUNDRED)
                .round_dp(PERCENT_PRECISION),
        )
    }

    /// Year-end closing price, or `None` when unavailable. Only elapsed
    /// dates may trigger an external fetch.
    async fn endpoint_price(
        &self,
        symbol: &str,
        date: NaiveDate,
        as_of: NaiveDate,
    ) -> Result<Option<Decimal>> {
        if date >= as_of {
            return Ok(self
                .pricing
                .get_cached_price(symbol, date)?
                .map(|resolved| resolved.value));
        }
        match self.pricing.get_or_fetch_price(symbol, date).await {
            Ok(resolved) => Ok(Some(resolved.value)),
            Err(Error::Pricing(PricingError::NotAvailable { .. })) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn year_end_date(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(|| {
        Error::Validation(crate::errors::ValidationError::InvalidInput(format!(
            "year {} out of range",
            year
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshots::MemorySnapshotStore;
    use crate::splits::StockSplit;
    use async_trait::async_trait;
    use folioperf_market_data::{
        MarketDataError, ProviderId, ProviderObservation, QuoteProvider, Result as ProviderResult,
    };
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers from a fixed price table, counting external calls.
    struct TableProvider {
        prices: HashMap<(String, NaiveDate), Decimal>,
        calls: AtomicUsize,
    }

    impl TableProvider {
        fn new(prices: &[(&str, NaiveDate, Decimal)]) -> Self {
            Self {
                prices: prices
                    .iter()
                    .map(|(s, d, v)| ((s.to_string(), *d), *v))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }

        fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
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

        async fn get_exchange_rate(
            &self,
            from: &str,
            to: &str,
            date: NaiveDate,
        ) -> ProviderResult<ProviderObservation> {
            Err(MarketDataError::AllProvidersFailed {
                symbol: format!("{}{}", from, to),
                date,
            })
        }

        async fn get_month_end_price(
            &self,
            symbol: &str,
            year: i32,
            _month: u32,
        ) -> ProviderResult<ProviderObservation> {
            Err(MarketDataError::AllProvidersFailed {
                symbol: symbol.to_string(),
                date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            })
        }
    }

    struct FixedBenchmarks(Vec<BenchmarkSelection>);

    impl BenchmarkRepositoryTrait for FixedBenchmarks {
        fn get_benchmark_selections(&self, _user_id: &str) -> Result<Vec<BenchmarkSelection>> {
            Ok(self.0.clone())
        }
    }

    struct FixedSplits(Vec<StockSplit>);

    impl SplitRepositoryTrait for FixedSplits {
        fn get_all_splits(&self) -> Result<Vec<StockSplit>> {
            Ok(self.0.clone())
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sp500() -> BenchmarkSelection {
        BenchmarkSelection {
            key: "sp500".to_string(),
            symbol: "^GSPC".to_string(),
            market: "INDEX".to_string(),
            has_splits: false,
        }
    }

    fn service(
        provider: Arc<TableProvider>,
        selections: Vec<BenchmarkSelection>,
        splits: Vec<StockSplit>,
    ) -> BenchmarkService {
        BenchmarkService::new(
            Arc::new(PricingService::new(
                Arc::new(MemorySnapshotStore::new()),
                provider,
            )),
            Arc::new(FixedBenchmarks(selections)),
            Arc::new(FixedSplits(splits)),
        )
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_elapsed_year_fetches_and_computes() {
        let provider = Arc::new(TableProvider::new(&[
            ("^GSPC", day(2023, 12, 31), dec!(4769.83)),
            ("^GSPC", day(2024, 12, 31), dec!(5881.63)),
        ]));
        let service = service(provider.clone(), vec![sp500()], vec![]);

        let response = service
            .compute_for_year("u1", 2024, &keys(&["sp500"]), day(2025, 6, 1))
            .await
            .unwrap();

        assert!(response.has_start_prices);
        assert!(response.has_end_prices);
        // 5881.63 / 4769.83 - 1 = 23.31%
        assert_eq!(response.returns["sp500"], Some(dec!(23.31)));
        assert_eq!(provider.count(), 2);
    }

    #[tokio::test]
    async fn test_running_year_stays_on_cache() {
        let provider = Arc::new(TableProvider::new(&[
            ("^GSPC", day(2024, 12, 31), dec!(5881.63)),
        ]));
        let service = service(provider.clone(), vec![sp500()], vec![]);

        let response = service
            .compute_for_year("u1", 2025, &keys(&["sp500"]), day(2025, 6, 1))
            .await
            .unwrap();

        // Start endpoint (elapsed) was fetched; the running year's end was
        // not asked for externally.
        assert_eq!(provider.count(), 1);
        assert!(response.has_start_prices);
        assert!(!response.has_end_prices);
        assert_eq!(response.returns["sp500"], None);
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_none_not_zero() {
        let provider = Arc::new(TableProvider::new(&[(
            "^GSPC",
            day(2024, 12, 31),
            dec!(5881.63),
        )]));
        let service = service(provider.clone(), vec![sp500()], vec![]);

        let response = service
            .compute_for_year("u1", 2024, &keys(&["sp500"]), day(2025, 6, 1))
            .await
            .unwrap();

        assert!(!response.has_start_prices);
        assert!(response.has_end_prices);
        assert_eq!(response.returns["sp500"], None);
    }

    #[tokio::test]
    async fn test_split_adjusts_start_price() {
        // 4:1 split during the year; raw prices would show a huge loss.
        let selection = BenchmarkSelection {
            key: "acme".to_string(),
            symbol: "ACME".to_string(),
            market: "XNAS".to_string(),
            has_splits: true,
        };
        let provider = Arc::new(TableProvider::new(&[
            ("ACME", day(2023, 12, 31), dec!(400)),
            ("ACME", day(2024, 12, 31), dec!(120)),
        ]));
        let splits = vec![StockSplit::new("ACME", "XNAS", day(2024, 6, 10), dec!(4)).unwrap()];
        let service = service(provider, vec![selection], splits);

        let response = service
            .compute_for_year("u1", 2024, &keys(&["acme"]), day(2025, 6, 1))
            .await
            .unwrap();

        // Adjusted start 400 / 4 = 100; 120 / 100 - 1 = 20%.
        assert_eq!(response.returns["acme"], Some(dec!(20.00)));
    }

    #[tokio::test]
    async fn test_zero_start_price_is_none() {
        // A provider serving a zero close must not blow up the ratio.
        let provider = Arc::new(TableProvider::new(&[
            ("^GSPC", day(2023, 12, 31), dec!(0)),
            ("^GSPC", day(2024, 12, 31), dec!(5881.63)),
        ]));
        let service = service(provider, vec![sp500()], vec![]);

        let response = service
            .compute_for_year("u1", 2024, &keys(&["sp500"]), day(2025, 6, 1))
            .await
            .unwrap();

        // Both endpoints resolved, but the return is undefined.
        assert!(response.has_start_prices);
        assert!(response.has_end_prices);
        assert_eq!(response.returns["sp500"], None);
    }

    #[tokio::test]
    async fn test_unknown_key_reports_none() {
        let provider = Arc::new(TableProvider::new(&[
            ("^GSPC", day(2023, 12, 31), dec!(4769.83)),
            ("^GSPC", day(2024, 12, 31), dec!(5881.63)),
        ]));
        let service = service(provider, vec![sp500()], vec![]);

        let response = service
            .compute_for_year("u1", 2024, &keys(&["sp500", "nope"]), day(2025, 6, 1))
            .await
            .unwrap();

        assert_eq!(response.returns["nope"], None);
        assert!(response.returns["sp500"].is_some());
        // Unconfigured keys do not poison the availability flags.
        assert!(response.has_start_prices);
        assert!(response.has_end_prices);
    }

    #[tokio::test]
    async fn test_second_computation_hits_cache() {
        let provider = Arc::new(TableProvider::new(&[
            ("^GSPC", day(2023, 12, 31), dec!(4769.83)),
            ("^GSPC", day(2024, 12, 31), dec!(5881.63)),
        ]));
        let service = service(provider.clone(), vec![sp500()], vec![]);

        let first = service
            .compute_for_year("u1", 2024, &keys(&["sp500"]), day(2025, 6, 1))
            .await
            .unwrap();
        let second = service
            .compute_for_year("u1", 2024, &keys(&["sp500"]), day(2025, 6, 1))
            .await
            .unwrap();

        assert_eq!(first.returns, second.returns);
        assert_eq!(provider.count(), 2, "snapshots must be reused");
    }
}
