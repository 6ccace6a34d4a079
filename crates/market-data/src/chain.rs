//! Provider chain - composite provider that tries sources in priority order.
//!
//! The chain is the main entry point for external lookups. It walks the
//! configured providers from highest to lowest priority and stops at the
//! first one that returns an observation. A provider failing is logged and
//! never aborts the chain; only a fully exhausted chain is an error.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{MarketDataError, Result};
use crate::models::{ProviderId, ProviderObservation, ProviderSettings};
use crate::provider::QuoteProvider;

pub struct ProviderChain {
    /// Providers in the order they should be tried.
    ordered: Vec<Arc<dyn QuoteProvider>>,
}

impl ProviderChain {
    /// Build a chain from providers and their settings.
    ///
    /// Providers without a settings entry keep registration order behind all
    /// configured ones; disabled providers are dropped outright.
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>, settings: &[ProviderSettings]) -> Self {
        let by_id: HashMap<ProviderId, &ProviderSettings> =
            settings.iter().map(|s| (s.id, s)).collect();

        let mut keyed: Vec<(i32, usize, Arc<dyn QuoteProvider>)> = providers
            .into_iter()
            .enumerate()
            .filter_map(|(idx, p)| match by_id.get(&p.id()) {
                Some(s) if !s.enabled => None,
                Some(s) => Some((s.priority, idx, p)),
                None => Some((i32::MAX, idx, p)),
            })
            .collect();
        keyed.sort_by_key(|(priority, idx, _)| (*priority, *idx));

        Self {
            ordered: keyed.into_iter().map(|(_, _, p)| p).collect(),
        }
    }

    /// All providers enabled, registration order is priority order.
    pub fn with_default_order(providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        Self { ordered: providers }
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

#[async_trait]
impl QuoteProvider for ProviderChain {
    fn id(&self) -> ProviderId {
        // The observation carries the source that actually answered; the
        // chain itself reports its preferred provider.
        self.ordered
            .first()
            .map(|p| p.id())
            .unwrap_or(ProviderId::Manual)
    }

    async fn get_stock_price(&self, symbol: &str, date: NaiveDate) -> Result<ProviderObservation> {
        for provider in &self.ordered {
            match provider.get_stock_price(symbol, date).await {
                Ok(observation) => return Ok(observation),
                Err(e) => {
                    log::warn!(
                        "Provider {} failed for {} on {}: {}",
                        provider.id(),
                        symbol,
                        date,
                        e
                    );
                }
            }
        }

        Err(MarketDataError::AllProvidersFailed {
            symbol: symbol.to_string(),
            date,
        })
    }

    async fn get_exchange_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<ProviderObservation> {
        for provider in &self.ordered {
            match provider.get_exchange_rate(from, to, date).await {
                Ok(observation) => return Ok(observation),
                Err(e) => {
                    log::warn!(
                        "Provider {} failed for {}/{} on {}: {}",
                        provider.id(),
                        from,
                        to,
                        date,
                        e
                    );
                }
            }
        }

        Err(MarketDataError::AllProvidersFailed {
            symbol: format!("{}{}", from, to),
            date,
        })
    }

    async fn get_month_end_price(
        &self,
        symbol: &str,
        year: i32,
        month: u32,
    ) -> Result<ProviderObservation> {
        let anchor = crate::provider::last_day_of_month(year, month).ok_or_else(|| {
            MarketDataError::UnexpectedResponse {
                provider: "chain".to_string(),
                message: format!("invalid month {}-{}", year, month),
            }
        })?;

        for provider in &self.ordered {
            match provider.get_month_end_price(symbol, year, month).await {
                Ok(observation) => return Ok(observation),
                Err(e) => {
                    log::warn!(
                        "Provider {} failed for {} month-end {}-{:02}: {}",
                        provider.id(),
                        symbol,
                        year,
                        month,
                        e
                    );
                }
            }
        }

        Err(MarketDataError::AllProvidersFailed {
            symbol: symbol.to_string(),
            date: anchor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Test double that either answers with a fixed value or always fails,
    /// counting how often it was asked.
    struct StubProvider {
        id: ProviderId,
        value: Option<Decimal>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn answering(id: ProviderId, value: Decimal) -> Self {
            Self {
                id,
                value: Some(value),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(id: ProviderId) -> Self {
            Self {
                id,
                value: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn observation(&self, symbol: &str, date: NaiveDate) -> Result<ProviderObservation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.value {
                Some(value) => Ok(ProviderObservation {
                    symbol: symbol.to_string(),
                    actual_date: date,
                    value,
                    currency: None,
                    provider: self.id,
                }),
                None => Err(MarketDataError::NoData {
                    provider: self.id.to_string(),
                    symbol: symbol.to_string(),
                    date,
                }),
            }
        }
    }

    #[async_trait]
    impl QuoteProvider for StubProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn get_stock_price(
            &self,
            symbol: &str,
            date: NaiveDate,
        ) -> Result<ProviderObservation> {
            self.observation(symbol, date)
        }

        async fn get_exchange_rate(
            &self,
            from: &str,
            to: &str,
            date: NaiveDate,
        ) -> Result<ProviderObservation> {
            self.observation(&format!("{}{}", from, to), date)
        }

        async fn get_month_end_price(
            &self,
            symbol: &str,
            year: i32,
            month: u32,
        ) -> Result<ProviderObservation> {
            let date = crate::provider::last_day_of_month(year, month).unwrap();
            self.observation(symbol, date)
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_first_provider_wins() {
        let first = Arc::new(StubProvider::answering(ProviderId::Yahoo, Decimal::from(101)));
        let second = Arc::new(StubProvider::answering(
            ProviderId::Frankfurter,
            Decimal::from(999),
        ));
        let chain = ProviderChain::with_default_order(vec![first.clone(), second.clone()]);

        let obs = chain.get_stock_price("AAPL", day(2025, 3, 3)).await.unwrap();
        assert_eq!(obs.value, Decimal::from(101));
        assert_eq!(obs.provider, ProviderId::Yahoo);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_through_on_failure() {
        let first = Arc::new(StubProvider::failing(ProviderId::Yahoo));
        let second = Arc::new(StubProvider::answering(
            ProviderId::Frankfurter,
            Decimal::from(42),
        ));
        let chain = ProviderChain::with_default_order(vec![first.clone(), second.clone()]);

        let obs = chain.get_stock_price("AAPL", day(2025, 3, 3)).await.unwrap();
        assert_eq!(obs.value, Decimal::from(42));
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_chain_errors() {
        let only = Arc::new(StubProvider::failing(ProviderId::Yahoo));
        let chain = ProviderChain::with_default_order(vec![only]);

        let err = chain
            .get_stock_price("AAPL", day(2025, 3, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketDataError::AllProvidersFailed { .. }));
    }

    #[tokio::test]
    async fn test_settings_reorder_and_disable() {
        let yahoo = Arc::new(StubProvider::answering(ProviderId::Yahoo, Decimal::ONE));
        let frankfurter = Arc::new(StubProvider::answering(
            ProviderId::Frankfurter,
            Decimal::TWO,
        ));

        let settings = vec![
            ProviderSettings {
                id: ProviderId::Yahoo,
                priority: 2,
                enabled: true,
            },
            ProviderSettings {
                id: ProviderId::Frankfurter,
                priority: 1,
                enabled: true,
            },
        ];
        let chain = ProviderChain::new(vec![yahoo.clone(), frankfurter.clone()], &settings);
        let obs = chain
            .get_exchange_rate("EUR", "USD", day(2025, 3, 3))
            .await
            .unwrap();
        assert_eq!(obs.provider, ProviderId::Frankfurter);

        let disabled = vec![
            ProviderSettings {
                id: ProviderId::Frankfurter,
                priority: 1,
                enabled: false,
            },
            ProviderSettings {
                id: ProviderId::Yahoo,
                priority: 2,
                enabled: true,
            },
        ];
        let chain = ProviderChain::new(vec![yahoo, frankfurter], &disabled);
        let obs = chain
            .get_exchange_rate("EUR", "USD", day(2025, 3, 3))
            .await
            .unwrap();
        assert_eq!(obs.provider, ProviderId::Yahoo);
    }

    #[tokio::test]
    async fn test_month_end_falls_through_too() {
        let first = Arc::new(StubProvider::failing(ProviderId::Yahoo));
        let second = Arc::new(StubProvider::answering(
            ProviderId::Frankfurter,
            Decimal::from(77),
        ));
        let chain = ProviderChain::with_default_order(vec![first, second]);

        let obs = chain.get_month_end_price("^GSPC", 2024, 2).await.unwrap();
        assert_eq!(obs.value, Decimal::from(77));
        assert_eq!(obs.actual_date, day(2024, 2, 29));
    }
}
