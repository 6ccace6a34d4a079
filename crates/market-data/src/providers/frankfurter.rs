//! Frankfurter provider for ECB reference exchange rates.
//!
//! `GET /{date}?from=EUR&to=USD` answers with the rate for the nearest
//! business day on or before the requested date, so the nearest-trading-day
//! contract comes for free. The service only covers currency pairs; stock
//! and month-end price lookups are reported as unsupported so the chain
//! moves on.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use crate::errors::{MarketDataError, Result};
use crate::models::{ProviderId, ProviderObservation};
use crate::provider::QuoteProvider;

const BASE_URL: &str = "https://api.frankfurter.app";

pub struct FrankfurterProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct FrankfurterResponse {
    date: NaiveDate,
    rates: HashMap<String, Decimal>,
}

impl FrankfurterProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the provider at a different endpoint (tests, self-hosted mirror).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn unsupported(&self, symbol: &str) -> MarketDataError {
        MarketDataError::Unsupported {
            provider: ProviderId::Frankfurter.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

#[async_trait]
impl QuoteProvider for FrankfurterProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Frankfurter
    }

    async fn get_stock_price(&self, symbol: &str, _date: NaiveDate) -> Result<ProviderObservation> {
        Err(self.unsupported(symbol))
    }

    async fn get_exchange_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<ProviderObservation> {
        let url = format!("{}/{}?from={}&to={}", self.base_url, date, from, to);
        log::debug!("Fetching Frankfurter rate {}/{}: {}", from, to, url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(MarketDataError::RateLimited {
                provider: ProviderId::Frankfurter.to_string(),
            });
        }
        if status.as_u16() == 404 {
            return Err(MarketDataError::NoData {
                provider: ProviderId::Frankfurter.to_string(),
                symbol: format!("{}{}", from, to),
                date,
            });
        }
        if !status.is_success() {
            return Err(MarketDataError::Network {
                provider: ProviderId::Frankfurter.to_string(),
                message: format!("HTTP {} for {}/{}", status, from, to),
            });
        }

        let body: FrankfurterResponse =
            response
                .json()
                .await
                .map_err(|e| MarketDataError::UnexpectedResponse {
                    provider: ProviderId::Frankfurter.to_string(),
                    message: e.to_string(),
                })?;

        let rate = body
            .rates
            .get(to)
            .copied()
            .ok_or_else(|| MarketDataError::NoData {
                provider: ProviderId::Frankfurter.to_string(),
                symbol: format!("{}{}", from, to),
                date,
            })?;

        Ok(ProviderObservation {
            symbol: format!("{}{}", from, to),
            actual_date: body.date,
            value: rate,
            currency: Some(to.to_string()),
            provider: ProviderId::Frankfurter,
        })
    }

    async fn get_month_end_price(
        &self,
        symbol: &str,
        _year: i32,
        _month: u32,
    ) -> Result<ProviderObservation> {
        Err(self.unsupported(symbol))
    }
}
