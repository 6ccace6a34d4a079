//! Yahoo Finance provider.
//!
//! Uses the public chart API. Historical lookups request a short window
//! ending on the requested date and keep the last close inside it, which
//! yields the nearest trading-day value when the requested date falls on a
//! weekend or holiday.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::errors::{MarketDataError, Result};
use crate::models::{ProviderId, ProviderObservation};
use crate::provider::{last_day_of_month, QuoteProvider};

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Days of lookback when asking for a single date. Covers long weekends and
/// market holidays.
const LOOKBACK_DAYS: i64 = 7;

pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MarketDataError::Network {
                provider: ProviderId::Yahoo.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }

    /// Fetch the last available close for `symbol` in `(start, end]`.
    async fn fetch_close_in_window(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ProviderObservation> {
        let period1 = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        let period2 = end
            .and_hms_opt(23, 59, 59)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);

        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d",
            BASE_URL,
            urlencode(symbol),
            period1,
            period2
        );
        log::debug!("Fetching Yahoo window for {}: {}", symbol, url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(MarketDataError::RateLimited {
                provider: ProviderId::Yahoo.to_string(),
            });
        }
        if !status.is_success() {
            return Err(MarketDataError::Network {
                provider: ProviderId::Yahoo.to_string(),
                message: format!("HTTP {} for {}", status, symbol),
            });
        }

        let data: serde_json::Value = response.json().await?;

        if let Some(error) = data
            .get("chart")
            .and_then(|c| c.get("error"))
            .filter(|e| !e.is_null())
        {
            return Err(MarketDataError::UnexpectedResponse {
                provider: ProviderId::Yahoo.to_string(),
                message: error.to_string(),
            });
        }

        let result = data
            .get("chart")
            .and_then(|c| c.get("result"))
            .and_then(|r| r.get(0))
            .ok_or_else(|| MarketDataError::UnexpectedResponse {
                provider: ProviderId::Yahoo.to_string(),
                message: format!("missing chart.result for {}", symbol),
            })?;

        let currency = result
            .get("meta")
            .and_then(|m| m.get("currency"))
            .and_then(|c| c.as_str())
            .map(str::to_string);

        let timestamps: Vec<i64> = result
            .get("timestamp")
            .and_then(|t| t.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_i64()).collect())
            .unwrap_or_default();

        let closes: Vec<Option<f64>> = result
            .get("indicators")
            .and_then(|i| i.get("quote"))
            .and_then(|q| q.get(0))
            .and_then(|q| q.get("close"))
            .and_then(|c| c.as_array())
            .map(|arr| arr.iter().map(|v| v.as_f64()).collect())
            .unwrap_or_default();

        // Walk backwards: the last non-null close on or before `end` wins.
        for (ts, close) in timestamps.iter().zip(closes.iter()).rev() {
            let date = chrono::DateTime::from_timestamp(*ts, 0)
                .map(|dt| dt.date_naive())
                .filter(|d| *d <= end);
            if let (Some(date), Some(close)) = (date, close) {
                let value =
                    Decimal::from_f64(*close).ok_or_else(|| MarketDataError::UnexpectedResponse {
                        provider: ProviderId::Yahoo.to_string(),
                        message: format!("unrepresentable close {} for {}", close, symbol),
                    })?;
                return Ok(ProviderObservation {
                    symbol: symbol.to_string(),
                    actual_date: date,
                    value,
                    currency,
                    provider: ProviderId::Yahoo,
                });
            }
        }

        Err(MarketDataError::NoData {
            provider: ProviderId::Yahoo.to_string(),
            symbol: symbol.to_string(),
            date: end,
        })
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    async fn get_stock_price(&self, symbol: &str, date: NaiveDate) -> Result<ProviderObservation> {
        let start = date - Duration::days(LOOKBACK_DAYS);
        self.fetch_close_in_window(symbol, start, date).await
    }

    async fn get_exchange_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<ProviderObservation> {
        let symbol = format!("{}{}=X", from, to);
        let start = date - Duration::days(LOOKBACK_DAYS);
        self.fetch_close_in_window(&symbol, start, date).await
    }

    async fn get_month_end_price(
        &self,
        symbol: &str,
        year: i32,
        month: u32,
    ) -> Result<ProviderObservation> {
        let end = last_day_of_month(year, month).ok_or_else(|| {
            MarketDataError::UnexpectedResponse {
                provider: ProviderId::Yahoo.to_string(),
                message: format!("invalid month {}-{}", year, month),
            }
        })?;
        let start = end - Duration::days(LOOKBACK_DAYS);
        self.fetch_close_in_window(symbol, start, end).await
    }
}

fn urlencode(symbol: &str) -> String {
    // Yahoo symbols only need '^' (indices) and '=' (FX) escaped.
    symbol.replace('^', "%5E").replace('=', "%3D")
}
