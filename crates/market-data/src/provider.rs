//! The provider contract.
//!
//! Each provider answers point-in-time questions with the nearest trading-day
//! observation on or before the requested date. Cancellation follows the
//! usual async contract: dropping the returned future abandons the request,
//! and nothing observable happens on the caller's side.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::Result;
use crate::models::{ProviderId, ProviderObservation};

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Closing price for a security on the nearest trading day on/before `date`.
    async fn get_stock_price(&self, symbol: &str, date: NaiveDate) -> Result<ProviderObservation>;

    /// Exchange rate `from` -> `to` on the nearest business day on/before `date`.
    async fn get_exchange_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<ProviderObservation>;

    /// Closing price on the last trading day of the given month.
    async fn get_month_end_price(
        &self,
        symbol: &str,
        year: i32,
        month: u32,
    ) -> Result<ProviderObservation>;
}

/// Last calendar day of a month, used to anchor month-end lookups.
pub(crate) fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).map(|d| d.pred_opt().unwrap_or(d))
}
