use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the price/FX resolution layer.
///
/// `NotAvailable` is the partial-data signal: callers collect it into a
/// missing-items list instead of failing the surrounding calculation.
#[derive(Error, Debug)]
pub enum PricingError {
    #[error("No value available for {symbol} on {date}")]
    NotAvailable { symbol: String, date: NaiveDate },

    #[error("Invalid currency code: {0}")]
    InvalidCurrencyCode(String),

    #[error("Invalid manual value: {0}")]
    InvalidManualValue(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}
