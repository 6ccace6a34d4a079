//! Core error types for the performance engine.
//!
//! Three classes of failure are kept apart on purpose: input validation is
//! rejected synchronously and never persisted; missing market data is not an
//! error at all (it is collected as [`crate::cashflow::MissingDataPoint`]s
//! and surfaced through `is_complete`); provider failures are caught at the
//! pricing layer and turned into negative cache entries.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;

use crate::pricing::PricingError;
use folioperf_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Calculation failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

/// Errors that occur during return calculations.
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Invalid transaction data: {0}")]
    InvalidTransaction(String),

    #[error("Invalid period: start {start} is after end {end}")]
    InvalidPeriod {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Calculation failed: {0}")]
    Calculation(String),
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
