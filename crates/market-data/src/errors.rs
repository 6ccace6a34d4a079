//! Error types for market data providers.
//!
//! Provider errors are never fatal for a whole batch: the chain logs them
//! and moves on to the next provider, and the caller converts a fully
//! exhausted chain into a negative cache entry.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MarketDataError>;

#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider's HTTP endpoint could not be reached or returned a
    /// transport-level failure.
    #[error("Network error from provider {provider}: {message}")]
    Network { provider: String, message: String },

    /// The provider answered but the payload could not be parsed.
    #[error("Unexpected response from provider {provider}: {message}")]
    UnexpectedResponse { provider: String, message: String },

    /// The provider has no observation on or before the requested date.
    #[error("No data from provider {provider} for {symbol} on or before {date}")]
    NoData {
        provider: String,
        symbol: String,
        date: chrono::NaiveDate,
    },

    /// The provider rejected the request because of rate limiting.
    #[error("Provider {provider} is rate limited")]
    RateLimited { provider: String },

    /// The provider does not cover the requested kind of instrument.
    #[error("Provider {provider} does not support {symbol}")]
    Unsupported { provider: String, symbol: String },

    /// Every provider in the chain was tried and failed.
    #[error("All providers failed for {symbol} on {date}")]
    AllProvidersFailed {
        symbol: String,
        date: chrono::NaiveDate,
    },
}

impl MarketDataError {
    /// Whether a later retry against the same provider could succeed.
    /// `NoData` and `Unsupported` are definitive answers, not failures.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MarketDataError::Network { .. } | MarketDataError::RateLimited { .. }
        )
    }
}

impl From<reqwest::Error> for MarketDataError {
    fn from(err: reqwest::Error) -> Self {
        let provider = err
            .url()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        MarketDataError::Network {
            provider,
            message: err.to_string(),
        }
    }
}
