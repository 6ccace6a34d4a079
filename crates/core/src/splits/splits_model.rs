use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// A stock split shared globally across users.
///
/// Unique per (ticker, market, effective_date). A 2-for-1 split has
/// `ratio = 2`; a 1-for-10 reverse split has `ratio = 0.1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSplit {
    pub ticker: String,
    pub market: String,
    pub effective_date: NaiveDate,
    pub ratio: Decimal,
}

impl StockSplit {
    pub fn new(
        ticker: impl Into<String>,
        market: impl Into<String>,
        effective_date: NaiveDate,
        ratio: Decimal,
    ) -> Result<Self> {
        if ratio <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Split ratio must be positive, got {}",
                ratio
            ))
            .into());
        }
        Ok(Self {
            ticker: ticker.into(),
            market: market.into(),
            effective_date,
            ratio,
        })
    }
}

/// Result of replaying splits onto a historical trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitAdjustment {
    pub adjusted_shares: Decimal,
    pub adjusted_price: Decimal,
    pub cumulative_ratio: Decimal,
    pub has_adjustment: bool,
}
