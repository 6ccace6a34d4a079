use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cashflow::MissingDataPoint;

/// How much the solver trusts a money-weighted rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum XirrConfidence {
    /// Newton-Raphson or bisection converged on a root.
    High,
    /// Best available estimate; the search did not converge.
    Low,
    /// The flow series does not admit a rate (needs at least one inflow
    /// and one outflow).
    #[default]
    Undefined,
}

/// Outcome of the money-weighted return solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XirrResult {
    /// Annualized rate as a fraction (0.10 = 10% p.a.); `None` when
    /// undefined.
    pub rate: Option<Decimal>,
    pub cash_flow_count: usize,
    pub earliest_transaction_date: Option<NaiveDate>,
    pub confidence: XirrConfidence,
}

impl XirrResult {
    pub fn undefined(cash_flow_count: usize, earliest: Option<NaiveDate>) -> Self {
        Self {
            rate: None,
            cash_flow_count,
            earliest_transaction_date: earliest,
            confidence: XirrConfidence::Undefined,
        }
    }
}

/// Per-year performance figures, reported in the investor's home currency
/// and the holdings' source currency side by side.
///
/// Return figures are percentages. `is_complete = false` means at least one
/// price or rate could not be resolved; the affected figures are `None` and
/// the gaps are listed in `missing_prices` so a caller can prompt for
/// manual values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearPerformance {
    pub year: i32,
    pub xirr: Option<Decimal>,
    pub xirr_confidence: XirrConfidence,
    pub modified_dietz_home: Option<Decimal>,
    pub modified_dietz_source: Option<Decimal>,
    pub twr_home: Option<Decimal>,
    pub twr_source: Option<Decimal>,
    pub start_value_home: Decimal,
    pub start_value_source: Decimal,
    pub end_value_home: Decimal,
    pub end_value_source: Decimal,
    pub net_contributions_home: Decimal,
    pub net_contributions_source: Decimal,
    pub is_complete: bool,
    pub missing_prices: Vec<MissingDataPoint>,
}
