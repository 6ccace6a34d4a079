use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An index a portfolio is compared against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkSelection {
    /// Stable identifier results are reported under.
    pub key: String,
    /// Provider-resolvable symbol, e.g. "^GSPC".
    pub symbol: String,
    pub market: String,
    /// Set for benchmarks tracking a single instrument that has undergone
    /// splits; plain indices leave it false.
    pub has_splits: bool,
}

/// Calendar-year returns for a set of benchmarks.
///
/// A benchmark whose endpoint prices could not be resolved reports `None`,
/// never a fabricated zero. The two flags say whether every requested
/// benchmark had its start (resp. end) price available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReturnsResponse {
    pub year: i32,
    /// Percentage return per benchmark key, rounded to 2 decimals.
    pub returns: HashMap<String, Option<Decimal>>,
    pub has_start_prices: bool,
    pub has_end_prices: bool,
}
