//! Split adjustment - pure composition of split ratios over a date range.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use super::splits_model::{SplitAdjustment, StockSplit};

/// Replays every split for (ticker, market) with an effective date strictly
/// after `trade_date` and on/before `as_of` (default today) onto a trade's
/// share count and price.
///
/// Pure and deterministic: identical inputs always produce identical output,
/// and nothing is persisted. With no applicable splits the ratio is 1 and
/// `has_adjustment` is false.
///
/// Splits sharing an exact effective date are applied in input order after
/// the date sort (stable sort). Ratio composition is commutative, so the
/// numbers do not depend on that order; it only pins down determinism.
pub fn adjust_for_splits(
    ticker: &str,
    market: &str,
    trade_date: NaiveDate,
    shares: Decimal,
    price: Decimal,
    all_splits: &[StockSplit],
    as_of: Option<NaiveDate>,
) -> SplitAdjustment {
    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());

    let mut applicable: Vec<&StockSplit> = all_splits
        .iter()
        .filter(|s| {
            s.ticker == ticker
                && s.market == market
                && s.effective_date > trade_date
                && s.effective_date <= as_of
        })
        .collect();
    applicable.sort_by_key(|s| s.effective_date);

    if applicable.is_empty() {
        return SplitAdjustment {
            adjusted_shares: shares,
            adjusted_price: price,
            cumulative_ratio: Decimal::ONE,
            has_adjustment: false,
        };
    }

    let cumulative_ratio = applicable
        .iter()
        .fold(Decimal::ONE, |acc, s| acc * s.ratio);

    SplitAdjustment {
        adjusted_shares: shares * cumulative_ratio,
        adjusted_price: price / cumulative_ratio,
        cumulative_ratio,
        has_adjustment: true,
    }
}

/// Cumulative split ratio for (ticker, market) effective within
/// `(after, up_to]`. Used for benchmark start-price adjustment where there
/// is no trade to replay onto.
pub fn cumulative_ratio_between(
    ticker: &str,
    market: &str,
    after: NaiveDate,
    up_to: NaiveDate,
    all_splits: &[StockSplit],
) -> Decimal {
    all_splits
        .iter()
        .filter(|s| {
            s.ticker == ticker
                && s.market == market
                && s.effective_date > after
                && s.effective_date <= up_to
        })
        .fold(Decimal::ONE, |acc, s| acc * s.ratio)
}
