//! Approximation-based period returns: Modified Dietz (money-weighted
//! without solving) and time-weighted return (flow-neutral chaining).

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A dated external flow inside the measurement period, signed from the
/// portfolio's perspective: contributions positive, withdrawals negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodFlow {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Portfolio value observed immediately after the flows of `date` settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationPoint {
    pub date: NaiveDate,
    pub value: Decimal,
    /// Net external flow on that date, already included in `value`.
    pub flow: Decimal,
}

/// Modified Dietz return over [`start`, `end`] as a fraction.
///
/// Weights each flow by the share of the period it was invested:
/// `w_i = (D - d_i) / D` with `D` the period length in days and `d_i` the
/// days from period start to the flow. `None` when the period is empty or
/// the average capital base is zero (the return is not meaningful then,
/// never zero by fiat).
pub fn modified_dietz(
    start_value: Decimal,
    end_value: Decimal,
    flows: &[PeriodFlow],
    start: NaiveDate,
    end: NaiveDate,
) -> Option<Decimal> {
    let period_days = (end - start).num_days();
    if period_days <= 0 {
        return None;
    }
    let period = Decimal::from(period_days);

    let mut net_flow = Decimal::ZERO;
    let mut weighted_flow = Decimal::ZERO;
    for flow in flows {
        let days_in = (flow.date - start).num_days().clamp(0, period_days);
        let weight = (period - Decimal::from(days_in)) / period;
        net_flow += flow.amount;
        weighted_flow += flow.amount * weight;
    }

    let capital_base = start_value + weighted_flow;
    if capital_base.is_zero() {
        return None;
    }
    Some((end_value - start_value - net_flow) / capital_base)
}

/// Time-weighted return as a fraction: the chained product of sub-period
/// growth factors `(v_j - f_j) / v_{j-1}`, where each valuation point is
/// taken just after its flow settled.
///
/// `points` must be ordered by date, starting with the opening valuation
/// (flow zero) and ending with the closing one.
///
/// A sub-period that begins with no capital contributes nothing as long as
/// its end value is fully explained by its flow (inception, or re-entry
/// after a liquidation). Value appearing from a zero base without a flow
/// is a data anomaly and yields `None`, as does a series where no
/// sub-period ever had capital at work.
pub fn time_weighted(points: &[ValuationPoint]) -> Option<Decimal> {
    if points.len() < 2 {
        return None;
    }
    let mut growth = Decimal::ONE;
    let mut had_capital = false;
    for pair in points.windows(2) {
        let prev = pair[0].value;
        let gained = pair[1].value - pair[1].flow;
        if prev.is_zero() {
            if gained.is_zero() {
                continue;
            }
            return None;
        }
        had_capital = true;
        growth *= gained / prev;
    }
    if !had_capital {
        return None;
    }
    Some(growth - Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn dietz_without_flows_is_simple_return() {
        let r = modified_dietz(
            dec!(1000),
            dec!(1100),
            &[],
            date(2025, 1, 1),
            date(2025, 12, 31),
        )
        .unwrap();
        assert_eq!(r, dec!(0.1));
    }

    #[test]
    fn dietz_weights_mid_period_contribution() {
        // 100 invested half-way through a 100-day period carries weight 0.5.
        let flows = [PeriodFlow {
            date: date(2025, 2, 20),
            amount: dec!(100),
        }];
        let r = modified_dietz(
            dec!(1000),
            dec!(1200),
            &flows,
            date(2025, 1, 1),
            date(2025, 4, 11),
        )
        .unwrap();
        // Gain 100 on base 1000 + 0.5 * 100 = 1050.
        assert!((r - dec!(0.0952)).abs() < dec!(0.0001), "r {r}");
    }

    #[test]
    fn dietz_zero_capital_base_is_none() {
        assert_eq!(
            modified_dietz(
                dec!(0),
                dec!(50),
                &[],
                date(2025, 1, 1),
                date(2025, 6, 30)
            ),
            None
        );
    }

    #[test]
    fn dietz_empty_period_is_none() {
        let d = date(2025, 3, 1);
        assert_eq!(modified_dietz(dec!(100), dec!(100), &[], d, d), None);
    }

    #[test]
    fn twr_chains_sub_periods() {
        // 1000 -> 1100 (+10%), deposit 400 then 1500 -> 1650 (+10%).
        let points = [
            ValuationPoint {
                date: date(2025, 1, 1),
                value: dec!(1000),
                flow: dec!(0),
            },
            ValuationPoint {
                date: date(2025, 6, 1),
                value: dec!(1500),
                flow: dec!(400),
            },
            ValuationPoint {
                date: date(2025, 12, 31),
                value: dec!(1650),
                flow: dec!(0),
            },
        ];
        let r = time_weighted(&points).unwrap();
        assert!((r - dec!(0.21)).abs() < dec!(0.0001), "r {r}");
    }

    #[test]
    fn twr_ignores_flow_timing_luck() {
        // Same market path, huge deposit right before the rally: TWR of the
        // path stays what the market did.
        let points = [
            ValuationPoint {
                date: date(2025, 1, 1),
                value: dec!(100),
                flow: dec!(0),
            },
            ValuationPoint {
                date: date(2025, 7, 1),
                value: dec!(10100),
                flow: dec!(10000),
            },
            ValuationPoint {
                date: date(2025, 12, 31),
                value: dec!(11110),
                flow: dec!(0),
            },
        ];
        let r = time_weighted(&points).unwrap();
        assert!((r - dec!(0.1)).abs() < dec!(0.0001), "r {r}");
    }

    #[test]
    fn twr_inception_sub_period_is_neutral() {
        // Empty until the deposit arrives, then +8%.
        let points = [
            ValuationPoint {
                date: date(2025, 1, 1),
                value: dec!(0),
                flow: dec!(0),
            },
            ValuationPoint {
                date: date(2025, 4, 1),
                value: dec!(500),
                flow: dec!(500),
            },
            ValuationPoint {
                date: date(2025, 12, 31),
                value: dec!(540),
                flow: dec!(0),
            },
        ];
        let r = time_weighted(&points).unwrap();
        assert_eq!(r, dec!(0.08));
    }

    #[test]
    fn twr_all_zero_series_is_none() {
        // No sub-period ever held capital; there is no return to report.
        let points = [
            ValuationPoint {
                date: date(2025, 1, 1),
                value: dec!(0),
                flow: dec!(0),
            },
            ValuationPoint {
                date: date(2025, 12, 31),
                value: dec!(0),
                flow: dec!(0),
            },
        ];
        assert_eq!(time_weighted(&points), None);
    }

    #[test]
    fn twr_value_from_nothing_is_none() {
        // Value appearing without a flow from a zero base has no return.
        let points = [
            ValuationPoint {
                date: date(2025, 1, 1),
                value: dec!(0),
                flow: dec!(0),
            },
            ValuationPoint {
                date: date(2025, 12, 31),
                value: dec!(500),
                flow: dec!(0),
            },
        ];
        assert_eq!(time_weighted(&points), None);
    }

    #[test]
    fn dietz_and_twr_agree_without_interior_flows() {
        let start = date(2025, 1, 1);
        let end = date(2025, 12, 31);
        let dietz = modified_dietz(dec!(2000), dec!(2300), &[], start, end).unwrap();
        let twr = time_weighted(&[
            ValuationPoint {
                date: start,
                value: dec!(2000),
                flow: dec!(0),
            },
            ValuationPoint {
                date: end,
                value: dec!(2300),
                flow: dec!(0),
            },
        ])
        .unwrap();
        assert_eq!(dietz, twr);
    }
}
