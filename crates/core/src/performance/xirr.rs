//! Money-weighted (internal) rate of return for irregularly dated flows.
//!
//! Newton-Raphson on the net present value with an analytic derivative,
//! falling back to bisection on [-99.9%, +1000%] when the iteration leaves
//! the admissible domain or fails to settle.

use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};

use crate::cashflow::CashFlowEvent;
use crate::constants::{
    DAYS_PER_YEAR, XIRR_BRACKET_HIGH, XIRR_BRACKET_LOW, XIRR_INITIAL_GUESS, XIRR_MAX_ITERATIONS,
    XIRR_TOLERANCE,
};
use crate::performance::performance_model::{XirrConfidence, XirrResult};

/// Flow timed in years relative to the series start.
struct TimedFlow {
    years: Decimal,
    amount: Decimal,
}

/// Solves for the annualized rate that zeroes the net present value of
/// `flows`. Needs at least one negative and one positive amount; anything
/// else yields an undefined result rather than an error.
pub fn solve(flows: &[CashFlowEvent]) -> XirrResult {
    let dated: Vec<(NaiveDate, Decimal)> = flows
        .iter()
        .filter(|f| !f.amount.is_zero())
        .map(|f| (f.date, f.amount))
        .collect();

    let earliest = dated.iter().map(|(d, _)| *d).min();

    let has_negative = dated.iter().any(|(_, a)| a.is_sign_negative());
    let has_positive = dated.iter().any(|(_, a)| a.is_sign_positive());
    if !has_negative || !has_positive {
        return XirrResult::undefined(dated.len(), earliest);
    }

    let t0 = earliest.unwrap_or_default();
    let timed: Vec<TimedFlow> = dated
        .iter()
        .map(|(date, amount)| TimedFlow {
            years: Decimal::from((*date - t0).num_days()) / DAYS_PER_YEAR,
            amount: *amount,
        })
        .collect();

    if let Some(rate) = newton_raphson(&timed) {
        return XirrResult {
            rate: Some(rate),
            cash_flow_count: dated.len(),
            earliest_transaction_date: earliest,
            confidence: XirrConfidence::High,
        };
    }

    let (rate, converged) = bisect(&timed);
    XirrResult {
        rate: Some(rate),
        cash_flow_count: dated.len(),
        earliest_transaction_date: earliest,
        confidence: if converged {
            XirrConfidence::High
        } else {
            XirrConfidence::Low
        },
    }
}

/// Net present value at `rate`. `None` when the arithmetic leaves the
/// representable range (rates pressed against -100% with long horizons).
fn xnpv(rate: Decimal, flows: &[TimedFlow]) -> Option<Decimal> {
    let base = Decimal::ONE + rate;
    if base <= Decimal::ZERO {
        return None;
    }
    let mut total = Decimal::ZERO;
    for flow in flows {
        let factor = base.checked_powd(-flow.years)?;
        total = total.checked_add(factor.checked_mul(flow.amount)?)?;
    }
    Some(total)
}

/// d/d(rate) of `xnpv`.
fn xnpv_derivative(rate: Decimal, flows: &[TimedFlow]) -> Option<Decimal> {
    let base = Decimal::ONE + rate;
    if base <= Decimal::ZERO {
        return None;
    }
    let mut total = Decimal::ZERO;
    for flow in flows {
        if flow.years.is_zero() {
            continue;
        }
        let factor = base.checked_powd(-flow.years - Decimal::ONE)?;
        let term = factor.checked_mul(flow.amount)?.checked_mul(-flow.years)?;
        total = total.checked_add(term)?;
    }
    Some(total)
}

fn newton_raphson(flows: &[TimedFlow]) -> Option<Decimal> {
    let mut rate = XIRR_INITIAL_GUESS;
    for _ in 0..XIRR_MAX_ITERATIONS {
        let value = xnpv(rate, flows)?;
        if value.abs() < XIRR_TOLERANCE {
            return Some(rate);
        }
        let derivative = xnpv_derivative(rate, flows)?;
        if derivative.abs() < XIRR_TOLERANCE {
            return None;
        }
        let next = rate.checked_sub(value.checked_div(derivative)?)?;
        if next <= Decimal::NEGATIVE_ONE {
            return None;
        }
        if (next - rate).abs() < XIRR_TOLERANCE {
            return Some(next);
        }
        rate = next;
    }
    None
}

/// Robust fallback. Returns the midpoint estimate and whether the interval
/// collapsed below tolerance around a sign change.
fn bisect(flows: &[TimedFlow]) -> (Decimal, bool) {
    let mut lo = XIRR_BRACKET_LOW;
    let mut hi = XIRR_BRACKET_HIGH;
    let two = Decimal::TWO;

    // Near -100% the discount factors blow up with the sign of the later
    // (positive) flows, so saturate overflow towards positive.
    let eval = |r: Decimal| xnpv(r, flows).unwrap_or(Decimal::MAX);

    let f_lo = eval(lo);
    let f_hi = eval(hi);
    if (f_lo.is_sign_negative()) == (f_hi.is_sign_negative()) {
        // No sign change in the bracket: report whichever coarse sample
        // comes closest to a root, tagged low-confidence by the caller.
        let mut best = (lo + hi) / two;
        let mut best_abs = eval(best).abs();
        let step = (hi - lo) / Decimal::from(20);
        let mut r = lo;
        while r <= hi {
            let abs = eval(r).abs();
            if abs < best_abs {
                best_abs = abs;
                best = r;
            }
            r += step;
        }
        return (best, false);
    }

    let lo_negative = f_lo.is_sign_negative();
    for _ in 0..XIRR_MAX_ITERATIONS {
        let mid = (lo + hi) / two;
        let f_mid = eval(mid);
        if f_mid.abs() < XIRR_TOLERANCE || (hi - lo) / two < XIRR_TOLERANCE {
            return (mid, true);
        }
        if f_mid.is_sign_negative() == lo_negative {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    ((lo + hi) / two, false)
}
