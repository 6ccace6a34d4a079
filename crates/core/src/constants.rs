use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal places kept on reported return figures.
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal places on benchmark percentage returns.
pub const PERCENT_PRECISION: u32 = 2;

/// Day-count denominator for annualization (actual/365).
pub const DAYS_PER_YEAR: Decimal = dec!(365);

/// Convergence tolerance for the XIRR root search.
pub const XIRR_TOLERANCE: Decimal = dec!(0.0000001);

/// Iteration cap for Newton-Raphson before falling back to bisection.
pub const XIRR_MAX_ITERATIONS: u32 = 100;

/// Initial Newton-Raphson guess.
pub const XIRR_INITIAL_GUESS: Decimal = dec!(0.1);

/// Bisection bracket for the annualized rate.
pub const XIRR_BRACKET_LOW: Decimal = dec!(-0.999);
pub const XIRR_BRACKET_HIGH: Decimal = dec!(10);
