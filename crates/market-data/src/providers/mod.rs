//! Concrete provider implementations.

mod frankfurter;
mod yahoo;

pub use frankfurter::FrankfurterProvider;
pub use yahoo::YahooProvider;
