pub mod benchmarks;
pub mod cashflow;
pub mod constants;
pub mod errors;
pub mod performance;
pub mod pricing;
pub mod snapshots;
pub mod splits;
pub mod transactions;

pub use errors::{Error, Result};
pub use performance::*;
pub use pricing::*;
