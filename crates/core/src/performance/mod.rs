pub mod performance_model;
pub mod performance_service;
pub mod period_returns;
pub mod xirr;

pub use performance_model::{XirrConfidence, XirrResult, YearPerformance};
pub use performance_service::PerformanceService;
pub use period_returns::{modified_dietz, time_weighted, PeriodFlow, ValuationPoint};
