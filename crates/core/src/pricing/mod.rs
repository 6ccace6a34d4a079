pub mod pricing_errors;
pub mod pricing_service;

pub use pricing_errors::PricingError;
pub use pricing_service::{PricingService, ResolvedValue};
