pub mod splits_model;
pub mod splits_service;
pub mod splits_traits;

pub use splits_model::{SplitAdjustment, StockSplit};
pub use splits_service::{adjust_for_splits, cumulative_ratio_between};
pub use splits_traits::SplitRepositoryTrait;
