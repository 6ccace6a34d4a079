use crate::errors::Result;

use super::splits_model::StockSplit;

/// Read contract for the globally shared split table.
pub trait SplitRepositoryTrait: Send + Sync {
    fn get_all_splits(&self) -> Result<Vec<StockSplit>>;
}
