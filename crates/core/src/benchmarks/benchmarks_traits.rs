use crate::errors::Result;

use super::benchmarks_model::BenchmarkSelection;

/// Read contract for a user's configured benchmark set.
pub trait BenchmarkRepositoryTrait: Send + Sync {
    fn get_benchmark_selections(&self, user_id: &str) -> Result<Vec<BenchmarkSelection>>;
}
