pub mod benchmarks_model;
pub mod benchmarks_service;
pub mod benchmarks_traits;

pub use benchmarks_model::{BenchmarkReturnsResponse, BenchmarkSelection};
pub use benchmarks_service::BenchmarkService;
pub use benchmarks_traits::BenchmarkRepositoryTrait;
