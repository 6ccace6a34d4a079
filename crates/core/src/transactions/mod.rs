pub mod transactions_model;
pub mod transactions_traits;

pub use transactions_model::{Transaction, TransactionType};
pub use transactions_traits::TransactionRepositoryTrait;
