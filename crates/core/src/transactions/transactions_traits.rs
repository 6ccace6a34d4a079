use crate::errors::Result;

use super::transactions_model::Transaction;

/// Read contract implemented by the surrounding application's persistence
/// layer. The engine never writes transactions.
pub trait TransactionRepositoryTrait: Send + Sync {
    fn get_transactions_by_portfolio(&self, portfolio_id: &str) -> Result<Vec<Transaction>>;
}
