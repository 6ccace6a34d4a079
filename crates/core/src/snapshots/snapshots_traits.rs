use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::Result;

use super::snapshots_model::PriceSnapshot;

/// Storage contract for price/rate snapshots.
///
/// Reads are synchronous (cache lookups are expected to be cheap); writes
/// are async so backends may involve I/O. `try_insert` carries the
/// append-only semantics: the first write for a (symbol, date) bucket wins
/// and concurrent duplicates collapse onto the stored row, which makes
/// races safe without locks.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    fn get(&self, symbol: &str, date: NaiveDate) -> Result<Option<PriceSnapshot>>;

    /// Year-end bucket shared across callers: the snapshot for Dec-31 of
    /// `year`, if one has been recorded.
    fn get_year_end(&self, symbol: &str, year: i32) -> Result<Option<PriceSnapshot>>;

    /// Insert unless a snapshot already exists for (symbol, date). Returns
    /// the snapshot that is in the store afterwards, which is the existing
    /// one when the insert lost the race.
    async fn try_insert(&self, snapshot: PriceSnapshot) -> Result<PriceSnapshot>;

    /// Authoritative write for manual overrides: replaces whatever is
    /// cached for (symbol, date), including negative markers.
    async fn put_override(&self, snapshot: PriceSnapshot) -> Result<PriceSnapshot>;
}
