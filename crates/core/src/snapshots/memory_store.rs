//! In-memory snapshot store.
//!
//! The default backend for embedded use and tests. A database-backed store
//! implements the same trait in the host application.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::errors::{Error, Result};

use super::snapshots_model::PriceSnapshot;
use super::snapshots_traits::SnapshotStore;

#[derive(Default)]
pub struct MemorySnapshotStore {
    entries: RwLock<HashMap<(String, NaiveDate), PriceSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    fn get(&self, symbol: &str, date: NaiveDate) -> Result<Option<PriceSnapshot>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::Repository(e.to_string()))?;
        Ok(entries.get(&(symbol.to_string(), date)).cloned())
    }

    fn get_year_end(&self, symbol: &str, year: i32) -> Result<Option<PriceSnapshot>> {
        match NaiveDate::from_ymd_opt(year, 12, 31) {
            Some(date) => self.get(symbol, date),
            None => Ok(None),
        }
    }

    async fn try_insert(&self, snapshot: PriceSnapshot) -> Result<PriceSnapshot> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Repository(e.to_string()))?;
        let key = (snapshot.symbol.clone(), snapshot.date);
        Ok(entries.entry(key).or_insert(snapshot).clone())
    }

    async fn put_override(&self, snapshot: PriceSnapshot) -> Result<PriceSnapshot> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Repository(e.to_string()))?;
        let key = (snapshot.symbol.clone(), snapshot.date);
        entries.insert(key, snapshot.clone());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_first_insert_wins() {
        let store = MemorySnapshotStore::new();
        let date = day(2024, 12, 31);

        let first = PriceSnapshot::manual("AAPL", date, dec!(250), None);
        let second = PriceSnapshot::manual("AAPL", date, dec!(999), None);

        store.try_insert(first).await.unwrap();
        let stored = store.try_insert(second).await.unwrap();

        assert_eq!(stored.value, Some(dec!(250)));
        assert_eq!(store.get("AAPL", date).unwrap().unwrap().value, Some(dec!(250)));
    }

    #[tokio::test]
    async fn test_override_replaces() {
        let store = MemorySnapshotStore::new();
        let date = day(2024, 12, 31);

        store
            .try_insert(PriceSnapshot::unavailable("AAPL", date))
            .await
            .unwrap();
        store
            .put_override(PriceSnapshot::manual("AAPL", date, dec!(250), None))
            .await
            .unwrap();

        let stored = store.get("AAPL", date).unwrap().unwrap();
        assert!(!stored.not_available);
        assert_eq!(stored.value, Some(dec!(250)));
    }

    #[tokio::test]
    async fn test_year_end_lookup() {
        let store = MemorySnapshotStore::new();
        store
            .try_insert(PriceSnapshot::manual(
                "^GSPC",
                day(2024, 12, 31),
                dec!(5881.63),
                None,
            ))
            .await
            .unwrap();

        let hit = store.get_year_end("^GSPC", 2024).unwrap();
        assert_eq!(hit.unwrap().value, Some(dec!(5881.63)));
        assert!(store.get_year_end("^GSPC", 2023).unwrap().is_none());
    }
}
