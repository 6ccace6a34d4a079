pub mod memory_store;
pub mod snapshots_model;
pub mod snapshots_traits;

pub use memory_store::MemorySnapshotStore;
pub use snapshots_model::{fx_symbol, PriceSnapshot};
pub use snapshots_traits::SnapshotStore;
