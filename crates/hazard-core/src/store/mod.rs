//! Hazard state store: the previous cycle's nearby set.
//!
//! The store is the only memory kept between cycles. It is replaced wholesale
//! by `commit` after a successful cycle and never partially updated. Two
//! backends are provided:
//! - `MemoryStateStore`: process-local, the default
//! - `FileStateStore`: a single JSON snapshot, so a restart keeps its baseline

use async_trait::async_trait;

use crate::domain::{NearbySet, StoreError};

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Holder of the most recently committed nearby set.
///
/// Guarantees:
/// - `load()` returns an empty set until the first `commit`.
/// - `commit(set)` atomically replaces the stored set.
/// - `clear()` resets to empty.
#[async_trait]
pub trait HazardStateStore: Send + Sync {
    async fn load(&self) -> StoreResult<NearbySet>;

    async fn commit(&self, set: NearbySet) -> StoreResult<()>;

    async fn clear(&self) -> StoreResult<()>;
}
