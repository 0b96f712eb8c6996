use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{HazardStateStore, StoreResult};
use crate::domain::NearbySet;

/// In-memory state store.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    current: RwLock<NearbySet>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HazardStateStore for MemoryStateStore {
    async fn load(&self) -> StoreResult<NearbySet> {
        Ok(self.current.read().await.clone())
    }

    async fn commit(&self, set: NearbySet) -> StoreResult<()> {
        *self.current.write().await = set;
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        *self.current.write().await = NearbySet::new();
        Ok(())
    }
}
