//! Snapshot store: the single persisted snapshot object of a bucket.

use std::sync::Arc;

use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};

use super::Snapshot;
use crate::error::{Error, Result};

/// Name of the object holding the most recent snapshot.
pub const SNAPSHOT_OBJECT: &str = "subscription_list.json";

#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn ObjectStore>,
    path: ObjectPath,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("store", &self.store.to_string())
            .field("path", &self.path)
            .finish()
    }
}

impl SnapshotStore {
    /// Uses `store` (already bound to a bucket) as the backing object store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            path: ObjectPath::from(SNAPSHOT_OBJECT),
        }
    }

    /// Previous snapshot, or an empty one if nothing was ever saved.
    pub async fn load(&self) -> Result<Snapshot> {
        let data = match self.read().await {
            Ok(data) => data,
            Err(err) if err.is_not_found() => {
                tracing::info!(object = %self.path, "No previous snapshot found");
                return Ok(Snapshot::new());
            }
            Err(err) => return Err(err),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    /// Replaces the stored snapshot. Last writer wins.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let contents = serde_json::to_vec(snapshot)?;
        let size = contents.len();
        self.store
            .put(&self.path, PutPayload::from(Bytes::from(contents)))
            .await?;
        tracing::debug!(object = %self.path, bytes = size, "Snapshot saved");
        Ok(())
    }

    async fn read(&self) -> Result<Bytes> {
        let result = self.store.get(&self.path).await.map_err(Error::from)?;
        Ok(result.bytes().await?)
    }
}
