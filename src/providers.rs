//! Per-invocation construction of provider clients.
//!
//! Nothing is pooled across invocations: each run asks for a fresh Pub/Sub
//! client and opens the snapshot bucket anew.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use parking_lot::Mutex;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::pubsub::{MemoryPubSub, PubSubApi, RestPubSub};
use crate::snapshot::SnapshotStore;

#[async_trait]
pub trait Providers: Send + Sync {
    async fn pubsub(&self) -> Result<Arc<dyn PubSubApi>>;

    /// Snapshot store backed by `bucket`.
    fn snapshot_store(&self, bucket: &str) -> Result<SnapshotStore>;
}

// ========================================
// GOOGLE CLOUD
// ========================================

/// Pub/Sub over REST and Cloud Storage buckets, with the local overrides from
/// [`ProviderConfig`].
#[derive(Debug, Clone, Default)]
pub struct GcpProviders {
    config: ProviderConfig,
}

impl GcpProviders {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Providers for GcpProviders {
    async fn pubsub(&self) -> Result<Arc<dyn PubSubApi>> {
        let client = match &self.config.pubsub_emulator_host {
            Some(host) => RestPubSub::emulator(host)?,
            None => RestPubSub::connect().await?,
        };
        Ok(Arc::new(client))
    }

    fn snapshot_store(&self, bucket: &str) -> Result<SnapshotStore> {
        let store: Arc<dyn ObjectStore> = match &self.config.local_root {
            Some(root) => Arc::new(local_bucket(root, bucket)?),
            None => Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(bucket)
                    .build()?,
            ),
        };
        Ok(SnapshotStore::new(store))
    }
}

fn local_bucket(root: &Path, bucket: &str) -> Result<LocalFileSystem> {
    let dir = root.join(bucket);
    std::fs::create_dir_all(&dir)
        .map_err(|e| Error::config(format!("Failed to create {}: {e}", dir.display())))?;
    Ok(LocalFileSystem::new_with_prefix(&dir)?)
}

// ========================================
// IN MEMORY
// ========================================

/// Shares one [`MemoryPubSub`] and keeps one [`InMemory`] store per bucket
/// name, so state survives across invocations like the real services do.
#[derive(Debug, Default)]
pub struct MemoryProviders {
    pubsub: Arc<MemoryPubSub>,
    buckets: Mutex<HashMap<String, Arc<InMemory>>>,
}

impl MemoryProviders {
    pub fn new(pubsub: Arc<MemoryPubSub>) -> Self {
        Self {
            pubsub,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Raw object store of `bucket`, created on first use.
    pub fn bucket(&self, bucket: &str) -> Arc<InMemory> {
        self.buckets
            .lock()
            .entry(bucket.to_string())
            .or_insert_with(|| Arc::new(InMemory::new()))
            .clone()
    }
}

#[async_trait]
impl Providers for MemoryProviders {
    async fn pubsub(&self) -> Result<Arc<dyn PubSubApi>> {
        Ok(self.pubsub.clone())
    }

    fn snapshot_store(&self, bucket: &str) -> Result<SnapshotStore> {
        Ok(SnapshotStore::new(self.bucket(bucket)))
    }
}
