//! In-memory partition storage backend.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use bytes::Bytes;
use tessera_types::PartitionId;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::PartitionStore;

/// Mirrored directories keyed by partition and file path, each holding the
/// chunk copies stored there by sequence number.
type Layout = BTreeMap<(PartitionId, PathBuf), BTreeMap<u64, Bytes>>;

#[derive(Default)]
struct Inner {
    partition_count: u32,
    layout: Layout,
}

/// In-memory partition store backed by a `RwLock<BTreeMap>`.
///
/// Enforces the same layout rules as [`FileStore`](crate::FileStore), so
/// engine tests can run without touching disk.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store with no partitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of chunk copies stored across all partitions.
    pub fn copy_count(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.layout.values().map(BTreeMap::len).sum()
    }

    /// Every mirrored file path, deduplicated and sorted.
    pub fn mirrored_paths(&self) -> Vec<PathBuf> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let paths: BTreeSet<&PathBuf> = inner.layout.keys().map(|(_, p)| p).collect();
        paths.into_iter().cloned().collect()
    }
}

#[async_trait::async_trait]
impl PartitionStore for MemoryStore {
    async fn create_partitions(&self, count: u32) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = PartitionId::all(inner.partition_count.min(count)).next() {
            return Err(StoreError::PartitionExists(existing));
        }
        inner.partition_count = count;
        debug!(count, "created in-memory partitions");
        Ok(())
    }

    async fn partitions(&self) -> Result<Vec<PartitionId>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(PartitionId::all(inner.partition_count).collect())
    }

    async fn mirror(&self, file_path: &Path) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        for partition in PartitionId::all(inner.partition_count) {
            inner
                .layout
                .entry((partition, file_path.to_path_buf()))
                .or_default();
        }
        Ok(())
    }

    async fn is_mirrored(
        &self,
        partition: PartitionId,
        file_path: &Path,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .layout
            .contains_key(&(partition, file_path.to_path_buf())))
    }

    async fn put_chunk(
        &self,
        partition: PartitionId,
        file_path: &Path,
        sequence: u64,
        data: Bytes,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if partition.get() > inner.partition_count {
            return Err(StoreError::UnknownPartition(partition));
        }
        let Some(dir) = inner.layout.get_mut(&(partition, file_path.to_path_buf())) else {
            return Err(StoreError::NotMirrored {
                partition,
                path: file_path.to_path_buf(),
            });
        };

        debug!(
            %partition,
            path = %file_path.display(),
            sequence,
            size = data.len(),
            "storing chunk in memory"
        );
        dir.insert(sequence, data);
        Ok(())
    }

    async fn get_chunk(
        &self,
        partition: PartitionId,
        file_path: &Path,
        sequence: u64,
    ) -> Result<Option<Bytes>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .layout
            .get(&(partition, file_path.to_path_buf()))
            .and_then(|dir| dir.get(&sequence).cloned()))
    }

    async fn list_chunks(
        &self,
        partition: PartitionId,
        file_path: &Path,
    ) -> Result<Vec<u64>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .layout
            .get(&(partition, file_path.to_path_buf()))
            .map(|dir| dir.keys().copied().collect())
            .ok_or_else(|| StoreError::NotMirrored {
                partition,
                path: file_path.to_path_buf(),
            })
    }
}
