//! Core trait for partition storage.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use tessera_types::PartitionId;

use crate::error::StoreError;

/// Trait for laying out partitions and storing chunk copies.
///
/// A store holds `N` partitions. Every input file gets a mirrored directory
/// at the same relative path in each partition; a chunk copy is a file named
/// by its decimal sequence number inside that directory.
///
/// All implementations must be `Send + Sync` so files can be placed from
/// concurrent tasks. Data is passed as [`Bytes`] so one chunk buffer can be
/// written to several partitions without copying.
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Create partitions `1..=count`. Fails if any of them already exists.
    async fn create_partitions(&self, count: u32) -> Result<(), StoreError>;

    /// List the partitions present in the store, sorted ascending.
    async fn partitions(&self) -> Result<Vec<PartitionId>, StoreError>;

    /// Create the directory for `file_path` in every partition.
    ///
    /// Idempotent: mirroring an already-mirrored path is a no-op.
    async fn mirror(&self, file_path: &Path) -> Result<(), StoreError>;

    /// Whether `file_path` has a mirrored directory in `partition`.
    async fn is_mirrored(&self, partition: PartitionId, file_path: &Path)
    -> Result<bool, StoreError>;

    /// Store one chunk copy in `partition`.
    ///
    /// The file's directory must already be mirrored into the partition.
    async fn put_chunk(
        &self,
        partition: PartitionId,
        file_path: &Path,
        sequence: u64,
        data: Bytes,
    ) -> Result<(), StoreError>;

    /// Retrieve a chunk copy. Returns `None` if the partition holds no copy.
    async fn get_chunk(
        &self,
        partition: PartitionId,
        file_path: &Path,
        sequence: u64,
    ) -> Result<Option<Bytes>, StoreError>;

    /// Sequence numbers of the chunk copies held in `partition` for a file,
    /// sorted ascending.
    async fn list_chunks(
        &self,
        partition: PartitionId,
        file_path: &Path,
    ) -> Result<Vec<u64>, StoreError>;
}
