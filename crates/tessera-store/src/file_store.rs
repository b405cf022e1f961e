//! File-based partition storage backend.
//!
//! Lays partitions out as sibling directories under an output root:
//! `{base_dir}/{partition}/{file_path}/{sequence}`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::Bytes;
use tessera_types::PartitionId;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::PartitionStore;

/// File-based partition store rooted at an output directory.
///
/// Each chunk copy is stored as a file at
/// `{base_dir}/{partition}/{file_path}/{sequence}`.
///
/// Writes are atomic: data is written to a hidden temporary file in the
/// same directory, then renamed into place, so a reader never sees a
/// half-written chunk.
pub struct FileStore {
    base_dir: PathBuf,
    partition_count: AtomicU32,
}

impl FileStore {
    /// Create a store rooted at `base_dir` with no partitions yet.
    ///
    /// Nothing is created on disk until [`PartitionStore::create_partitions`].
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self::with_partitions(base_dir, 0)
    }

    /// Open a store whose partitions `1..=count` already exist on disk.
    pub fn with_partitions(base_dir: impl AsRef<Path>, count: u32) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            partition_count: AtomicU32::new(count),
        }
    }

    /// The output root this store writes under.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory of one partition.
    pub fn partition_dir(&self, partition: PartitionId) -> PathBuf {
        self.base_dir.join(partition.dir_name())
    }

    /// Mirrored directory of a file inside one partition.
    fn file_dir(&self, partition: PartitionId, file_path: &Path) -> PathBuf {
        self.partition_dir(partition).join(file_path)
    }

    /// Full path of one chunk copy.
    pub fn chunk_path(&self, partition: PartitionId, file_path: &Path, sequence: u64) -> PathBuf {
        self.file_dir(partition, file_path).join(sequence.to_string())
    }

    fn check_partition(&self, partition: PartitionId) -> Result<(), StoreError> {
        if partition.get() > self.partition_count.load(Ordering::Acquire) {
            return Err(StoreError::UnknownPartition(partition));
        }
        Ok(())
    }
}

/// Parse a directory entry name written by this store (`"1"`, `"42"`).
///
/// Rejects names that would not round-trip, such as `"007"` or `"+3"`.
fn parse_decimal(name: &str) -> Option<u64> {
    let value: u64 = name.parse().ok()?;
    (value.to_string() == name).then_some(value)
}

#[async_trait::async_trait]
impl PartitionStore for FileStore {
    async fn create_partitions(&self, count: u32) -> Result<(), StoreError> {
        for partition in PartitionId::all(count) {
            let dir = self.partition_dir(partition);
            match tokio::fs::create_dir(&dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    return Err(StoreError::PartitionExists(partition));
                }
                Err(e) => return Err(StoreError::Io(e)),
            }
            debug!(%partition, path = %dir.display(), "created partition directory");
        }
        self.partition_count.store(count, Ordering::Release);
        Ok(())
    }

    async fn partitions(&self) -> Result<Vec<PartitionId>, StoreError> {
        let mut partitions = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && let Some(id) = parse_decimal(name)
                && let Ok(id) = u32::try_from(id)
                && let Some(partition) = PartitionId::new(id)
            {
                partitions.push(partition);
            }
        }
        partitions.sort_unstable();
        Ok(partitions)
    }

    async fn mirror(&self, file_path: &Path) -> Result<(), StoreError> {
        let count = self.partition_count.load(Ordering::Acquire);
        for partition in PartitionId::all(count) {
            tokio::fs::create_dir_all(self.file_dir(partition, file_path)).await?;
        }
        debug!(path = %file_path.display(), partitions = count, "mirrored file directory");
        Ok(())
    }

    async fn is_mirrored(
        &self,
        partition: PartitionId,
        file_path: &Path,
    ) -> Result<bool, StoreError> {
        match tokio::fs::metadata(self.file_dir(partition, file_path)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn put_chunk(
        &self,
        partition: PartitionId,
        file_path: &Path,
        sequence: u64,
        data: Bytes,
    ) -> Result<(), StoreError> {
        self.check_partition(partition)?;
        if !self.is_mirrored(partition, file_path).await? {
            return Err(StoreError::NotMirrored {
                partition,
                path: file_path.to_path_buf(),
            });
        }

        let path = self.chunk_path(partition, file_path, sequence);
        let tmp_path = self
            .file_dir(partition, file_path)
            .join(format!(".{sequence}.tmp"));
        let written = match tokio::fs::write(&tmp_path, &data).await {
            Ok(()) => tokio::fs::rename(&tmp_path, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            // Best effort: the partition must not keep a stray temp file.
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(e));
        }

        debug!(
            %partition,
            path = %path.display(),
            size = data.len(),
            "stored chunk copy"
        );
        Ok(())
    }

    async fn get_chunk(
        &self,
        partition: PartitionId,
        file_path: &Path,
        sequence: u64,
    ) -> Result<Option<Bytes>, StoreError> {
        match tokio::fs::read(self.chunk_path(partition, file_path, sequence)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn list_chunks(
        &self,
        partition: PartitionId,
        file_path: &Path,
    ) -> Result<Vec<u64>, StoreError> {
        let dir = self.file_dir(partition, file_path);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotMirrored {
                    partition,
                    path: file_path.to_path_buf(),
                });
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut sequences = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && let Some(sequence) = parse_decimal(name)
            {
                sequences.push(sequence);
            }
        }
        sequences.sort_unstable();
        Ok(sequences)
    }
}
