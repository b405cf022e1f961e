//! Shared test utilities for tessera-engine tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use tempfile::TempDir;
use tessera_store::{MemoryStore, PartitionStore, StoreError};
use tessera_types::{FileRecord, LayoutConfig, Manifest, PartitionId, manifest_path};

use crate::materializer::{GenerationReport, Materializer};

/// Generate deterministic text: `lines` lines of varying width, each
/// terminated by `\n`.
pub fn test_text(lines: usize) -> Vec<u8> {
    let mut data = Vec::new();
    let mut state: u32 = 0xDEAD_BEEF;
    for i in 0..lines {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        let width = 1 + (state >> 16) as usize % 40;
        data.extend(format!("{i:05} ").bytes());
        data.extend(std::iter::repeat_n(b'a' + (state % 26) as u8, width));
        data.push(b'\n');
    }
    data
}

/// Write `files` (relative path, content) under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}

/// A seeded layout config so failures are reproducible.
pub fn test_config(partitions: u32, copies: u32, chunk_size: u64) -> LayoutConfig {
    LayoutConfig {
        partitions,
        copies,
        chunk_size,
        concurrency: 1,
        seed: Some(7),
    }
}

/// A populated input root and an empty output root, as separate temp dirs.
pub struct Fixture {
    pub input: TempDir,
    pub output: TempDir,
}

impl Fixture {
    pub fn new(files: &[(&str, &[u8])]) -> Self {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_tree(input.path(), files);
        Self { input, output }
    }

    pub async fn generate(&self, config: LayoutConfig) -> GenerationReport {
        Materializer::new(config)
            .generate(self.input.path(), self.output.path())
            .await
            .unwrap()
    }

    /// Parse the manifest straight from disk.
    pub fn manifest(&self) -> Manifest {
        let bytes = std::fs::read(manifest_path(self.output.path())).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Read one chunk copy from a partition, if present.
    pub fn chunk_copy(&self, partition: u32, file_path: &str, sequence: u64) -> Option<Vec<u8>> {
        let path = self
            .output
            .path()
            .join(partition.to_string())
            .join(file_path)
            .join(sequence.to_string());
        std::fs::read(path).ok()
    }

    /// Rebuild a file's content from the first listed copy of each chunk.
    pub fn reassemble(&self, record: &FileRecord) -> Vec<u8> {
        let mut data = Vec::new();
        for chunk in &record.chunks {
            let partition = chunk.partitions[0].get();
            data.extend(
                self.chunk_copy(partition, &record.file_path, chunk.sequence)
                    .unwrap(),
            );
        }
        data
    }

    /// Names of the entries directly under the output root, sorted.
    pub fn output_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.output.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// A [`MemoryStore`] whose chunk writes fail for one file.
pub struct FailingStore {
    pub inner: Arc<MemoryStore>,
    fail_path: PathBuf,
    /// Chunk writes that reached the inner store.
    pub writes: AtomicUsize,
}

impl FailingStore {
    pub fn new(fail_path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(MemoryStore::new()),
            fail_path: fail_path.into(),
            writes: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl PartitionStore for FailingStore {
    async fn create_partitions(&self, count: u32) -> Result<(), StoreError> {
        self.inner.create_partitions(count).await
    }

    async fn partitions(&self) -> Result<Vec<PartitionId>, StoreError> {
        self.inner.partitions().await
    }

    async fn mirror(&self, file_path: &Path) -> Result<(), StoreError> {
        self.inner.mirror(file_path).await
    }

    async fn is_mirrored(
        &self,
        partition: PartitionId,
        file_path: &Path,
    ) -> Result<bool, StoreError> {
        self.inner.is_mirrored(partition, file_path).await
    }

    async fn put_chunk(
        &self,
        partition: PartitionId,
        file_path: &Path,
        sequence: u64,
        data: Bytes,
    ) -> Result<(), StoreError> {
        if file_path == self.fail_path {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.inner
            .put_chunk(partition, file_path, sequence, data)
            .await
    }

    async fn get_chunk(
        &self,
        partition: PartitionId,
        file_path: &Path,
        sequence: u64,
    ) -> Result<Option<Bytes>, StoreError> {
        self.inner.get_chunk(partition, file_path, sequence).await
    }

    async fn list_chunks(
        &self,
        partition: PartitionId,
        file_path: &Path,
    ) -> Result<Vec<u64>, StoreError> {
        self.inner.list_chunks(partition, file_path).await
    }
}
