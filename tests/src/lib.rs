//! Shared test harness for Tessera integration tests.
//!
//! Provides [`Workspace`]: an input tree and an empty output root in separate
//! temp dirs, with helpers to run a generation and read the result back
//! through the same store abstraction the engine writes with.

use std::collections::BTreeSet;
use std::path::Path;

use tempfile::TempDir;
use tessera_engine::{AuditReport, EngineError, GenerationReport, Materializer, audit_layout};
use tessera_store::{FileStore, PartitionStore};
use tessera_types::{FileRecord, LayoutConfig, Manifest, PartitionId, manifest_path};

/// Generate deterministic text with a caller-chosen seed.
///
/// Produces `lines` newline-terminated lines of 1 to `max_width` printable
/// characters each.
pub fn test_text_seeded(lines: usize, max_width: usize, seed: u32) -> Vec<u8> {
    let mut data = Vec::new();
    let mut state: u32 = seed.wrapping_mul(2654435761).wrapping_add(1);
    for _ in 0..lines {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        let width = 1 + (state >> 16) as usize % max_width.max(1);
        for _ in 0..width {
            state = state.wrapping_mul(1103515245).wrapping_add(12345);
            data.push(b' ' + ((state >> 16) % 95) as u8);
        }
        data.push(b'\n');
    }
    data
}

/// A seeded layout config.
pub fn layout(partitions: u32, copies: u32, chunk_size: u64) -> LayoutConfig {
    LayoutConfig {
        partitions,
        copies,
        chunk_size,
        concurrency: 1,
        seed: Some(0x7e55_e7a),
    }
}

/// An input tree and an output root for one generation run.
pub struct Workspace {
    pub input: TempDir,
    pub output: TempDir,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Create empty input and output roots.
    pub fn new() -> Self {
        Self {
            input: tempfile::tempdir().unwrap(),
            output: tempfile::tempdir().unwrap(),
        }
    }

    /// Write one input file, creating parent directories.
    pub fn write(&self, rel: &str, content: &[u8]) {
        let path = self.input.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Run a generation, returning the engine's result unchanged.
    pub async fn try_generate(&self, config: LayoutConfig) -> Result<GenerationReport, EngineError> {
        Materializer::new(config)
            .generate(self.input.path(), self.output.path())
            .await
    }

    /// Run a generation that must succeed.
    pub async fn generate(&self, config: LayoutConfig) -> GenerationReport {
        self.try_generate(config).await.unwrap()
    }

    /// Audit the output root against its manifest.
    pub async fn audit(&self) -> AuditReport {
        audit_layout(self.output.path()).await.unwrap()
    }

    /// Load the manifest written by the last generation.
    pub async fn manifest(&self) -> Manifest {
        tessera_cas::load_manifest(&manifest_path(self.output.path()))
            .await
            .unwrap()
    }

    /// A store over the output root, sized from the partitions on disk.
    pub async fn store(&self) -> FileStore {
        let count = FileStore::new(self.output.path())
            .partitions()
            .await
            .unwrap()
            .len();
        FileStore::with_partitions(self.output.path(), count as u32)
    }

    /// Rebuild a file from its chunk copies, reading each chunk from every
    /// listed partition and checking the copies agree.
    pub async fn reconstruct(&self, record: &FileRecord) -> Vec<u8> {
        let store = self.store().await;
        let rel = Path::new(&record.file_path);
        let mut data = Vec::new();
        for chunk in &record.chunks {
            let mut copies = Vec::new();
            for &partition in &chunk.partitions {
                let copy = store
                    .get_chunk(partition, rel, chunk.sequence)
                    .await
                    .unwrap()
                    .unwrap_or_else(|| {
                        panic!("{}#{} missing from {partition}", record.file_path, chunk.sequence)
                    });
                copies.push(copy);
            }
            assert!(
                copies.windows(2).all(|w| w[0] == w[1]),
                "copies of {}#{} differ",
                record.file_path,
                chunk.sequence
            );
            data.extend_from_slice(&copies[0]);
        }
        data
    }

    /// Partitions holding a copy of the given chunk, by scanning every one.
    pub async fn holders(&self, file_path: &str, sequence: u64) -> Vec<PartitionId> {
        let store = self.store().await;
        let mut holders = Vec::new();
        for partition in store.partitions().await.unwrap() {
            if store
                .get_chunk(partition, Path::new(file_path), sequence)
                .await
                .unwrap()
                .is_some()
            {
                holders.push(partition);
            }
        }
        holders
    }

    /// Relative paths of every non-hidden regular file in the input tree,
    /// found independently of the engine's own traversal.
    pub fn eligible_files(&self) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut pending = vec![self.input.path().to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir).unwrap() {
                let entry = entry.unwrap();
                if entry.file_name().to_string_lossy().starts_with('.') {
                    continue;
                }
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else if path.is_file() {
                    let rel = path.strip_prefix(self.input.path()).unwrap();
                    found.insert(rel.to_string_lossy().into_owned());
                }
            }
        }
        found
    }
}
