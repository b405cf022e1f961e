//! Shared types and identifiers for Tessera.
//!
//! This crate defines the data model used across the Tessera workspace:
//! partition identifiers ([`PartitionId`]), the manifest document
//! ([`Manifest`], [`FileRecord`], [`ChunkRecord`]), the generation
//! parameters ([`LayoutConfig`]), and the fixed output layout constants.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

/// Name of the directory under the output root that holds the manifest.
pub const MANIFEST_DIR: &str = "manifest";

/// File name of the manifest document inside [`MANIFEST_DIR`].
pub const MANIFEST_FILE_NAME: &str = "fs-manifest.json";

/// Prefix marking a hidden path component. Hidden entries are never mirrored.
pub const HIDDEN_PREFIX: char = '.';

/// One mebibyte, the unit chunk sizes are given in at the CLI surface.
pub const MIB: u64 = 1024 * 1024;

/// Default number of partitions.
pub const DEFAULT_PARTITIONS: u32 = 2;

/// Default number of copies per chunk.
pub const DEFAULT_COPIES: u32 = 1;

/// Default target chunk size in mebibytes.
pub const DEFAULT_CHUNK_SIZE_MB: u64 = 64;

/// Location of the manifest document for a given output root.
pub fn manifest_path(out_root: &Path) -> PathBuf {
    out_root.join(MANIFEST_DIR).join(MANIFEST_FILE_NAME)
}

// ---------------------------------------------------------------------------
// Partition identifier
// ---------------------------------------------------------------------------

/// Identifier of a simulated storage node, in `1..=partitions`.
///
/// Each partition corresponds to one directory under the output root, named
/// by the decimal identifier with no leading zeros. Serialized as a bare
/// integer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(u32);

impl PartitionId {
    /// Create a partition identifier. Returns `None` for zero.
    pub fn new(id: u32) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    /// The numeric identifier.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Name of this partition's directory under the output root.
    pub fn dir_name(self) -> String {
        self.0.to_string()
    }

    /// Iterate over all partition identifiers `1..=count`.
    pub fn all(count: u32) -> impl Iterator<Item = PartitionId> {
        (1..=count).map(PartitionId)
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartitionId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Manifest document
// ---------------------------------------------------------------------------

/// Placement record for one chunk of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// 0-based position of this chunk within its file.
    pub sequence: u64,
    /// Size of the chunk content in bytes.
    pub size: u64,
    /// Partitions holding a copy of the chunk, sorted ascending.
    pub partitions: Vec<PartitionId>,
}

/// Chunk layout of one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the input root, with OS-native separators.
    #[serde(rename = "filePath")]
    pub file_path: String,
    /// Chunks in sequence order. Empty for an empty file.
    pub chunks: Vec<ChunkRecord>,
}

impl FileRecord {
    /// Create a record with no chunks yet.
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            chunks: Vec::new(),
        }
    }

    /// Total size of the file as recorded by its chunks.
    pub fn total_size(&self) -> u64 {
        self.chunks.iter().map(|c| c.size).sum()
    }
}

/// The manifest of one generation run: every file's chunk layout, in input
/// traversal order.
///
/// Serialized as a bare JSON array of [`FileRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    /// File records in input traversal order.
    pub files: Vec<FileRecord>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed file record.
    pub fn push(&mut self, record: FileRecord) {
        self.files.push(record);
    }

    /// Number of file records.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the manifest holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of chunks across all files.
    pub fn chunk_count(&self) -> usize {
        self.files.iter().map(|f| f.chunks.len()).sum()
    }

    /// Total bytes of source data described by the manifest.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(FileRecord::total_size).sum()
    }

    /// Look up a file record by its relative path.
    pub fn file(&self, file_path: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.file_path == file_path)
    }
}

impl FromIterator<FileRecord> for Manifest {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Parameters of one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Number of partition directories to create.
    pub partitions: u32,
    /// Number of partitions holding each chunk.
    pub copies: u32,
    /// Target chunk size in bytes.
    pub chunk_size: u64,
    /// Maximum number of files chunked and placed at once.
    pub concurrency: usize,
    /// Seed for the placement RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl LayoutConfig {
    /// Convert a chunk size in mebibytes to bytes.
    pub fn chunk_size_from_mb(mb: u64) -> u64 {
        mb.saturating_mul(MIB)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            partitions: DEFAULT_PARTITIONS,
            copies: DEFAULT_COPIES,
            chunk_size: DEFAULT_CHUNK_SIZE_MB * MIB, // 64 MiB
            concurrency: 1,
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
