//! Error types for the engine.

use std::path::PathBuf;

/// Errors that can occur while generating or auditing a layout.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The input root is missing or not a directory.
    #[error("input directory {} does not exist or is not a directory", .0.display())]
    InputNotDirectory(PathBuf),

    /// The output root is missing or not a directory.
    #[error("output directory {} does not exist or is not a directory", .0.display())]
    OutputNotDirectory(PathBuf),

    /// The output root already has entries in it.
    #[error("output directory {} must be empty", .0.display())]
    OutputNotEmpty(PathBuf),

    /// The output root is the input root or lies inside it.
    #[error("output directory {} must not be inside input directory {}", output.display(), input.display())]
    OutputInsideInput {
        /// Input root.
        input: PathBuf,
        /// Output root.
        output: PathBuf,
    },

    /// Partition or copy count cannot be satisfied.
    #[error("invalid placement: {0}")]
    Placement(#[from] tessera_placement::PlacementError),

    /// The target chunk size is zero.
    #[error("chunk size must be at least 1 byte")]
    InvalidChunkSize,

    /// The file concurrency is zero.
    #[error("concurrency must be at least 1")]
    InvalidConcurrency,

    /// An input path cannot be represented in the manifest.
    #[error("input path {} is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),

    /// Walking the input tree failed.
    #[error("failed to walk input directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Reading or chunking an input file failed.
    #[error("failed to read {}: {source}", path.display())]
    Source {
        /// Absolute path of the input file.
        path: PathBuf,
        /// Underlying chunking error.
        source: tessera_cas::CasError,
    },

    /// Manifest serialization or persistence error.
    #[error("manifest error: {0}")]
    Cas(#[from] tessera_cas::CasError),

    /// Failed to access the partition store.
    #[error("store error: {0}")]
    Store(#[from] tessera_store::StoreError),

    /// An I/O error outside the store, such as inspecting the roots.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
