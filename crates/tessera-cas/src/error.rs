//! Error types for chunking and manifest operations.

/// Errors that can occur while chunking files or handling the manifest.
#[derive(Debug, thiserror::Error)]
pub enum CasError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred while reading a source or writing the manifest.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
