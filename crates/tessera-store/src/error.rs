//! Error types for partition storage operations.

use std::path::PathBuf;

use tessera_types::PartitionId;

/// Errors that can occur during partition storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The partition does not exist in this store.
    #[error("unknown partition: {0}")]
    UnknownPartition(PartitionId),

    /// A chunk was written before its file was mirrored into the partition.
    #[error("file {} is not mirrored into partition {partition}", path.display())]
    NotMirrored {
        /// Target partition.
        partition: PartitionId,
        /// File path relative to the input root.
        path: PathBuf,
    },

    /// A partition directory was already present when partitions were created.
    #[error("partition {0} already exists")]
    PartitionExists(PartitionId),

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
