//! Error types for placement selection.

/// Errors returned when a placement request cannot be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// There are no partitions to place onto.
    #[error("partition count must be at least 1")]
    NoPartitions,

    /// Each chunk must be stored at least once.
    #[error("copy count must be at least 1")]
    NoCopies,

    /// More copies were requested than there are distinct partitions.
    #[error("copy count {copies} exceeds partition count {partitions}")]
    TooManyCopies {
        /// Requested copies per chunk.
        copies: u32,
        /// Available partitions.
        partitions: u32,
    },
}

/// Check that `copies` distinct partitions can be drawn from `partitions`.
pub fn validate(partitions: u32, copies: u32) -> Result<(), PlacementError> {
    if partitions == 0 {
        return Err(PlacementError::NoPartitions);
    }
    if copies == 0 {
        return Err(PlacementError::NoCopies);
    }
    if copies > partitions {
        return Err(PlacementError::TooManyCopies { copies, partitions });
    }
    Ok(())
}
