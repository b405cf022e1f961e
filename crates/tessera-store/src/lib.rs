//! Partition storage trait and backend implementations.
//!
//! This crate defines the [`PartitionStore`] trait for laying out simulated
//! storage nodes and their chunk copies, along with these backends:
//!
//! - [`FileStore`]: one directory per partition under an output root.
//! - [`MemoryStore`]: in-memory layout backed by a `RwLock<BTreeMap>`.
//! - [`SlowStore`]: wrapper adding random IO latency, for concurrency tests.

mod error;
mod file_store;
mod memory_store;
mod slow_store;
mod traits;

pub use error::StoreError;
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use slow_store::SlowStore;
pub use traits::PartitionStore;
