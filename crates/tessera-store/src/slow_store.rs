//! Latency injection for partition stores.
//!
//! [`SlowStore`] delays the calls that move chunk data so that concurrently
//! placed files finish out of traversal order. Out of the box it adds no
//! delay and seeds its RNG with `0`. `write_latency` covers `mirror` and
//! `put_chunk`. `read_latency` covers `get_chunk`. Partition creation and
//! listing are never delayed.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tessera_types::PartitionId;

use crate::error::StoreError;
use crate::traits::PartitionStore;

/// Wraps another store and sleeps a random number of milliseconds, drawn
/// from the configured inclusive range, before each delayed call.
pub struct SlowStore {
    inner: Arc<dyn PartitionStore>,
    read_latency_ms: (u64, u64),
    write_latency_ms: (u64, u64),
    rng: Mutex<StdRng>,
}

impl SlowStore {
    /// No delay on any call until a latency range is set.
    pub fn new(inner: Arc<dyn PartitionStore>) -> Self {
        Self {
            inner,
            read_latency_ms: (0, 0),
            write_latency_ms: (0, 0),
            rng: Mutex::new(StdRng::seed_from_u64(0)),
        }
    }

    /// Delay for `get_chunk`, in milliseconds.
    pub fn read_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.read_latency_ms = (min_ms, max_ms);
        self
    }

    /// Delay for `mirror` and `put_chunk`, in milliseconds.
    pub fn write_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.write_latency_ms = (min_ms, max_ms);
        self
    }

    /// Replaces the default seed of `0`.
    pub fn seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// A range with `min >= max` always sleeps `max`.
    async fn delay(&self, range: (u64, u64)) {
        let (min, max) = range;

        if max == 0 {
            return;
        }

        let ms = if min >= max {
            max
        } else {
            self.rng
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .random_range(min..=max)
        };

        if ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait::async_trait]
impl PartitionStore for SlowStore {
    async fn create_partitions(&self, count: u32) -> Result<(), StoreError> {
        self.inner.create_partitions(count).await
    }

    async fn partitions(&self) -> Result<Vec<PartitionId>, StoreError> {
        self.inner.partitions().await
    }

    async fn mirror(&self, file_path: &Path) -> Result<(), StoreError> {
        self.delay(self.write_latency_ms).await;
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
        self.delay(self.write_latency_ms).await;
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
        self.delay(self.read_latency_ms).await;
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
