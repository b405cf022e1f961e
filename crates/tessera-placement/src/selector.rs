//! Placement selector trait and implementations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tessera_types::PartitionId;
use tracing::trace;

use crate::error::{PlacementError, validate};

/// Chooses the partitions that hold a copy of one chunk.
///
/// Implementations must return exactly `copies` distinct identifiers in
/// `1..=partitions`, sorted ascending. They take `&self` and must be
/// `Send + Sync` so one selector can serve concurrently placed files.
pub trait PlacementSelector: Send + Sync {
    /// Pick the partition set for the next chunk.
    fn select(&self, partitions: u32, copies: u32) -> Result<Vec<PartitionId>, PlacementError>;
}

/// Uniform random placement without replacement.
///
/// The RNG is guarded by a mutex, so concurrent callers draw from a single
/// sequence without racing.
pub struct RandomSelector {
    rng: Mutex<StdRng>,
}

impl RandomSelector {
    /// Create a selector seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Create a selector with a fixed seed for reproducible placement.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seeded when a seed is given, OS-seeded otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::new(),
        }
    }
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RandomSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomSelector").finish_non_exhaustive()
    }
}

impl PlacementSelector for RandomSelector {
    fn select(&self, partitions: u32, copies: u32) -> Result<Vec<PartitionId>, PlacementError> {
        validate(partitions, copies)?;

        let picked = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rand::seq::index::sample(&mut *rng, partitions as usize, copies as usize)
        };

        // Indices are 0-based and distinct; shift into the 1-based id space.
        let mut selected: Vec<PartitionId> = picked
            .into_iter()
            .filter_map(|i| PartitionId::new(i as u32 + 1))
            .collect();
        selected.sort_unstable();

        trace!(?selected, "selected partitions");
        Ok(selected)
    }
}

/// Deterministic placement that stripes consecutive chunks across partitions.
///
/// Call `n` places copies on partitions `n, n+1, ..` (mod `partitions`),
/// so a fresh selector puts the first chunk on `1..=copies`.
#[derive(Debug, Default)]
pub struct RoundRobinSelector {
    next: AtomicU64,
}

impl RoundRobinSelector {
    /// Create a selector starting at partition 1.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlacementSelector for RoundRobinSelector {
    fn select(&self, partitions: u32, copies: u32) -> Result<Vec<PartitionId>, PlacementError> {
        validate(partitions, copies)?;

        let start = self.next.fetch_add(1, Ordering::Relaxed) % u64::from(partitions);
        let mut selected: Vec<PartitionId> = (0..u64::from(copies))
            .filter_map(|i| PartitionId::new(((start + i) % u64::from(partitions)) as u32 + 1))
            .collect();
        selected.sort_unstable();
        Ok(selected)
    }
}
