//! Chunk placement across partitions.
//!
//! A [`PlacementSelector`] picks which partitions hold a copy of each chunk.
//! The default policy, [`RandomSelector`], draws `copies` distinct partitions
//! uniformly at random without replacement; every call is independent, so two
//! chunks of the same file may land on disjoint or overlapping sets.
//!
//! The randomness source is injected: a selector is either seeded from the
//! OS or from an explicit seed for reproducible layouts.
//! [`RoundRobinSelector`] is a deterministic policy for tests and for
//! fixtures that need a predictable layout.

mod error;
mod selector;

pub use error::{PlacementError, validate};
pub use selector::{PlacementSelector, RandomSelector, RoundRobinSelector};
