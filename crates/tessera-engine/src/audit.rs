//! Layout audit: check a generated output tree against its manifest.
//!
//! The audit never modifies the store. It collects every violation it finds
//! instead of stopping at the first one, so a damaged layout can be
//! diagnosed in a single pass.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use bytes::Bytes;
use tessera_store::{FileStore, PartitionStore};
use tessera_types::{Manifest, PartitionId, manifest_path};
use tracing::{debug, info, warn};

use crate::error::EngineError;

/// A single inconsistency between a manifest and the partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Partition directories are not numbered `1..=N` without gaps.
    PartitionGap {
        /// First missing partition number.
        missing: u32,
    },
    /// A file's directory is missing from a partition.
    NotMirrored {
        /// Manifest path of the file.
        file_path: String,
        /// Partition lacking the directory.
        partition: PartitionId,
    },
    /// Chunk sequence numbers are not `0, 1, 2, ...`.
    SequenceGap {
        /// Manifest path of the file.
        file_path: String,
        /// Sequence expected at this position.
        expected: u64,
        /// Sequence found instead.
        found: u64,
    },
    /// A chunk's partition list is empty, unsorted, duplicated, or out of range.
    BadPlacement {
        /// Manifest path of the file.
        file_path: String,
        /// Chunk sequence number.
        sequence: u64,
        /// The offending partition list.
        partitions: Vec<PartitionId>,
    },
    /// A chunk has a different number of copies than the rest of the layout.
    CopyCountMismatch {
        /// Manifest path of the file.
        file_path: String,
        /// Chunk sequence number.
        sequence: u64,
        /// Copy count of the first chunk in the manifest.
        expected: usize,
        /// Copy count of this chunk.
        found: usize,
    },
    /// A partition listed for a chunk holds no copy of it.
    MissingCopy {
        /// Manifest path of the file.
        file_path: String,
        /// Chunk sequence number.
        sequence: u64,
        /// Partition expected to hold the copy.
        partition: PartitionId,
    },
    /// A copy's length differs from the size recorded in the manifest.
    SizeMismatch {
        /// Manifest path of the file.
        file_path: String,
        /// Chunk sequence number.
        sequence: u64,
        /// Partition holding the copy.
        partition: PartitionId,
        /// Size in the manifest.
        expected: u64,
        /// Size on disk.
        found: u64,
    },
    /// Copies of the same chunk hold different bytes.
    CopyDivergence {
        /// Manifest path of the file.
        file_path: String,
        /// Chunk sequence number.
        sequence: u64,
        /// Partition whose copy differs from the first one.
        partition: PartitionId,
    },
    /// A partition holds a copy the manifest does not list there.
    UnexpectedCopy {
        /// Manifest path of the file.
        file_path: String,
        /// Sequence number of the stray copy.
        sequence: u64,
        /// Partition holding it.
        partition: PartitionId,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartitionGap { missing } => write!(f, "partition {missing} is missing"),
            Self::NotMirrored {
                file_path,
                partition,
            } => write!(f, "{file_path}: not mirrored into partition {partition}"),
            Self::SequenceGap {
                file_path,
                expected,
                found,
            } => write!(f, "{file_path}: expected chunk {expected}, found {found}"),
            Self::BadPlacement {
                file_path,
                sequence,
                partitions,
            } => write!(f, "{file_path}#{sequence}: invalid placement {partitions:?}"),
            Self::CopyCountMismatch {
                file_path,
                sequence,
                expected,
                found,
            } => write!(
                f,
                "{file_path}#{sequence}: {found} copies, expected {expected}"
            ),
            Self::MissingCopy {
                file_path,
                sequence,
                partition,
            } => write!(f, "{file_path}#{sequence}: no copy in partition {partition}"),
            Self::SizeMismatch {
                file_path,
                sequence,
                partition,
                expected,
                found,
            } => write!(
                f,
                "{file_path}#{sequence}: copy in partition {partition} is {found} bytes, expected {expected}"
            ),
            Self::CopyDivergence {
                file_path,
                sequence,
                partition,
            } => write!(
                f,
                "{file_path}#{sequence}: copy in partition {partition} differs from other copies"
            ),
            Self::UnexpectedCopy {
                file_path,
                sequence,
                partition,
            } => write!(
                f,
                "{file_path}#{sequence}: unlisted copy in partition {partition}"
            ),
        }
    }
}

/// Result of auditing a layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Number of partitions found.
    pub partitions: u32,
    /// Number of files in the manifest.
    pub files: usize,
    /// Number of chunks in the manifest.
    pub chunks: usize,
    /// Every inconsistency found.
    pub violations: Vec<Violation>,
}

impl AuditReport {
    /// Whether the layout matches its manifest exactly.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Audit the layout under `out_root` against its own manifest.
pub async fn audit_layout(out_root: &Path) -> Result<AuditReport, EngineError> {
    let manifest = tessera_cas::load_manifest(&manifest_path(out_root)).await?;

    let partitions = FileStore::new(out_root).partitions().await?;
    let highest = partitions.last().map_or(0, |p| p.get());
    let store = FileStore::with_partitions(out_root, highest);

    audit_store(&manifest, &store).await
}

/// Audit `store` against `manifest`.
pub async fn audit_store(
    manifest: &Manifest,
    store: &dyn PartitionStore,
) -> Result<AuditReport, EngineError> {
    let partitions = store.partitions().await?;
    let mut report = AuditReport {
        partitions: u32::try_from(partitions.len()).unwrap_or(u32::MAX),
        files: manifest.len(),
        chunks: manifest.chunk_count(),
        violations: Vec::new(),
    };

    if let Some(missing) = PartitionId::all(report.partitions)
        .zip(&partitions)
        .find(|(expected, found)| expected != *found)
        .map(|(expected, _)| expected.get())
    {
        report.violations.push(Violation::PartitionGap { missing });
    }

    // Copies may only live in partitions that actually exist.
    let present: BTreeSet<PartitionId> = partitions.iter().copied().collect();
    let expected_copies = manifest
        .files
        .iter()
        .flat_map(|f| f.chunks.first())
        .map(|c| c.partitions.len())
        .next();

    for file in &manifest.files {
        let rel_path = Path::new(&file.file_path);
        let mut listed: BTreeMap<PartitionId, BTreeSet<u64>> = partitions
            .iter()
            .map(|&p| (p, BTreeSet::new()))
            .collect();

        for &partition in &partitions {
            if !store.is_mirrored(partition, rel_path).await? {
                report.violations.push(Violation::NotMirrored {
                    file_path: file.file_path.clone(),
                    partition,
                });
            }
        }

        for (expected, chunk) in (0u64..).zip(&file.chunks) {
            if chunk.sequence != expected {
                report.violations.push(Violation::SequenceGap {
                    file_path: file.file_path.clone(),
                    expected,
                    found: chunk.sequence,
                });
            }

            let in_range = |p: &PartitionId| present.contains(p);
            let well_formed = !chunk.partitions.is_empty()
                && chunk.partitions.windows(2).all(|w| w[0] < w[1])
                && chunk.partitions.iter().all(in_range);
            if !well_formed {
                report.violations.push(Violation::BadPlacement {
                    file_path: file.file_path.clone(),
                    sequence: chunk.sequence,
                    partitions: chunk.partitions.clone(),
                });
            }

            if let Some(expected) = expected_copies
                && chunk.partitions.len() != expected
            {
                report.violations.push(Violation::CopyCountMismatch {
                    file_path: file.file_path.clone(),
                    sequence: chunk.sequence,
                    expected,
                    found: chunk.partitions.len(),
                });
            }

            let mut first: Option<Bytes> = None;
            for &partition in chunk.partitions.iter().filter(|p| in_range(p)) {
                listed.entry(partition).or_default().insert(chunk.sequence);

                let Some(data) = store.get_chunk(partition, rel_path, chunk.sequence).await?
                else {
                    report.violations.push(Violation::MissingCopy {
                        file_path: file.file_path.clone(),
                        sequence: chunk.sequence,
                        partition,
                    });
                    continue;
                };

                if data.len() as u64 != chunk.size {
                    report.violations.push(Violation::SizeMismatch {
                        file_path: file.file_path.clone(),
                        sequence: chunk.sequence,
                        partition,
                        expected: chunk.size,
                        found: data.len() as u64,
                    });
                }
                match &first {
                    Some(reference) if *reference != data => {
                        report.violations.push(Violation::CopyDivergence {
                            file_path: file.file_path.clone(),
                            sequence: chunk.sequence,
                            partition,
                        });
                    }
                    Some(_) => {}
                    None => first = Some(data),
                }
            }
        }

        for (&partition, expected) in &listed {
            let stored = match store.list_chunks(partition, rel_path).await {
                Ok(stored) => stored,
                // Already reported as not mirrored.
                Err(tessera_store::StoreError::NotMirrored { .. }) => continue,
                Err(e) => return Err(e.into()),
            };
            for sequence in stored.into_iter().filter(|s| !expected.contains(s)) {
                report.violations.push(Violation::UnexpectedCopy {
                    file_path: file.file_path.clone(),
                    sequence,
                    partition,
                });
            }
        }

        debug!(file_path = %file.file_path, chunks = file.chunks.len(), "audited file");
    }

    if report.is_clean() {
        info!(
            partitions = report.partitions,
            files = report.files,
            chunks = report.chunks,
            "layout is consistent"
        );
    } else {
        warn!(
            violations = report.violations.len(),
            "layout does not match manifest"
        );
    }
    Ok(report)
}
