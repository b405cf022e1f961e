//! Filesystem materializer: the full generation pipeline.
//!
//! A run goes through three phases:
//!
//! 1. **Prepare**: validate the layout config and both roots, then walk the
//!    input tree. Nothing is written; any violation fails the whole run.
//! 2. **Build**: create the partitions, mirror every file's directory into
//!    each of them, then chunk each file and write every chunk to the
//!    partitions the selector picks for it.
//! 3. **Finish**: write the manifest, once, after every file succeeded.
//!
//! Failures during build are fatal and not rolled back: chunks already
//! written stay on disk and no manifest is produced.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use tessera_cas::{CasError, LineChunker, ManifestWriter};
use tessera_placement::{PlacementSelector, RandomSelector};
use tessera_store::{FileStore, PartitionStore};
use tessera_types::{ChunkRecord, FileRecord, LayoutConfig, Manifest};
use tokio::io::BufReader;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::walk::{SourceFile, collect_source_files};

/// Summary of a completed generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Number of input files chunked.
    pub files: usize,
    /// Number of chunks across all files.
    pub chunks: usize,
    /// Total bytes of source data.
    pub bytes: u64,
    /// Number of chunk copies written across all partitions.
    pub copies_written: usize,
    /// Location of the manifest document.
    pub manifest_path: PathBuf,
}

impl GenerationReport {
    fn new(manifest: &Manifest, manifest_path: PathBuf) -> Self {
        Self {
            files: manifest.len(),
            chunks: manifest.chunk_count(),
            bytes: manifest.total_size(),
            copies_written: manifest
                .files
                .iter()
                .flat_map(|f| &f.chunks)
                .map(|c| c.partitions.len())
                .sum(),
            manifest_path,
        }
    }
}

/// Builds a partitioned, replicated filesystem layout from an input tree.
pub struct Materializer {
    config: LayoutConfig,
    chunker: LineChunker,
    selector: Arc<dyn PlacementSelector>,
}

impl Materializer {
    /// Create a materializer using random placement.
    ///
    /// The RNG is seeded from `config.seed` when set, from the OS otherwise.
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_selector(config, Arc::new(RandomSelector::from_seed(config.seed)))
    }

    /// Create a materializer with an injected placement policy.
    pub fn with_selector(config: LayoutConfig, selector: Arc<dyn PlacementSelector>) -> Self {
        Self {
            config,
            chunker: LineChunker::new(config.chunk_size),
            selector,
        }
    }

    /// The layout parameters of this materializer.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Check the layout parameters on their own.
    pub fn validate_config(&self) -> Result<(), EngineError> {
        tessera_placement::validate(self.config.partitions, self.config.copies)?;
        if self.config.chunk_size == 0 {
            return Err(EngineError::InvalidChunkSize);
        }
        if self.config.concurrency == 0 {
            return Err(EngineError::InvalidConcurrency);
        }
        Ok(())
    }

    /// Generate a layout from `in_root` into the empty directory `out_root`.
    pub async fn generate(
        &self,
        in_root: &Path,
        out_root: &Path,
    ) -> Result<GenerationReport, EngineError> {
        info!(
            input = %in_root.display(),
            output = %out_root.display(),
            partitions = self.config.partitions,
            copies = self.config.copies,
            chunk_size = self.config.chunk_size,
            concurrency = self.config.concurrency,
            "starting generation"
        );

        let files = self.prepare(in_root, out_root).await?;

        let store = FileStore::new(out_root);
        let writer = self
            .build(&files, &store, ManifestWriter::new(out_root))
            .await?;
        let (manifest_path, manifest) = writer.finish().await?;

        let report = GenerationReport::new(&manifest, manifest_path);
        info!(
            files = report.files,
            chunks = report.chunks,
            bytes = report.bytes,
            copies_written = report.copies_written,
            "generation complete"
        );
        Ok(report)
    }

    /// Validate every precondition and collect the input files.
    ///
    /// Performs no filesystem mutation.
    pub async fn prepare(
        &self,
        in_root: &Path,
        out_root: &Path,
    ) -> Result<Vec<SourceFile>, EngineError> {
        if !is_dir(in_root).await? {
            return Err(EngineError::InputNotDirectory(in_root.to_path_buf()));
        }
        if !is_dir(out_root).await? {
            return Err(EngineError::OutputNotDirectory(out_root.to_path_buf()));
        }
        if tokio::fs::read_dir(out_root)
            .await?
            .next_entry()
            .await?
            .is_some()
        {
            return Err(EngineError::OutputNotEmpty(out_root.to_path_buf()));
        }
        self.validate_config()?;

        let input = tokio::fs::canonicalize(in_root).await?;
        let output = tokio::fs::canonicalize(out_root).await?;
        if output.starts_with(&input) {
            return Err(EngineError::OutputInsideInput { input, output });
        }

        let root = in_root.to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_source_files(&root))
            .await
            .map_err(std::io::Error::other)??;

        debug!(files = files.len(), "collected input files");
        Ok(files)
    }

    /// Lay out `files` into `store`, recording each file in `writer`.
    ///
    /// Mirrors every file before any chunk is written. Files are then placed
    /// up to `concurrency` at a time, and recorded in input order regardless
    /// of which finishes first.
    pub async fn build(
        &self,
        files: &[SourceFile],
        store: &dyn PartitionStore,
        writer: ManifestWriter,
    ) -> Result<ManifestWriter, EngineError> {
        self.validate_config()?;
        store.create_partitions(self.config.partitions).await?;
        info!(partitions = self.config.partitions, "created partitions");

        for file in files {
            store.mirror(&file.rel_path).await?;
        }
        info!(files = files.len(), "mirrored input tree");

        stream::iter(files)
            .map(|file| self.place_file(file, store))
            .buffered(self.config.concurrency)
            .try_fold(writer, |mut writer, record| async move {
                writer.record(record);
                Ok::<_, EngineError>(writer)
            })
            .await
    }

    /// Chunk one file and write each chunk to its selected partitions.
    async fn place_file(
        &self,
        file: &SourceFile,
        store: &dyn PartitionStore,
    ) -> Result<FileRecord, EngineError> {
        let source_err = |source: CasError| EngineError::Source {
            path: file.abs_path.clone(),
            source,
        };

        let handle = tokio::fs::File::open(&file.abs_path)
            .await
            .map_err(|e| source_err(e.into()))?;
        let mut reader = self.chunker.reader(BufReader::new(handle));
        let mut record = FileRecord::new(file.file_path.clone());

        while let Some(chunk) = reader.next_chunk().await.map_err(source_err)? {
            let partitions = self
                .selector
                .select(self.config.partitions, self.config.copies)?;

            for &partition in &partitions {
                store
                    .put_chunk(partition, &file.rel_path, chunk.sequence, chunk.data.clone())
                    .await?;
            }

            debug!(
                file_path = %file.file_path,
                sequence = chunk.sequence,
                size = chunk.size(),
                ?partitions,
                "placed chunk"
            );
            record.chunks.push(ChunkRecord {
                sequence: chunk.sequence,
                size: chunk.size(),
                partitions,
            });
        }

        debug!(
            file_path = %file.file_path,
            chunks = record.chunks.len(),
            "placed file"
        );
        Ok(record)
    }
}

async fn is_dir(path: &Path) -> Result<bool, EngineError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(EngineError::Io(e)),
    }
}
