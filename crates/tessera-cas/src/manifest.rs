//! Manifest accumulation, serialization, and persistence.
//!
//! The manifest is a pretty-printed JSON array with one object per input
//! file, written exactly once to `<out>/manifest/fs-manifest.json` after
//! every file has been chunked and placed.

use std::path::{Path, PathBuf};

use tessera_types::{FileRecord, MANIFEST_DIR, Manifest, manifest_path};
use tracing::{debug, info};

use crate::error::CasError;

/// Accumulates file records during materialization and persists them once.
///
/// [`ManifestWriter::finish`] consumes the writer, so a manifest can only be
/// written a single time per run.
#[derive(Debug)]
pub struct ManifestWriter {
    out_root: PathBuf,
    manifest: Manifest,
}

impl ManifestWriter {
    /// Create an empty writer targeting the given output root.
    pub fn new(out_root: impl AsRef<Path>) -> Self {
        Self {
            out_root: out_root.as_ref().to_path_buf(),
            manifest: Manifest::new(),
        }
    }

    /// Append a completed file record.
    pub fn record(&mut self, record: FileRecord) {
        debug!(
            file_path = %record.file_path,
            chunks = record.chunks.len(),
            "recorded file in manifest"
        );
        self.manifest.push(record);
    }

    /// The records accumulated so far.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Serialize and write the manifest, returning its path and contents.
    pub async fn finish(self) -> Result<(PathBuf, Manifest), CasError> {
        let path = write_manifest(&self.out_root, &self.manifest).await?;
        Ok((path, self.manifest))
    }
}

/// Serialize a manifest to pretty-printed JSON bytes.
pub fn serialize_manifest(manifest: &Manifest) -> Result<Vec<u8>, CasError> {
    serde_json::to_vec_pretty(manifest).map_err(|e| CasError::Serialization(e.to_string()))
}

/// Deserialize a manifest from JSON bytes.
pub fn deserialize_manifest(bytes: &[u8]) -> Result<Manifest, CasError> {
    serde_json::from_slice(bytes).map_err(|e| CasError::Serialization(e.to_string()))
}

/// Write a manifest under `out_root`, creating the manifest directory.
///
/// Returns the path of the written document.
pub async fn write_manifest(out_root: &Path, manifest: &Manifest) -> Result<PathBuf, CasError> {
    let bytes = serialize_manifest(manifest)?;
    tokio::fs::create_dir_all(out_root.join(MANIFEST_DIR)).await?;

    let path = manifest_path(out_root);
    tokio::fs::write(&path, &bytes).await?;

    info!(
        path = %path.display(),
        files = manifest.len(),
        chunks = manifest.chunk_count(),
        "wrote manifest"
    );
    Ok(path)
}

/// Load a manifest document from disk.
pub async fn load_manifest(path: &Path) -> Result<Manifest, CasError> {
    let bytes = tokio::fs::read(path).await?;
    deserialize_manifest(&bytes)
}
