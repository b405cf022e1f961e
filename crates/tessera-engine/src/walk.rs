//! Input tree traversal.
//!
//! Collects the regular files under an input root in a deterministic order
//! (sorted by name at each level), skipping hidden entries. A hidden entry
//! is any path component below the root that starts with `.`; hidden
//! directories are not descended into.

use std::path::{Path, PathBuf};

use tessera_types::HIDDEN_PREFIX;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::error::EngineError;

/// An eligible input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path on disk.
    pub abs_path: PathBuf,
    /// Path relative to the input root.
    pub rel_path: PathBuf,
    /// `rel_path` as recorded in the manifest.
    pub file_path: String,
}

/// Whether any component of a relative path is hidden.
pub fn is_hidden(rel_path: &Path) -> bool {
    rel_path
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with(HIDDEN_PREFIX))
}

fn is_hidden_entry(entry: &DirEntry) -> bool {
    // The root itself may live in a hidden directory (e.g. a temp dir).
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with(HIDDEN_PREFIX)
}

/// Regular files and symlinks to regular files are chunked; anything else
/// (sockets, FIFOs, dangling links) is skipped.
fn is_regular_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }
    file_type.is_symlink() && std::fs::metadata(entry.path()).is_ok_and(|m| m.is_file())
}

/// Collect every eligible file under `root`, in traversal order.
///
/// Blocking; callers on an async runtime should use `spawn_blocking`.
pub fn collect_source_files(root: &Path) -> Result<Vec<SourceFile>, EngineError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden_entry(e));

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        if !is_regular_file(&entry) {
            warn!(path = %entry.path().display(), "skipping non-regular file");
            continue;
        }

        let rel_path = entry
            .path()
            .strip_prefix(root)
            .map_err(std::io::Error::other)?
            .to_path_buf();
        let file_path = rel_path
            .to_str()
            .ok_or_else(|| EngineError::NonUtf8Path(rel_path.clone()))?
            .to_string();

        files.push(SourceFile {
            abs_path: entry.into_path(),
            rel_path,
            file_path,
        });
    }

    Ok(files)
}
