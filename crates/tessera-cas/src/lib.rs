//! Line chunking and manifest handling.
//!
//! This crate provides:
//! - [`LineChunker`]: splits text into newline-aligned chunks of bounded size.
//! - [`ChunkReader`]: the same split, produced incrementally from an async reader.
//! - [`ManifestWriter`]: accumulates [`FileRecord`](tessera_types::FileRecord)s
//!   and writes the manifest document once at the end of a run.

mod chunker;
mod error;
mod manifest;

pub use chunker::{Chunk, ChunkReader, LineChunker};
pub use error::CasError;
pub use manifest::{
    ManifestWriter, deserialize_manifest, load_manifest, serialize_manifest, write_manifest,
};
