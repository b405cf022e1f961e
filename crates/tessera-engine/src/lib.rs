//! Layout generation pipeline for Tessera.
//!
//! The [`Materializer`] turns a directory of text files into a set of
//! numbered partitions holding replicated, line-aligned chunks, plus a JSON
//! manifest describing where every chunk went. [`audit_layout`] checks a
//! generated tree against that manifest.

pub mod audit;
pub mod error;
pub mod materializer;
pub mod walk;

pub use audit::{AuditReport, Violation, audit_layout, audit_store};
pub use error::EngineError;
pub use materializer::{GenerationReport, Materializer};
pub use walk::{SourceFile, collect_source_files, is_hidden};

#[cfg(test)]
mod tests;
