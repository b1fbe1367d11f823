//! Storage abstractions for post persistence.
//!
//! Documents are addressed by a path relative to the destination root,
//! e.g. `_posts/2015-01-10-hi.markdown`.

pub mod document;
pub mod local;

use std::path::{Path, PathBuf};

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for post storage backends.
pub trait PostStorage {
    /// Destination root all keys are relative to.
    fn root(&self) -> &Path;

    /// Write a document, replacing any existing file. Returns the full path.
    fn write_document(&self, key: &Path, contents: &str) -> Result<PathBuf>;

    /// Write raw bytes, e.g. a downloaded image.
    fn write_bytes(&self, key: &Path, bytes: &[u8]) -> Result<PathBuf>;

    fn exists(&self, key: &Path) -> bool;

    /// Read a document, `None` if it does not exist.
    fn read_document(&self, key: &Path) -> Result<Option<String>>;

    /// Relative keys of every file under a directory, sorted.
    fn list_documents(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Copy an external file into the destination.
    fn copy_file(&self, from: &Path, key: &Path) -> Result<PathBuf>;
}
