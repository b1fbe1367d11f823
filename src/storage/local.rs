//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── _posts/               # Dated posts: YYYY-MM-DD-slug.ext
//! ├── _drafts/              # Undated posts
//! ├── _comments/            # Comments, when imported
//! ├── assets/               # Copied media
//! └── slug.ext              # Pages
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::storage::PostStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &Path) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::write(parent, e))?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    fn write_atomic(&self, key: &Path, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        self.ensure_dir(&path)?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let mut file = fs::File::create(&tmp).map_err(|e| AppError::write(&tmp, e))?;
        file.write_all(bytes).map_err(|e| AppError::write(&tmp, e))?;
        file.flush().map_err(|e| AppError::write(&tmp, e))?;
        drop(file);

        fs::rename(&tmp, &path).map_err(|e| AppError::write(&path, e))?;
        Ok(path)
    }
}

impl PostStorage for LocalStorage {
    fn root(&self) -> &Path {
        &self.root_dir
    }

    fn write_document(&self, key: &Path, contents: &str) -> Result<PathBuf> {
        let path = self.write_atomic(key, contents.as_bytes())?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    fn write_bytes(&self, key: &Path, bytes: &[u8]) -> Result<PathBuf> {
        self.write_atomic(key, bytes)
    }

    fn exists(&self, key: &Path) -> bool {
        self.path(key).exists()
    }

    fn read_document(&self, key: &Path) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    fn list_documents(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let full = self.path(dir);
        if !full.is_dir() {
            log::warn!("No {} directory found", full.display());
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in walkdir::WalkDir::new(&full).sort_by_file_name() {
            let entry = entry.map_err(|e| AppError::Io(e.into()))?;
            if entry.file_type().is_file() {
                if let Ok(rel) = entry.path().strip_prefix(&self.root_dir) {
                    keys.push(rel.to_path_buf());
                }
            }
        }
        Ok(keys)
    }

    fn copy_file(&self, from: &Path, key: &Path) -> Result<PathBuf> {
        let path = self.path(key);
        self.ensure_dir(&path)?;
        fs::copy(from, &path).map_err(|e| AppError::write(&path, e))?;
        Ok(path)
    }
}
