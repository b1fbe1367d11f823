// src/error.rs

//! Unified error handling for the importer.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for importer operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Required option missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Origin could not be opened, reached or parsed
    #[error("Source unavailable ({source_name}): {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    /// A record is missing a structural field
    #[error("Malformed record {id}: {message}")]
    MalformedRecord { id: String, message: String },

    /// Filesystem failure while writing output
    #[error("Write error for {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Internal link points at a post that was never written
    #[error("Could not find a written post for {0}")]
    LinkNotFound(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML front matter serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV reading failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// XML parsing failed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// SQLite query failed
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Regex compilation failed
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a source-unavailable error.
    pub fn source_unavailable(source_name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Create a malformed-record error.
    pub fn malformed(id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MalformedRecord {
            id: id.into(),
            message: message.to_string(),
        }
    }

    /// Create a write error for the given path.
    pub fn write(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether the pipeline may skip the offending record and keep going.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}
