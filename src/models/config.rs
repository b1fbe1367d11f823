//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::PostKind;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Output layout settings
    #[serde(default)]
    pub output: OutputConfig,

    /// HTTP settings for remote sources
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::config("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::config("http.timeout_secs must be > 0"));
        }
        if self.output.dest_dir.as_os_str().is_empty() {
            return Err(AppError::config("output.dest_dir is empty"));
        }
        for (name, layout) in [
            ("output.post_layout", &self.output.post_layout),
            ("output.page_layout", &self.output.page_layout),
            ("output.comment_layout", &self.output.comment_layout),
        ] {
            if layout.trim().is_empty() {
                return Err(AppError::config(format!("{name} is empty")));
            }
        }
        Ok(())
    }
}

/// Where and how post files are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Site source directory that receives `_posts/`, `_drafts/`, ...
    #[serde(default = "defaults::dest_dir")]
    pub dest_dir: PathBuf,

    /// Layout name written for posts
    #[serde(default = "defaults::post_layout")]
    pub post_layout: String,

    /// Layout name written for pages
    #[serde(default = "defaults::page_layout")]
    pub page_layout: String,

    /// Layout name written for comments
    #[serde(default = "defaults::comment_layout")]
    pub comment_layout: String,
}

impl OutputConfig {
    /// Layout for a given content type.
    pub fn layout_for(&self, kind: PostKind) -> &str {
        match kind {
            PostKind::Post => &self.post_layout,
            PostKind::Page => &self.page_layout,
            PostKind::Comment => &self.comment_layout,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dest_dir: defaults::dest_dir(),
            post_layout: defaults::post_layout(),
            page_layout: defaults::page_layout(),
            comment_layout: defaults::comment_layout(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Output defaults
    pub fn dest_dir() -> PathBuf {
        PathBuf::from(".")
    }
    pub fn post_layout() -> String {
        "post".into()
    }
    pub fn page_layout() -> String {
        "page".into()
    }
    pub fn comment_layout() -> String {
        "comment".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; importer/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
}
