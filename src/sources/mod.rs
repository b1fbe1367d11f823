//! Source adapters, one per blogging platform.
//!
//! Every adapter implements [`Importer`]: it opens its origin as a lazy
//! sequence of [`RawRecord`]s and maps each record onto a
//! [`CanonicalPost`]. Path derivation and writing are shared by the
//! pipeline.

pub mod blogger;
pub mod csv;
pub mod dotclear;
#[cfg(feature = "sqlite")]
pub mod ghost;
pub mod google_reader;
pub mod jrnl;
pub mod marley;
pub mod pebble;
pub mod pluxml;
pub mod rss;
pub mod s9y;
pub mod tumblr;
pub mod wordpressdotcom;
mod xml;

use reqwest::blocking::Client;

use crate::error::Result;
use crate::models::{CanonicalPost, Config, RawRecord};
use crate::pipeline::ImportSummary;
use crate::registry::Platform;
use crate::storage::PostStorage;
use crate::utils::http::create_client;

/// Lazy, finite, non-restartable record sequence.
pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<RawRecord>> + 'a>;

/// Shared state handed to an importer for one run.
pub struct ImportContext<'a> {
    pub config: &'a Config,
    pub storage: &'a dyn PostStorage,
}

impl<'a> ImportContext<'a> {
    pub fn new(config: &'a Config, storage: &'a dyn PostStorage) -> Self {
        Self { config, storage }
    }

    /// Build the HTTP client for this run.
    pub fn http_client(&self) -> Result<Client> {
        create_client(&self.config.http)
    }
}

/// A platform importer.
pub trait Importer {
    fn platform(&self) -> Platform;

    /// Check options before any I/O happens.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Open the origin. Fails with `SourceUnavailable` when it cannot be
    /// read or is not the expected container format.
    fn open(&self, ctx: &ImportContext<'_>) -> Result<RecordIter<'_>>;

    /// Map a record onto a post. `Ok(None)` drops the record on purpose.
    fn normalize(&self, record: RawRecord) -> Result<Option<CanonicalPost>>;

    /// Default file extension, without the dot.
    fn extension(&self) -> &str;

    /// Whether documents get a front-matter header.
    fn front_matter(&self) -> bool {
        true
    }

    /// Hook run after every record was written.
    fn finish(&self, _ctx: &ImportContext<'_>, _summary: &ImportSummary) -> Result<()> {
        Ok(())
    }
}
