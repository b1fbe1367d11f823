// src/pipeline/import.rs

//! Import pipeline: read → normalize → derive path → write.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{CanonicalPost, OutputConfig};
use crate::pipeline::filename::derive_path;
use crate::pipeline::links::LinkTable;
use crate::sources::{ImportContext, Importer};
use crate::storage::{PostStorage, document};

/// Outcome of one import run.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub platform: &'static str,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Written documents, relative to the destination root
    pub written: Vec<PathBuf>,
    /// Records dropped as malformed
    pub skipped: usize,
    /// Records the importer chose not to write (unpublished, wrong type, ...)
    pub filtered: usize,
    /// Original URL path → written file, for the link rewrite pass
    pub links: LinkTable,
}

impl ImportSummary {
    fn new(platform: &'static str) -> Self {
        let now = Utc::now();
        Self {
            platform,
            start_time: now,
            end_time: now,
            written: Vec::new(),
            skipped: 0,
            filtered: 0,
            links: LinkTable::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.skipped == 0 && self.filtered == 0
    }
}

/// Serialize a post and write it at its derived path.
///
/// Returns the path relative to the storage root.
pub fn write_post(
    storage: &dyn PostStorage,
    output: &OutputConfig,
    post: &CanonicalPost,
    extension: &str,
    front_matter: bool,
) -> Result<PathBuf> {
    let key = derive_path(post, extension);
    let contents = if front_matter {
        document::render(post, output.layout_for(post.kind))?
    } else {
        format!("{}\n", post.body.trim_end_matches('\n'))
    };
    storage.write_document(&key, &contents)?;
    Ok(key)
}

/// Run an importer to completion.
///
/// Malformed records are logged and skipped; any other error aborts.
pub fn run_import(importer: &dyn Importer, ctx: &ImportContext<'_>) -> Result<ImportSummary> {
    let platform = importer.platform().name();
    let mut summary = ImportSummary::new(platform);

    importer.validate()?;
    log::info!("Importing from {} into {}", platform, ctx.storage.root().display());

    let records = importer.open(ctx)?;
    for (index, record) in records.enumerate() {
        match record.and_then(|record| importer.normalize(record)) {
            Ok(Some(post)) => {
                let key = write_post(
                    ctx.storage,
                    &ctx.config.output,
                    &post,
                    post.extension.as_deref().unwrap_or(importer.extension()),
                    importer.front_matter(),
                )?;
                log::debug!("Record {} -> {}", index, key.display());
                if let Some(url) = &post.source_url {
                    summary.links.insert(url, &key);
                }
                summary.written.push(key);
            }
            Ok(None) => summary.filtered += 1,
            Err(e) if e.is_skippable() => {
                log::warn!("Skipping record {}: {}", index, e);
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if summary.is_empty() {
        log::info!("No posts found in {} source", platform);
    }

    importer.finish(ctx, &summary)?;
    summary.end_time = Utc::now();

    log::info!(
        "Imported {} posts from {} ({} skipped, {} filtered) in {}ms",
        summary.written.len(),
        platform,
        summary.skipped,
        summary.filtered,
        (summary.end_time - summary.start_time).num_milliseconds()
    );

    Ok(summary)
}
