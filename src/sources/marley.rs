// src/sources/marley.rs

//! Marley importer.
//!
//! Marley keeps each article in its own directory (`001-my-post/`) as a
//! plain-text file:
//!
//! ```text
//! # My post (24/12/2009)
//! One-line perex.
//!
//! Body in Markdown...
//! {{
//! tags: [a, b]
//! }}
//! ```

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use regex::Regex;
use serde_yaml::Mapping;
use walkdir::WalkDir;

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, RawRecord};
use crate::pipeline::normalize::{FieldTable, normalize};
use crate::registry::Platform;
use crate::sources::{ImportContext, Importer, RecordIter};

static META: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{\{\n(.*?)\n?\}\}\n?").unwrap());
static TITLE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s+\(([0-9/]+)\)$").unwrap());
static ORDER_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,4}-").unwrap());

/// Options for the Marley importer.
#[derive(Debug, Clone, Args)]
pub struct MarleyOptions {
    /// Marley data directory
    #[arg(long)]
    pub marley_data_dir: Option<PathBuf>,
}

/// Split an article into title, date, perex, body and metadata block.
fn parse_article(text: &str) -> RawRecord {
    let mut record = RawRecord::new();
    let content = match META.captures(text) {
        Some(caps) => {
            record.insert("meta", &caps[1]);
            META.replace(text, "").into_owned()
        }
        None => text.to_string(),
    };

    let mut lines: Vec<&str> = content.lines().collect();
    if let Some(index) = lines.iter().position(|line| line.starts_with('#')) {
        let heading = lines.remove(index).trim_start_matches('#').trim();
        match TITLE_DATE.captures(heading) {
            Some(caps) => {
                record.insert("title", &caps[1]);
                record.insert("date", &caps[2]);
            }
            None => record.insert("title", heading),
        }
    }
    if let Some(index) = lines
        .iter()
        .position(|line| !line.trim().is_empty() && !line.starts_with('#'))
    {
        record.insert("perex", lines.remove(index).trim());
    }
    record.insert("body", lines.join("\n").trim());
    record
}

/// Marley writes dates day first; ISO-style dates are accepted too.
fn parse_marley_date(text: &str) -> Option<NaiveDate> {
    ["%d/%m/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Post name: the article directory without its ordering prefix.
fn post_name(path: &Path) -> Option<String> {
    let dir = path.parent()?.file_name()?.to_string_lossy();
    let name = ORDER_PREFIX.replace(&dir, "").into_owned();
    (!name.is_empty()).then_some(name)
}

fn read_article(path: &Path) -> Result<RawRecord> {
    let name = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| AppError::malformed(&name, e))?;
    let mut record = parse_article(&text);
    record.insert("file", name.as_str());
    record.insert("name", post_name(path));
    if let Ok(modified) = path.metadata().and_then(|m| m.modified()) {
        let modified: DateTime<Utc> = modified.into();
        record.insert("mtime", modified.format("%Y-%m-%d").to_string());
    }
    Ok(record)
}

pub struct MarleyImporter {
    options: MarleyOptions,
    fields: FieldTable,
}

impl MarleyImporter {
    pub fn new(options: MarleyOptions) -> Self {
        let fields = FieldTable::new("title", "body").id("file").slug("name");
        Self { options, fields }
    }
}

impl Importer for MarleyImporter {
    fn platform(&self) -> Platform {
        Platform::Marley
    }

    fn validate(&self) -> Result<()> {
        match &self.options.marley_data_dir {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(()),
            _ => Err(AppError::config("Missing mandatory option --marley-data-dir")),
        }
    }

    fn open(&self, _ctx: &ImportContext<'_>) -> Result<RecordIter<'_>> {
        let dir = self.options.marley_data_dir.clone().unwrap_or_default();
        if !dir.is_dir() {
            return Err(AppError::source_unavailable(
                dir.display().to_string(),
                "marley dir not found",
            ));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(|e| AppError::source_unavailable(dir.display().to_string(), e))?;
            if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "txt") {
                files.push(entry.into_path());
            }
        }
        log::info!("Found {} articles in {}", files.len(), dir.display());
        Ok(Box::new(files.into_iter().map(|path| read_article(&path))))
    }

    fn normalize(&self, record: RawRecord) -> Result<Option<CanonicalPost>> {
        let file = record.text("file").unwrap_or_default();
        if record.text("title").is_none() {
            return Err(AppError::malformed(file, "no '#' title line"));
        }

        let mut post = normalize(&self.fields, &record)?;
        if let Some(perex) = record.text("perex") {
            post.body = format!("{}\n\n{}", perex, post.body);
        }

        let date = record
            .text("date")
            .as_deref()
            .and_then(parse_marley_date)
            .or_else(|| {
                record
                    .text("mtime")
                    .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
            });
        post.published_at = date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().fixed_offset());

        if let Some(meta) = record.text("meta") {
            let mapping: Mapping = serde_yaml::from_str(&meta)
                .map_err(|e| AppError::malformed(&file, format!("metadata block: {e}")))?;
            for (key, value) in mapping {
                if let Some(key) = key.as_str() {
                    post = post.with_extra(key, value);
                }
            }
        }
        Ok(Some(post.with_extra("layout", "post")))
    }

    fn extension(&self) -> &str {
        "markdown"
    }
}
