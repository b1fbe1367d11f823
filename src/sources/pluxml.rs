// src/sources/pluxml.rs

//! PluXml importer.
//!
//! PluXml keeps one XML `<document>` per article in its data directory. The
//! file name carries the metadata the document lacks:
//!
//! ```text
//! 0001.draft,001.001.201501021230.my-first-post.xml
//! ^id  ^status/categories   ^YYYYMMDDhhmm ^slug
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Args;

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, FieldValue, RawRecord};
use crate::pipeline::normalize::{FieldTable, normalize};
use crate::registry::Platform;
use crate::sources::xml::ItemReader;
use crate::sources::{ImportContext, Importer, RecordIter};

const DOCUMENT_TAG: &str = "document";

/// Options for the PluXml importer.
#[derive(Debug, Clone, Args)]
pub struct PluxmlOptions {
    /// PluXml article directory (data/articles)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Layout written to every post
    #[arg(long, default_value = "post")]
    pub layout: String,

    /// Add `render_with_liquid: false` to the front matter
    #[arg(long)]
    pub avoid_liquid: bool,
}

/// Metadata encoded in an article file name.
#[derive(Debug, PartialEq)]
struct ArticleName {
    slug: String,
    date: NaiveDate,
    draft: bool,
}

fn parse_file_name(stem: &str) -> Option<ArticleName> {
    let mut parts: Vec<&str> = stem.split('.').collect();
    let slug = parts.pop()?.to_string();
    let stamp = parts.pop()?;
    let date = NaiveDate::parse_from_str(stamp.get(..8)?, "%Y%m%d").ok()?;
    let draft = parts
        .get(1)
        .and_then(|status| status.split(',').next())
        .is_some_and(|first| first == "draft");
    Some(ArticleName { slug, date, draft })
}

/// Article files directly inside `dir`, in name order.
fn article_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let source = dir.display().to_string();
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| AppError::source_unavailable(&source, e))? {
        let path = entry.map_err(|e| AppError::source_unavailable(&source, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "xml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_article(path: &Path) -> Result<RawRecord> {
    let name = path.display().to_string();
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let article = parse_file_name(&stem)
        .ok_or_else(|| AppError::malformed(&name, "file name is not a PluXml article name"))?;

    let text = std::fs::read_to_string(path).map_err(|e| AppError::malformed(&name, e))?;
    let mut record = ItemReader::from_text(&name, text, DOCUMENT_TAG)
        .and_then(|mut reader| reader.next().transpose())
        .map_err(|e| AppError::malformed(&name, e))?
        .ok_or_else(|| AppError::malformed(&name, "no document element"))?;

    record.insert("file", name.as_str());
    record.insert("slug", article.slug);
    record.insert("draft", article.draft);
    record.insert("date", article.date.format("%Y-%m-%d").to_string());
    Ok(record)
}

pub struct PluxmlImporter {
    options: PluxmlOptions,
    fields: FieldTable,
}

impl PluxmlImporter {
    pub fn new(options: PluxmlOptions) -> Self {
        let fields = FieldTable::new("title", "content")
            .id("file")
            .slug("slug")
            .tags("tags", ",");
        Self { options, fields }
    }
}

impl Importer for PluxmlImporter {
    fn platform(&self) -> Platform {
        Platform::Pluxml
    }

    fn validate(&self) -> Result<()> {
        match &self.options.source {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(()),
            _ => Err(AppError::config("Missing mandatory option --source")),
        }
    }

    fn open(&self, _ctx: &ImportContext<'_>) -> Result<RecordIter<'_>> {
        let dir = self.options.source.clone().unwrap_or_default();
        if !dir.is_dir() {
            return Err(AppError::source_unavailable(
                dir.display().to_string(),
                "not a directory",
            ));
        }
        let files = article_files(&dir)?;
        log::info!("Found {} articles in {}", files.len(), dir.display());
        Ok(Box::new(files.into_iter().map(|path| read_article(&path))))
    }

    fn normalize(&self, record: RawRecord) -> Result<Option<CanonicalPost>> {
        let file = record.text("file").unwrap_or_default();
        if record.text("title").is_none() {
            return Err(AppError::malformed(file, "missing title"));
        }

        let mut post = normalize(&self.fields, &record)?;
        post.body = match record.text("chapo") {
            Some(chapo) => format!("{}\n{}", chapo, post.body),
            None => post.body,
        };

        let date = record.text("date").unwrap_or_default();
        if record.get("draft") != Some(&FieldValue::Bool(true)) {
            post.published_at = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc().fixed_offset());
        }

        post = post
            .with_extra("layout", self.options.layout.as_str())
            .with_extra("created_at", date.as_str())
            .with_extra("updated_at", date.as_str());
        if self.options.avoid_liquid {
            post = post.with_extra("render_with_liquid", false);
        }
        Ok(Some(post))
    }

    fn extension(&self) -> &str {
        "html"
    }
}
