// src/sources/dotclear.rs

//! Dotclear importer.
//!
//! A Dotclear flat export is a list of sections separated by blank lines:
//!
//! ```text
//! [post post_id,post_creadt,post_title,...]
//! "1","2019-03-20 10:00:00","Hello",...
//!
//! [meta meta_id,meta_type,post_id]
//! "rust","tag","1"
//! ```
//!
//! Posts come from the `post` section, tags from `meta`. Files listed in the
//! `media` section are copied from the media folder into `assets/dotclear`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, RawRecord};
use crate::pipeline::ImportSummary;
use crate::pipeline::normalize::{DateEncoding, FieldTable, normalize};
use crate::registry::Platform;
use crate::sources::{ImportContext, Importer, RecordIter};

const ASSETS_DIR: &str = "assets/dotclear";
const IGNORED_SECTIONS: [&str; 4] = ["category", "comment", "link", "setting"];

type Row = HashMap<String, String>;

/// Options for the Dotclear importer.
#[derive(Debug, Clone, Args)]
pub struct DotclearOptions {
    /// Dotclear export file
    #[arg(long)]
    pub datafile: Option<PathBuf>,

    /// Dotclear media export folder (unpacked media.zip)
    #[arg(long)]
    pub mediafolder: Option<PathBuf>,
}

/// Undo Dotclear's backslash escaping inside a cell.
fn unescape(cell: &str) -> String {
    let mut out = String::with_capacity(cell.len());
    let mut chars = cell.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => {}
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn split_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('"').unwrap_or(line);
    let line = line.strip_suffix('"').unwrap_or(line);
    line.split("\",\"").map(unescape).collect()
}

/// Parsed export: section name → rows keyed by column name.
#[derive(Debug, Default)]
pub struct DotclearExport {
    sections: HashMap<String, Vec<Row>>,
}

impl DotclearExport {
    pub fn parse(text: &str) -> Self {
        let text = text.replace("\r\n", "\n");
        let mut sections = HashMap::new();

        for block in text.split("\n\n") {
            let mut block = block.trim_start_matches('\n');
            // Export signature line, e.g. `///DOTCLEAR|2.18|full`.
            if block.starts_with("///") {
                block = block.split_once('\n').map(|(_, rest)| rest).unwrap_or_default();
            }
            let Some(rest) = block.strip_prefix('[') else {
                continue;
            };
            let Some((header, rows)) = rest.split_once('\n') else {
                continue;
            };
            let Some((name, columns)) = header.trim_end_matches(']').split_once(' ') else {
                continue;
            };
            if IGNORED_SECTIONS.contains(&name) {
                continue;
            }

            let columns: Vec<&str> = columns.split(',').collect();
            let rows: Vec<Row> = rows
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|line| {
                    columns
                        .iter()
                        .map(|c| c.to_string())
                        .zip(split_row(line))
                        .collect()
                })
                .collect();
            sections.insert(name.to_string(), rows);
        }

        Self { sections }
    }

    pub fn section(&self, name: &str) -> &[Row] {
        self.sections.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Tags per post id, from `meta` rows of type `tag`.
    fn tags(&self) -> HashMap<String, Vec<String>> {
        let mut tags: HashMap<String, Vec<String>> = HashMap::new();
        for meta in self.section("meta") {
            if meta.get("meta_type").map(String::as_str) != Some("tag") {
                continue;
            }
            if let (Some(post_id), Some(tag)) = (meta.get("post_id"), meta.get("meta_id")) {
                tags.entry(post_id.clone()).or_default().push(tag.clone());
            }
        }
        tags
    }

    /// One raw record per post, with its tags attached.
    pub fn post_records(&self) -> Vec<RawRecord> {
        let tags = self.tags();
        self.section("post")
            .iter()
            .map(|row| {
                let mut record = RawRecord::new();
                for (key, value) in row {
                    record.insert(key.as_str(), value.as_str());
                }
                let post_tags = row
                    .get("post_id")
                    .and_then(|id| tags.get(id))
                    .cloned()
                    .unwrap_or_default();
                record.insert("tags", post_tags);
                record
            })
            .collect()
    }
}

pub struct DotclearImporter {
    options: DotclearOptions,
    fields: FieldTable,
}

impl DotclearImporter {
    pub fn new(options: DotclearOptions) -> Self {
        let fields = FieldTable::new("post_title", "post_content_xhtml")
            .id("post_id")
            .date("post_creadt", DateEncoding::Text)
            .tags("tags", "");
        Self { options, fields }
    }

    fn datafile(&self) -> PathBuf {
        self.options.datafile.clone().unwrap_or_default()
    }

    fn read_export(&self) -> Result<DotclearExport> {
        let path = self.datafile();
        let text = std::fs::read_to_string(&path)
            .map_err(|e| AppError::source_unavailable(path.display().to_string(), e))?;
        Ok(DotclearExport::parse(&text))
    }

    /// Copy the media listed in the export into `assets/dotclear`.
    fn import_assets(&self, ctx: &ImportContext<'_>, media_dir: &Path) -> Result<usize> {
        let export = self.read_export()?;
        let mut copied = 0;
        for media in export.section("media") {
            let Some(file) = media.get("media_file").filter(|f| !f.is_empty()) else {
                continue;
            };
            let from = media_dir.join(file);
            if !from.is_file() {
                log::warn!("Media file {} not found", from.display());
                continue;
            }
            let key = Path::new(ASSETS_DIR).join(file);
            ctx.storage.copy_file(&from, &key)?;
            log::debug!("Copied {} to {}", from.display(), key.display());
            copied += 1;
        }
        log::info!("Copied {} media files into {}", copied, ASSETS_DIR);
        Ok(copied)
    }
}

impl Importer for DotclearImporter {
    fn platform(&self) -> Platform {
        Platform::Dotclear
    }

    fn validate(&self) -> Result<()> {
        match &self.options.datafile {
            Some(path) if !path.as_os_str().is_empty() => {}
            _ => return Err(AppError::config("--datafile cannot be undefined, null or empty")),
        }
        if let Some(dir) = &self.options.mediafolder {
            if dir.as_os_str().is_empty() {
                return Err(AppError::config("--mediafolder cannot be empty"));
            }
        }
        Ok(())
    }

    fn open(&self, _ctx: &ImportContext<'_>) -> Result<RecordIter<'_>> {
        let export = self.read_export()?;
        if export.sections.is_empty() {
            return Err(AppError::source_unavailable(
                self.datafile().display().to_string(),
                "not a Dotclear export",
            ));
        }
        Ok(Box::new(export.post_records().into_iter().map(Ok)))
    }

    fn normalize(&self, mut record: RawRecord) -> Result<Option<CanonicalPost>> {
        let excerpt = record.text("post_excerpt_xhtml");
        let content = record.text("post_content_xhtml").unwrap_or_default();
        if let Some(excerpt) = &excerpt {
            if record.contains("post_content_xhtml") {
                record.insert("post_content_xhtml", format!("{excerpt}\n\n{content}"));
            }
        }

        let mut post = normalize(&self.fields, &record)?
            .with_extra_opt("lang", record.text("post_lang"))
            .with_extra_opt("original_url", record.text("post_url"))
            .with_extra_opt("excerpt", excerpt);
        if record.text("post_status").is_some_and(|s| s != "1") {
            post = post.with_extra("published", false);
        }

        Ok(Some(post))
    }

    fn extension(&self) -> &str {
        "html"
    }

    fn finish(&self, ctx: &ImportContext<'_>, _summary: &ImportSummary) -> Result<()> {
        match &self.options.mediafolder {
            Some(dir) if dir.is_dir() => {
                self.import_assets(ctx, dir)?;
            }
            Some(dir) => log::warn!("Media folder {} not found, skipping assets", dir.display()),
            None => {}
        }
        Ok(())
    }
}
