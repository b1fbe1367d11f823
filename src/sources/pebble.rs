// src/sources/pebble.rs

//! Pebble importer.
//!
//! Pebble stores one `<blogEntry>` XML file per post, spread over a
//! `YYYY/MM/DD/` directory tree. Every `*.xml` file except
//! `categories.xml` is one post.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use clap::Args;
use walkdir::WalkDir;

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, FieldValue, RawRecord};
use crate::pipeline::normalize::{DateEncoding, FieldTable, normalize, parse_date_text};
use crate::registry::Platform;
use crate::sources::xml::ItemReader;
use crate::sources::{ImportContext, Importer, RecordIter};
use crate::utils::html::html_to_text;

const ENTRY_TAG: &str = "blogEntry";
const CATEGORIES_FILE: &str = "categories.xml";

/// Options for the Pebble importer.
#[derive(Debug, Clone, Args)]
pub struct PebbleOptions {
    /// Pebble data directory
    #[arg(long)]
    pub directory: Option<PathBuf>,
}

/// Entry files under `dir`, in path order.
fn entry_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| AppError::source_unavailable(dir.display().to_string(), e))?;
        let path = entry.path();
        let is_entry = entry.file_type().is_file()
            && path.extension().is_some_and(|ext| ext == "xml")
            && path.file_name().is_some_and(|name| name != CATEGORIES_FILE);
        if is_entry {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Read the `<blogEntry>` of one file.
fn read_entry(path: &Path) -> Result<RawRecord> {
    let name = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| AppError::malformed(&name, e))?;
    let entry = ItemReader::from_text(&name, text, ENTRY_TAG)
        .and_then(|mut reader| reader.next().transpose())
        .map_err(|e| AppError::malformed(&name, e))?;
    entry.ok_or_else(|| AppError::malformed(&name, "no blogEntry element"))
}

/// Pebble dates look like `18 Jan 2007 08:32:11:454 GMT`.
fn parse_pebble_date(text: &str) -> Option<FieldValue> {
    let trimmed = text.trim();
    let naive = trimmed
        .rsplit_once(' ')
        .filter(|(_, zone)| zone.chars().all(|c| c.is_ascii_alphabetic()))
        .map(|(rest, _)| rest)
        .unwrap_or(trimmed);
    NaiveDateTime::parse_from_str(naive, "%d %b %Y %H:%M:%S:%3f")
        .map(|dt| dt.and_utc().fixed_offset())
        .ok()
        .or_else(|| parse_date_text(trimmed))
        .map(FieldValue::DateTime)
}

pub struct PebbleImporter {
    options: PebbleOptions,
    fields: FieldTable,
}

impl PebbleImporter {
    pub fn new(options: PebbleOptions) -> Self {
        let fields = FieldTable::new("title", "body")
            .id("id")
            .date("date", DateEncoding::Text)
            .tags("tags", ",")
            .categories("category", ",");
        Self { options, fields }
    }
}

impl Importer for PebbleImporter {
    fn platform(&self) -> Platform {
        Platform::Pebble
    }

    fn validate(&self) -> Result<()> {
        match &self.options.directory {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(()),
            _ => Err(AppError::config("Missing mandatory option --directory")),
        }
    }

    fn open(&self, _ctx: &ImportContext<'_>) -> Result<RecordIter<'_>> {
        let dir = self.options.directory.clone().unwrap_or_default();
        if !dir.is_dir() {
            return Err(AppError::source_unavailable(
                dir.display().to_string(),
                "not a directory",
            ));
        }
        let files = entry_files(&dir)?;
        log::info!("Found {} entry files in {}", files.len(), dir.display());
        Ok(Box::new(files.into_iter().map(|path| read_entry(&path))))
    }

    fn normalize(&self, mut record: RawRecord) -> Result<Option<CanonicalPost>> {
        if let Some(date) = record.text("date").as_deref().and_then(parse_pebble_date) {
            record.insert("date", date);
        }
        if let Some(body) = record.text("body") {
            record.insert("body", html_to_text(&body));
        }

        let post = normalize(&self.fields, &record)?.with_extra("render_with_liquid", false);
        Ok(Some(post))
    }

    fn extension(&self) -> &str {
        "html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;
    use crate::pipeline::run_import;
    use crate::storage::LocalStorage;
    use std::fs;
    use tempfile::TempDir;

    const ENTRY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<blogEntry>
  <title>Hello Pebble</title>
  <date>18 Jan 2007 08:32:11:454 GMT</date>
  <tags>java, blogging</tags>
  <category>/tech</category>
  <body>&lt;p&gt;First &lt;b&gt;entry&lt;/b&gt;&lt;/p&gt;
&lt;p&gt;Second paragraph&lt;/p&gt;</body>
</blogEntry>"#;

    fn setup() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let day = tmp.path().join("data/2007/01/18");
        fs::create_dir_all(&day).unwrap();
        fs::write(day.join("1169109131454.xml"), ENTRY).unwrap();
        fs::write(day.join("notes.txt"), "ignored").unwrap();
        fs::write(tmp.path().join("data/categories.xml"), "<categories/>").unwrap();
        fs::write(day.join("1169109999999.xml"), "<blogEntry><title>broken").unwrap();
        tmp
    }

    #[test]
    fn test_entry_files_skip_categories() {
        let tmp = setup();
        let files = entry_files(&tmp.path().join("data")).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.file_name().unwrap() != CATEGORIES_FILE));
    }

    #[test]
    fn test_parse_pebble_date() {
        let Some(FieldValue::DateTime(dt)) = parse_pebble_date("18 Jan 2007 08:32:11:454 GMT") else {
            panic!("date not parsed");
        };
        assert_eq!(dt.to_rfc3339(), "2007-01-18T08:32:11.454+00:00");
    }

    #[test]
    fn test_import_directory() {
        let tmp = setup();
        let config = Config::default();
        let storage = LocalStorage::new(tmp.path().join("site"));
        let ctx = ImportContext::new(&config, &storage);
        let importer = PebbleImporter::new(PebbleOptions {
            directory: Some(tmp.path().join("data")),
        });
        let summary = run_import(&importer, &ctx).unwrap();

        assert_eq!(
            summary.written,
            vec![PathBuf::from("_posts/2007-01-18-hello-pebble.html")]
        );
        assert_eq!(summary.skipped, 1);

        let text =
            fs::read_to_string(tmp.path().join("site/_posts/2007-01-18-hello-pebble.html")).unwrap();
        assert!(text.contains("tags:\n- blogging\n- java\n"));
        assert!(text.contains("categories:\n- /tech\n"));
        assert!(text.contains("render_with_liquid: false\n"));
        assert!(text.ends_with("\n\nFirst entry\nSecond paragraph\n"));
    }

    #[test]
    fn test_missing_directory() {
        let importer = PebbleImporter::new(PebbleOptions { directory: None });
        assert!(matches!(importer.validate(), Err(AppError::Config(_))));
    }
}
