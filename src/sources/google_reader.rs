// src/sources/google_reader.rs

//! Google Reader importer.
//!
//! Reads the Atom feed Google Reader exported for shared or starred items.
//! Entries without a title or a parseable publication date are dropped.

use std::path::PathBuf;

use clap::Args;

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, FieldValue, RawRecord};
use crate::pipeline::normalize::{DateEncoding, FieldTable, normalize};
use crate::registry::Platform;
use crate::sources::xml::ItemReader;
use crate::sources::{ImportContext, Importer, RecordIter};

/// Options for the Google Reader importer.
#[derive(Debug, Clone, Args)]
pub struct GoogleReaderOptions {
    /// Atom XML file of the Google Reader export
    #[arg(long)]
    pub source: Option<PathBuf>,
}

pub struct GoogleReaderImporter {
    options: GoogleReaderOptions,
    fields: FieldTable,
}

impl GoogleReaderImporter {
    pub fn new(options: GoogleReaderOptions) -> Self {
        let fields = FieldTable::new("title", "content")
            .date("published", DateEncoding::Text)
            .source_url("link@href");
        Self { options, fields }
    }
}

impl Importer for GoogleReaderImporter {
    fn platform(&self) -> Platform {
        Platform::GoogleReader
    }

    fn validate(&self) -> Result<()> {
        match &self.options.source {
            Some(source) if !source.as_os_str().is_empty() => Ok(()),
            _ => Err(AppError::config("Missing mandatory option --source")),
        }
    }

    fn open(&self, _ctx: &ImportContext<'_>) -> Result<RecordIter<'_>> {
        let source = self.options.source.clone().unwrap_or_default();
        let name = source.display().to_string();
        let text =
            std::fs::read_to_string(&source).map_err(|e| AppError::source_unavailable(&name, e))?;
        Ok(Box::new(ItemReader::from_text(&name, text, "entry")?))
    }

    fn normalize(&self, mut record: RawRecord) -> Result<Option<CanonicalPost>> {
        if record.text("title").is_none() {
            log::debug!("Dropping entry without a title");
            return Ok(None);
        }
        // Entries that carry only a summary still import.
        if !record.contains("content") {
            let summary = record.get("summary").cloned().unwrap_or(FieldValue::Null);
            record.insert("content", summary);
        }

        let post = normalize(&self.fields, &record)?;
        if post.published_at.is_none() {
            log::debug!("Dropping '{}': no publication date", post.title);
            return Ok(None);
        }
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

    const EXPORT: &str = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Shared items</title>
  <entry>
    <title type="html">Reading list: Rust &amp; more</title>
    <published>2010-06-15T09:30:00Z</published>
    <link rel="alternate" href="http://example.com/reading-list"/>
    <content type="html">&lt;p&gt;Worth a read.&lt;/p&gt;</content>
  </entry>
  <entry>
    <title></title>
    <published>2010-06-16T09:30:00Z</published>
    <content type="html">untitled</content>
  </entry>
  <entry>
    <title>No date</title>
    <content type="html">undated</content>
  </entry>
  <entry>
    <title>Summary only</title>
    <published>2010-06-17T10:00:00Z</published>
    <summary>short</summary>
  </entry>
</feed>"#;

    fn import(tmp: &TempDir) -> crate::pipeline::ImportSummary {
        let source = tmp.path().join("reader.xml");
        fs::write(&source, EXPORT).unwrap();

        let config = Config::default();
        let storage = LocalStorage::new(tmp.path().join("site"));
        let ctx = ImportContext::new(&config, &storage);
        let importer = GoogleReaderImporter::new(GoogleReaderOptions {
            source: Some(source),
        });
        run_import(&importer, &ctx).unwrap()
    }

    #[test]
    fn test_import_entries() {
        let tmp = TempDir::new().unwrap();
        let summary = import(&tmp);

        assert_eq!(
            summary.written,
            vec![
                PathBuf::from("_posts/2010-06-15-reading-list-rust-more.html"),
                PathBuf::from("_posts/2010-06-17-summary-only.html"),
            ]
        );
        assert_eq!(summary.filtered, 2);

        let text = fs::read_to_string(
            tmp.path().join("site/_posts/2010-06-15-reading-list-rust-more.html"),
        )
        .unwrap();
        assert!(text.contains("Reading list: Rust & more"));
        assert!(text.ends_with("---\n\n<p>Worth a read.</p>\n"));
    }

    #[test]
    fn test_source_is_mandatory() {
        let importer = GoogleReaderImporter::new(GoogleReaderOptions { source: None });
        assert!(matches!(importer.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_non_xml_source_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("reader.xml");
        fs::write(&source, "not xml").unwrap();

        let config = Config::default();
        let storage = LocalStorage::new(tmp.path());
        let ctx = ImportContext::new(&config, &storage);
        let importer = GoogleReaderImporter::new(GoogleReaderOptions {
            source: Some(source),
        });
        assert!(matches!(
            importer.open(&ctx).err(),
            Some(AppError::SourceUnavailable { .. })
        ));
    }
}
