// src/sources/csv.rs

//! CSV importer.
//!
//! One post per row, columns in order: title, permalink, body,
//! published_at, filter. The filter column doubles as the file extension.

use std::path::PathBuf;

use clap::Args;

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, RawRecord};
use crate::pipeline::normalize::{DateEncoding, FieldTable, normalize};
use crate::registry::Platform;
use crate::sources::{ImportContext, Importer, RecordIter};

const COLUMNS: [&str; 5] = ["title", "permalink", "body", "published_at", "filter"];

/// Options for the CSV importer.
#[derive(Debug, Clone, Args)]
pub struct CsvOptions {
    /// The CSV file to import
    #[arg(long, default_value = "posts.csv")]
    pub file: PathBuf,

    /// Do not add front matter to the post body
    #[arg(long)]
    pub no_front_matter: bool,
}

pub struct CsvImporter {
    options: CsvOptions,
    fields: FieldTable,
}

impl CsvImporter {
    pub fn new(options: CsvOptions) -> Self {
        let fields = FieldTable::new("title", "body")
            .slug("permalink")
            .date("published_at", DateEncoding::Text);
        Self { options, fields }
    }
}

fn row_to_record(index: usize, row: &::csv::StringRecord) -> Option<RawRecord> {
    // Only the first row may be a header.
    if index == 0 && row.get(0).is_some_and(|c| c.trim() == "title") {
        return None;
    }
    let mut record = RawRecord::new();
    for (name, cell) in COLUMNS.iter().zip(row.iter()) {
        record.insert(*name, cell);
    }
    Some(record)
}

impl Importer for CsvImporter {
    fn platform(&self) -> Platform {
        Platform::Csv
    }

    fn validate(&self) -> Result<()> {
        if self.options.file.as_os_str().is_empty() {
            return Err(AppError::config("--file must not be empty"));
        }
        Ok(())
    }

    fn open(&self, _ctx: &ImportContext<'_>) -> Result<RecordIter<'_>> {
        let file = self.options.file.display().to_string();
        let reader = ::csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.options.file)
            .map_err(|e| AppError::source_unavailable(&file, e))?;

        let rows = reader.into_records().enumerate().filter_map(move |(index, row)| match row {
            Ok(row) => row_to_record(index, &row).map(Ok),
            Err(e) if e.is_io_error() => Some(Err(AppError::source_unavailable(&file, e))),
            Err(e) => Some(Err(AppError::malformed(format!("row {}", index + 1), e))),
        });
        Ok(Box::new(rows))
    }

    fn normalize(&self, record: RawRecord) -> Result<Option<CanonicalPost>> {
        let mut post = normalize(&self.fields, &record)?;
        if let Some(permalink) = record.text("permalink") {
            post = post.with_extra("permalink", permalink);
        }
        if let Some(filter) = record.text("filter") {
            post = post.with_extension(filter);
        }
        Ok(Some(post))
    }

    fn extension(&self) -> &str {
        "markdown"
    }

    fn front_matter(&self) -> bool {
        !self.options.no_front_matter
    }
}
