// src/sources/jrnl.rs

//! jrnl journal importer.
//!
//! Entries are separated by blank lines. The first line of an entry starts
//! with a timestamp in `--time-format`, followed by the title; the remaining
//! lines are the body.

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, RawRecord};
use crate::pipeline::normalize::{DateEncoding, FieldTable, normalize};
use crate::registry::Platform;
use crate::sources::{ImportContext, Importer, RecordIter};

/// Options for the jrnl importer.
#[derive(Debug, Clone, Args)]
pub struct JrnlOptions {
    /// Journal file
    #[arg(long, default_value = "journal.txt")]
    pub file: PathBuf,

    /// Time format of the journal
    #[arg(long, default_value = "%Y-%m-%d %H:%M")]
    pub time_format: String,

    /// Output extension
    #[arg(long, default_value = "md")]
    pub extension: String,

    /// Output post layout
    #[arg(long, default_value = "post")]
    pub layout: String,
}

pub struct JrnlImporter {
    options: JrnlOptions,
    fields: FieldTable,
}

impl JrnlImporter {
    pub fn new(options: JrnlOptions) -> Self {
        let fields = FieldTable::new("title", "body")
            .date("date", DateEncoding::Format(options.time_format.clone()));
        Self { options, fields }
    }

    /// Width of a formatted timestamp at the head of an entry.
    fn date_length(&self) -> usize {
        Utc::now().format(&self.options.time_format).to_string().len()
    }
}

/// Split one journal entry into date, title and body fields.
pub fn parse_entry(entry: &str, date_length: usize) -> RawRecord {
    let mut lines = entry.lines();
    let head = lines.next().unwrap_or_default();
    let body = lines.collect::<Vec<_>>().join("\n");

    let split = head
        .char_indices()
        .nth(date_length)
        .map_or(head.len(), |(idx, _)| idx);
    let (date, title) = head.split_at(split);

    RawRecord::new()
        .with("date", date.trim())
        .with("title", title.trim())
        .with("body", body)
}

impl Importer for JrnlImporter {
    fn platform(&self) -> Platform {
        Platform::Jrnl
    }

    fn validate(&self) -> Result<()> {
        if self.options.time_format.trim().is_empty() {
            return Err(AppError::config("--time-format must not be empty"));
        }
        if self.options.extension.trim_start_matches('.').is_empty() {
            return Err(AppError::config("--extension must not be empty"));
        }
        Ok(())
    }

    fn open(&self, _ctx: &ImportContext<'_>) -> Result<RecordIter<'_>> {
        let file = &self.options.file;
        let input = std::fs::read_to_string(file)
            .map_err(|e| AppError::source_unavailable(file.display().to_string(), e))?;

        let date_length = self.date_length();
        let records: Vec<_> = input
            .split("\n\n")
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| Ok(parse_entry(entry.trim_start_matches('\n'), date_length)))
            .collect();
        Ok(Box::new(records.into_iter()))
    }

    fn normalize(&self, record: RawRecord) -> Result<Option<CanonicalPost>> {
        let post = normalize(&self.fields, &record)?.with_extra("layout", self.options.layout.as_str());
        Ok(Some(post))
    }

    fn extension(&self) -> &str {
        self.options.extension.trim_start_matches('.')
    }
}
