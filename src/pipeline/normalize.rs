// src/pipeline/normalize.rs

//! Field normalization: `RawRecord` → `CanonicalPost`.
//!
//! Each platform describes where its fields live with a [`FieldTable`];
//! the shared rules for titles, dates, slugs and term lists live here.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, FieldValue, PostKind, RawRecord};
use crate::utils::slug::{slug_from_permalink, slugify};

/// Title written when the source has none.
pub const PLACEHOLDER_TITLE: &str = "no title";

/// Slug used when neither title nor id yield one.
const FALLBACK_SLUG: &str = "untitled";

/// How a date field is encoded in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateEncoding {
    /// Seconds since the Unix epoch
    EpochSeconds,
    /// Milliseconds since the Unix epoch
    EpochMillis,
    /// Free text in one of the common formats
    Text,
    /// Text in a fixed strftime format
    Format(String),
}

/// Per-platform mapping from canonical fields to source field names.
#[derive(Debug, Clone)]
pub struct FieldTable {
    pub title: String,
    pub body: String,
    pub id: Option<String>,
    pub slug: Option<String>,
    pub date: Option<(String, DateEncoding)>,
    pub tags: Option<(String, String)>,
    pub categories: Option<(String, String)>,
    pub source_url: Option<String>,
}

impl FieldTable {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            id: None,
            slug: None,
            date: None,
            tags: None,
            categories: None,
            source_url: None,
        }
    }

    pub fn id(mut self, key: impl Into<String>) -> Self {
        self.id = Some(key.into());
        self
    }

    pub fn slug(mut self, key: impl Into<String>) -> Self {
        self.slug = Some(key.into());
        self
    }

    pub fn date(mut self, key: impl Into<String>, encoding: DateEncoding) -> Self {
        self.date = Some((key.into(), encoding));
        self
    }

    pub fn tags(mut self, key: impl Into<String>, delimiter: impl Into<String>) -> Self {
        self.tags = Some((key.into(), delimiter.into()));
        self
    }

    pub fn categories(mut self, key: impl Into<String>, delimiter: impl Into<String>) -> Self {
        self.categories = Some((key.into(), delimiter.into()));
        self
    }

    pub fn source_url(mut self, key: impl Into<String>) -> Self {
        self.source_url = Some(key.into());
        self
    }
}

/// Normalize a record through a field table.
///
/// Fails only when the title or body key is missing from the record
/// altogether; blank values are handled by the fallbacks.
pub fn normalize(table: &FieldTable, record: &RawRecord) -> Result<CanonicalPost> {
    let id = table.id.as_deref().and_then(|key| record.text(key));
    let label = id.clone().unwrap_or_else(|| "<unknown>".to_string());

    for key in [&table.title, &table.body] {
        if !record.contains(key) {
            return Err(AppError::malformed(&label, format!("missing field '{key}'")));
        }
    }

    let raw_title = record.text(&table.title);
    let title = raw_title
        .clone()
        .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string());

    let explicit_slug = table
        .slug
        .as_deref()
        .and_then(|key| record.text(key))
        .and_then(|value| explicit_slug(&value));
    let slug = derive_slug(explicit_slug, raw_title.as_deref(), id.as_deref());

    let published_at = table
        .date
        .as_ref()
        .and_then(|(key, encoding)| record.get(key).and_then(|v| parse_date(v, encoding)));

    let tags = table
        .tags
        .as_ref()
        .map(|(key, delim)| split_terms(record, key, delim))
        .unwrap_or_default();
    let categories = table
        .categories
        .as_ref()
        .map(|(key, delim)| split_terms(record, key, delim))
        .unwrap_or_default();

    let body = record
        .get(&table.body)
        .and_then(FieldValue::as_text)
        .unwrap_or_default();

    Ok(CanonicalPost {
        id,
        title,
        slug,
        published_at,
        kind: PostKind::Post,
        tags,
        categories,
        body,
        source_url: table.source_url.as_deref().and_then(|key| record.text(key)),
        extra_fields: BTreeMap::new(),
        extension: None,
    })
}

fn explicit_slug(value: &str) -> Option<String> {
    if value.contains('/') {
        slug_from_permalink(value)
    } else {
        Some(slugify(value)).filter(|s| !s.is_empty())
    }
}

/// Slug fallback chain: explicit alias, title, numeric id, `"untitled"`.
pub fn derive_slug(explicit: Option<String>, title: Option<&str>, id: Option<&str>) -> String {
    explicit
        .or_else(|| title.map(slugify).filter(|s| !s.is_empty()))
        .or_else(|| id.map(slugify).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| FALLBACK_SLUG.to_string())
}

/// Parse a field value into a timestamp. Unparseable values yield `None`.
pub fn parse_date(value: &FieldValue, encoding: &DateEncoding) -> Option<DateTime<FixedOffset>> {
    match value {
        FieldValue::DateTime(dt) => Some(*dt),
        FieldValue::Integer(n) => from_epoch(*n, encoding),
        FieldValue::Float(f) => from_epoch(*f as i64, encoding),
        FieldValue::Text(text) => {
            let text = text.trim();
            match encoding {
                DateEncoding::EpochSeconds | DateEncoding::EpochMillis => text
                    .parse::<i64>()
                    .ok()
                    .and_then(|n| from_epoch(n, encoding))
                    .or_else(|| parse_date_text(text)),
                DateEncoding::Format(format) => parse_with_format(text, format),
                DateEncoding::Text => parse_date_text(text),
            }
        }
        _ => None,
    }
}

fn from_epoch(value: i64, encoding: &DateEncoding) -> Option<DateTime<FixedOffset>> {
    let secs = match encoding {
        DateEncoding::EpochMillis => value.div_euclid(1000),
        _ => value,
    };
    DateTime::from_timestamp(secs, 0).map(|dt| dt.fixed_offset())
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%a, %d %b %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y", "%B %d, %Y"];

/// Parse free-form date text. Naive times are taken as UTC.
pub fn parse_date_text(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt);
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    let naive = text
        .strip_suffix(" GMT")
        .or_else(|| text.strip_suffix(" UTC"))
        .unwrap_or(text);
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc().fixed_offset());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(naive, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().fixed_offset());
        }
    }

    None
}

/// Parse text with a fixed strftime format, with or without an offset.
pub fn parse_with_format(text: &str, format: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_str(text, format) {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
        return Some(dt.and_utc().fixed_offset());
    }
    NaiveDate::parse_from_str(text, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().fixed_offset())
}

/// Collect a term set from a field. Text is split on `delimiter`; lists
/// are taken item by item.
pub fn split_terms(record: &RawRecord, key: &str, delimiter: &str) -> BTreeSet<String> {
    let items: Vec<String> = match record.get(key) {
        Some(FieldValue::List(items)) => items.clone(),
        Some(value) => match value.as_text() {
            Some(text) if delimiter.is_empty() => vec![text],
            Some(text) => text.split(delimiter).map(str::to_string).collect(),
            None => Vec::new(),
        },
        None => Vec::new(),
    };

    items
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn csv_table() -> FieldTable {
        FieldTable::new("title", "body")
            .slug("permalink")
            .date("published_at", DateEncoding::Text)
            .tags("tags", ",")
    }

    #[test]
    fn test_csv_row() {
        let record = RawRecord::new()
            .with("title", "My Title")
            .with("permalink", "/2015/05/05/hi.html")
            .with("body", "body text")
            .with("published_at", "2015-01-10");

        let post = normalize(&csv_table(), &record).unwrap();
        assert_eq!(post.title, "My Title");
        assert_eq!(post.slug, "hi");
        assert_eq!(post.body, "body text");
        let date = post.published_at.unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2015, 1, 10));
    }

    #[test]
    fn test_blank_title_gets_placeholder() {
        let record = RawRecord::new()
            .with("id", "42")
            .with("title", "   ")
            .with("body", "x");
        let post = normalize(&FieldTable::new("title", "body").id("id"), &record).unwrap();
        assert_eq!(post.title, PLACEHOLDER_TITLE);
        assert_eq!(post.slug, "42");
    }

    #[test]
    fn test_missing_structural_key_is_malformed() {
        let record = RawRecord::new().with("id", "9").with("title", "t");
        let err = normalize(&FieldTable::new("title", "body").id("id"), &record).unwrap_err();
        assert!(err.is_skippable());
        assert!(err.to_string().contains('9'));
    }

    #[test]
    fn test_unparseable_date_is_draft() {
        let record = RawRecord::new()
            .with("title", "t")
            .with("body", "b")
            .with("published_at", "sometime last year");
        let post = normalize(&csv_table(), &record).unwrap();
        assert!(post.is_draft());
    }

    #[test]
    fn test_slug_fallbacks() {
        assert_eq!(derive_slug(Some("alias".into()), Some("T"), Some("1")), "alias");
        assert_eq!(derive_slug(None, Some("Hello World"), Some("1")), "hello-world");
        assert_eq!(derive_slug(None, Some("???"), Some("17")), "17");
        assert_eq!(derive_slug(None, None, None), "untitled");
    }

    #[test]
    fn test_date_encodings() {
        let secs = parse_date(&FieldValue::Integer(1_420_848_000), &DateEncoding::EpochSeconds).unwrap();
        assert_eq!(secs.to_rfc3339(), "2015-01-10T00:00:00+00:00");

        let millis = parse_date(
            &FieldValue::Integer(1_420_848_000_000),
            &DateEncoding::EpochMillis,
        )
        .unwrap();
        assert_eq!(millis, secs);

        let rfc2822 = parse_date_text("Sat, 10 Jan 2015 00:00:00 +0000").unwrap();
        assert_eq!(rfc2822, secs);

        let offset = parse_date_text("2015-01-10 09:00:00 +0900").unwrap();
        assert_eq!(offset.with_timezone(&chrono::Utc), secs.with_timezone(&chrono::Utc));

        let gmt = parse_date_text("2013-07-06 16:27:23 GMT").unwrap();
        assert_eq!((gmt.hour(), gmt.minute()), (16, 27));
    }

    #[test]
    fn test_custom_format() {
        let date = parse_date(
            &FieldValue::from("2013-09-24 11:36"),
            &DateEncoding::Format("%Y-%m-%d %H:%M".into()),
        )
        .unwrap();
        assert_eq!((date.day(), date.hour(), date.minute()), (24, 11, 36));
    }

    #[test]
    fn test_split_terms_dedups_and_trims() {
        let record = RawRecord::new()
            .with("tags", "rust, blog,,rust ,  ")
            .with("cats", vec!["a".to_string(), "a".to_string(), " b ".to_string()]);

        let tags = split_terms(&record, "tags", ",");
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["blog", "rust"]);

        let cats = split_terms(&record, "cats", ",");
        assert_eq!(cats.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);

        assert!(split_terms(&record, "absent", ",").is_empty());
    }
}
