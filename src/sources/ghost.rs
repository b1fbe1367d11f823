// src/sources/ghost.rs

//! Ghost importer, reading posts straight from a Ghost SQLite database.

use std::path::PathBuf;

use clap::Args;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags};

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, FieldValue, PostKind, RawRecord};
use crate::pipeline::normalize::{DateEncoding, FieldTable, normalize, parse_date};
use crate::registry::Platform;
use crate::sources::{ImportContext, Importer, RecordIter};
use crate::storage::document::DATE_FORMAT;

const QUERY: &str =
    "SELECT title, slug, markdown, created_at, published_at, status, page FROM posts";

/// Options for the Ghost importer.
#[derive(Debug, Clone, Args)]
pub struct GhostOptions {
    /// Ghost SQLite database file
    #[arg(long, default_value = "ghost.db")]
    pub dbfile: PathBuf,
}

fn field_value(value: SqlValue) -> FieldValue {
    match value {
        SqlValue::Null => FieldValue::Null,
        SqlValue::Integer(n) => FieldValue::Integer(n),
        SqlValue::Real(f) => FieldValue::Float(f),
        SqlValue::Text(s) => FieldValue::Text(s),
        SqlValue::Blob(b) => FieldValue::Text(String::from_utf8_lossy(&b).into_owned()),
    }
}

/// Read every row of the posts table. The connection is closed on return.
fn read_posts(path: &PathBuf) -> Result<Vec<RawRecord>> {
    let source = path.display().to_string();
    let unavailable = |e: rusqlite::Error| AppError::source_unavailable(&source, e);

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(unavailable)?;
    let mut stmt = conn.prepare(QUERY).map_err(unavailable)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let rows = stmt
        .query_map([], |row| {
            let mut record = RawRecord::new();
            for (index, name) in columns.iter().enumerate() {
                record.insert(name.as_str(), field_value(row.get::<_, SqlValue>(index)?));
            }
            Ok(record)
        })
        .map_err(unavailable)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row.map_err(unavailable)?);
    }
    Ok(records)
}

fn is_page(record: &RawRecord) -> bool {
    match record.get("page") {
        Some(FieldValue::Integer(n)) => *n != 0,
        Some(FieldValue::Bool(b)) => *b,
        Some(FieldValue::Text(s)) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    }
}

pub struct GhostImporter {
    options: GhostOptions,
    fields: FieldTable,
}

impl GhostImporter {
    pub fn new(options: GhostOptions) -> Self {
        let fields = FieldTable::new("title", "markdown").slug("slug");
        Self { options, fields }
    }
}

impl Importer for GhostImporter {
    fn platform(&self) -> Platform {
        Platform::Ghost
    }

    fn validate(&self) -> Result<()> {
        if self.options.dbfile.as_os_str().is_empty() {
            return Err(AppError::config("--dbfile must not be empty"));
        }
        Ok(())
    }

    fn open(&self, _ctx: &ImportContext<'_>) -> Result<RecordIter<'_>> {
        if !self.options.dbfile.is_file() {
            return Err(AppError::source_unavailable(
                self.options.dbfile.display().to_string(),
                "database file not found",
            ));
        }
        let records = read_posts(&self.options.dbfile)?;
        log::info!("Read {} rows from {}", records.len(), self.options.dbfile.display());
        Ok(Box::new(records.into_iter().map(Ok)))
    }

    fn normalize(&self, record: RawRecord) -> Result<Option<CanonicalPost>> {
        let draft = record.text("status").as_deref() == Some("draft");
        let date_key = if draft { "created_at" } else { "published_at" };
        let date = record
            .get(date_key)
            .and_then(|v| parse_date(v, &DateEncoding::EpochMillis));

        let mut post = normalize(&self.fields, &record)?;
        post.published_at = None;

        if is_page(&record) {
            post = post.with_kind(PostKind::Page);
            if draft {
                post = post.with_extra("published", false);
            } else {
                post.published_at = date;
            }
        } else if draft {
            // Drafts keep their creation time in the header only.
            post = post.with_extra_opt("date", date.map(|d| d.format(DATE_FORMAT).to_string()));
        } else {
            post.published_at = date;
        }

        Ok(Some(post))
    }

    fn extension(&self) -> &str {
        "markdown"
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

    fn create_db(path: &std::path::Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE posts (
                id INTEGER PRIMARY KEY,
                title TEXT, slug TEXT, markdown TEXT,
                created_at INTEGER, published_at INTEGER,
                status TEXT, page INTEGER
            );
            INSERT INTO posts (title, slug, markdown, created_at, published_at, status, page) VALUES
                ('Welcome to Ghost', 'welcome-to-ghost', 'You''re live!', 1388534400000, 1388620800000, 'published', 0),
                ('Work in progress', 'wip', 'not yet', 1391212800000, NULL, 'draft', 0),
                ('About', 'about', 'me', 1388534400000, 1388534400000, 'published', 1),
                ('Secret page', 'secret', 'shh', 1388534400000, NULL, 'draft', 1);",
        )
        .unwrap();
    }

    fn import() -> (TempDir, Vec<PathBuf>) {
        let tmp = TempDir::new().unwrap();
        let db = tmp.path().join("ghost.db");
        create_db(&db);

        let config = Config::default();
        let storage = LocalStorage::new(tmp.path().join("site"));
        let ctx = ImportContext::new(&config, &storage);
        let importer = GhostImporter::new(GhostOptions { dbfile: db });
        let summary = run_import(&importer, &ctx).unwrap();
        (tmp, summary.written)
    }

    #[test]
    fn test_posts_drafts_and_pages() {
        let (tmp, written) = import();
        assert_eq!(
            written,
            vec![
                PathBuf::from("_posts/2014-01-02-welcome-to-ghost.markdown"),
                PathBuf::from("_drafts/wip.markdown"),
                PathBuf::from("about.markdown"),
                PathBuf::from("secret.markdown"),
            ]
        );

        let site = tmp.path().join("site");
        let post = fs::read_to_string(site.join("_posts/2014-01-02-welcome-to-ghost.markdown")).unwrap();
        assert!(post.contains("layout: post\n"));
        assert!(post.contains("date: 2014-01-02 00:00:00 +0000\n"));
        assert!(post.ends_with("You're live!\n"));

        let draft = fs::read_to_string(site.join("_drafts/wip.markdown")).unwrap();
        assert!(draft.contains("date: 2014-02-01 00:00:00 +0000\n"));

        let page = fs::read_to_string(site.join("about.markdown")).unwrap();
        assert!(page.contains("layout: page\n"));

        let secret = fs::read_to_string(site.join("secret.markdown")).unwrap();
        assert!(secret.contains("published: false\n"));
        assert!(!secret.contains("date:"));
    }

    #[test]
    fn test_missing_database_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let storage = LocalStorage::new(tmp.path());
        let ctx = ImportContext::new(&config, &storage);
        let importer = GhostImporter::new(GhostOptions {
            dbfile: tmp.path().join("missing.db"),
        });
        assert!(matches!(
            run_import(&importer, &ctx),
            Err(AppError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_not_a_database_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let db = tmp.path().join("ghost.db");
        fs::write(&db, "this is not sqlite at all, just some text padding it out").unwrap();

        let config = Config::default();
        let storage = LocalStorage::new(tmp.path());
        let ctx = ImportContext::new(&config, &storage);
        let importer = GhostImporter::new(GhostOptions { dbfile: db });
        assert!(matches!(
            run_import(&importer, &ctx),
            Err(AppError::SourceUnavailable { .. })
        ));
    }
}
