// src/sources/s9y.rs

//! Serendipity (s9y) importer, reading the blog's public RSS feed.

use clap::Args;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, RawRecord};
use crate::pipeline::normalize::{DateEncoding, FieldTable, normalize};
use crate::registry::Platform;
use crate::sources::xml::ItemReader;
use crate::sources::{ImportContext, Importer, RecordIter};
use crate::utils::http::fetch_text;
use crate::utils::url::path_of;

/// Options for the Serendipity importer.
#[derive(Debug, Clone, Args)]
pub struct S9yOptions {
    /// URL of the s9y RSS feed, e.g. https://blog.example.com/feeds/index.rss2
    #[arg(long)]
    pub source: Option<String>,
}

pub struct S9yImporter {
    options: S9yOptions,
    fields: FieldTable,
}

impl S9yImporter {
    pub fn new(options: S9yOptions) -> Self {
        let fields = FieldTable::new("title", "content:encoded")
            .slug("link")
            .date("pubDate", DateEncoding::Text)
            .categories("category", ",")
            .source_url("link");
        Self { options, fields }
    }

    fn records(&self, source: &str, feed: String) -> Result<RecordIter<'_>> {
        Ok(Box::new(ItemReader::from_text(source, feed, "item")?))
    }
}

impl Importer for S9yImporter {
    fn platform(&self) -> Platform {
        Platform::S9y
    }

    fn validate(&self) -> Result<()> {
        let source = self
            .options
            .source
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::config("Missing mandatory option --source"))?;
        let url = Url::parse(source)
            .map_err(|e| AppError::config(format!("Invalid feed URL '{source}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::config(format!(
                "Invalid feed URL '{source}': expected http(s)"
            )));
        }
        Ok(())
    }

    fn open(&self, ctx: &ImportContext<'_>) -> Result<RecordIter<'_>> {
        let source = self.options.source.as_deref().unwrap_or_default();
        let client = ctx.http_client()?;
        let feed = fetch_text(&client, source)?;
        self.records(source, feed)
    }

    fn normalize(&self, mut record: RawRecord) -> Result<Option<CanonicalPost>> {
        if !record.contains("content:encoded") {
            if let Some(description) = record.get("description").cloned() {
                record.insert("content:encoded", description);
            }
        }
        if !record.contains("pubDate") {
            if let Some(date) = record.get("dc:date").cloned() {
                record.insert("pubDate", date);
            }
        }

        let mut post = normalize(&self.fields, &record)?;
        post.body = post.body.trim().to_string();
        if let Some(link) = record.text("link") {
            post = post
                .with_extra("permalink", path_of(&link))
                .with_extra("s9y_link", link);
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
    use crate::pipeline::write_post;
    use crate::storage::LocalStorage;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel>
  <title>My s9y blog</title>
  <item>
    <title>Spring cleaning</title>
    <link>https://blog.example.com/archives/42-Spring-Cleaning.html</link>
    <category>Home</category>
    <category>Garden</category>
    <pubDate>Sat, 20 Mar 2010 10:15:00 +0100</pubDate>
    <content:encoded><![CDATA[<p>Out with the old.</p>]]></content:encoded>
  </item>
  <item>
    <title>Teaser only</title>
    <link>https://blog.example.com/archives/43-Teaser.html</link>
    <description>short &amp; sweet</description>
  </item>
</channel>
</rss>"#;

    fn posts() -> Vec<CanonicalPost> {
        let importer = S9yImporter::new(S9yOptions {
            source: Some("https://blog.example.com/feeds/index.rss2".into()),
        });
        importer
            .records("index.rss2", FEED.to_string())
            .unwrap()
            .map(|record| importer.normalize(record.unwrap()).unwrap().unwrap())
            .collect()
    }

    #[test]
    fn test_items_become_posts() {
        let posts = posts();
        assert_eq!(posts.len(), 2);

        let first = &posts[0];
        assert_eq!(first.title, "Spring cleaning");
        assert_eq!(first.slug, "42-spring-cleaning");
        assert_eq!(first.body, "<p>Out with the old.</p>");
        assert!(first.categories.contains("Home") && first.categories.contains("Garden"));
        assert_eq!(
            first.published_at.unwrap().to_rfc3339(),
            "2010-03-20T10:15:00+01:00"
        );

        let second = &posts[1];
        assert_eq!(second.body, "short & sweet");
        assert!(second.published_at.is_none());
    }

    #[test]
    fn test_written_post_header() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let storage = LocalStorage::new(tmp.path());
        let post = posts().remove(0);

        let key = write_post(&storage, &config.output, &post, "html", true).unwrap();
        assert_eq!(key, PathBuf::from("_posts/2010-03-20-42-spring-cleaning.html"));

        let text = fs::read_to_string(tmp.path().join(&key)).unwrap();
        assert!(text.contains("permalink: /archives/42-Spring-Cleaning.html\n"));
        assert!(text.contains("s9y_link: https://blog.example.com/archives/42-Spring-Cleaning.html\n"));
        assert!(text.contains("categories:\n- Garden\n- Home\n"));
    }

    #[test]
    fn test_source_must_be_http_url() {
        let check = |source: Option<&str>| {
            S9yImporter::new(S9yOptions {
                source: source.map(str::to_string),
            })
            .validate()
        };
        assert!(check(Some("https://blog.example.com/feeds/index.rss2")).is_ok());
        assert!(matches!(check(None), Err(AppError::Config(_))));
        assert!(matches!(check(Some("feed.xml")), Err(AppError::Config(_))));
        assert!(matches!(check(Some("ftp://example.com/feed")), Err(AppError::Config(_))));
    }
}
