// src/sources/rss.rs

//! RSS 2.0 importer, and the Medium importer built on top of it.

use clap::Args;

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, RawRecord};
use crate::pipeline::normalize::{DateEncoding, FieldTable, normalize};
use crate::registry::Platform;
use crate::sources::xml::ItemReader;
use crate::sources::{ImportContext, Importer, RecordIter};
use crate::utils::http::read_source;

/// Options for the RSS importer.
#[derive(Debug, Clone, Args)]
pub struct RssOptions {
    /// The RSS file or URL to import
    #[arg(long)]
    pub source: Option<String>,

    /// Add a specific tag to all posts
    #[arg(long)]
    pub tag: Option<String>,

    /// Copy tags from the given item subfield to front matter
    #[arg(long, value_name = "KEY")]
    pub extract_tags: Option<String>,

    /// Render an `<audio>` element for enclosure URLs
    #[arg(long)]
    pub render_audio: bool,

    /// Add the original link as `canonical_url`
    #[arg(long)]
    pub canonical_link: bool,
}

/// Options for the Medium importer.
#[derive(Debug, Clone, Args)]
pub struct MediumOptions {
    /// Medium username
    #[arg(long)]
    pub username: Option<String>,

    /// Add the original link as `canonical_url`
    #[arg(long)]
    pub canonical_link: bool,

    /// Render an `<audio>` element for enclosure URLs
    #[arg(long)]
    pub render_audio: bool,
}

pub struct RssImporter {
    platform: Platform,
    options: RssOptions,
    fields: FieldTable,
}

impl RssImporter {
    pub fn new(options: RssOptions) -> Self {
        let fields = FieldTable::new("title", "description")
            .date("pubDate", DateEncoding::Text)
            .source_url("link");
        Self {
            platform: Platform::Rss,
            options,
            fields,
        }
    }

    /// Medium publishes a per-user RSS feed with tags in `<category>`.
    pub fn medium(options: MediumOptions) -> Self {
        let source = options
            .username
            .as_deref()
            .map(|user| format!("https://medium.com/feed/@{}", user.trim_start_matches('@')));
        let mut importer = Self::new(RssOptions {
            source,
            tag: None,
            extract_tags: Some("category".to_string()),
            render_audio: options.render_audio,
            canonical_link: options.canonical_link,
        });
        importer.platform = Platform::Medium;
        importer
    }

    fn extract_tags(&self, record: &RawRecord) -> Vec<String> {
        if let Some(tag) = self.options.tag.as_deref().filter(|t| !t.is_empty()) {
            return vec![tag.to_string()];
        }
        match &self.options.extract_tags {
            Some(key) => record
                .list(key)
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            None => Vec::new(),
        }
    }
}

fn audio_player(url: &str) -> String {
    format!(
        "<audio controls=\"\">\n  <source src=\"{url}\" type=\"audio/mpeg\">\n  Your browser does not support the audio element.\n</audio>\n"
    )
}

impl Importer for RssImporter {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn validate(&self) -> Result<()> {
        match self.platform {
            Platform::Medium if self.options.source.is_none() => {
                return Err(AppError::config("Missing mandatory option --username"));
            }
            _ if self.options.source.as_deref().is_none_or(str::is_empty) => {
                return Err(AppError::config("Missing mandatory option --source"));
            }
            _ => {}
        }
        if self.options.tag.is_some() && self.options.extract_tags.is_some() {
            return Err(AppError::config(
                "Provide either --tag or --extract-tags, but not both",
            ));
        }
        Ok(())
    }

    fn open(&self, ctx: &ImportContext<'_>) -> Result<RecordIter<'_>> {
        let source = self.options.source.as_deref().unwrap_or_default();
        let text = read_source(|| ctx.http_client(), source)?;
        Ok(Box::new(ItemReader::from_text(source, text, "item")?))
    }

    fn normalize(&self, mut record: RawRecord) -> Result<Option<CanonicalPost>> {
        if record.text("description").is_none() {
            if let Some(content) = record.get("content:encoded").cloned() {
                record.insert("description", content);
            }
        }
        if !record.contains("pubDate") {
            if let Some(date) = record.get("dc:date").cloned() {
                record.insert("pubDate", date);
            }
        }

        let mut post = normalize(&self.fields, &record)?;
        post.body = post.body.trim().to_string();
        post.tags = self.extract_tags(&record).into_iter().collect();

        if self.options.render_audio {
            if let Some(url) = record.text("enclosure@url") {
                post.body = format!("{}{}", audio_player(&url), post.body);
            }
        }
        if self.options.canonical_link {
            post = post.with_extra_opt("canonical_url", record.text("link"));
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
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn opts(source: &str) -> RssOptions {
        RssOptions {
            source: Some(source.to_string()),
            tag: None,
            extract_tags: None,
            render_audio: false,
            canonical_link: false,
        }
    }

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel>
  <title>Example</title>
  <item>
    <title>Hello RSS</title>
    <link>https://example.com/hello-rss</link>
    <pubDate>Sat, 10 Jan 2015 00:00:00 +0000</pubDate>
    <category>Rust</category>
    <category>Blogging</category>
    <description>&lt;p&gt;Hi there&lt;/p&gt;</description>
    <enclosure url="https://example.com/ep1.mp3" length="1" type="audio/mpeg"/>
  </item>
  <item>
    <title>Medium style</title>
    <pubDate>Sun, 11 Jan 2015 00:00:00 +0000</pubDate>
    <content:encoded><![CDATA[<p>Encoded body</p>]]></content:encoded>
  </item>
</channel>
</rss>"#;

    fn run(options: RssOptions) -> (TempDir, Vec<PathBuf>) {
        let tmp = TempDir::new().unwrap();
        let feed = tmp.path().join("feed.xml");
        fs::write(&feed, FEED).unwrap();

        let options = RssOptions {
            source: Some(feed.display().to_string()),
            ..options
        };
        let config = Config::default();
        let storage = LocalStorage::new(tmp.path().join("site"));
        let ctx = ImportContext::new(&config, &storage);
        let summary = run_import(&RssImporter::new(options), &ctx).unwrap();
        (tmp, summary.written)
    }

    fn read(tmp: &TempDir, key: &str) -> String {
        fs::read_to_string(tmp.path().join("site").join(key)).unwrap()
    }

    #[test]
    fn test_items_become_posts() {
        let (tmp, written) = run(opts(""));
        assert_eq!(
            written,
            vec![
                PathBuf::from("_posts/2015-01-10-hello-rss.html"),
                PathBuf::from("_posts/2015-01-11-medium-style.html"),
            ]
        );
        assert!(read(&tmp, "_posts/2015-01-10-hello-rss.html").ends_with("<p>Hi there</p>\n"));
        assert!(read(&tmp, "_posts/2015-01-11-medium-style.html").contains("<p>Encoded body</p>"));
    }

    #[test]
    fn test_extract_tags_and_canonical_link() {
        let (tmp, _) = run(RssOptions {
            extract_tags: Some("category".to_string()),
            canonical_link: true,
            ..opts("")
        });
        let text = read(&tmp, "_posts/2015-01-10-hello-rss.html");
        assert!(text.contains("tags:\n- blogging\n- rust\n"));
        assert!(text.contains("canonical_url: https://example.com/hello-rss\n"));
    }

    #[test]
    fn test_render_audio() {
        let (tmp, _) = run(RssOptions {
            render_audio: true,
            tag: Some("podcast".to_string()),
            ..opts("")
        });
        let text = read(&tmp, "_posts/2015-01-10-hello-rss.html");
        assert!(text.contains("<source src=\"https://example.com/ep1.mp3\" type=\"audio/mpeg\">"));
        assert!(text.contains("tags:\n- podcast\n"));
    }

    #[test]
    fn test_validate() {
        let both = RssImporter::new(RssOptions {
            tag: Some("a".into()),
            extract_tags: Some("category".into()),
            ..opts("feed.xml")
        });
        assert!(both.validate().is_err());

        let missing = RssImporter::new(RssOptions {
            source: None,
            ..opts("")
        });
        assert!(missing.validate().is_err());
    }

    #[test]
    fn test_medium_feed_url() {
        let importer = RssImporter::medium(MediumOptions {
            username: Some("@someone".into()),
            canonical_link: false,
            render_audio: false,
        });
        assert_eq!(importer.platform(), Platform::Medium);
        assert_eq!(
            importer.options.source.as_deref(),
            Some("https://medium.com/feed/@someone")
        );
        assert_eq!(importer.options.extract_tags.as_deref(), Some("category"));
        assert!(importer.validate().is_ok());

        let anonymous = RssImporter::medium(MediumOptions {
            username: None,
            canonical_link: false,
            render_audio: false,
        });
        assert!(anonymous.validate().is_err());
    }

    #[test]
    fn test_non_xml_source_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let feed = tmp.path().join("feed.xml");
        fs::write(&feed, "definitely not xml").unwrap();

        let config = Config::default();
        let storage = LocalStorage::new(tmp.path());
        let ctx = ImportContext::new(&config, &storage);
        let importer = RssImporter::new(opts(feed.to_str().unwrap()));
        assert!(matches!(
            run_import(&importer, &ctx),
            Err(AppError::SourceUnavailable { .. })
        ));
    }
}
