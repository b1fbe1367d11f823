// src/sources/wordpressdotcom.rs

//! WordPress.com export (WXR) importer.
//!
//! Posts and pages are read from `<item>` elements. After the write pass,
//! remote images referenced by the written documents can be downloaded into
//! an assets folder and their `src` rewritten.

use std::path::PathBuf;

use clap::Args;

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, PostKind, RawRecord};
use crate::pipeline::ImportSummary;
use crate::pipeline::assets::ImageLocalizer;
use crate::pipeline::normalize::{DateEncoding, FieldTable, normalize};
use crate::registry::Platform;
use crate::sources::xml::ItemReader;
use crate::sources::{ImportContext, Importer, RecordIter};
use crate::utils::autop::wpautop;
use crate::utils::html::strip_tags;
use crate::utils::url::path_of;

/// Options for the WordPress.com importer.
#[derive(Debug, Clone, Args)]
pub struct WordpressDotComOptions {
    /// WordPress export XML file
    #[arg(long, default_value = "wordpress.xml")]
    pub source: PathBuf,

    /// Do not fetch the images referenced in the posts
    #[arg(long)]
    pub no_fetch_images: bool,

    /// Folder where images are downloaded to
    #[arg(long, default_value = "assets")]
    pub assets_folder: String,

    /// Turn double line breaks in post bodies into paragraphs
    #[arg(long)]
    pub autop: bool,
}

pub struct WordpressDotComImporter {
    options: WordpressDotComOptions,
    fields: FieldTable,
}

impl WordpressDotComImporter {
    pub fn new(options: WordpressDotComOptions) -> Self {
        let fields = FieldTable::new("title", "content:encoded")
            .id("wp:post_id")
            .slug("wp:post_name")
            .date("wp:post_date", DateEncoding::Text)
            .tags("category@domain=post_tag", "")
            .categories("category@domain=category", "")
            .source_url("link");
        Self { options, fields }
    }
}

impl Importer for WordpressDotComImporter {
    fn platform(&self) -> Platform {
        Platform::WordpressDotCom
    }

    fn validate(&self) -> Result<()> {
        if self.options.assets_folder.trim().is_empty() {
            return Err(AppError::config("--assets-folder must not be empty"));
        }
        Ok(())
    }

    fn open(&self, _ctx: &ImportContext<'_>) -> Result<RecordIter<'_>> {
        let source = self.options.source.display().to_string();
        let text = std::fs::read_to_string(&self.options.source)
            .map_err(|e| AppError::source_unavailable(&source, e))?;
        Ok(Box::new(ItemReader::from_text(&source, text, "item")?))
    }

    fn normalize(&self, record: RawRecord) -> Result<Option<CanonicalPost>> {
        let kind = match record.text("wp:post_type").as_deref() {
            None | Some("post") => PostKind::Post,
            Some("page") => PostKind::Page,
            Some(other) => {
                log::debug!("Ignoring {} item", other);
                return Ok(None);
            }
        };

        let mut post = normalize(&self.fields, &record)?.with_kind(kind);
        if self.options.autop {
            post.body = wpautop(&post.body, true);
        }

        if let Some(link) = record.text("link") {
            post = post.with_extra("permalink", path_of(&link));
        }
        if let Some(excerpt) = record.text("excerpt:encoded") {
            let excerpt = strip_tags(&excerpt);
            post = post.with_extra_opt("excerpt", (!excerpt.is_empty()).then_some(excerpt));
        }
        if record.text("wp:status").as_deref() != Some("publish") {
            post = post.with_extra("published", false);
        }
        if let Some(id) = post.id.as_deref().and_then(|id| id.parse::<i64>().ok()) {
            post = post.with_extra("wordpress_id", id);
        }
        post = post.with_extra_opt("author", record.text("dc:creator"));

        Ok(Some(post))
    }

    fn extension(&self) -> &str {
        "html"
    }

    fn finish(&self, ctx: &ImportContext<'_>, summary: &ImportSummary) -> Result<()> {
        if self.options.no_fetch_images {
            return Ok(());
        }
        ImageLocalizer::new(ctx, &self.options.assets_folder).localize_all(&summary.written)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;
    use crate::pipeline::run_import;
    use crate::storage::{LocalStorage, PostStorage};
    use std::path::Path;
    use serde_yaml::Value;
    use std::fs;
    use tempfile::TempDir;

    fn importer() -> WordpressDotComImporter {
        WordpressDotComImporter::new(WordpressDotComOptions {
            source: PathBuf::from("wordpress.xml"),
            no_fetch_images: true,
            assets_folder: "assets".to_string(),
            autop: false,
        })
    }

    fn item(xml: &str) -> RawRecord {
        ItemReader::from_text("test", xml.to_string(), "item")
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
    }

    fn published_item() -> RawRecord {
        item(
            r#"<item>
                <title>PostTitle</title>
                <link>https://www.example.com/post/123/post-title/</link>
                <wp:post_id>123</wp:post_id>
                <wp:post_name>post-name</wp:post_name>
                <wp:post_type>post</wp:post_type>
                <wp:status>publish</wp:status>
                <wp:post_date>2015-01-23 08:53:47</wp:post_date>
                <category domain="post_tag" nicename="one">One</category>
                <category domain="category" nicename="news">News</category>
                <content:encoded><![CDATA[<p>Body</p>]]></content:encoded>
            </item>"#,
        )
    }

    #[test]
    fn test_post_name_preferred_over_title() {
        let post = importer().normalize(published_item()).unwrap().unwrap();
        assert_eq!(post.title, "PostTitle");
        assert_eq!(post.slug, "post-name");
        assert_eq!(
            crate::pipeline::derive_path(&post, "html"),
            PathBuf::from("_posts/2015-01-23-post-name.html")
        );
        assert_eq!(
            post.extra_fields.get("permalink"),
            Some(&Value::from("/post/123/post-title/"))
        );
        assert_eq!(post.extra_fields.get("wordpress_id"), Some(&Value::from(123)));
        assert!(post.tags.contains("One"));
        assert!(post.categories.contains("News"));
        assert!(!post.extra_fields.contains_key("published"));
    }

    #[test]
    fn test_empty_post_name_uses_title() {
        let record = item(
            "<item><wp:post_name></wp:post_name><title>Dear Science</title><content:encoded/></item>",
        );
        let post = importer().normalize(record).unwrap().unwrap();
        assert_eq!(post.slug, "dear-science");
    }

    #[test]
    fn test_excerpt() {
        let empty = item(
            "<item><title>t</title><excerpt:encoded><![CDATA[]]></excerpt:encoded><content:encoded/></item>",
        );
        let post = importer().normalize(empty).unwrap().unwrap();
        assert!(!post.extra_fields.contains_key("excerpt"));

        let present = item(
            "<item><title>t</title><excerpt:encoded><![CDATA[<p>...this one <b>weird</b> trick.</p>]]></excerpt:encoded><content:encoded/></item>",
        );
        let post = importer().normalize(present).unwrap().unwrap();
        assert_eq!(
            post.extra_fields.get("excerpt"),
            Some(&Value::from("...this one weird trick."))
        );
    }

    #[test]
    fn test_draft_goes_to_drafts_unpublished() {
        let record = item(
            r#"<item>
                <title>Draft</title>
                <wp:post_name>post-name</wp:post_name>
                <wp:post_type>post</wp:post_type>
                <wp:status>draft</wp:status>
                <content:encoded>wip</content:encoded>
            </item>"#,
        );
        let post = importer().normalize(record).unwrap().unwrap();
        assert_eq!(
            crate::pipeline::derive_path(&post, "html"),
            PathBuf::from("_drafts/post-name.html")
        );
        assert_eq!(post.extra_fields.get("published"), Some(&Value::from(false)));
    }

    #[test]
    fn test_pages_and_attachments() {
        let page = item(
            "<item><title>About</title><wp:post_type>page</wp:post_type><wp:status>publish</wp:status><content:encoded>me</content:encoded></item>",
        );
        let post = importer().normalize(page).unwrap().unwrap();
        assert_eq!(crate::pipeline::derive_path(&post, "html"), PathBuf::from("about.html"));

        let attachment = item(
            "<item><title>img</title><wp:post_type>attachment</wp:post_type><content:encoded/></item>",
        );
        assert!(importer().normalize(attachment).unwrap().is_none());
    }

    #[test]
    fn test_autop_reflows_body() {
        let importer = WordpressDotComImporter::new(WordpressDotComOptions {
            autop: true,
            ..importer().options
        });
        let record = item("<item><title>t</title><content:encoded>one\n\ntwo</content:encoded></item>");
        let post = importer.normalize(record).unwrap().unwrap();
        assert_eq!(post.body, "<p>one</p>\n<p>two</p>\n");
    }

    #[test]
    fn test_cached_images_are_relinked() {
        let tmp = TempDir::new().unwrap();
        let export = tmp.path().join("wordpress.xml");
        fs::write(
            &export,
            r#"<rss><channel><item>
                <title>Pics</title>
                <wp:post_type>post</wp:post_type>
                <wp:status>publish</wp:status>
                <wp:post_date>2015-01-23 08:53:47</wp:post_date>
                <content:encoded><![CDATA[<img src="http://example.files.wordpress.com/2015/01/cat.png">]]></content:encoded>
            </item></channel></rss>"#,
        )
        .unwrap();

        let config = Config::default();
        let storage = LocalStorage::new(tmp.path().join("site"));
        storage.write_bytes(Path::new("assets/cat.png"), b"png").unwrap();

        let importer = WordpressDotComImporter::new(WordpressDotComOptions {
            source: export,
            no_fetch_images: false,
            assets_folder: "assets".to_string(),
            autop: false,
        });
        let ctx = ImportContext::new(&config, &storage);
        let summary = run_import(&importer, &ctx).unwrap();

        let text = storage.read_document(&summary.written[0]).unwrap().unwrap();
        assert!(text.contains(r#"<img src="{{ site.baseurl }}/assets/cat.png">"#));
        assert!(!text.contains("wordpress.com"));
    }
}
