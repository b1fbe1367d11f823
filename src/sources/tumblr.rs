// src/sources/tumblr.rs

//! Tumblr importer for the v1 read API.
//!
//! Posts come either from a live blog (`--url`, fetched 50 at a time until
//! an empty page) or from a saved API response (`--file`). Each Tumblr post
//! type is rendered to an HTML body before normalization.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, RawRecord};
use crate::pipeline::ImportSummary;
use crate::pipeline::assets::ImageLocalizer;
use crate::pipeline::filename::POSTS_DIR;
use crate::pipeline::links::post_url_tag;
use crate::pipeline::normalize::{DateEncoding, FieldTable, normalize};
use crate::registry::Platform;
use crate::sources::{ImportContext, Importer, RecordIter};
use crate::storage::document;
use crate::utils::html::strip_tags;
use crate::utils::http::fetch_text;

const PAGE_SIZE: usize = 50;
const IMAGES_DIR: &str = "tumblr_files";

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TumblrFormat {
    #[default]
    Html,
    Md,
}

/// Options for the Tumblr importer.
#[derive(Debug, Clone, Args)]
pub struct TumblrOptions {
    /// URL of the Tumblr blog, e.g. https://example.tumblr.com
    #[arg(long, conflicts_with = "file")]
    pub url: Option<String>,

    /// Saved response of the v1 read API
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Output format (extension of the written files)
    #[arg(long, value_enum, default_value_t = TumblrFormat::Html)]
    pub format: TumblrFormat,

    /// Replace links to tumblr posts with links to the imported posts
    #[arg(long)]
    pub rewrite_urls: bool,

    /// Download photos into tumblr_files/
    #[arg(long)]
    pub grab_images: bool,
}

/// Cut the JSON object out of a (possibly JavaScript-wrapped) API response.
pub fn extract_json(source: &str, contents: &str) -> Result<Value> {
    let (Some(start), Some(end)) = (contents.find('{'), contents.rfind('}')) else {
        return Err(AppError::source_unavailable(source, "no JSON object found"));
    };
    if end < start {
        return Err(AppError::source_unavailable(source, "no JSON object found"));
    }
    serde_json::from_str(&contents[start..=end])
        .map_err(|e| AppError::source_unavailable(source, e))
}

fn posts_of(source: &str, document: Value) -> Result<Vec<Value>> {
    match document {
        Value::Object(mut map) => match map.remove("posts") {
            Some(Value::Array(posts)) => Ok(posts),
            _ => Err(AppError::source_unavailable(source, "response has no posts array")),
        },
        _ => Err(AppError::source_unavailable(source, "response is not a JSON object")),
    }
}

/// String view of a JSON field; numbers are accepted too.
fn field(post: &Value, key: &str) -> Option<String> {
    match post.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn photo_url(photo: &Value) -> String {
    field(photo, "photo-url-500")
        .or_else(|| field(photo, "photo-url-1280"))
        .or_else(|| field(photo, "photo-url"))
        .unwrap_or_default()
}

fn conversation_csv(id: &str, lines: &[Value]) -> Result<String> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    for line in lines {
        let label = field(line, "label").unwrap_or_default();
        let phrase = field(line, "phrase").unwrap_or_default();
        writer
            .write_record([label, phrase])
            .map_err(|e| AppError::malformed(id, e))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::malformed(id, e.error().to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Render one API post into a raw record with an HTML body.
fn post_record(post: &Value) -> Result<RawRecord> {
    let id = field(post, "id").unwrap_or_else(|| "<unknown>".to_string());
    let post_type = field(post, "type").unwrap_or_default();
    let caption = |key: &str| {
        field(post, key)
            .map(|c| format!("<br/>{c}"))
            .unwrap_or_default()
    };

    let (title, body) = match post_type.as_str() {
        "regular" => (
            field(post, "regular-title"),
            field(post, "regular-body").unwrap_or_default(),
        ),
        "link" => {
            let url = field(post, "link-url").unwrap_or_default();
            let text = field(post, "link-text").unwrap_or_else(|| url.clone());
            let body = format!("<a href=\"{url}\">{text}</a>{}", caption("link-description"));
            (Some(text), body)
        }
        "photo" => {
            let title = field(post, "slug").map(|s| s.replace('-', " "));
            let photos = post.get("photos").and_then(Value::as_array);
            let mut body = String::new();
            match photos {
                Some(photos) if photos.len() > 1 => {
                    for photo in photos {
                        body.push_str(&format!("<img src=\"{}\"/><br/>", photo_url(photo)));
                        body.push_str(&field(photo, "caption").unwrap_or_default());
                    }
                }
                _ => body.push_str(&format!("<img src=\"{}\"/>", photo_url(post))),
            }
            body.push_str(&caption("photo-caption"));
            (title, body)
        }
        "audio" => (
            field(post, "id3-title"),
            format!(
                "{}{}",
                field(post, "audio-player").unwrap_or_default(),
                caption("audio-caption")
            ),
        ),
        "quote" => {
            let text = field(post, "quote-text").unwrap_or_default();
            let source = field(post, "quote-source")
                .map(|s| format!("&#8212;{s}"))
                .unwrap_or_default();
            (Some(text.clone()), format!("<blockquote>{text}</blockquote>{source}"))
        }
        "conversation" => {
            let lines = post
                .get("conversation")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            (field(post, "conversation-title"), conversation_csv(&id, lines)?)
        }
        "video" => {
            let body = match field(post, "video-player") {
                Some(player) => format!("{player}{}", caption("video-caption")),
                None => field(post, "video-caption").unwrap_or_default(),
            };
            (field(post, "video-title"), body)
        }
        "answer" => (
            field(post, "question"),
            field(post, "answer").unwrap_or_default(),
        ),
        other => {
            return Err(AppError::malformed(&id, format!("unknown post type '{other}'")));
        }
    };

    let tags: Vec<String> = post
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| tags.iter().filter_map(|t| t.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    Ok(RawRecord::new()
        .with("id", id)
        .with("type", post_type)
        .with("title", title.map(|t| strip_tags(&t)).unwrap_or_default())
        .with("body", body)
        .with("slug", field(post, "slug"))
        .with("date", field(post, "date-gmt").or_else(|| field(post, "date")))
        .with("tags", tags)
        .with("url", field(post, "url"))
        .with("url-with-slug", field(post, "url-with-slug")))
}

/// Lazily paged v1 read API.
struct ApiPages {
    client: Client,
    base: String,
    start: usize,
    pending: VecDeque<Value>,
    done: bool,
}

impl ApiPages {
    fn fetch_page(&mut self) -> Result<()> {
        let url = format!(
            "{}/api/read/json?num={}&start={}",
            self.base, PAGE_SIZE, self.start
        );
        log::info!("Fetching {}", url);
        let body = fetch_text(&self.client, &url)?;
        let posts = posts_of(&url, extract_json(&url, &body)?)?;
        if posts.is_empty() {
            self.done = true;
        }
        self.start += posts.len();
        self.pending.extend(posts);
        Ok(())
    }
}

impl Iterator for ApiPages {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending.is_empty() && !self.done {
            if let Err(e) = self.fetch_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
        self.pending.pop_front().map(|post| post_record(&post))
    }
}

/// `http://x.tumblr.com/post/123/some-slug` → `http://x.tumblr.com/post/123`.
fn short_url(url: &str) -> Option<String> {
    let idx = url.find("/post/")? + "/post/".len();
    let digits = url[idx..].chars().take_while(char::is_ascii_digit).count();
    (digits > 0).then(|| url[..idx + digits].to_string())
}

pub struct TumblrImporter {
    options: TumblrOptions,
    fields: FieldTable,
}

impl TumblrImporter {
    pub fn new(options: TumblrOptions) -> Self {
        let fields = FieldTable::new("title", "body")
            .id("id")
            .slug("slug")
            .date("date", DateEncoding::Text)
            .tags("tags", "")
            .source_url("url-with-slug");
        Self { options, fields }
    }

    /// Replace tumblr URLs in written documents with links to the imported posts.
    fn rewrite_urls(&self, ctx: &ImportContext<'_>, summary: &ImportSummary) -> Result<usize> {
        let mut replacements: Vec<(String, String)> = Vec::new();
        for entry in summary.links.iter() {
            if !entry.key.starts_with(Path::new(POSTS_DIR)) {
                continue;
            }
            let tag = post_url_tag(&entry.key);
            if let Some(short) = short_url(&entry.url) {
                replacements.push((short, tag.clone()));
            }
            replacements.push((entry.url.clone(), tag));
        }
        // Longest first, so a short URL never eats part of a longer one.
        replacements.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut changed = 0;
        for key in &summary.written {
            let Some(text) = ctx.storage.read_document(key)? else {
                continue;
            };
            // Front matter keeps the original tumblr_url.
            let offset = document::parse(&text)
                .map(|(_, body)| text.len() - body.len())
                .unwrap_or(0);
            let mut body = text[offset..].to_string();
            for (from, to) in &replacements {
                body = body.replace(from, to);
            }
            if body != text[offset..] {
                let rewritten = format!("{}{}", &text[..offset], body);
                ctx.storage.write_document(key, &rewritten)?;
                changed += 1;
            }
        }
        log::info!("Rewrote tumblr URLs in {} documents", changed);
        Ok(changed)
    }
}

impl Importer for TumblrImporter {
    fn platform(&self) -> Platform {
        Platform::Tumblr
    }

    fn validate(&self) -> Result<()> {
        match (&self.options.url, &self.options.file) {
            (Some(_), Some(_)) => Err(AppError::config("Provide either --url or --file, not both")),
            (None, None) => Err(AppError::config("Missing mandatory option --url or --file")),
            (Some(url), None) if url.trim().is_empty() => {
                Err(AppError::config("--url must not be empty"))
            }
            _ => Ok(()),
        }
    }

    fn open(&self, ctx: &ImportContext<'_>) -> Result<RecordIter<'_>> {
        if let Some(file) = &self.options.file {
            let source = file.display().to_string();
            let text = std::fs::read_to_string(file)
                .map_err(|e| AppError::source_unavailable(&source, e))?;
            let posts = posts_of(&source, extract_json(&source, &text)?)?;
            return Ok(Box::new(posts.into_iter().map(|post| post_record(&post))));
        }

        let url = self.options.url.as_deref().unwrap_or_default().trim_end_matches('/');
        let base = if url.contains("://") {
            url.to_string()
        } else {
            format!("https://{url}")
        };
        Ok(Box::new(ApiPages {
            client: ctx.http_client()?,
            base,
            start: 0,
            pending: VecDeque::new(),
            done: false,
        }))
    }

    fn normalize(&self, record: RawRecord) -> Result<Option<CanonicalPost>> {
        let post = normalize(&self.fields, &record)?
            .with_extra_opt("tumblr_url", record.text("url-with-slug"));
        Ok(Some(post))
    }

    fn extension(&self) -> &str {
        match self.options.format {
            TumblrFormat::Html => "html",
            TumblrFormat::Md => "md",
        }
    }

    fn finish(&self, ctx: &ImportContext<'_>, summary: &ImportSummary) -> Result<()> {
        if self.options.grab_images {
            ImageLocalizer::new(ctx, IMAGES_DIR).localize_all(&summary.written)?;
        }
        if self.options.rewrite_urls {
            self.rewrite_urls(ctx, summary)?;
        }
        Ok(())
    }
}
