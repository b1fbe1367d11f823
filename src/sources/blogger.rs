// src/sources/blogger.rs

//! Blogger Atom export importer.
//!
//! The export is streamed through a small state machine that accumulates
//! one [`EntryDraft`] per `<entry>`:
//!
//! ```text
//! OutsideEntry --<entry>--> InEntry --<title>----> InTitle --</title>---> InEntry
//!                           InEntry --<content>--> InBody  --</content>-> InEntry
//!                           InEntry --<published|updated|id|name|app:draft>--> InMeta
//!                           InEntry --</entry>--> OutsideEntry (emit record)
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::LazyLock;

use clap::Args;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{CanonicalPost, PostKind, RawRecord};
use crate::pipeline::ImportSummary;
use crate::pipeline::links::rewrite_internal_links;
use crate::pipeline::normalize::{DateEncoding, FieldTable, normalize};
use crate::registry::Platform;
use crate::sources::xml::{attributes, element_name};
use crate::sources::{ImportContext, Importer, RecordIter};
use crate::storage::document::DATE_FORMAT;
use crate::utils::slug::slugify;
use crate::utils::url::{origin_base, path_of, trailing_number};

const KIND_SCHEME: &str = "http://schemas.google.com/g/2005#kind";
const TAG_SCHEME: &str = "http://www.blogger.com/atom/ns#";

/// Options for the Blogger importer.
#[derive(Debug, Clone, Args)]
pub struct BloggerOptions {
    /// The XML export file (blog-MM-DD-YYYY.xml)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Leave out blogger id and original URL from the front matter
    #[arg(long)]
    pub no_blogger_info: bool,

    /// Replace internal links with the post_url liquid tag
    #[arg(long)]
    pub replace_internal_link: bool,

    /// Import comments into the _comments collection
    #[arg(long)]
    pub comments: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaField {
    Id,
    Published,
    Updated,
    Author,
    Draft,
}

impl MetaField {
    fn tag(self) -> &'static str {
        match self {
            MetaField::Id => "id",
            MetaField::Published => "published",
            MetaField::Updated => "updated",
            MetaField::Author => "name",
            MetaField::Draft => "app:draft",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    OutsideEntry,
    InEntry,
    InTitle,
    InBody,
    InMeta(MetaField),
}

/// Fields collected from one `<entry>`.
#[derive(Debug, Default)]
struct EntryDraft {
    id: Option<String>,
    kind: Option<String>,
    content_type: Option<String>,
    categories: Vec<String>,
    original_url: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    title: Option<String>,
    body: Option<String>,
    author: Option<String>,
    thumbnail: Option<String>,
    draft: Option<String>,
    in_reply_to: Option<String>,
}

impl EntryDraft {
    fn into_record(self) -> RawRecord {
        let mut record = RawRecord::new()
            .with("id", self.id)
            .with("kind", self.kind)
            .with("content_type", self.content_type)
            .with("category", self.categories)
            .with("original_url", self.original_url)
            .with("published", self.published)
            .with("updated", self.updated)
            .with("author", self.author)
            .with("thumbnail", self.thumbnail)
            .with("draft", self.draft)
            .with("in_reply_to", self.in_reply_to);
        // Title and body only exist when the entry had the element.
        if let Some(title) = self.title {
            record.insert("title", title);
        }
        if let Some(body) = self.body {
            record.insert("body", body);
        }
        record
    }
}

/// Owned copy of the XML events the state machine reacts to.
enum Step {
    Start(String, Vec<(String, String)>),
    Empty(String, Vec<(String, String)>),
    Text(String),
    End(String),
    Eof,
    Skip,
}

/// Streaming reader yielding one record per `<entry>`.
pub struct EntryReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    source_name: String,
    state: State,
    draft: EntryDraft,
    text: String,
    path: Vec<String>,
    root_seen: bool,
    done: bool,
}

impl<R: BufRead> EntryReader<R> {
    pub fn new(source_name: &str, input: R) -> Self {
        Self {
            reader: Reader::from_reader(input),
            buf: Vec::with_capacity(8192),
            source_name: source_name.to_string(),
            state: State::OutsideEntry,
            draft: EntryDraft::default(),
            text: String::new(),
            path: Vec::new(),
            root_seen: false,
            done: false,
        }
    }

    fn unavailable(&self, message: impl std::fmt::Display) -> AppError {
        AppError::source_unavailable(&self.source_name, message)
    }

    fn read_step(&mut self) -> Result<Step> {
        self.buf.clear();
        let step = match self.reader.read_event_into(&mut self.buf) {
            Ok(Event::Start(e)) => Step::Start(element_name(&e), attributes(&e)),
            Ok(Event::Empty(e)) => Step::Empty(element_name(&e), attributes(&e)),
            Ok(Event::Text(e)) => Step::Text(
                e.unescape()
                    .map(|t| t.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned()),
            ),
            Ok(Event::CData(e)) => Step::Text(String::from_utf8_lossy(&e).into_owned()),
            Ok(Event::End(e)) => Step::End(String::from_utf8_lossy(e.name().as_ref()).into_owned()),
            Ok(Event::Eof) => Step::Eof,
            Ok(_) => Step::Skip,
            Err(e) => {
                let position = self.reader.buffer_position();
                return Err(AppError::source_unavailable(
                    &self.source_name,
                    format!("{e} at byte {position}"),
                ));
            }
        };
        Ok(step)
    }

    fn check_root(&mut self, name: &str) -> Result<()> {
        if !self.root_seen {
            if name != "feed" {
                return Err(self.unavailable(format!(
                    "not a Blogger Atom export (root element <{name}>)"
                )));
            }
            self.root_seen = true;
        }
        Ok(())
    }

    fn parent_is(&self, name: &str) -> bool {
        self.path.len() >= 2 && self.path[self.path.len() - 2] == name
    }

    fn on_start(&mut self, name: &str, attrs: &[(String, String)]) -> Result<()> {
        let attr = |key: &str| {
            attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        match self.state {
            State::OutsideEntry => {
                if name == "entry" {
                    self.draft = EntryDraft::default();
                    self.state = State::InEntry;
                }
            }
            State::InEntry => match name {
                "entry" => return Err(self.unavailable("nested entry element")),
                "title" => {
                    self.text.clear();
                    self.state = State::InTitle;
                }
                "content" => {
                    self.draft.content_type = attr("type");
                    self.text.clear();
                    self.state = State::InBody;
                }
                "category" => match (attr("scheme").as_deref(), attr("term")) {
                    (Some(KIND_SCHEME), Some(term)) => {
                        self.draft.kind = term.rsplit('#').next().map(str::to_string);
                    }
                    (Some(TAG_SCHEME), Some(term)) => self.draft.categories.push(term),
                    _ => {}
                },
                "link" => {
                    let html = attr("type").is_none_or(|t| t == "text/html");
                    if attr("rel").as_deref() == Some("alternate") && html {
                        self.draft.original_url = attr("href");
                    }
                }
                "media:thumbnail" => self.draft.thumbnail = attr("url"),
                "thr:in-reply-to" => self.draft.in_reply_to = attr("ref"),
                "id" | "published" | "updated" if self.parent_is("entry") => {
                    let field = match name {
                        "id" => MetaField::Id,
                        "published" => MetaField::Published,
                        _ => MetaField::Updated,
                    };
                    self.text.clear();
                    self.state = State::InMeta(field);
                }
                "name" if self.parent_is("author") => {
                    self.text.clear();
                    self.state = State::InMeta(MetaField::Author);
                }
                "app:draft" => {
                    self.text.clear();
                    self.state = State::InMeta(MetaField::Draft);
                }
                _ => {}
            },
            State::InTitle | State::InBody | State::InMeta(_) => {}
        }
        Ok(())
    }

    fn on_end(&mut self, name: &str) -> Option<RawRecord> {
        match self.state {
            State::InTitle if name == "title" => {
                let value = std::mem::take(&mut self.text);
                self.draft.title = Some(value);
                self.state = State::InEntry;
            }
            State::InBody if name == "content" => {
                let value = std::mem::take(&mut self.text);
                self.draft.body = Some(value);
                self.state = State::InEntry;
            }
            State::InMeta(field) if name == field.tag() => {
                let value = Some(std::mem::take(&mut self.text).trim().to_string());
                match field {
                    MetaField::Id => self.draft.id = value,
                    MetaField::Published => self.draft.published = value,
                    MetaField::Updated => self.draft.updated = value,
                    MetaField::Author => self.draft.author = value,
                    MetaField::Draft => self.draft.draft = value,
                }
                self.state = State::InEntry;
            }
            State::InEntry if name == "entry" => {
                self.state = State::OutsideEntry;
                return Some(std::mem::take(&mut self.draft).into_record());
            }
            _ => {}
        }
        None
    }

    fn next_entry(&mut self) -> Result<Option<RawRecord>> {
        loop {
            match self.read_step()? {
                Step::Start(name, attrs) => {
                    self.check_root(&name)?;
                    self.path.push(name.clone());
                    self.on_start(&name, &attrs)?;
                }
                Step::Empty(name, attrs) => {
                    self.check_root(&name)?;
                    self.path.push(name.clone());
                    self.on_start(&name, &attrs)?;
                    self.path.pop();
                    if let Some(record) = self.on_end(&name) {
                        return Ok(Some(record));
                    }
                }
                Step::Text(text) => {
                    if matches!(
                        self.state,
                        State::InTitle | State::InBody | State::InMeta(_)
                    ) {
                        self.text.push_str(&text);
                    }
                }
                Step::End(name) => {
                    self.path.pop();
                    if let Some(record) = self.on_end(&name) {
                        return Ok(Some(record));
                    }
                }
                Step::Eof => {
                    if !self.root_seen {
                        return Err(self.unavailable("not a Blogger Atom export"));
                    }
                    if !self.path.is_empty() || self.state != State::OutsideEntry {
                        return Err(self.unavailable("unexpected end of document"));
                    }
                    return Ok(None);
                }
                Step::Skip => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for EntryReader<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_entry() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

static LIQUID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{|\{%").unwrap());

/// Keep Liquid from interpreting `{{` and `{%` inside imported bodies.
fn escape_liquid(body: &str) -> String {
    LIQUID
        .replace_all(body, |caps: &regex::Captures<'_>| {
            format!("{{{{ \"{}\" }}}}", &caps[0])
        })
        .into_owned()
}

/// Slug from a Blogger permalink: `/1900/02/post0.link.html` → `post0-link`.
fn slug_from_original_url(url: &str) -> Option<String> {
    let path = path_of(url);
    let mut segments = path.trim_start_matches('/').splitn(3, '/');
    let (year, month, rest) = (segments.next()?, segments.next()?, segments.next()?);
    if year.len() != 4 || month.len() != 2 || rest.is_empty() {
        return None;
    }
    let rest = rest.strip_suffix(".html").unwrap_or(rest);
    let slug = slugify(&rest.replace('/', "-"));
    (!slug.is_empty()).then_some(slug)
}

pub struct BloggerImporter {
    options: BloggerOptions,
    fields: FieldTable,
}

impl BloggerImporter {
    pub fn new(options: BloggerOptions) -> Self {
        let fields = FieldTable::new("title", "body")
            .id("id")
            .date("published", DateEncoding::Text)
            .tags("category", "")
            .source_url("original_url");
        Self { options, fields }
    }
}

impl Importer for BloggerImporter {
    fn platform(&self) -> Platform {
        Platform::Blogger
    }

    fn validate(&self) -> Result<()> {
        match &self.options.source {
            Some(path) if !path.as_os_str().is_empty() => Ok(()),
            _ => Err(AppError::config("Missing mandatory option --source")),
        }
    }

    fn open(&self, _ctx: &ImportContext<'_>) -> Result<RecordIter<'_>> {
        let path = self.options.source.clone().unwrap_or_default();
        let name = path.display().to_string();
        let file = File::open(&path).map_err(|e| AppError::source_unavailable(&name, e))?;
        Ok(Box::new(EntryReader::new(&name, BufReader::new(file))))
    }

    fn normalize(&self, record: RawRecord) -> Result<Option<CanonicalPost>> {
        let kind = match record.text("kind").as_deref() {
            Some("post") => PostKind::Post,
            Some("comment") if self.options.comments => PostKind::Comment,
            _ => return Ok(None),
        };

        let mut post = normalize(&self.fields, &record)?.with_kind(kind);
        post.body = escape_liquid(&post.body);

        let original_url = record.text("original_url");
        match kind {
            PostKind::Comment => {
                post.slug = post
                    .id
                    .as_deref()
                    .and_then(trailing_number)
                    .unwrap_or_else(|| post.slug.clone());
                post.source_url = None;
                post = post.with_extra_opt(
                    "post_id",
                    record.text("in_reply_to").as_deref().and_then(trailing_number),
                );
            }
            _ => {
                if let Some(slug) = original_url.as_deref().and_then(slug_from_original_url) {
                    post.slug = slug;
                } else if let Some(title) = record.text("title") {
                    let slug = slugify(&title);
                    if !slug.is_empty() {
                        post.slug = slug;
                    }
                }
            }
        }

        post = post
            .with_extra_opt("author", record.text("author"))
            .with_extra_opt("thumbnail", record.text("thumbnail"));
        if let Some(updated) = record.text("updated") {
            if record.text("published").as_deref() != Some(updated.as_str()) {
                post = post.with_extra("modified_time", updated);
            }
        }
        if !self.options.no_blogger_info {
            let id = post.id.clone();
            post = post
                .with_extra_opt("blogger_id", id)
                .with_extra_opt("blogger_orig_url", original_url);
        }
        if record.text("draft").as_deref() == Some("yes") {
            let date = post.published_at.take();
            post = post
                .with_extra("published", false)
                .with_extra_opt("date", date.map(|d| d.format(DATE_FORMAT).to_string()));
        }

        Ok(Some(post))
    }

    fn extension(&self) -> &str {
        "html"
    }

    fn finish(&self, ctx: &ImportContext<'_>, summary: &ImportSummary) -> Result<()> {
        if !self.options.replace_internal_link {
            return Ok(());
        }
        let Some(origin) = summary.links.iter().find_map(|e| origin_base(&e.url)) else {
            log::info!("No original URLs recorded, skipping internal link rewrite");
            return Ok(());
        };
        rewrite_internal_links(ctx.storage, Some(&origin), &summary.links)?;
        Ok(())
    }
}
