// src/pipeline/links.rs

//! Second-pass internal link rewrite.
//!
//! After all posts are written, links of the form
//! ` href="<origin>/YYYY/MM/<rest>"` pointing at imported posts are replaced
//! with ` href="{{ site.baseurl }}{% post_url <stem> %}"`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{AppError, Result};
use crate::pipeline::filename::POSTS_DIR;
use crate::storage::{PostStorage, document};
use crate::utils::url::path_of;

/// A written post reachable through its original URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// Original absolute URL
    pub url: String,
    /// Written document, relative to the destination root
    pub key: PathBuf,
}

/// Original URL path → written file.
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    entries: BTreeMap<String, LinkEntry>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_url: &str, key: &Path) {
        self.entries.insert(
            path_of(source_url),
            LinkEntry {
                url: source_url.to_string(),
                key: key.to_path_buf(),
            },
        );
    }

    /// Look up a site-relative path such as `/2020/01/post.html`.
    pub fn resolve(&self, path: &str) -> Option<&Path> {
        let path = path.split(['#', '?']).next().unwrap_or(path);
        self.entries.get(path).map(|e| e.key.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild the table from posts already on disk, reading the original
    /// URL from the given front-matter field.
    pub fn from_written(storage: &dyn PostStorage, field: &str) -> Result<Self> {
        let mut table = Self::new();
        for key in storage.list_documents(Path::new(POSTS_DIR))? {
            let Some(text) = storage.read_document(&key)? else {
                continue;
            };
            let url = document::parse(&text)
                .and_then(|(header, _)| header.get(field).and_then(|v| v.as_str().map(str::to_string)));
            match url {
                Some(url) => table.insert(&url, &key),
                None => log::debug!("{} has no '{}' field", key.display(), field),
            }
        }
        log::info!("Link table rebuilt with {} entries", table.len());
        Ok(table)
    }
}

/// Liquid reference to a written post.
pub fn post_url_tag(key: &Path) -> String {
    let stem = key
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{{{{ site.baseurl }}}}{{% post_url {stem} %}}")
}

fn link_patterns(origin: Option<&str>) -> Result<[Regex; 2]> {
    let prefix = origin
        .map(|o| format!("(?:{})?", regex::escape(o.trim_end_matches('/'))))
        .unwrap_or_default();
    Ok([
        Regex::new(&format!(r#" href="{prefix}(/\d{{4}}/\d{{2}}/[^"]+)""#))?,
        Regex::new(&format!(r#" href='{prefix}(/\d{{4}}/\d{{2}}/[^']+)'"#))?,
    ])
}

fn rewrite_text(text: &str, patterns: &[Regex], table: &LinkTable) -> Result<Option<String>> {
    let mut current = Cow::Borrowed(text);
    let mut changed = false;

    for pattern in patterns {
        let mut out = String::with_capacity(current.len());
        let mut last = 0;
        for caps in pattern.captures_iter(&current) {
            let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let key = table
                .resolve(path.as_str())
                .ok_or_else(|| AppError::LinkNotFound(path.as_str().to_string()))?;
            out.push_str(&current[last..whole.start()]);
            out.push_str(&format!(" href=\"{}\"", post_url_tag(key)));
            last = whole.end();
        }
        if last > 0 {
            out.push_str(&current[last..]);
            current = Cow::Owned(out);
            changed = true;
        }
    }

    Ok(changed.then(|| current.into_owned()))
}

/// Rewrite internal links in every file under `_posts/`.
///
/// Returns the number of files changed. A link to a post missing from the
/// table aborts the pass.
pub fn rewrite_internal_links(
    storage: &dyn PostStorage,
    origin: Option<&str>,
    table: &LinkTable,
) -> Result<usize> {
    let patterns = link_patterns(origin)?;
    let mut changed = 0;

    for key in storage.list_documents(Path::new(POSTS_DIR))? {
        let Some(text) = storage.read_document(&key)? else {
            continue;
        };
        if let Some(rewritten) = rewrite_text(&text, &patterns, table)? {
            storage.write_document(&key, &rewritten)?;
            log::debug!("Rewrote internal links in {}", key.display());
            changed += 1;
        }
    }

    log::info!("Internal links rewritten in {} files", changed);
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    fn table() -> LinkTable {
        let mut table = LinkTable::new();
        table.insert(
            "http://foobar.blogspot.com/1900/02/post0.html",
            Path::new("_posts/1900-02-01-post0.html"),
        );
        table
    }

    #[test]
    fn test_post_url_tag() {
        assert_eq!(
            post_url_tag(Path::new("_posts/1900-02-01-post0.html")),
            "{{ site.baseurl }}{% post_url 1900-02-01-post0 %}"
        );
    }

    #[test]
    fn test_resolve_ignores_fragment() {
        let table = table();
        assert!(table.resolve("/1900/02/post0.html#more").is_some());
        assert!(table.resolve("/1900/03/other.html").is_none());
    }

    #[test]
    fn test_rewrite_both_quote_styles() {
        let patterns = link_patterns(Some("http://foobar.blogspot.com")).unwrap();
        let text = concat!(
            "<a href=\"http://foobar.blogspot.com/1900/02/post0.html\">a</a>",
            "<a href='/1900/02/post0.html'>b</a>",
            "<a href=\"http://elsewhere.org/2001/01/x.html\">c</a>"
        );
        let out = rewrite_text(text, &patterns, &table()).unwrap().unwrap();
        assert_eq!(out.matches("{% post_url 1900-02-01-post0 %}").count(), 2);
        assert!(out.contains("elsewhere.org"));
    }

    #[test]
    fn test_unknown_reference_aborts() {
        let patterns = link_patterns(None).unwrap();
        let err = rewrite_text("<a href=\"/1999/12/missing.html\">x</a>", &patterns, &table())
            .unwrap_err();
        assert!(matches!(err, AppError::LinkNotFound(ref p) if p == "/1999/12/missing.html"));
    }

    #[test]
    fn test_untouched_text_is_none() {
        let patterns = link_patterns(None).unwrap();
        assert!(rewrite_text("no links", &patterns, &table()).unwrap().is_none());
    }

    #[test]
    fn test_from_written_reads_front_matter() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage
            .write_document(
                Path::new("_posts/1900-02-01-post0.html"),
                "---\ntitle: p\nblogger_orig_url: http://foobar.blogspot.com/1900/02/post0.html\n---\n\nbody\n",
            )
            .unwrap();
        storage
            .write_document(Path::new("_posts/2000-01-01-plain.html"), "no header")
            .unwrap();

        let table = LinkTable::from_written(&storage, "blogger_orig_url").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.resolve("/1900/02/post0.html"),
            Some(Path::new("_posts/1900-02-01-post0.html"))
        );
    }
}
