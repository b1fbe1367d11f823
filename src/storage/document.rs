// src/storage/document.rs

//! Front-matter document rendering and parsing.
//!
//! ```text
//! ---
//! layout: post
//! title: My Title
//! date: 2015-01-10 00:00:00 +0000
//! ---
//!
//! body text
//! ```

use serde_yaml::{Mapping, Value};

use crate::error::Result;
use crate::models::CanonicalPost;

/// Separator line between header and body.
pub const SEPARATOR: &str = "---";

/// Timestamp format written to the `date` key.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Build the ordered front-matter mapping for a post.
///
/// Order: layout, title, date, tags, categories, then extra fields by key.
/// An extra field may override any of the leading keys.
pub fn front_matter(post: &CanonicalPost, layout: &str) -> Mapping {
    let mut header = Mapping::new();
    header.insert("layout".into(), layout.into());
    header.insert("title".into(), post.title.as_str().into());

    if let Some(date) = post.published_at {
        header.insert("date".into(), date.format(DATE_FORMAT).to_string().into());
    }
    if !post.tags.is_empty() {
        header.insert("tags".into(), terms(&post.tags));
    }
    if !post.categories.is_empty() {
        header.insert("categories".into(), terms(&post.categories));
    }

    for (key, value) in &post.extra_fields {
        header.insert(key.as_str().into(), value.clone());
    }

    header
}

fn terms(set: &std::collections::BTreeSet<String>) -> Value {
    Value::Sequence(set.iter().map(|t| Value::from(t.as_str())).collect())
}

/// Render a full document: header block, separator, blank line, body.
pub fn render(post: &CanonicalPost, layout: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(&front_matter(post, layout))?;
    Ok(format!(
        "{SEPARATOR}\n{yaml}{SEPARATOR}\n\n{}\n",
        post.body.trim_end_matches('\n')
    ))
}

/// Split a document into its front-matter mapping and body.
///
/// Returns `None` when the text does not start with a header block.
pub fn parse(text: &str) -> Option<(Mapping, &str)> {
    let rest = text.strip_prefix("---\n")?;
    let end = rest.find("\n---\n")?;
    let header: Mapping = serde_yaml::from_str(&rest[..end]).ok()?;
    let body = &rest[end + "\n---\n".len()..];
    Some((header, body.strip_prefix('\n').unwrap_or(body)))
}
