//! Canonical post data structure.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Content type of a post, deciding where its file lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    #[default]
    Post,
    Page,
    Comment,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Post => "post",
            PostKind::Page => "page",
            PostKind::Comment => "comment",
        }
    }
}

/// A normalized, platform-independent blog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalPost {
    /// Original identifier in the source, if any
    pub id: Option<String>,

    /// Post title (never empty)
    pub title: String,

    /// Filename-safe identifier
    pub slug: String,

    /// Publish timestamp; `None` marks a draft
    pub published_at: Option<DateTime<FixedOffset>>,

    /// Content type
    pub kind: PostKind,

    pub tags: BTreeSet<String>,
    pub categories: BTreeSet<String>,

    /// HTML or Markdown body
    pub body: String,

    /// Original URL, used to resolve internal links after the write pass
    pub source_url: Option<String>,

    /// Platform-specific passthrough fields
    pub extra_fields: BTreeMap<String, serde_yaml::Value>,

    /// Per-post file extension, overriding the importer's default
    pub extension: Option<String>,
}

impl CanonicalPost {
    pub fn is_draft(&self) -> bool {
        self.published_at.is_none()
    }

    /// Set an extra front-matter field.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_yaml::Value>) -> Self {
        self.extra_fields.insert(key.into(), value.into());
        self
    }

    /// Set an extra field only when the value is present.
    pub fn with_extra_opt<V: Into<serde_yaml::Value>>(
        self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(v) => self.with_extra(key, v),
            None => self,
        }
    }

    pub fn with_kind(mut self, kind: PostKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_post() -> CanonicalPost {
        CanonicalPost {
            id: Some("1".to_string()),
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            published_at: None,
            kind: PostKind::Post,
            tags: BTreeSet::new(),
            categories: BTreeSet::new(),
            body: String::new(),
            source_url: None,
            extra_fields: BTreeMap::new(),
            extension: None,
        }
    }

    #[test]
    fn test_draft_is_absence_of_date() {
        let mut post = sample_post();
        assert!(post.is_draft());

        let utc = FixedOffset::east_opt(0).unwrap();
        post.published_at = Some(utc.with_ymd_and_hms(2015, 1, 10, 0, 0, 0).unwrap());
        assert!(!post.is_draft());
    }

    #[test]
    fn test_with_extra_opt_skips_none() {
        let post = sample_post()
            .with_extra_opt("excerpt", None::<String>)
            .with_extra_opt("mt_id", Some(123_i64));
        assert!(!post.extra_fields.contains_key("excerpt"));
        assert_eq!(
            post.extra_fields.get("mt_id"),
            Some(&serde_yaml::Value::from(123_i64))
        );
    }
}
