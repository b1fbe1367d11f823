//! Output path derivation.

use std::path::PathBuf;

use crate::models::{CanonicalPost, PostKind};

pub const POSTS_DIR: &str = "_posts";
pub const DRAFTS_DIR: &str = "_drafts";
pub const COMMENTS_DIR: &str = "_comments";

/// Relative output path for a post.
///
/// - post with date: `_posts/YYYY-MM-DD-slug.ext`
/// - post without date: `_drafts/slug.ext`
/// - page: `slug.ext`
/// - comment: `_comments/slug.ext`
pub fn derive_path(post: &CanonicalPost, extension: &str) -> PathBuf {
    let extension = extension.trim_start_matches('.');
    let file = format!("{}.{}", post.slug, extension);

    match (post.kind, post.published_at) {
        (PostKind::Post, Some(date)) => PathBuf::from(POSTS_DIR)
            .join(format!("{}-{}", date.format("%Y-%m-%d"), file)),
        (PostKind::Post, None) => PathBuf::from(DRAFTS_DIR).join(file),
        (PostKind::Page, _) => PathBuf::from(file),
        (PostKind::Comment, _) => PathBuf::from(COMMENTS_DIR).join(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use std::collections::{BTreeMap, BTreeSet};

    fn post(kind: PostKind, dated: bool) -> CanonicalPost {
        let utc = FixedOffset::east_opt(0).unwrap();
        CanonicalPost {
            id: None,
            title: "Hi".to_string(),
            slug: "hi".to_string(),
            published_at: dated.then(|| utc.with_ymd_and_hms(2015, 1, 10, 0, 0, 0).unwrap()),
            kind,
            tags: BTreeSet::new(),
            categories: BTreeSet::new(),
            body: String::new(),
            source_url: None,
            extra_fields: BTreeMap::new(),
            extension: None,
        }
    }

    #[test]
    fn test_dated_post() {
        assert_eq!(
            derive_path(&post(PostKind::Post, true), "markdown"),
            PathBuf::from("_posts/2015-01-10-hi.markdown")
        );
    }

    #[test]
    fn test_draft_has_no_date_segment() {
        assert_eq!(
            derive_path(&post(PostKind::Post, false), ".html"),
            PathBuf::from("_drafts/hi.html")
        );
    }

    #[test]
    fn test_page_and_comment() {
        assert_eq!(derive_path(&post(PostKind::Page, true), "html"), PathBuf::from("hi.html"));
        assert_eq!(
            derive_path(&post(PostKind::Comment, true), "html"),
            PathBuf::from("_comments/hi.html")
        );
    }

    #[test]
    fn test_is_pure() {
        let p = post(PostKind::Post, true);
        assert_eq!(derive_path(&p, "md"), derive_path(&p, "md"));
    }
}
