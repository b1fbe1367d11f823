// src/utils/slug.rs

//! Slug derivation.

/// Turn arbitrary text into a filename-safe slug.
///
/// Lower-cases ASCII, collapses every run of characters outside `[a-z0-9]`
/// into a single `-`, and trims leading/trailing separators. May return an
/// empty string when the input has no alphanumerics.
///
/// ```
/// use importer::utils::slug::slugify;
///
/// assert_eq!(slugify("blogs part 1/2"), "blogs-part-1-2");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars().map(|c| c.to_ascii_lowercase()) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Reduce a permalink (absolute URL or path) to a slug.
///
/// Takes the last non-empty path segment and drops its extension, so
/// `/2015/05/05/hi.html` becomes `hi`.
pub fn slug_from_permalink(permalink: &str) -> Option<String> {
    let path = match url::Url::parse(permalink) {
        Ok(url) => url.path().to_string(),
        Err(_) => permalink.to_string(),
    };

    let segment = path.split('/').filter(|s| !s.is_empty()).last()?;
    let stem = match segment.rfind('.') {
        Some(idx) if idx > 0 => &segment[..idx],
        _ => segment,
    };

    let slug = slugify(stem);
    (!slug.is_empty()).then_some(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_runs_and_case() {
        assert_eq!(slugify("blogs part 1/2"), "blogs-part-1-2");
        assert_eq!(slugify("Hello,   World!!"), "hello-world");
        assert_eq!(slugify("--Already-Slugged--"), "already-slugged");
    }

    #[test]
    fn test_punctuation_only_is_empty() {
        assert_eq!(slugify("?!... ///"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_non_ascii_is_a_separator() {
        assert_eq!(slugify("café au lait"), "caf-au-lait");
    }

    #[test]
    fn test_slug_from_permalink() {
        assert_eq!(
            slug_from_permalink("/2015/05/05/hi.html"),
            Some("hi".to_string())
        );
        assert_eq!(
            slug_from_permalink("https://www.example.com/post/123/post-title/"),
            Some("post-title".to_string())
        );
        assert_eq!(slug_from_permalink("/"), None);
    }
}
