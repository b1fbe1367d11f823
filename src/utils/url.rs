// src/utils/url.rs

//! URL manipulation utilities.

/// Scheme and host of a URL, e.g. `http://foobar.blogspot.com`.
///
/// # Examples
/// ```
/// use importer::utils::url::origin_base;
///
/// assert_eq!(
///     origin_base("http://foobar.blogspot.com/1900/02/post0.html"),
///     Some("http://foobar.blogspot.com".to_string())
/// );
/// ```
pub fn origin_base(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}", parsed.scheme(), host, port)),
        None => Some(format!("{}://{}", parsed.scheme(), host)),
    }
}

/// Site-relative path of a URL; relative inputs are returned as-is.
///
/// # Examples
/// ```
/// use importer::utils::url::path_of;
///
/// assert_eq!(
///     path_of("https://www.example.com/post/123/post-title/"),
///     "/post/123/post-title/"
/// );
/// assert_eq!(path_of("/2015/05/05/hi.html"), "/2015/05/05/hi.html");
/// ```
pub fn path_of(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    }
}

/// Extract the trailing numeric identifier of an id string.
///
/// Handles Blogger-style ids such as `tag:blogger.com,1999:blog-1.post-42`.
pub fn trailing_number(id: &str) -> Option<String> {
    let digits: String = id
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    (!digits.is_empty()).then_some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_base_keeps_port() {
        assert_eq!(
            origin_base("http://localhost:4000/2020/01/x.html"),
            Some("http://localhost:4000".to_string())
        );
        assert_eq!(origin_base("not a url"), None);
    }

    #[test]
    fn test_path_of() {
        assert_eq!(path_of("http://foobar.blogspot.com/1900/02/post0.html"), "/1900/02/post0.html");
    }

    #[test]
    fn test_trailing_number() {
        assert_eq!(
            trailing_number("tag:blogger.com,1999:blog-1.post-42"),
            Some("42".to_string())
        );
        assert_eq!(trailing_number("abc"), None);
    }
}
