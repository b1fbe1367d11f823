// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// Create a configured blocking HTTP client.
pub fn create_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a URL as text, failing on non-success status codes.
pub fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| AppError::source_unavailable(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::source_unavailable(url, format!("HTTP {status}")));
    }

    response
        .text()
        .map_err(|e| AppError::source_unavailable(url, e))
}

/// Fetch a URL as raw bytes.
pub fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| AppError::source_unavailable(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::source_unavailable(url, format!("HTTP {status}")));
    }

    let bytes = response
        .bytes()
        .map_err(|e| AppError::source_unavailable(url, e))?;
    Ok(bytes.to_vec())
}

/// Read a source that may be either a local path or an http(s) URL.
pub fn read_source(client: impl FnOnce() -> Result<Client>, source: &str) -> Result<String> {
    if is_remote(source) {
        let client = client()?;
        fetch_text(&client, source)
    } else {
        std::fs::read_to_string(source).map_err(|e| AppError::source_unavailable(source, e))
    }
}

/// Whether a source string names a remote resource.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_create_client_from_default_config() {
        assert!(create_client(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://medium.com/feed/@someone"));
        assert!(is_remote("http://example.com/rss.xml"));
        assert!(!is_remote("feed.xml"));
        assert!(!is_remote("/tmp/http/feed.xml"));
    }

    #[test]
    fn test_read_local_source_without_client() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<rss/>").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let content = read_source(
            || Err(AppError::config("client must not be built for local files")),
            &path,
        )
        .unwrap();
        assert_eq!(content, "<rss/>");
    }

    #[test]
    fn test_missing_local_source_is_unavailable() {
        let err = read_source(|| create_client(&HttpConfig::default()), "/nope/feed.xml")
            .unwrap_err();
        assert!(matches!(err, AppError::SourceUnavailable { .. }));
    }
}
