// src/pipeline/assets.rs

//! Image localization for written documents.
//!
//! Remote `<img src>` references are downloaded into an assets folder under
//! the destination and the documents are pointed at the local copies.

use std::path::{Path, PathBuf};

use reqwest::blocking::Client;

use crate::error::Result;
use crate::sources::ImportContext;
use crate::utils::html::image_sources;
use crate::utils::http::{fetch_bytes, is_remote};
use crate::utils::url::path_of;

/// Asset key for a remote image URL: `<folder>/<file name>`.
pub fn asset_key(folder: &str, url: &str) -> Option<PathBuf> {
    let path = path_of(url);
    let name = path.rsplit('/').find(|s| !s.is_empty())?;
    Some(Path::new(folder).join(name))
}

/// Downloads images on demand, building the HTTP client only when a
/// download is actually needed.
pub struct ImageLocalizer<'a> {
    ctx: &'a ImportContext<'a>,
    folder: String,
    client: Option<Client>,
    downloaded: usize,
}

impl<'a> ImageLocalizer<'a> {
    pub fn new(ctx: &'a ImportContext<'a>, folder: &str) -> Self {
        Self {
            ctx,
            folder: folder.trim_matches('/').to_string(),
            client: None,
            downloaded: 0,
        }
    }

    /// Make sure the image behind `url` exists locally.
    ///
    /// Returns the asset key, or `None` when the download failed.
    fn ensure(&mut self, url: &str) -> Result<Option<PathBuf>> {
        let Some(asset) = asset_key(&self.folder, url) else {
            return Ok(None);
        };
        if self.ctx.storage.exists(&asset) {
            log::debug!("{} already downloaded", asset.display());
            return Ok(Some(asset));
        }

        if self.client.is_none() {
            self.client = Some(self.ctx.http_client()?);
        }
        let Some(client) = self.client.as_ref() else {
            return Ok(None);
        };
        match fetch_bytes(client, url) {
            Ok(bytes) => {
                self.ctx.storage.write_bytes(&asset, &bytes)?;
                self.downloaded += 1;
                log::info!("Downloaded {}", url);
                Ok(Some(asset))
            }
            Err(e) => {
                log::error!("Image download failed: {}", e);
                Ok(None)
            }
        }
    }

    /// Localize the remote images of one written document.
    pub fn localize(&mut self, key: &Path) -> Result<()> {
        let Some(text) = self.ctx.storage.read_document(key)? else {
            return Ok(());
        };

        let mut rewritten = text.clone();
        for src in image_sources(&text).into_iter().filter(|s| is_remote(s)) {
            let Some(asset) = self.ensure(&src)? else {
                continue;
            };
            let local = format!("{{{{ site.baseurl }}}}/{}", asset.to_string_lossy());
            rewritten = rewritten.replace(&src, &local);
        }

        if rewritten != text {
            self.ctx.storage.write_document(key, &rewritten)?;
        }
        Ok(())
    }

    /// Localize every document in `keys`; returns the number of downloads.
    pub fn localize_all(mut self, keys: &[PathBuf]) -> Result<usize> {
        for key in keys {
            self.localize(key)?;
        }
        if self.downloaded > 0 {
            log::info!("Downloaded {} images into {}", self.downloaded, self.folder);
        }
        Ok(self.downloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_key_uses_file_name() {
        assert_eq!(
            asset_key("assets", "http://example.files.wordpress.com/2015/01/cat.png?w=300"),
            Some(PathBuf::from("assets/cat.png"))
        );
        assert_eq!(asset_key("assets", "http://example.com/"), None);
    }
}
