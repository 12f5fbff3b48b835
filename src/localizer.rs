//! Downloading remote font files into the upload area.

use selfhost_fonts_net::{FetchError, Fetcher};
use thiserror::Error;

use crate::cache::{Namespace, UrlCache};
use crate::storage::{StorageError, UploadArea, sanitize_file_name};

#[derive(Debug, Error)]
pub enum LocalizeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Turns remote asset URLs into URLs of local copies.
///
/// The local file name depends only on the remote URL, so "file exists"
/// doubles as "already downloaded" and repeated or concurrent calls for the
/// same URL are harmless.
pub struct AssetLocalizer<'a> {
    upload: &'a UploadArea,
    cache: &'a UrlCache,
    fetcher: &'a dyn Fetcher,
    protocol_relative: bool,
}

impl<'a> AssetLocalizer<'a> {
    pub fn new(
        upload: &'a UploadArea,
        cache: &'a UrlCache,
        fetcher: &'a dyn Fetcher,
        protocol_relative: bool,
    ) -> Self {
        Self {
            upload,
            cache,
            fetcher,
            protocol_relative,
        }
    }

    /// Local file name for a remote URL: its sanitized base name.
    pub fn local_name(remote_url: &str) -> String {
        let base = remote_url
            .trim()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        sanitize_file_name(base)
    }

    /// Make sure a local copy of `remote_url` exists and return its URL.
    ///
    /// Downloads only when the file is missing. On success the mapping
    /// `remote_url → local URL` is recorded in the processed namespace, where
    /// the preloader later finds it.
    pub fn localize(&self, remote_url: &str) -> Result<String, LocalizeError> {
        let name = Self::local_name(remote_url);

        if self.upload.contains(&name) {
            log::debug!("Font file {} already present", name);
        } else {
            let bytes = self.fetcher.fetch(remote_url)?;
            self.upload.write(&name, &bytes)?;
            log::info!("Downloaded {} ({} bytes)", remote_url, bytes.len());
        }

        let local_url = public_url(&self.upload.url_of(&name), self.protocol_relative);
        if let Err(e) = self.cache.put(Namespace::Processed, remote_url, &local_url) {
            log::warn!("Could not cache local URL for {}: {}", remote_url, e);
        }

        Ok(local_url)
    }
}

/// Strip the scheme from an absolute URL when protocol-relative output is on.
pub fn public_url(url: &str, protocol_relative: bool) -> String {
    if !protocol_relative {
        return url.to_string();
    }
    ["https://", "http://"]
        .iter()
        .find_map(|scheme| {
            url.get(..scheme.len())
                .filter(|head| head.eq_ignore_ascii_case(scheme))
                .map(|_| format!("//{}", &url[scheme.len()..]))
        })
        .unwrap_or_else(|| url.to_string())
}
