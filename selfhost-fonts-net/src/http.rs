//! HTTP client helper with native-tls support.

use std::time::Duration;
use thiserror::Error;
use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};

/// Global timeout for all HTTP operations (30 seconds).
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum response body size for a single font or stylesheet (20 MB).
pub const MAX_DOWNLOAD_SIZE: u64 = 20 * 1024 * 1024;

const USER_AGENT: &str = concat!("selfhost-fonts/", env!("CARGO_PKG_VERSION"));

/// Errors produced while fetching a remote asset.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed at all.
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Only `http` and `https` URLs are fetched.
    #[error("Unsupported URL scheme '{scheme}' for '{url}'; only http and https are fetched")]
    UnsupportedScheme { url: String, scheme: String },

    /// DNS, connection, TLS, timeout, or a non-2xx status.
    #[error("Failed to download '{url}': {source}")]
    Request {
        url: String,
        #[source]
        source: ureq::Error,
    },

    /// The body could not be read or exceeded [`MAX_DOWNLOAD_SIZE`].
    #[error("Failed to read downloaded content from '{url}': {source}")]
    Body {
        url: String,
        #[source]
        source: ureq::Error,
    },
}

/// Something that can turn a URL into bytes.
///
/// Implementations must be `Send + Sync`: one fetcher is shared by every
/// request the host serves.
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return the full response body.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Validate that a URL is something we are willing to download.
///
/// Enforces an `http` or `https` scheme; `file://`, `data:` and friends are
/// rejected before any I/O happens.
pub fn validate_asset_url(url: &str) -> Result<(), FetchError> {
    let parsed = url::Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(FetchError::UnsupportedScheme {
            url: url.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

/// Create a new HTTP agent configured with native-tls and a global timeout.
///
/// With `verify_tls` off, certificate validation is skipped. The font
/// localizer uses that mode to tolerate the font host's certificate chain on
/// misconfigured servers; it weakens transport security and is not a sane
/// default for anything else.
pub fn agent(verify_tls: bool) -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .disable_verification(!verify_tls)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .timeout_global(Some(HTTP_TIMEOUT))
        .build()
        .into()
}

/// [`Fetcher`] backed by a ureq [`Agent`].
#[derive(Clone)]
pub struct HttpFetcher {
    agent: Agent,
}

impl HttpFetcher {
    /// Fetcher with certificate validation on.
    pub fn new() -> Self {
        Self { agent: agent(true) }
    }

    /// Fetcher with certificate validation off. See [`agent`].
    pub fn relaxed_tls() -> Self {
        Self {
            agent: agent(false),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        validate_asset_url(url)?;

        log::debug!("GET {}", url);

        let bytes = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?
            .into_body()
            .with_config()
            .limit(MAX_DOWNLOAD_SIZE)
            .read_to_vec()
            .map_err(|source| FetchError::Body {
                url: url.to_string(),
                source,
            })?;

        log::debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_https_url() {
        assert!(
            validate_asset_url("https://fonts.gstatic.com/s/lato/v24/S6uyw4BMUTPHjx4wXg.woff2")
                .is_ok()
        );
    }

    #[test]
    fn test_valid_http_url() {
        assert!(validate_asset_url("http://example.com/font.woff").is_ok());
    }

    #[test]
    fn test_rejected_file_scheme() {
        let result = validate_asset_url("file:///etc/passwd");
        let err = result.unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme { .. }));
        assert!(
            err.to_string().contains("file"),
            "Error should mention the bad scheme: {err}"
        );
    }

    #[test]
    fn test_rejected_invalid_url() {
        let err = validate_asset_url("not a url at all").unwrap_err();
        assert!(
            err.to_string().contains("Invalid URL"),
            "Error should mention parse failure: {err}"
        );
    }

    #[test]
    fn test_fetch_rejects_before_network() {
        let fetcher = HttpFetcher::relaxed_tls();
        let err = fetcher.fetch("ftp://example.com/font.woff2").unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme { .. }));
    }

    #[test]
    fn test_verifying_fetcher_validates_first() {
        let fetcher = HttpFetcher::new();
        let err = fetcher.fetch("file:///etc/passwd").unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme { .. }));

        let err = HttpFetcher::default().fetch("not a url").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
