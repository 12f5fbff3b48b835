//! Site URL to filesystem mappings.
//!
//! Stylesheet URLs found in a page are resolved to local files by matching
//! them against these mappings: the content directory first, then the site
//! root as a fallback.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Public URLs of the site and where they live on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site root URL, e.g. `https://example.com`
    #[serde(default = "crate::defaults::site_url")]
    pub site_url: String,

    /// Directory served at `site_url`
    #[serde(default = "crate::defaults::site_root")]
    pub site_root: PathBuf,

    /// Content URL, e.g. `https://example.com/wp-content`
    #[serde(default = "crate::defaults::content_url")]
    pub content_url: String,

    /// Directory served at `content_url`
    #[serde(default = "crate::defaults::content_dir")]
    pub content_dir: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_url: crate::defaults::site_url(),
            site_root: crate::defaults::site_root(),
            content_url: crate::defaults::content_url(),
            content_dir: crate::defaults::content_dir(),
        }
    }
}

/// A URL prefix served from a local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    /// URL prefix without scheme, leading `www.`, or trailing slash
    pub url: String,
    /// Host part of `url`
    pub host: String,
    /// Directory the prefix maps to
    pub dir: PathBuf,
}

impl PathMapping {
    /// Build a mapping, returning `None` when the URL has no usable host.
    pub fn new(url: &str, dir: impl Into<PathBuf>) -> Option<Self> {
        let stripped = strip_scheme(url.trim()).trim_end_matches('/').to_string();
        let host = host_of(&stripped)?;
        Some(Self {
            url: stripped,
            host,
            dir: dir.into(),
        })
    }
}

impl SiteConfig {
    /// Mappings in match order: content directory first, site root second.
    pub fn path_mappings(&self) -> Vec<PathMapping> {
        [
            (self.content_url.as_str(), &self.content_dir),
            (self.site_url.as_str(), &self.site_root),
        ]
        .into_iter()
        .filter_map(|(url, dir)| {
            let mapping = PathMapping::new(url, dir.clone());
            if mapping.is_none() {
                log::warn!("Ignoring site mapping with unusable URL {:?}", url);
            }
            mapping
        })
        .collect()
    }
}

/// Remove a leading `http://`, `https://`, `//` or `://` and then a leading `www.`.
pub fn strip_scheme(url: &str) -> &str {
    let lower = url.to_ascii_lowercase();
    let mut rest = url;
    for prefix in ["https://", "http://", "https:", "http:", "://", "//"] {
        if lower.starts_with(prefix) {
            rest = &url[prefix.len()..];
            if prefix.ends_with(':') {
                rest = rest.strip_prefix("//").unwrap_or(rest);
            }
            break;
        }
    }
    match rest.get(..4) {
        Some(head) if head.eq_ignore_ascii_case("www.") => &rest[4..],
        _ => rest,
    }
}

/// Host of a scheme-less URL.
pub fn host_of(stripped: &str) -> Option<String> {
    let parsed = url::Url::parse(&format!("http://{stripped}")).ok()?;
    parsed.host_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_scheme() {
        assert_eq!(strip_scheme("https://www.example.com/a"), "example.com/a");
        assert_eq!(strip_scheme("http://example.com"), "example.com");
        assert_eq!(strip_scheme("//cdn.example.com/x.css"), "cdn.example.com/x.css");
        assert_eq!(strip_scheme("HTTPS://WWW.Example.com"), "Example.com");
        assert_eq!(strip_scheme("example.com/path"), "example.com/path");
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("example.com/wp-content").as_deref(), Some("example.com"));
        assert_eq!(host_of("example.com:8080/x").as_deref(), Some("example.com"));
    }

    #[test]
    fn test_path_mappings_order() {
        let site = SiteConfig {
            site_url: "https://www.example.com/".to_string(),
            site_root: PathBuf::from("/srv/www"),
            content_url: "https://example.com/wp-content".to_string(),
            content_dir: PathBuf::from("/srv/www/wp-content"),
        };
        let mappings = site.path_mappings();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].url, "example.com/wp-content");
        assert_eq!(mappings[0].dir, PathBuf::from("/srv/www/wp-content"));
        assert_eq!(mappings[1].url, "example.com");
        assert_eq!(mappings[1].host, "example.com");
    }
}
