//! Shared integration test helpers for selfhost-fonts.
//!
//! Builds a complete processing setup inside a temporary directory: a small
//! font catalog, an upload area, a cache directory, a site tree with a local
//! stylesheet, and a fetcher that counts downloads instead of touching the
//! network.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::TestContext;
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a
//! subset of helpers is used per file.

#![allow(dead_code)]

use parking_lot::Mutex;
use selfhost_fonts::{FontCatalog, Processor};
use selfhost_fonts_config::{Config, Options, SiteConfig, StorageConfig};
use selfhost_fonts_net::{FetchError, Fetcher};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const LATO_URL: &str = "https://fonts.googleapis.com/css?family=Lato:400,700&subset=latin";

pub const SITE_URL: &str = "https://example.com";
pub const UPLOAD_URL: &str = "https://example.com/wp-content/uploads";

/// Catalog in the on-disk format: Lato 400/700 in latin and latin-ext,
/// Roboto 400 in latin only.
pub const CATALOG_JSON: &str = r#"{
  "fonts": {
    "Lato": {
      "latin": {
        "400": {
          "fontFile": "https://fonts.gstatic.com/s/lato/v24/lato-latin-400.woff2",
          "fontFileWoff": "https://fonts.gstatic.com/s/lato/v24/lato-latin-400.woff",
          "localNames": ["Lato Regular", "Lato-Regular"]
        },
        "700": {
          "fontFile": "https://fonts.gstatic.com/s/lato/v24/lato-latin-700.woff2",
          "fontFileWoff": "https://fonts.gstatic.com/s/lato/v24/lato-latin-700.woff",
          "localNames": ["Lato Bold", "Lato-Bold"]
        }
      },
      "latin-ext": {
        "400": {
          "fontFile": "https://fonts.gstatic.com/s/lato/v24/lato-ext-400.woff2",
          "fontFileWoff": "https://fonts.gstatic.com/s/lato/v24/lato-ext-400.woff"
        }
      }
    },
    "Roboto": {
      "latin": {
        "400": {
          "fontFile": "https://fonts.gstatic.com/s/roboto/v30/roboto-latin-400.woff2",
          "fontFileWoff": "https://fonts.gstatic.com/s/roboto/v30/roboto-latin-400.woff"
        }
      }
    }
  },
  "ranges": {
    "latin": "U+0000-00FF, U+0131, U+0152-0153",
    "latin-ext": "U+0100-024F"
  }
}"#;

/// Fetcher that serves fake font bytes and records every request.
#[derive(Default)]
pub struct CountingFetcher {
    calls: Mutex<HashMap<String, usize>>,
    fail_all: bool,
}

impl CountingFetcher {
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Total number of fetches
    pub fn total(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Number of fetches of one URL
    pub fn count(&self, url: &str) -> usize {
        self.calls.lock().get(url).copied().unwrap_or(0)
    }
}

impl Fetcher for CountingFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        *self.calls.lock().entry(url.to_string()).or_default() += 1;
        if self.fail_all {
            return Err(FetchError::UnsupportedScheme {
                url: url.to_string(),
                scheme: "offline".to_string(),
            });
        }
        Ok(format!("font bytes for {url}").into_bytes())
    }
}

/// A processor wired to a temporary directory tree.
///
/// The `TempDir` must stay alive for the duration of the test.
pub struct TestContext {
    pub temp_dir: TempDir,
    pub processor: Processor,
    pub fetcher: Arc<CountingFetcher>,
}

impl TestContext {
    /// Every processing pass enabled
    pub fn new() -> Self {
        Self::with_options(Options {
            process_css_files: true,
            process_css_inline: true,
            ..Options::default()
        })
    }

    pub fn with_options(options: Options) -> Self {
        Self::build(options, CountingFetcher::default())
    }

    pub fn offline(options: Options) -> Self {
        Self::build(options, CountingFetcher::failing())
    }

    fn build(options: Options, fetcher: CountingFetcher) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = config_in(&temp_dir, options);
        let catalog = FontCatalog::from_json(CATALOG_JSON).expect("Invalid test catalog");
        let fetcher = Arc::new(fetcher);
        let processor = Processor::new(config, Arc::new(catalog), fetcher.clone());
        Self {
            temp_dir,
            processor,
            fetcher,
        }
    }

    pub fn site_root(&self) -> PathBuf {
        self.temp_dir.path().join("site")
    }

    /// Write a file below the site root, creating directories as needed.
    pub fn write_site_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.site_root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create site dir");
        }
        fs::write(&path, content).expect("Failed to write site file");
        path
    }

    /// Names of the files in the upload area, sorted
    pub fn uploaded_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.processor.upload().dir())
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// Configuration with every path inside `temp_dir`.
///
/// Layout:
/// ```text
/// <tmp>/
///   site/              # site root, served at https://example.com
///     wp-content/      # content dir, served at https://example.com/wp-content
///       uploads/       # upload area (generated files in sgf-css/)
///   cache/             # URL cache files
/// ```
pub fn config_in(temp_dir: &TempDir, options: Options) -> Config {
    let site_root = temp_dir.path().join("site");
    Config {
        options,
        storage: StorageConfig {
            upload_dir: site_root.join("wp-content").join("uploads"),
            upload_url: UPLOAD_URL.to_string(),
            cache_dir: temp_dir.path().join("cache"),
            catalog_path: temp_dir.path().join("google-fonts-src.json"),
        },
        site: SiteConfig {
            site_url: SITE_URL.to_string(),
            site_root: site_root.clone(),
            content_url: format!("{SITE_URL}/wp-content"),
            content_dir: site_root.join("wp-content"),
        },
    }
}
