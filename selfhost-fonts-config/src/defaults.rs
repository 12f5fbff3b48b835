//! Default value functions for configuration.
//!
//! Each function is used as a `#[serde(default = "crate::defaults::...")]`
//! attribute on a config field, and by the matching `Default` impl.

use std::path::PathBuf;

use crate::options::DownloadFailurePolicy;

pub fn bool_true() -> bool {
    true
}

pub fn bool_false() -> bool {
    false
}

pub fn font_display() -> String {
    String::new() // Omit the descriptor entirely
}

pub fn download_failure() -> DownloadFailurePolicy {
    DownloadFailurePolicy::KeepRemote
}

pub fn upload_dir() -> PathBuf {
    data_dir().join("uploads")
}

pub fn upload_url() -> String {
    "/uploads".to_string()
}

pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("selfhost-fonts"))
        .unwrap_or_else(|| PathBuf::from(".cache"))
}

pub fn catalog_path() -> PathBuf {
    data_dir().join("google-fonts-src.json")
}

pub fn site_url() -> String {
    "http://localhost".to_string()
}

pub fn site_root() -> PathBuf {
    PathBuf::from(".")
}

pub fn content_url() -> String {
    "http://localhost/wp-content".to_string()
}

pub fn content_dir() -> PathBuf {
    PathBuf::from("wp-content")
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("selfhost-fonts"))
        .unwrap_or_else(|| PathBuf::from("."))
}
