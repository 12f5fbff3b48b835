use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where generated artifacts, cache namespaces, and the font catalog live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the upload area; artifacts go in its `sgf-css/` subdirectory
    #[serde(default = "crate::defaults::upload_dir")]
    pub upload_dir: PathBuf,

    /// Public URL of `upload_dir`
    #[serde(default = "crate::defaults::upload_url")]
    pub upload_url: String,

    /// Directory holding one JSON file per cache namespace
    #[serde(default = "crate::defaults::cache_dir")]
    pub cache_dir: PathBuf,

    /// Font metadata catalog (`fonts` + `ranges`)
    #[serde(default = "crate::defaults::catalog_path")]
    pub catalog_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: crate::defaults::upload_dir(),
            upload_url: crate::defaults::upload_url(),
            cache_dir: crate::defaults::cache_dir(),
            catalog_path: crate::defaults::catalog_path(),
        }
    }
}

impl StorageConfig {
    /// Directory generated files are written to
    pub fn artifact_dir(&self) -> PathBuf {
        self.upload_dir.join(crate::UPLOAD_SUBDIR)
    }

    /// Public URL of [`Self::artifact_dir`], always with a trailing slash
    pub fn artifact_url(&self) -> String {
        format!(
            "{}/{}/",
            self.upload_url.trim_end_matches('/'),
            crate::UPLOAD_SUBDIR
        )
    }
}
