//! Static font metadata catalog.
//!
//! The catalog file is a JSON document with two top-level keys:
//!
//! ```json
//! {
//!   "fonts":  { "Lato": { "latin": { "400": {
//!       "fontFile": "https://…/lato-400.woff2",
//!       "fontFileWoff": "https://…/lato-400.woff",
//!       "localNames": ["Lato Regular", "Lato-Regular"] } } } },
//!   "ranges": { "latin": "U+0000-00FF, U+0131, …" }
//! }
//! ```
//!
//! It is loaded once at startup and shared read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::variant::Variant;

/// Remote files and local aliases for one family/subset/variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontAsset {
    /// Remote woff2 file
    pub font_file: String,
    /// Remote woff file
    pub font_file_woff: String,
    /// Names usable in `local('…')`
    #[serde(default)]
    pub local_names: Vec<String>,
}

/// subset name → variant key → asset
pub type SubsetTable = HashMap<String, HashMap<String, FontAsset>>;

/// Errors loading the catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read font catalog {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse font catalog {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Family → subset → variant index plus the per-subset Unicode ranges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontCatalog {
    #[serde(default)]
    fonts: HashMap<String, SubsetTable>,
    #[serde(default)]
    ranges: HashMap<String, String>,
}

impl FontCatalog {
    /// Load the catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!(
            "Loaded font catalog {:?}: {} families, {} ranges",
            path,
            catalog.fonts.len(),
            catalog.ranges.len()
        );
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Subsets of a family, if the family is known
    pub fn family(&self, name: &str) -> Option<&SubsetTable> {
        self.fonts.get(name)
    }

    /// Look up one family/subset/variant triple.
    pub fn lookup(&self, family: &str, subset: &str, variant: Variant) -> Option<&FontAsset> {
        self.fonts
            .get(family)?
            .get(subset)?
            .get(&variant.catalog_key())
    }

    /// Unicode range expression for a subset
    pub fn unicode_range(&self, subset: &str) -> Option<&str> {
        self.ranges
            .get(subset)
            .map(String::as_str)
            .filter(|range| !range.trim().is_empty())
    }

    pub fn family_count(&self) -> usize {
        self.fonts.len()
    }

    /// Add or replace an entry. Used when assembling catalogs in code.
    pub fn insert(&mut self, family: &str, subset: &str, variant: Variant, asset: FontAsset) {
        self.fonts
            .entry(family.to_string())
            .or_default()
            .entry(subset.to_string())
            .or_default()
            .insert(variant.catalog_key(), asset);
    }

    pub fn set_range(&mut self, subset: &str, range: &str) {
        self.ranges.insert(subset.to_string(), range.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CATALOG: &str = r#"{
        "fonts": {
            "Lato": {
                "latin": {
                    "400": {
                        "fontFile": "https://fonts.gstatic.com/s/lato/v24/lato-400.woff2",
                        "fontFileWoff": "https://fonts.gstatic.com/s/lato/v24/lato-400.woff",
                        "localNames": ["Lato Regular", "Lato-Regular"]
                    },
                    "700italic": {
                        "fontFile": "https://fonts.gstatic.com/s/lato/v24/lato-700i.woff2",
                        "fontFileWoff": "https://fonts.gstatic.com/s/lato/v24/lato-700i.woff"
                    }
                }
            }
        },
        "ranges": { "latin": "U+0000-00FF", "greek": "" }
    }"#;

    #[test]
    fn test_lookup() {
        let catalog = FontCatalog::from_json(CATALOG).unwrap();
        let asset = catalog.lookup("Lato", "latin", Variant::REGULAR).unwrap();
        assert_eq!(asset.local_names, vec!["Lato Regular", "Lato-Regular"]);

        let italic = catalog
            .lookup("Lato", "latin", Variant::new(700, true))
            .unwrap();
        assert!(italic.local_names.is_empty());
        assert!(italic.font_file.ends_with("lato-700i.woff2"));
    }

    #[test]
    fn test_lookup_misses() {
        let catalog = FontCatalog::from_json(CATALOG).unwrap();
        assert!(catalog.lookup("Roboto", "latin", Variant::REGULAR).is_none());
        assert!(catalog.lookup("Lato", "cyrillic", Variant::REGULAR).is_none());
        assert!(
            catalog
                .lookup("Lato", "latin", Variant::new(300, false))
                .is_none()
        );
    }

    #[test]
    fn test_unicode_range() {
        let catalog = FontCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.unicode_range("latin"), Some("U+0000-00FF"));
        assert_eq!(catalog.unicode_range("greek"), None);
        assert_eq!(catalog.unicode_range("vietnamese"), None);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fonts.json");
        fs::write(&path, CATALOG).unwrap();

        let catalog = FontCatalog::load(&path).unwrap();
        assert_eq!(catalog.family_count(), 1);
    }

    #[test]
    fn test_load_errors() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(
            FontCatalog::load(&missing),
            Err(CatalogError::Read { .. })
        ));

        let broken = temp_dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            FontCatalog::load(&broken),
            Err(CatalogError::Parse { .. })
        ));
    }
}
