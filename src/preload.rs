//! `<link rel="preload">` tags for configured fonts.
//!
//! Preload targets are resolved only from fonts that were already localized
//! while generating stylesheets. Nothing here downloads.

use crate::cache::{Namespace, UrlCache};
use crate::catalog::FontCatalog;
use crate::fonts_url::DEFAULT_SUBSET;
use crate::variant::Variant;

/// A configured `family:weight:subset` preload entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadSpec {
    pub family: String,
    pub variant: Variant,
    pub subset: String,
}

impl PreloadSpec {
    /// Parse `family[:weight[:subset]]`. The weight is canonicalized like any
    /// variant token and the subset defaults to `latin`.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut parts = spec.splitn(3, ':').map(str::trim);
        let family = parts.next().filter(|family| !family.is_empty())?;
        let variant = parts
            .next()
            .filter(|token| !token.is_empty())
            .map_or(Variant::REGULAR, Variant::parse);
        let subset = parts
            .next()
            .filter(|subset| !subset.is_empty())
            .unwrap_or(DEFAULT_SUBSET);

        Some(Self {
            family: family.to_string(),
            variant,
            subset: subset.to_string(),
        })
    }

    /// Identifier under which the resolved URL is cached
    fn cache_id(&self) -> String {
        format!("{}:{}:{}", self.family, self.variant, self.subset)
    }
}

pub struct Preloader<'a> {
    catalog: &'a FontCatalog,
    cache: &'a UrlCache,
    specs: Vec<PreloadSpec>,
}

impl<'a> Preloader<'a> {
    /// Build from the configured entries; unparseable entries are dropped.
    pub fn new(catalog: &'a FontCatalog, cache: &'a UrlCache, entries: &[String]) -> Self {
        let specs = entries
            .iter()
            .filter_map(|entry| {
                let spec = PreloadSpec::parse(entry);
                if spec.is_none() {
                    log::warn!("Ignoring preload entry {:?}", entry);
                }
                spec
            })
            .collect();

        Self {
            catalog,
            cache,
            specs,
        }
    }

    /// Local woff2 URLs for every entry that has been localized, in
    /// configuration order.
    pub fn urls(&self) -> Vec<String> {
        self.specs.iter().filter_map(|spec| self.resolve(spec)).collect()
    }

    /// One preload tag per resolved URL
    pub fn tags(&self) -> Vec<String> {
        self.urls()
            .iter()
            .map(|url| {
                format!(
                    "<link rel=\"preload\" as=\"font\" href=\"{}\" type=\"font/woff2\" crossorigin>",
                    html_escape::encode_double_quoted_attribute(url)
                )
            })
            .collect()
    }

    fn resolve(&self, spec: &PreloadSpec) -> Option<String> {
        let id = spec.cache_id();
        if let Some(url) = self.cache.get(Namespace::Preload, &id) {
            return Some(url);
        }

        let asset = self
            .catalog
            .lookup(&spec.family, &spec.subset, spec.variant)?;
        let Some(local) = self.cache.get(Namespace::Processed, &asset.font_file) else {
            log::debug!("{} has not been localized yet, not preloading", id);
            return None;
        };

        if let Err(e) = self.cache.put(Namespace::Preload, &id, &local) {
            log::warn!("Could not cache preload URL for {}: {}", id, e);
        }
        Some(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FontAsset;
    use tempfile::TempDir;

    const WOFF2: &str = "https://fonts.gstatic.com/s/lato/v1/lato700i.woff2";

    fn catalog() -> FontCatalog {
        let mut catalog = FontCatalog::default();
        catalog.insert(
            "Lato",
            "latin-ext",
            Variant::new(700, true),
            FontAsset {
                font_file: WOFF2.to_string(),
                font_file_woff: "https://fonts.gstatic.com/s/lato/v1/lato700i.woff".to_string(),
                local_names: Vec::new(),
            },
        );
        catalog
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            PreloadSpec::parse("Lato:700i:latin-ext"),
            Some(PreloadSpec {
                family: "Lato".to_string(),
                variant: Variant::new(700, true),
                subset: "latin-ext".to_string(),
            })
        );
        assert_eq!(
            PreloadSpec::parse(" Open Sans "),
            Some(PreloadSpec {
                family: "Open Sans".to_string(),
                variant: Variant::REGULAR,
                subset: "latin".to_string(),
            })
        );
        assert_eq!(PreloadSpec::parse(":700"), None);
    }

    #[test]
    fn test_resolves_only_localized_fonts() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = catalog();
        let cache = UrlCache::new(temp_dir.path());
        let entries = vec!["Lato:700italic:latin-ext".to_string(), "Roboto".to_string()];

        let preloader = Preloader::new(&catalog, &cache, &entries);
        assert!(preloader.urls().is_empty());

        cache
            .put(Namespace::Processed, WOFF2, "/uploads/sgf-css/lato700i.woff2")
            .unwrap();
        assert_eq!(preloader.urls(), vec!["/uploads/sgf-css/lato700i.woff2"]);
        assert_eq!(
            preloader.tags(),
            vec![
                "<link rel=\"preload\" as=\"font\" href=\"/uploads/sgf-css/lato700i.woff2\" type=\"font/woff2\" crossorigin>"
            ]
        );

        // Served from the preload namespace from now on
        cache.clear(Namespace::Processed).unwrap();
        assert_eq!(preloader.urls(), vec!["/uploads/sgf-css/lato700i.woff2"]);

        cache.clear(Namespace::Preload).unwrap();
        assert!(preloader.urls().is_empty());
    }
}
