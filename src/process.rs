//! Font-service URL processing: turning a stylesheet URL into a local
//! stylesheet, with the results cached per source URL.

use std::sync::Arc;

use selfhost_fonts_config::site::strip_scheme;
use selfhost_fonts_config::{Config, FONTS_HOST, Options};
use selfhost_fonts_net::Fetcher;

use crate::cache::{Namespace, UrlCache};
use crate::catalog::FontCatalog;
use crate::font_css::FontCssGenerator;
use crate::fonts_url::{FontRequest, is_fonts_css_url, parse_fonts_url};
use crate::localizer::{AssetLocalizer, public_url};
use crate::storage::{FONT_CSS_PREFIX, UploadArea};

/// What the hosting server knows about the current request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Request is for the administration area
    pub is_admin_area: bool,
    /// Request renders a live customization preview
    pub is_customize_preview: bool,
    /// Requesting user may change plugin options
    pub can_manage_options: bool,
}

/// Form in which [`Processor::get_processed`] hands back an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Public URL of the generated file
    Url,
    /// Contents of the generated file
    Css,
}

/// Shared state for localizing fonts: configuration, catalog, cache,
/// upload area and the fetcher used for downloads.
///
/// Constructed once and shared by every request; nothing here is mutated
/// after construction except through the cache and the upload area.
pub struct Processor {
    config: Config,
    catalog: Arc<FontCatalog>,
    cache: UrlCache,
    upload: UploadArea,
    fetcher: Arc<dyn Fetcher>,
}

impl Processor {
    pub fn new(config: Config, catalog: Arc<FontCatalog>, fetcher: Arc<dyn Fetcher>) -> Self {
        let cache = UrlCache::new(config.storage.cache_dir.clone());
        let upload = UploadArea::new(&config.storage);
        Self {
            config,
            catalog,
            cache,
            upload,
            fetcher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn options(&self) -> &Options {
        &self.config.options
    }

    pub fn catalog(&self) -> &FontCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &UrlCache {
        &self.cache
    }

    pub fn upload(&self) -> &UploadArea {
        &self.upload
    }

    /// Whether fonts should be localized for this request at all.
    pub fn should_process(&self, ctx: &RequestContext) -> bool {
        let options = self.options();
        if ctx.is_admin_area || ctx.is_customize_preview || !options.enabled {
            return false;
        }
        !(options.disable_for_admins && ctx.can_manage_options)
    }

    /// Whether whole documents should be passed through the markup processor.
    pub fn should_process_html(&self) -> bool {
        self.options().processes_html()
    }

    /// Rewrite a registered stylesheet URL.
    ///
    /// Font-service URLs become the URL of their localized stylesheet; any
    /// other URL, or a font-service URL that could not be localized, is
    /// returned unchanged.
    pub fn process_enqueue(&self, url: &str) -> String {
        if !self.options().process_enqueues || !is_fonts_css_url(url) {
            return url.to_string();
        }
        self.get_processed(url, |url| self.process_fonts_url(url), Output::Url)
            .unwrap_or_else(|| url.to_string())
    }

    /// Return the cached artifact for `url`, generating it on a miss.
    ///
    /// The generator returns the name of a file it wrote to the upload area,
    /// or `None` when it had nothing to produce; `None` results are not
    /// cached. A cache entry whose file has disappeared counts as a miss.
    pub fn get_processed<F>(&self, url: &str, generator: F, output: Output) -> Option<String>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let file = match self.cache.get(Namespace::Processed, url) {
            Some(file) if self.upload.contains(&file) => file,
            cached => {
                if let Some(file) = cached {
                    log::debug!("Cached file {} for {} is missing, regenerating", file, url);
                }
                let file = generator(url)?;
                if let Err(e) = self.cache.put(Namespace::Processed, url, &file) {
                    log::warn!("Could not cache {} for {}: {}", file, url, e);
                }
                file
            }
        };

        match output {
            Output::Url => Some(public_url(
                &self.upload.url_of(&file),
                self.options().protocol_relative,
            )),
            Output::Css => match self.upload.read_to_string(&file) {
                Ok(css) if !css.is_empty() => Some(css),
                Ok(_) => None,
                Err(e) => {
                    log::warn!("{}", e);
                    None
                }
            },
        }
    }

    /// Generate a local stylesheet for a font-service URL.
    ///
    /// Returns the generated file name, `font-<md5(url)>.css`, or `None` when
    /// the URL names nothing the catalog can serve.
    pub fn process_fonts_url(&self, url: &str) -> Option<String> {
        let parsed = match parse_fonts_url(url, &self.options().force_subsets) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::debug!("Leaving {} alone: {}", url, e);
                return None;
            }
        };

        let css = self.generate_css(&parsed.families, &parsed.subsets);
        if css.is_empty() {
            log::debug!("No catalog entries for {}", url);
            return None;
        }

        let name = format!("{}{}", FONT_CSS_PREFIX, UrlCache::key(url));
        match self.upload.create_css_file(&css.join("\n"), &name) {
            Ok(file) => Some(file),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }

    /// `@font-face` blocks for every requested family, in request order.
    pub fn generate_css(&self, families: &[FontRequest], subsets: &[String]) -> Vec<String> {
        let localizer = AssetLocalizer::new(
            &self.upload,
            &self.cache,
            self.fetcher.as_ref(),
            self.options().protocol_relative,
        );
        let generator = FontCssGenerator::new(&self.catalog, &localizer, self.options());

        families
            .iter()
            .flat_map(|font| generator.generate(&font.name, &font.variants, subsets))
            .collect()
    }
}

/// Drop the font service host from a list of resource hints.
///
/// Once fonts are served locally, prefetching the remote host only costs a
/// DNS lookup.
pub fn remove_fonts_prefetch(hints: Vec<String>) -> Vec<String> {
    hints
        .into_iter()
        .filter(|hint| {
            !strip_scheme(hint.trim())
                .trim_end_matches('/')
                .eq_ignore_ascii_case(FONTS_HOST)
        })
        .collect()
}
