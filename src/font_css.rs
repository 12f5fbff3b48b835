//! `@font-face` generation for one family.

use selfhost_fonts_config::{DownloadFailurePolicy, Options};

use crate::catalog::{FontAsset, FontCatalog};
use crate::localizer::AssetLocalizer;
use crate::variant::Variant;

/// Renders `@font-face` blocks from catalog entries, localizing the font
/// files they reference along the way.
pub struct FontCssGenerator<'a> {
    catalog: &'a FontCatalog,
    localizer: &'a AssetLocalizer<'a>,
    options: &'a Options,
}

impl<'a> FontCssGenerator<'a> {
    pub fn new(
        catalog: &'a FontCatalog,
        localizer: &'a AssetLocalizer<'a>,
        options: &'a Options,
    ) -> Self {
        Self {
            catalog,
            localizer,
            options,
        }
    }

    /// One block per (subset, variant) pair found in the catalog.
    ///
    /// Subsets are the outer loop and variants the inner one, so output order
    /// is stable for a given request. Pairs missing from the catalog are
    /// skipped silently.
    pub fn generate(&self, family: &str, variants: &[Variant], subsets: &[String]) -> Vec<String> {
        if self.catalog.family(family).is_none() {
            log::debug!("Family {:?} is not in the font catalog", family);
            return Vec::new();
        }

        let mut blocks = Vec::new();
        for subset in subsets {
            for &variant in variants {
                let Some(asset) = self.catalog.lookup(family, subset, variant) else {
                    log::debug!("No {} {} for {:?}", subset, variant, family);
                    continue;
                };
                if let Some(block) = self.font_face(family, subset, variant, asset) {
                    blocks.push(block);
                }
            }
        }
        blocks
    }

    fn font_face(
        &self,
        family: &str,
        subset: &str,
        variant: Variant,
        asset: &FontAsset,
    ) -> Option<String> {
        let woff2 = self.local_or_fallback(&asset.font_file)?;
        let woff = self.local_or_fallback(&asset.font_file_woff)?;

        let mut rules = vec![
            format!("font-family: \"{}\"", sanitize_text(family)),
            format!("font-weight: {}", variant.weight),
            format!("font-style: {}", variant.css_style()),
        ];

        if let Some(display) = self.options.font_display() {
            rules.push(format!("font-display: {}", sanitize_text(display)));
        }

        let mut src = Vec::new();
        if !self.options.disable_local_names {
            src.extend(
                asset
                    .local_names
                    .iter()
                    .map(|name| format!("local('{}')", escape_css_string(name))),
            );
        }
        src.push(format!("url({}) format('woff2')", escape_css_url(&woff2)));
        src.push(format!("url({}) format('woff')", escape_css_url(&woff)));
        rules.push(format!("src: {}", src.join(", ")));

        if let Some(range) = self.catalog.unicode_range(subset) {
            rules.push(format!("unicode-range: {}", range));
        }

        let body: Vec<String> = rules.iter().map(|rule| format!("\t{};", rule)).collect();
        Some(format!("@font-face {{\n{}\n}}", body.join("\n")))
    }

    /// Local URL for a font file, or what the failure policy says to use instead.
    fn local_or_fallback(&self, remote_url: &str) -> Option<String> {
        match self.localizer.localize(remote_url) {
            Ok(local) => Some(local),
            Err(e) => {
                log::warn!("{}", e);
                match self.options.download_failure {
                    DownloadFailurePolicy::KeepRemote => Some(remote_url.to_string()),
                    DownloadFailurePolicy::SkipFace => None,
                }
            }
        }
    }
}

/// Strip characters that could break out of a declaration value.
fn sanitize_text(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '<' | '>' | ';' | '{' | '}' | '\\') && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Percent-encode the characters that would end an unquoted `url(...)`.
fn escape_css_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            ' ' => out.push_str("%20"),
            '"' => out.push_str("%22"),
            '\'' => out.push_str("%27"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
