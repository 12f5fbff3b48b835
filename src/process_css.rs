//! Whole-document rewriting: stylesheet links, inline `<style>` imports and
//! local stylesheets that import font-service CSS.

use regex::{Captures, Regex};
use selfhost_fonts_config::PathMapping;
use selfhost_fonts_config::site::{host_of, strip_scheme};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use url::Url;

use crate::cache::UrlCache;
use crate::fonts_url::{decode_url, is_fonts_css_url};
use crate::process::{Output, Processor};
use crate::storage::{STYLE_CSS_PREFIX, UploadArea};

static LINK_REGEX: OnceLock<Regex> = OnceLock::new();
static HREF_REGEX: OnceLock<Regex> = OnceLock::new();
static STYLE_REGEX: OnceLock<Regex> = OnceLock::new();
static IMPORT_REGEX: OnceLock<Regex> = OnceLock::new();
static CSS_URL_REGEX: OnceLock<Regex> = OnceLock::new();
static IMPORT_STRING_REGEX: OnceLock<Regex> = OnceLock::new();

/// `<link>` tags loading a stylesheet, directly or as a preload
fn link_regex() -> &'static Regex {
    LINK_REGEX.get_or_init(|| {
        Regex::new(r"(?is)<link[^>]*(?:stylesheet|as=.?style)[^>]*>")
            .expect("Failed to compile link regex")
    })
}

/// `href` attribute value, double, single or unquoted
fn href_regex() -> &'static Regex {
    HREF_REGEX.get_or_init(|| {
        Regex::new(r#"(?i)\shref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .expect("Failed to compile href regex")
    })
}

fn style_regex() -> &'static Regex {
    STYLE_REGEX.get_or_init(|| {
        Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("Failed to compile style regex")
    })
}

/// `@import url(...) [media];` with an optionally quoted target
fn import_regex() -> &'static Regex {
    IMPORT_REGEX.get_or_init(|| {
        Regex::new(r#"(?is)@import\s+url\(\s*["']?([^"'\s)]*)["']?\s*\)[^;]*;"#)
            .expect("Failed to compile import regex")
    })
}

/// Any `url(...)` reference, optionally quoted
fn css_url_regex() -> &'static Regex {
    CSS_URL_REGEX.get_or_init(|| {
        Regex::new(r#"(?i)url\(\s*(["']?)([^"'\s)]+)["']?\s*\)"#)
            .expect("Failed to compile css url regex")
    })
}

/// `@import "target"` written without `url()`
fn import_string_regex() -> &'static Regex {
    IMPORT_STRING_REGEX.get_or_init(|| {
        Regex::new(r#"(?i)@import\s+(["'])([^"']+)["']"#)
            .expect("Failed to compile import string regex")
    })
}

/// Resolve relative `url()` and `@import` targets in `css` against the URL
/// the stylesheet was served from.
///
/// Absolute, protocol-relative, fragment-only and `data:` targets are kept.
/// A protocol-relative stylesheet URL yields protocol-relative results.
fn rebase_relative_urls(css: &str, stylesheet_url: &str) -> String {
    let (base, protocol_relative) = match stylesheet_url.strip_prefix("//") {
        Some(rest) => (Url::parse(&format!("https://{rest}")), true),
        None => (Url::parse(stylesheet_url), false),
    };
    let Ok(base) = base else {
        log::debug!("Cannot rebase references in {}", stylesheet_url);
        return css.to_string();
    };

    let rebase = |target: &str| -> Option<String> {
        if target.starts_with("//") || target.starts_with('#') || Url::parse(target).is_ok() {
            return None;
        }
        let joined = base.join(target).ok()?;
        let joined = joined.as_str();
        Some(match joined.strip_prefix("https:") {
            Some(rest) if protocol_relative => rest.to_string(),
            _ => joined.to_string(),
        })
    };

    let css = css_url_regex().replace_all(css, |caps: &Captures| match rebase(&caps[2]) {
        Some(target) => format!("url({0}{1}{0})", &caps[1], target),
        None => caps[0].to_string(),
    });
    import_string_regex()
        .replace_all(&css, |caps: &Captures| match rebase(&caps[2]) {
            Some(target) => format!("@import {0}{1}{0}", &caps[1], target),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Rewrites one HTML document at a time.
///
/// Anything that cannot be localized is left exactly as it was, so a failed
/// rewrite degrades to the page loading its original remote resources.
pub struct MarkupProcessor<'a> {
    processor: &'a Processor,
    mappings: Vec<PathMapping>,
}

impl<'a> MarkupProcessor<'a> {
    pub fn new(processor: &'a Processor) -> Self {
        Self {
            processor,
            mappings: processor.config().site.path_mappings(),
        }
    }

    /// Rewrite `html`, running the stylesheet pass and then the inline pass
    /// as enabled in the options.
    pub fn process(&self, html: &str) -> String {
        let options = self.processor.options();
        let mut html = html.to_string();

        if options.process_css_files {
            html = self.markup_stylesheets(&html);
        }
        if options.process_css_inline {
            html = self.markup_inline_css(&html);
        }
        html
    }

    fn markup_stylesheets(&self, html: &str) -> String {
        link_regex()
            .replace_all(html, |caps: &Captures| {
                let tag = &caps[0];
                self.rewrite_link(tag).unwrap_or_else(|| tag.to_string())
            })
            .into_owned()
    }

    /// The tag with its `href` pointing at a local copy, if one can be made.
    fn rewrite_link(&self, tag: &str) -> Option<String> {
        let caps = href_regex().captures(tag)?;
        let href = caps.get(1).or(caps.get(2)).or(caps.get(3))?.as_str();
        if href.trim().is_empty() || UploadArea::is_generated_css_url(href) {
            return None;
        }

        let replacement = if is_fonts_css_url(href) {
            self.processor.get_processed(
                href,
                |url| self.processor.process_fonts_url(url),
                Output::Url,
            )
        } else {
            self.processor
                .get_processed(href, |url| self.process_file_by_url(url), Output::Url)
        }?;

        log::debug!("Rewriting stylesheet {} to {}", href, replacement);
        Some(tag.replace(href, &html_escape::encode_quoted_attribute(&replacement)))
    }

    fn markup_inline_css(&self, html: &str) -> String {
        style_regex()
            .replace_all(html, |caps: &Captures| {
                let block = &caps[0];
                self.process_imports(block)
                    .unwrap_or_else(|| block.to_string())
            })
            .into_owned()
    }

    /// Replace font-service `@import` statements with the generated CSS.
    ///
    /// Returns `None` when nothing was replaced. Other imports are kept.
    pub fn process_imports(&self, content: &str) -> Option<String> {
        let mut changed = false;
        let replaced = import_regex().replace_all(content, |caps: &Captures| {
            let target = &caps[1];
            if !is_fonts_css_url(target) {
                return caps[0].to_string();
            }
            match self.processor.get_processed(
                target,
                |url| self.processor.process_fonts_url(url),
                Output::Css,
            ) {
                Some(css) => {
                    changed = true;
                    css
                }
                None => caps[0].to_string(),
            }
        });

        changed.then(|| replaced.into_owned())
    }

    /// Generate `style-<md5(url)>.css` from a local stylesheet with its
    /// font-service imports inlined.
    ///
    /// Declines (returns `None`) when the URL is one of our own outputs, does
    /// not resolve to a readable local file, or imports nothing to inline.
    pub fn process_file_by_url(&self, url: &str) -> Option<String> {
        if UploadArea::is_generated_css_url(url) {
            return None;
        }

        let url = decode_url(url);
        let path = self.css_file_path(&url)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) if !content.is_empty() => content,
            Ok(_) => return None,
            Err(e) => {
                log::debug!("Could not read {:?}: {}", path, e);
                return None;
            }
        };

        // The copy is served from the upload area, not from beside the original
        let content = rebase_relative_urls(&content, &url);
        let css = self.process_imports(&content)?;
        let name = format!("{}{}", STYLE_CSS_PREFIX, UrlCache::key(&url));
        match self.processor.upload().create_css_file(&css, &name) {
            Ok(file) => Some(file),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }

    /// Resolve a stylesheet URL to a file on disk via the site mappings.
    ///
    /// The first mapping whose host equals the URL's host and whose prefix
    /// occurs in the URL's directory wins. Only existing `.css` files below
    /// the mapped directory are returned. Paths containing `..` are declined
    /// before touching the filesystem, so symlinked theme or plugin
    /// directories pointing elsewhere still resolve.
    pub fn css_file_path(&self, url: &str) -> Option<PathBuf> {
        let url = url.trim().split('?').next().unwrap_or_default().trim();
        if !url.ends_with(".css") {
            return None;
        }

        let decoded;
        let url = if url.contains('%') {
            decoded = percent_encoding::percent_decode_str(url).decode_utf8_lossy();
            &*decoded
        } else {
            url
        };

        let no_proto = strip_scheme(url);
        let host = host_of(no_proto)?;
        let (dirname, basename) = no_proto.rsplit_once('/')?;

        let mapping = self
            .mappings
            .iter()
            .find(|mapping| mapping.host.eq_ignore_ascii_case(&host) && dirname.contains(&mapping.url))?;

        let relative = dirname.replacen(&mapping.url, "", 1);
        let relative = Path::new(relative.trim_start_matches('/')).join(basename);

        // Only plain names below the mapped directory; symlinks inside it are followed
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            log::debug!("Stylesheet {} leaves its mapped directory", url);
            return None;
        }

        let file = mapping.dir.join(relative);
        if !file.is_file() {
            log::debug!("Stylesheet {} does not map to a local file", url);
            return None;
        }
        Some(file)
    }
}
