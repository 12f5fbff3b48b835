//! Font-service stylesheet URL parsing.
//!
//! Understands the classic query syntax
//! `family=Name1:variant,variant|Name2:variant:extra-subset&subset=latin,cyrillic`
//! and the axis syntax `family=Name:ital,wght@0,400;1,700` with repeated
//! `family` parameters.

use percent_encoding::percent_decode_str;
use selfhost_fonts_config::FONTS_CSS_PATTERN;
use thiserror::Error;
use url::Url;

use crate::variant::Variant;

/// Subset used when nothing else was requested or forced.
pub const DEFAULT_SUBSET: &str = "latin";

/// One requested family with its variants in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRequest {
    pub name: String,
    pub variants: Vec<Variant>,
}

/// Result of parsing a font-service URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFonts {
    pub families: Vec<FontRequest>,
    /// Deduplicated, never empty
    pub subsets: Vec<String>,
}

/// Why a URL could not be turned into a font request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("font URL has no family parameter")]
    MissingFamily,

    #[error("font URL family parameter names no fonts")]
    EmptyFamily,
}

/// Whether `url` points at the font service's CSS endpoint.
pub fn is_fonts_css_url(url: &str) -> bool {
    url.to_ascii_lowercase().contains(FONTS_CSS_PATTERN)
}

/// Parse a font-service stylesheet URL as found in markup.
///
/// The value may still carry HTML entities (`&amp;`) and percent-encoding;
/// both are decoded first. Protocol-relative URLs are given an `https:` scheme.
pub fn parse_fonts_url(raw: &str, forced_subsets: &[String]) -> Result<ParsedFonts, ParseError> {
    let mut url = decode_url(raw);
    if url.starts_with("//") {
        url.insert_str(0, "https:");
    }

    let query = match Url::parse(&url) {
        Ok(parsed) => parsed.query().unwrap_or_default().to_string(),
        // Not an absolute URL; take whatever follows '?', or the whole thing
        Err(_) => url
            .split_once('?')
            .map_or(url.as_str(), |(_, query)| query)
            .to_string(),
    };

    parse_fonts_query(&query, forced_subsets)
}

/// Parse the query string of a font-service URL.
pub fn parse_fonts_query(query: &str, forced_subsets: &[String]) -> Result<ParsedFonts, ParseError> {
    let mut family_params = Vec::new();
    let mut subset_params = Vec::new();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "family" => family_params.push(value.into_owned()),
            "subset" => subset_params.push(value.into_owned()),
            _ => {}
        }
    }

    if family_params.is_empty() {
        return Err(ParseError::MissingFamily);
    }

    let mut subsets: Vec<String> = subset_params
        .iter()
        .flat_map(|param| split_list(param, ','))
        .collect();

    let mut families = Vec::new();
    for segment in family_params.iter().flat_map(|param| param.split('|')) {
        let mut parts = segment.splitn(3, ':');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            continue;
        }

        let variants = match parts.next().map(str::trim).filter(|spec| !spec.is_empty()) {
            Some(spec) if spec.contains('@') => parse_axis_variants(spec),
            Some(spec) => split_list(spec, ',')
                .map(|token| Variant::parse(&token.to_ascii_lowercase()))
                .collect(),
            None => Vec::new(),
        };

        if let Some(extra) = parts.next() {
            subsets.extend(split_list(extra, ','));
        }

        families.push(FontRequest {
            name: name.to_string(),
            variants: with_default_variant(dedup(variants)),
        });
    }

    if families.is_empty() {
        return Err(ParseError::EmptyFamily);
    }

    subsets.extend(forced_subsets.iter().map(|subset| subset.trim().to_string()));
    subsets.retain(|subset| !subset.is_empty());
    let mut subsets = dedup(subsets);
    if subsets.is_empty() {
        subsets.push(DEFAULT_SUBSET.to_string());
    }

    Ok(ParsedFonts { families, subsets })
}

/// Parse `ital,wght@0,400;1,700` style variant tuples.
fn parse_axis_variants(spec: &str) -> Vec<Variant> {
    let Some((axes, tuples)) = spec.split_once('@') else {
        return Vec::new();
    };
    let axes: Vec<&str> = axes.split(',').map(str::trim).collect();
    let ital = axes.iter().position(|axis| *axis == "ital");
    let wght = axes.iter().position(|axis| *axis == "wght");

    tuples
        .split(';')
        .filter_map(|tuple| {
            let values: Vec<&str> = tuple.split(',').map(str::trim).collect();
            if values.len() != axes.len() {
                return None;
            }
            let italic = ital.is_some_and(|idx| values[idx] == "1");
            let weight = wght.map_or("400", |idx| values[idx]);
            // Variable ranges such as 200..800 are not in the static catalog
            if weight.contains("..") {
                return None;
            }
            Some(Variant::parse(&format!(
                "{}{}",
                weight,
                if italic { "italic" } else { "" }
            )))
        })
        .collect()
}

/// Decode HTML entities, `+` and percent-escapes, in that order.
pub(crate) fn decode_url(raw: &str) -> String {
    let entities_decoded = html_escape::decode_html_entities(raw.trim());
    percent_decode_str(&entities_decoded.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

fn split_list(list: &str, separator: char) -> impl Iterator<Item = String> + '_ {
    list.split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

fn with_default_variant(mut variants: Vec<Variant>) -> Vec<Variant> {
    if variants.is_empty() {
        variants.push(Variant::REGULAR);
    }
    variants
}
