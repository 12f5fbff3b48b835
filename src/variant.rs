//! Font variant identifiers.
//!
//! The font service accepts loose variant tokens (`b`, `bold`, `regular`,
//! `400i`, `italic`, `700italic`, …). Every token canonicalizes to exactly one
//! [`Variant`]; anything unrecognized becomes 400 upright.

use std::fmt;

/// Weight used when a token carries no usable weight.
pub const DEFAULT_WEIGHT: u16 = 400;

/// A weight + style pair, e.g. 700 italic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variant {
    pub weight: u16,
    pub italic: bool,
}

impl Default for Variant {
    fn default() -> Self {
        Self::REGULAR
    }
}

impl Variant {
    pub const REGULAR: Variant = Variant {
        weight: DEFAULT_WEIGHT,
        italic: false,
    };

    pub const fn new(weight: u16, italic: bool) -> Self {
        Self { weight, italic }
    }

    /// Canonicalize a loose variant token.
    ///
    /// Total and deterministic: trims and lower-cases the token, peels off a
    /// trailing `italics`/`italic`/`i`, then reads the rest as `bold`/`b`
    /// (700), `regular` or nothing (400), or a numeric weight in 100..=900.
    /// Anything else yields [`Variant::REGULAR`].
    pub fn parse(token: &str) -> Self {
        let token = token.trim().to_ascii_lowercase();

        let (base, italic) = ["italics", "italic", "i"]
            .iter()
            .find_map(|suffix| token.strip_suffix(suffix).map(|base| (base, true)))
            .unwrap_or((token.as_str(), false));

        let weight = match base {
            "" if italic => DEFAULT_WEIGHT,
            "regular" => DEFAULT_WEIGHT,
            "b" | "bold" => 700,
            numeric => match numeric.parse::<u16>() {
                Ok(weight) if (100..=900).contains(&weight) => weight,
                _ => return Self::REGULAR,
            },
        };

        Self { weight, italic }
    }

    /// Key used by the font catalog: `400`, `700italic`, …
    pub fn catalog_key(&self) -> String {
        if self.italic {
            format!("{}italic", self.weight)
        } else {
            self.weight.to_string()
        }
    }

    /// Value for the `font-style` descriptor
    pub fn css_style(&self) -> &'static str {
        if self.italic { "italic" } else { "normal" }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.catalog_key())
    }
}
