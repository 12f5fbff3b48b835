//! Configuration system for selfhost-fonts.
//!
//! This crate provides configuration loading, saving, validation, and default
//! values for the font localizer. It includes:
//!
//! - The operator-facing option set (`Options`)
//! - Where generated artifacts, caches, and the font catalog live (`StorageConfig`)
//! - How site URLs map onto on-disk directories (`SiteConfig`, `PathMapping`)

pub mod config;
pub mod defaults;
pub mod error;
pub mod options;
pub mod site;
pub mod storage;

// Re-export main types for convenience
pub use config::Config;
pub use error::ConfigError;
pub use options::{DownloadFailurePolicy, Options};
pub use site::{PathMapping, SiteConfig};
pub use storage::StorageConfig;

/// Case-insensitive substring that identifies a font-service stylesheet URL.
pub const FONTS_CSS_PATTERN: &str = "fonts.googleapis.com/css";

/// Host of the font service, used when pruning resource hints.
pub const FONTS_HOST: &str = "fonts.googleapis.com";

/// Subdirectory of the upload area holding generated CSS and font files.
pub const UPLOAD_SUBDIR: &str = "sgf-css";

/// Accepted values for the `font-display` descriptor.
pub const FONT_DISPLAY_VALUES: &[&str] = &["auto", "block", "swap", "fallback", "optional"];
