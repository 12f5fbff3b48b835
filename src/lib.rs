// Library exports for testing and embedding in a host server
//
// A host constructs one `Processor` at startup (configuration, font catalog,
// URL cache, upload area, fetcher) and then, per request:
//
//   - checks `Processor::should_process` for the request context,
//   - passes registered stylesheet URLs through `Processor::process_enqueue`,
//   - passes the finished document through `MarkupProcessor::process` when
//     `Processor::should_process_html` is set.
//
// Cache writes inside one process are serialized with a `parking_lot::Mutex`;
// see `cache` for what that does and does not cover across processes.

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod admin;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod debug;
pub mod font_css;
pub mod fonts_url;
pub mod localizer;
pub mod preload;
pub mod process;
pub mod process_css;
pub mod storage;
pub mod variant;

pub use admin::{Admin, AdminError, CacheInfo};
pub use cache::{CacheError, Namespace, UrlCache};
pub use catalog::{CatalogError, FontAsset, FontCatalog};
pub use font_css::FontCssGenerator;
pub use fonts_url::{FontRequest, ParseError, ParsedFonts, parse_fonts_query, parse_fonts_url};
pub use localizer::{AssetLocalizer, LocalizeError};
pub use preload::{PreloadSpec, Preloader};
pub use process::{Output, Processor, RequestContext, remove_fonts_prefetch};
pub use process_css::MarkupProcessor;
pub use storage::{StorageError, UploadArea};
pub use variant::Variant;
