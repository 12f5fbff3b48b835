//! HTTP fetching of remote font assets for selfhost-fonts.
//!
//! Provides:
//! - `http`: the configured ureq agent, URL validation, and [`HttpFetcher`]
//! - [`Fetcher`]: the download seam the localizer is written against

pub mod http;

pub use http::{FetchError, Fetcher, HttpFetcher, MAX_DOWNLOAD_SIZE, agent, validate_asset_url};
