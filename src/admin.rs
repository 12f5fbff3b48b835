//! Operator actions: cache status, cache clearing and saving options.

use selfhost_fonts_config::{Config, ConfigError};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::cache::{CacheError, Namespace, UrlCache};
use crate::process::RequestContext;

/// Message reported after a successful cache clear.
pub const CACHE_CLEARED: &str = "Cache cleared.";

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("You are not allowed to manage these options")]
    Unauthorized,

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Entry counts per cache namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheInfo {
    pub processed: usize,
    pub preload: usize,
}

impl CacheInfo {
    pub fn total(&self) -> usize {
        self.processed + self.preload
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for CacheInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cache Status: {} Items ({} processed, {} preload)",
            self.total(),
            self.processed,
            self.preload
        )
    }
}

pub struct Admin<'a> {
    cache: &'a UrlCache,
}

impl<'a> Admin<'a> {
    pub fn new(cache: &'a UrlCache) -> Self {
        Self { cache }
    }

    pub fn cache_info(&self) -> CacheInfo {
        CacheInfo {
            processed: self.cache.len(Namespace::Processed),
            preload: self.cache.len(Namespace::Preload),
        }
    }

    /// Empty both cache namespaces. Requires `can_manage_options`.
    ///
    /// Generated files stay in the upload area; they are rewritten in place
    /// the next time their source URL is processed.
    pub fn clear_cache(&self, ctx: &RequestContext) -> Result<&'static str, AdminError> {
        authorize(ctx)?;
        self.empty_cache()?;
        Ok(CACHE_CLEARED)
    }

    /// Validate and save `config` to `path`, then empty the caches so the
    /// new options apply to every page.
    pub fn save_options(
        &self,
        config: &Config,
        path: &Path,
        ctx: &RequestContext,
    ) -> Result<(), AdminError> {
        authorize(ctx)?;
        config.validate()?;
        config.save(path)?;
        log::info!("Saved options to {:?}", path);
        self.empty_cache()?;
        Ok(())
    }

    fn empty_cache(&self) -> Result<(), CacheError> {
        for namespace in Namespace::ALL {
            self.cache.clear(namespace)?;
        }
        Ok(())
    }
}

fn authorize(ctx: &RequestContext) -> Result<(), AdminError> {
    if ctx.can_manage_options {
        Ok(())
    } else {
        log::warn!("Rejected admin action without manage permission");
        Err(AdminError::Unauthorized)
    }
}
