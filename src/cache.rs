//! Persistent URL cache.
//!
//! Each namespace is one JSON object on disk mapping `md5(identifier)` to a
//! produced value: a generated file name, or the local URL of a downloaded
//! font. A `put` reads the whole map, inserts, and rewrites the whole file.
//!
//! Writers inside one process are serialized by a mutex. Separate processes
//! sharing the directory can still race, and then the last write wins; every
//! value is derived deterministically from its key, so a lost update only
//! costs a repeated download.
//!
//! Entries never expire. [`UrlCache::clear`] drops a namespace wholesale.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::storage::write_atomic;

/// Independent cache collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Source URL → generated CSS file name or localized font URL
    Processed,
    /// Preload spec → localized woff2 URL
    Preload,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Processed, Namespace::Preload];

    fn file_name(self) -> &'static str {
        match self {
            Namespace::Processed => "sgf_processed_cache.json",
            Namespace::Preload => "sgf_preload_cache.json",
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to access cache file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache file {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

type Entries = BTreeMap<String, String>;

/// Hash-keyed, file-backed cache with one file per [`Namespace`].
#[derive(Debug)]
pub struct UrlCache {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl UrlCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Digest an identifier into a cache key. Collisions are not guarded against.
    pub fn key(identifier: &str) -> String {
        format!("{:x}", md5::compute(identifier.as_bytes()))
    }

    /// Look up the value stored for `identifier`.
    ///
    /// An unreadable or corrupt namespace behaves like an empty one.
    pub fn get(&self, namespace: Namespace, identifier: &str) -> Option<String> {
        let entries = match self.load(namespace) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("{}", e);
                return None;
            }
        };

        let value = entries
            .get(&Self::key(identifier))
            .filter(|value| !value.is_empty())
            .cloned();
        log::debug!(
            "Cache {} for {:?} in {:?}",
            if value.is_some() { "hit" } else { "miss" },
            identifier,
            namespace
        );
        value
    }

    /// Store `value` for `identifier`, rewriting the namespace file.
    pub fn put(&self, namespace: Namespace, identifier: &str, value: &str) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock();

        // Start over from an empty map rather than refusing to cache forever
        let mut entries = self.load(namespace).unwrap_or_else(|e| {
            log::warn!("{}; starting a fresh cache", e);
            Entries::new()
        });
        entries.insert(Self::key(identifier), value.to_string());
        self.store(namespace, &entries)
    }

    /// Remove every entry of a namespace.
    pub fn clear(&self, namespace: Namespace) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock();

        let path = self.path(namespace);
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Cleared {:?} cache", namespace);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    /// Number of entries in a namespace
    pub fn len(&self, namespace: Namespace) -> usize {
        self.load(namespace)
            .map(|entries| entries.values().filter(|value| !value.is_empty()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, namespace: Namespace) -> bool {
        self.len(namespace) == 0
    }

    fn path(&self, namespace: Namespace) -> PathBuf {
        self.dir.join(namespace.file_name())
    }

    fn load(&self, namespace: Namespace) -> Result<Entries, CacheError> {
        let path = self.path(namespace);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        serde_json::from_str(&content).map_err(|source| CacheError::Corrupt { path, source })
    }

    fn store(&self, namespace: Namespace, entries: &Entries) -> Result<(), CacheError> {
        let path = self.path(namespace);
        let io = |source| CacheError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io)?;
        let content = serde_json::to_vec(entries).map_err(|source| CacheError::Corrupt {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, &content).map_err(io)
    }
}
