//! The upload area holding generated CSS and downloaded font files.
//!
//! File names are the contract other parts depend on: `font-<md5>.css`,
//! `style-<md5>.css`, and the sanitized base name of each font URL. Writes go
//! to a temporary file first and are renamed into place, so a failed or
//! concurrent write never leaves a partial file under the final name.

use selfhost_fonts_config::{StorageConfig, UPLOAD_SUBDIR};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Prefix of CSS generated from font-service URLs
pub const FONT_CSS_PREFIX: &str = "font-";

/// Prefix of local stylesheets with inlined imports
pub const STYLE_CSS_PREFIX: &str = "style-";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Directory + public URL pair for generated artifacts.
#[derive(Debug, Clone)]
pub struct UploadArea {
    dir: PathBuf,
    url: String,
}

impl UploadArea {
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            dir: storage.artifact_dir(),
            url: storage.artifact_url(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn url_of(&self, file: &str) -> String {
        format!("{}{}", self.url, file)
    }

    /// Whether a regular file of this name exists
    pub fn contains(&self, file: &str) -> bool {
        self.path_of(file).is_file()
    }

    pub fn read_to_string(&self, file: &str) -> Result<String, StorageError> {
        let path = self.path_of(file);
        fs::read_to_string(&path).map_err(io_error(&path))
    }

    /// Write `contents` under `file`, replacing any existing file atomically.
    pub fn write(&self, file: &str, contents: &[u8]) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let path = self.path_of(file);
        write_atomic(&path, contents).map_err(io_error(&path))?;
        Ok(path)
    }

    /// Write a CSS file named `<name>.css` and return that file name.
    pub fn create_css_file(&self, css: &str, name: &str) -> Result<String, StorageError> {
        let file = sanitize_file_name(&format!("{name}.css"));
        let path = self.write(&file, css.as_bytes())?;
        log::info!("Wrote generated stylesheet {:?}", path);
        Ok(file)
    }

    /// Whether `url` points at a stylesheet this system generated.
    pub fn is_generated_css_url(url: &str) -> bool {
        [FONT_CSS_PREFIX, STYLE_CSS_PREFIX]
            .iter()
            .any(|prefix| url.contains(&format!("/{UPLOAD_SUBDIR}/{prefix}")))
    }
}

/// Write through a uniquely named sibling temp file, then rename over `path`.
///
/// The temp name carries the process id and a counter so concurrent writers
/// never share one.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    fs::write(&temp_path, contents)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}

/// Characters dropped from file names.
const SPECIAL_CHARS: &[char] = &[
    '?', '[', ']', '/', '\\', '=', '<', '>', ':', ';', ',', '\'', '"', '&', '$', '#', '*', '(', ')',
    '|', '~', '`', '!', '{', '}', '%', '+', '’', '«', '»', '”', '“',
];

/// Make a string safe to use as a file name.
///
/// Drops path separators and shell/URL metacharacters, turns whitespace runs
/// into a single `-`, and trims `.`, `-` and `_` from both ends.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
            continue;
        }
        if c.is_control() || SPECIAL_CHARS.contains(&c) {
            continue;
        }
        if pending_dash && !out.is_empty() {
            out.push('-');
        }
        pending_dash = false;
        out.push(c);
    }

    let trimmed = out.trim_matches(|c| matches!(c, '.' | '-' | '_'));
    if trimmed.is_empty() {
        "unnamed-file".to_string()
    } else {
        trimmed.to_string()
    }
}
