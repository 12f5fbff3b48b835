//! Logging backend for the `log` facade.
//!
//! Controlled by the DEBUG_LEVEL environment variable:
//! - 0: No logging
//! - 1: Errors only
//! - 2: Info level (downloads, generated files)
//! - 3: Debug level (cache hits and misses, skipped lookups)
//! - 4: Trace level
//!
//! When neither DEBUG_LEVEL nor `--log-level` is given, warnings and errors
//! are shown. All output goes to stderr so stdout carries only documents.

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Debug level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Off = 0,
    Error = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl DebugLevel {
    fn from_env() -> Option<Self> {
        let val = std::env::var("DEBUG_LEVEL").ok()?;
        Some(match val.trim().parse::<u8>() {
            Ok(1) => DebugLevel::Error,
            Ok(2) => DebugLevel::Info,
            Ok(3) => DebugLevel::Debug,
            Ok(4) => DebugLevel::Trace,
            _ => DebugLevel::Off,
        })
    }

    pub fn level_filter(self) -> LevelFilter {
        match self {
            DebugLevel::Off => LevelFilter::Off,
            DebugLevel::Error => LevelFilter::Error,
            DebugLevel::Info => LevelFilter::Info,
            DebugLevel::Debug => LevelFilter::Debug,
            DebugLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Writes records to stderr, one line each.
struct StderrLogger {
    level: LevelFilter,
    lock: Mutex<()>,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _guard = self.lock.lock();
        let _ = writeln!(
            std::io::stderr(),
            "[{}] [{:<5}] [{}] {}",
            get_timestamp(),
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Route `log` records to stderr.
///
/// `cli_level` (from `--log-level`) wins over DEBUG_LEVEL. Calling this more
/// than once keeps the first logger.
pub fn init_log_bridge(cli_level: Option<LevelFilter>) {
    let level = cli_level
        .or_else(|| DebugLevel::from_env().map(DebugLevel::level_filter))
        .unwrap_or(LevelFilter::Warn);

    let logger = LOGGER.get_or_init(|| StderrLogger {
        level,
        lock: Mutex::new(()),
    });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level);
    }
}
