//! File-backed tracing setup. The terminal belongs to the UI, so nothing is logged to stdout/stderr.

use color_eyre::Result;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{CacheManager, LOG_FILE};
use crate::config::LoggingConfig;

const DEFAULT_LEVEL: &str = "warn";

/// Filter used when neither the config nor `RUST_LOG` sets one.
fn filter_for(level: Option<&str>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|e| {
            eprintln!("Warning: invalid log level '{}': {}", level, e);
            EnvFilter::new(DEFAULT_LEVEL)
        }),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL)),
    }
}

/// Where log lines go: the configured file, else `datavis.log` in the cache directory.
pub fn log_path(config: &LoggingConfig, cache: &CacheManager) -> PathBuf {
    config
        .file
        .clone()
        .unwrap_or_else(|| cache.cache_file(LOG_FILE))
}

/// Install the global subscriber. Returns the log file path.
///
/// A second call in the same process is ignored, so tests may call it freely.
pub fn init_logging(config: &LoggingConfig, cache: &CacheManager) -> Result<PathBuf> {
    let path = log_path(config, cache);
    let file = open_log_file(&path)?;

    let _ = tracing_subscriber::registry()
        .with(filter_for(config.level.as_deref()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init();

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(path)
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}
