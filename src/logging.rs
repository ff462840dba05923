//! Logging setup
//!
//! Installs a global tracing subscriber that writes to stdout and to a
//! daily-rotated file `logs/log.YYYY-MM-DD.log`. The default filter is
//! `booking_pipeline=info`; `RUST_LOG` overrides it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

const DEFAULT_FILTER: &str = "booking_pipeline=info";
const LOG_FILE_PREFIX: &str = "log";
const LOG_FILE_SUFFIX: &str = "log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Errors that may occur while initializing logging
#[derive(Debug, thiserror::Error)]
pub enum LogInitError {
    #[error("Failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to create log file appender: {0}")]
    Appender(#[from] rolling::InitError),
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize tracing to write to stdout and a daily log file in `log_dir`.
///
/// Subsequent calls are no-ops.
pub fn init(log_dir: &Path) -> Result<(), LogInitError> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    fs::create_dir_all(log_dir).map_err(|source| LogInitError::CreateDir {
        path: log_dir.to_path_buf(),
        source,
    })?;
    let appender = rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(log_dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let stdout_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);
    let file_layer = fmt::layer().with_ansi(false).with_writer(file_writer);

    let subscriber = Registry::default()
        .with(build_env_filter())
        .with(stdout_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = LOG_GUARD.set(guard);

    tracing::info!("Logging initialized; log files in {}", log_dir.display());
    Ok(())
}

/// Stdout-only logging, used when the log directory is unusable
pub fn init_stdout() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter())
        .try_init();
}
