//! Logging setup for offmap.
//!
//! Logs go to `~/.offmap/logs/offmap.log` (truncated per session) and to
//! stderr so stdout stays clean for command output. The filter comes from
//! `RUST_LOG` when set.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::config_directory;

/// Log file name inside the log directory.
pub const LOG_FILE_NAME: &str = "offmap.log";

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping it flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    log_path: PathBuf,
}

impl LoggingGuard {
    /// Path of the active log file.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "offmap=debug,info"
    } else {
        "info"
    }
}

/// Initialize the global subscriber.
///
/// Creates `log_dir` if needed and clears the previous log file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the log file
/// cannot be truncated.
pub fn init_logging(log_dir: &Path, verbose: bool) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    let log_path = log_dir.join(LOG_FILE_NAME);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    // A second init (tests, embedding apps) keeps the existing subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_path,
    })
}

/// Default log directory (`~/.offmap/logs`).
pub fn default_log_dir() -> PathBuf {
    config_directory().join("logs")
}
