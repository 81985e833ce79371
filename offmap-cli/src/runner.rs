//! CLI runner for common setup.
//!
//! Loads configuration, initializes logging and owns the tokio runtime so
//! command handlers stay synchronous.

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::runtime::Runtime;
use tracing::info;

use offmap::config::{config_file_path, ConfigFile};
use offmap::logging::{default_log_dir, init_logging, LoggingGuard};
use offmap::OfflineMapManager;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps the file writer alive while the runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
    config_path: PathBuf,
    runtime: Runtime,
}

impl CliRunner {
    /// Load config from `config_path` (or the default path) and start logging.
    pub fn new(config_path: Option<PathBuf>, verbose: bool) -> Result<Self, CliError> {
        let config_path = config_path.unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;

        let logging_guard = init_logging(&default_log_dir(), verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("offmap-worker")
            .build()
            .map_err(CliError::Runtime)?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
            runtime,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("offmap v{}", env!("CARGO_PKG_VERSION"));
        info!(config = %self.config_path.display(), "offmap CLI: {} command", command);
    }

    /// Build the manager described by the loaded config.
    pub fn manager(&self) -> Result<OfflineMapManager, CliError> {
        let manager = self
            .runtime
            .block_on(OfflineMapManager::from_config(&self.config))?;
        Ok(manager)
    }

    /// Run a future to completion on the runner's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
