//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use offmap::config::ConfigFileError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Library operation failed
    Manager(offmap::Error),
    /// Download finished without every tile cached
    DownloadIncomplete(String),
    /// Failed to write output file
    FileWrite { path: String, error: std::io::Error },
    /// Interactive prompt failed
    Prompt(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Manager(offmap::Error::Busy(_)) => {
                eprintln!();
                eprintln!("Another operation is using the cache. Try again in a moment.");
            }
            CliError::Manager(offmap::Error::Network(_)) => {
                eprintln!();
                eprintln!("Check your connection and the [source] url in config.ini.");
                eprintln!("Run 'offmap config path' to locate the file.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::Manager(e) => write!(f, "{}", e),
            CliError::DownloadIncomplete(msg) => write!(f, "Download incomplete: {}", msg),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::Prompt(msg) => write!(f, "Prompt failed: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::Manager(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<offmap::Error> for CliError {
    fn from(e: offmap::Error) -> Self {
        CliError::Manager(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}
