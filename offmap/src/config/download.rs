//! Download configuration.

use std::time::Duration;

use super::defaults::{
    DEFAULT_BACKOFF_MS, DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_MAX_RETRIES,
    DEFAULT_PARALLEL_DOWNLOADS,
};
use crate::download::RetryPolicy;

/// Configuration for bulk tile downloads.
///
/// # Example
///
/// ```
/// use offmap::config::DownloadConfig;
///
/// // Using defaults
/// let config = DownloadConfig::default();
/// assert_eq!(config.timeout_secs(), 30);
/// assert_eq!(config.max_retries(), 2);
/// assert_eq!(config.parallel_downloads(), 8);
///
/// // Custom configuration
/// let config = DownloadConfig::new()
///     .with_timeout_secs(10)
///     .with_max_retries(5)
///     .with_parallel_downloads(4);
/// assert_eq!(config.parallel_downloads(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Timeout for a single tile request (in seconds)
    timeout_secs: u64,
    /// Retries per tile after the first attempt
    max_retries: u32,
    /// Maximum number of concurrent tile fetches
    parallel_downloads: usize,
    /// Base backoff between retries (in milliseconds), doubled each retry
    backoff_ms: u64,
}

impl DownloadConfig {
    /// Create a new download configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-request timeout in seconds.
    ///
    /// Default: 30 seconds.
    pub fn with_timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = timeout;
        self
    }

    /// Set the number of retries per tile.
    ///
    /// Default: 2 retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the maximum number of concurrent tile fetches.
    ///
    /// Values below 1 are raised to 1. Default: 8.
    pub fn with_parallel_downloads(mut self, parallel: usize) -> Self {
        self.parallel_downloads = parallel.max(1);
        self
    }

    /// Set the base retry backoff in milliseconds.
    ///
    /// Default: 200 ms.
    pub fn with_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = backoff_ms;
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn parallel_downloads(&self) -> usize {
        self.parallel_downloads
    }

    pub fn backoff_ms(&self) -> u64 {
        self.backoff_ms
    }

    /// Retry policy for the download coordinator.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(self.max_retries)
            .with_base_backoff(Duration::from_millis(self.backoff_ms))
            .with_attempt_timeout(Duration::from_secs(self.timeout_secs))
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            parallel_downloads: DEFAULT_PARALLEL_DOWNLOADS,
            backoff_ms: DEFAULT_BACKOFF_MS,
        }
    }
}
