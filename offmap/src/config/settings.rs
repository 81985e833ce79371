//! Settings structs mirroring the sections of `config.ini`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::overlay::OverlayMode;

use super::download::DownloadConfig;

/// Parsed contents of `config.ini`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub download: DownloadSettings,
    pub source: SourceSettings,
    pub overlay: OverlaySettings,
}

impl ConfigFile {
    /// Download settings as a [`DownloadConfig`].
    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig::new()
            .with_parallel_downloads(self.download.parallel_downloads)
            .with_max_retries(self.download.max_retries)
            .with_timeout_secs(self.download.timeout)
            .with_backoff_ms(self.download.backoff_ms)
    }
}

/// Where tiles are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    /// One file per tile under `[cache] directory`.
    Disk,
    /// In-process only; lost on exit.
    Memory,
}

impl CacheBackend {
    pub fn name(&self) -> &'static str {
        match self {
            CacheBackend::Disk => "disk",
            CacheBackend::Memory => "memory",
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disk" => Ok(CacheBackend::Disk),
            "memory" => Ok(CacheBackend::Memory),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub directory: PathBuf,
    pub backend: CacheBackend,
    /// Bytes, only used by the memory backend.
    pub memory_size: usize,
    pub clear_timeout_ms: u64,
}

impl CacheSettings {
    pub fn clear_timeout(&self) -> Duration {
        Duration::from_millis(self.clear_timeout_ms)
    }
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    pub parallel_downloads: usize,
    pub max_retries: u32,
    /// Seconds per tile request.
    pub timeout: u64,
    pub backoff_ms: u64,
}

/// `[source]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    /// URL template with `{z}`, `{x}`, `{y}` and optionally `{s}`.
    pub url: String,
    pub subdomains: Vec<String>,
    pub user_agent: String,
}

/// `[overlay]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlaySettings {
    /// Mode at startup.
    pub mode: OverlayMode,
    /// Store tiles fetched in live mode.
    pub write_through: bool,
}
