//! Default values for all configuration settings.

use std::path::PathBuf;

use super::settings::*;
use crate::overlay::OverlayMode;
use crate::provider::{DEFAULT_TILE_URL, DEFAULT_USER_AGENT};

/// Default memory cache size when `backend = memory` (256 MB).
pub const DEFAULT_MEMORY_CACHE_SIZE: usize = 256 * 1024 * 1024;

/// Default wait for exclusive access when clearing the cache.
pub const DEFAULT_CLEAR_TIMEOUT_MS: u64 = 5_000;

/// Default number of concurrent tile fetches per download.
pub const DEFAULT_PARALLEL_DOWNLOADS: usize = 8;

/// Default retries per tile after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default timeout for one tile request, in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// Default base backoff between retries, in milliseconds.
pub const DEFAULT_BACKOFF_MS: u64 = 200;

/// Platform cache directory for tiles (e.g. `~/.cache/offmap` on Linux).
pub fn default_cache_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("offmap")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                directory: default_cache_directory(),
                backend: CacheBackend::Disk,
                memory_size: DEFAULT_MEMORY_CACHE_SIZE,
                clear_timeout_ms: DEFAULT_CLEAR_TIMEOUT_MS,
            },
            download: DownloadSettings {
                parallel_downloads: DEFAULT_PARALLEL_DOWNLOADS,
                max_retries: DEFAULT_MAX_RETRIES,
                timeout: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
                backoff_ms: DEFAULT_BACKOFF_MS,
            },
            source: SourceSettings {
                url: DEFAULT_TILE_URL.to_string(),
                subdomains: Vec::new(),
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
            overlay: OverlaySettings {
                mode: OverlayMode::Live,
                write_through: true,
            },
        }
    }
}
