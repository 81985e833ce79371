//! Byte-valued key-value interface shared by the cache providers.
//!
//! Keys are `/`-separated strings (tile keys look like `16/10485/25328`) and
//! values are opaque image bytes. [`TileStore`](super::TileStore) adds tile
//! coordinates and clear/read exclusion on top.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result of clearing a cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearResult {
    /// Number of entries removed.
    pub entries_removed: u64,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl fmt::Display for ClearResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "removed {} entries, freed {} bytes",
            self.entries_removed, self.bytes_freed
        )
    }
}

/// A stored value together with the time it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub value: Vec<u8>,
    pub modified: DateTime<Utc>,
}

/// Cache provider failures.
#[derive(Debug, Error)]
pub enum ServiceCacheError {
    /// Filesystem failure in the disk provider.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key cannot be mapped onto the backing store.
    #[error("Invalid cache key: '{0}'")]
    InvalidKey(String),

    /// Failed to spawn or join a background task.
    #[error("Failed to spawn task: {0}")]
    SpawnError(String),
}

/// Future returned by [`Cache`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Storage backend behind a [`TileStore`](super::TileStore).
///
/// Writes to distinct keys never interfere; concurrent writes to one key
/// resolve to the last writer. Methods return boxed futures so the store can
/// hold an `Arc<dyn Cache>`.
pub trait Cache: Send + Sync {
    /// Store a value with the given key, replacing any existing value.
    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), ServiceCacheError>>;

    /// Value and write time for `key`, or `None` when absent.
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<CacheEntry>, ServiceCacheError>>;

    /// Delete a value by key. Returns whether the key existed.
    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>>;

    /// Whether `key` is present, without reading the value.
    fn contains(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>>;

    /// Remove every entry.
    ///
    /// Callers that need readers to never observe a half-cleared cache must
    /// provide their own exclusion; [`TileStore`](super::TileStore) does.
    fn clear(&self) -> BoxFuture<'_, Result<ClearResult, ServiceCacheError>>;

    /// Bring size and entry counters up to date.
    ///
    /// Providers with eventually-consistent bookkeeping (moka) flush their
    /// pending work here; others return immediately.
    fn sync(&self) -> BoxFuture<'_, ()>;

    /// Current size of the cache in bytes.
    fn size_bytes(&self) -> u64;

    /// Current number of entries in the cache.
    fn entry_count(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_result_default() {
        let result = ClearResult::default();
        assert_eq!(result.entries_removed, 0);
        assert_eq!(result.bytes_freed, 0);
    }

    #[test]
    fn test_clear_result_display() {
        let result = ClearResult {
            entries_removed: 10,
            bytes_freed: 1024,
        };
        let display = format!("{}", result);
        assert!(display.contains("10 entries"));
        assert!(display.contains("1024 bytes"));
    }

    #[test]
    fn test_cache_error_display() {
        let err = ServiceCacheError::InvalidKey("../etc".to_string());
        assert_eq!(format!("{}", err), "Invalid cache key: '../etc'");
    }

    #[test]
    fn test_cache_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cache_err: ServiceCacheError = io_err.into();
        assert!(matches!(cache_err, ServiceCacheError::Io(_)));
    }
}
