//! Tile store: the domain layer over a generic [`Cache`].
//!
//! Translates [`TileCoord`] to cache keys (`{zoom}/{x}/{y}`) and provides
//! clear/read exclusion on top of the provider.
//!
//! # Exclusion
//!
//! `get`, `put` and `contains` hold shared access to an internal
//! `RwLock<()>`, so operations on distinct tiles never wait on each other.
//! `clear` holds exclusive access, which makes it a barrier: every operation
//! that started before it completes first, and every operation that starts
//! after it observes the empty store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::traits::{Cache, ClearResult, ServiceCacheError};
use crate::coord::TileCoord;

/// A cached tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileBlob {
    pub coord: TileCoord,
    pub bytes: Vec<u8>,
    /// When the tile was written to the store.
    pub fetched_at: DateTime<Utc>,
}

/// Errors from [`TileStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying provider failed.
    #[error("Cache error: {0}")]
    Cache(#[from] ServiceCacheError),

    /// Exclusive access for a clear was not acquired in time.
    #[error("Cache is busy: exclusive access not acquired within {0:?}")]
    Busy(Duration),
}

/// Tile-keyed store over a shared cache provider.
pub struct TileStore {
    cache: Arc<dyn Cache>,
    guard: RwLock<()>,
}

impl TileStore {
    /// Create a store over the given provider.
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            guard: RwLock::new(()),
        }
    }

    /// Get a tile from the store.
    ///
    /// Returns `Ok(None)` if the tile has not been cached.
    pub async fn get(&self, coord: &TileCoord) -> Result<Option<TileBlob>, StoreError> {
        let _shared = self.guard.read().await;
        match self.cache.get(&coord.key()).await {
            Ok(Some(entry)) => Ok(Some(TileBlob {
                coord: *coord,
                bytes: entry.value,
                fetched_at: entry.modified,
            })),
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(tile = %coord, error = %e, "Tile cache read failed");
                Err(e.into())
            }
        }
    }

    /// Store a tile, replacing any existing bytes for the same coordinate.
    pub async fn put(&self, coord: &TileCoord, bytes: Vec<u8>) -> Result<(), StoreError> {
        let _shared = self.guard.read().await;
        let len = bytes.len();
        self.cache.set(&coord.key(), bytes).await.map_err(|e| {
            warn!(tile = %coord, error = %e, "Tile cache write failed");
            StoreError::from(e)
        })?;
        debug!(tile = %coord, bytes = len, "Tile stored");
        Ok(())
    }

    /// Check whether a tile is cached.
    pub async fn contains(&self, coord: &TileCoord) -> Result<bool, StoreError> {
        let _shared = self.guard.read().await;
        Ok(self.cache.contains(&coord.key()).await?)
    }

    /// Remove every tile.
    ///
    /// Waits up to `timeout` for in-flight reads and writes to drain. If
    /// exclusive access is not acquired by then, nothing is removed and
    /// [`StoreError::Busy`] is returned.
    pub async fn clear(&self, timeout: Duration) -> Result<ClearResult, StoreError> {
        let _exclusive = match tokio::time::timeout(timeout, self.guard.write()).await {
            Ok(guard) => guard,
            Err(_) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Cache clear timed out waiting for access"
                );
                return Err(StoreError::Busy(timeout));
            }
        };

        let result = self.cache.clear().await?;
        info!(
            entries_removed = result.entries_removed,
            bytes_freed = result.bytes_freed,
            "Tile cache cleared"
        );
        Ok(result)
    }

    /// Total bytes of cached tiles.
    pub async fn size_bytes(&self) -> u64 {
        self.cache.sync().await;
        self.cache.size_bytes()
    }

    /// Number of cached tiles.
    pub async fn entry_count(&self) -> u64 {
        self.cache.sync().await;
        self.cache.entry_count()
    }
}

impl std::fmt::Debug for TileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileStore")
            .field("entries", &self.cache.entry_count())
            .field("size_bytes", &self.cache.size_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::providers::{DiskCacheProvider, MemoryCacheProvider};
    use tempfile::TempDir;

    fn memory_store() -> TileStore {
        TileStore::new(Arc::new(MemoryCacheProvider::new(100_000_000)))
    }

    fn tile(x: u32, y: u32) -> TileCoord {
        TileCoord::new(16, x, y).unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get_returns_same_bytes() {
        let store = memory_store();
        let coord = tile(10483, 25332);

        store.put(&coord, vec![7u8; 64]).await.unwrap();

        let blob = store.get(&coord).await.unwrap().unwrap();
        assert_eq!(blob.coord, coord);
        assert_eq!(blob.bytes, vec![7u8; 64]);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = memory_store();
        assert!(store.get(&tile(1, 1)).await.unwrap().is_none());
        assert!(!store.contains(&tile(1, 1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = memory_store();
        let coord = tile(2, 2);

        store.put(&coord, vec![1, 2, 3]).await.unwrap();
        store.put(&coord, vec![4, 5]).await.unwrap();

        assert_eq!(store.get(&coord).await.unwrap().unwrap().bytes, vec![4, 5]);
        assert_eq!(store.entry_count().await, 1);
        assert_eq!(store.size_bytes().await, 2);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let store = memory_store();
        for x in 0..10 {
            store.put(&tile(x, 0), vec![0u8; 100]).await.unwrap();
        }

        let result = store.clear(Duration::from_secs(1)).await.unwrap();
        assert_eq!(result.entries_removed, 10);
        assert_eq!(result.bytes_freed, 1000);

        for x in 0..10 {
            assert!(store.get(&tile(x, 0)).await.unwrap().is_none());
        }
        assert_eq!(store.size_bytes().await, 0);
    }

    #[tokio::test]
    async fn test_clear_busy_when_reader_holds_access() {
        let store = memory_store();
        store.put(&tile(3, 3), vec![1]).await.unwrap();

        let held = store.guard.read().await;
        let result = store.clear(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(StoreError::Busy(_))));
        drop(held);

        // Nothing was removed
        assert!(store.contains(&tile(3, 3)).await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_waits_for_in_flight_put() {
        let store = Arc::new(memory_store());
        let held = store.guard.read().await;

        let clearing = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.clear(Duration::from_secs(5)).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!clearing.is_finished());
        drop(held);

        assert!(clearing.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_disk_backed_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let provider = DiskCacheProvider::open(temp_dir.path()).await.unwrap();
        let store = TileStore::new(Arc::new(provider));
        let coord = tile(5, 6);

        store.put(&coord, vec![0u8; 1024]).await.unwrap();
        assert_eq!(store.size_bytes().await, 1024);
        assert!(store.get(&coord).await.unwrap().is_some());

        store.clear(Duration::from_secs(1)).await.unwrap();
        assert!(store.get(&coord).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_distinct_puts_all_present() {
        let store = Arc::new(memory_store());
        let mut handles = Vec::new();

        for i in 0..100u32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.put(&tile(i, i), vec![i as u8; 16]).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..100u32 {
            let blob = store.get(&tile(i, i)).await.unwrap().unwrap();
            assert_eq!(blob.bytes, vec![i as u8; 16]);
        }
        assert_eq!(store.entry_count().await, 100);
    }
}
