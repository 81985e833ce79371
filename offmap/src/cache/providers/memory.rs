//! Tile cache held in process memory.
//!
//! Backs the `memory` cache backend and tests that do not want a disk
//! directory. Capacity is counted in tile bytes, not entries.
//!
//! Moka's size and entry counters are eventually consistent; `sync()` runs
//! its pending maintenance tasks so the counters are exact afterwards.

use chrono::Utc;
use moka::future::Cache as MokaCache;

use crate::cache::traits::{BoxFuture, Cache, CacheEntry, ClearResult, ServiceCacheError};

/// Byte-bounded LRU cache over `moka::future::Cache`.
pub struct MemoryCacheProvider {
    cache: MokaCache<String, CacheEntry>,
    max_size_bytes: u64,
}

impl MemoryCacheProvider {
    /// Entries beyond `max_size_bytes` are evicted least-recently-used first.
    pub fn new(max_size_bytes: u64) -> Self {
        let cache = MokaCache::builder()
            // moka uses u32 weights, cap at u32::MAX for very large entries
            .weigher(|_key: &String, entry: &CacheEntry| -> u32 {
                entry.value.len().min(u32::MAX as usize) as u32
            })
            .max_capacity(max_size_bytes)
            .build();

        Self {
            cache,
            max_size_bytes,
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }
}

impl Cache for MemoryCacheProvider {
    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move {
            let entry = CacheEntry {
                value,
                modified: Utc::now(),
            };
            self.cache.insert(key, entry).await;
            Ok(())
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<CacheEntry>, ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.get(&key).await) })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.remove(&key).await.is_some()) })
    }

    fn contains(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.contains_key(&key)) })
    }

    fn clear(&self) -> BoxFuture<'_, Result<ClearResult, ServiceCacheError>> {
        Box::pin(async move {
            self.cache.run_pending_tasks().await;
            let result = ClearResult {
                entries_removed: self.cache.entry_count(),
                bytes_freed: self.cache.weighted_size(),
            };

            // invalidate_all only drops entries lazily, which leaves the counters stale
            let keys: Vec<String> = self.cache.iter().map(|(key, _)| (*key).clone()).collect();
            for key in keys {
                self.cache.invalidate(&key).await;
            }
            self.cache.run_pending_tasks().await;

            Ok(result)
        })
    }

    fn sync(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move { self.cache.run_pending_tasks().await })
    }

    fn size_bytes(&self) -> u64 {
        self.cache.weighted_size()
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}
