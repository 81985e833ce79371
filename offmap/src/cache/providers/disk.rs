//! On-disk cache provider.
//!
//! Stores each entry as one file under the cache root. Keys are `/`-separated
//! paths (tile keys look like `16/10483/25332`), so the layout mirrors the
//! slippy map scheme and can be inspected or copied by hand.
//!
//! # File Layout
//!
//! ```text
//! {root}/tiles/{key}.tile
//! {root}/.trash-{n}/          directories being deleted after a clear
//! ```
//!
//! # Atomicity
//!
//! - Writes go to a uniquely named temp file first and are renamed into
//!   place, so a reader never sees a partially written tile.
//! - `clear` renames the whole `tiles/` directory away in a single rename and
//!   recreates it empty. Deleting the old files happens afterwards on the
//!   blocking pool and is invisible to readers.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::traits::{BoxFuture, Cache, CacheEntry, ClearResult, ServiceCacheError};

/// Directory under the root holding live entries.
const TILES_DIR: &str = "tiles";

/// Prefix for directories pending deletion after a clear.
const TRASH_PREFIX: &str = ".trash-";

/// Extension of entry files.
const ENTRY_EXTENSION: &str = "tile";

/// On-disk cache provider.
pub struct DiskCacheProvider {
    /// Cache root directory.
    root: PathBuf,

    /// Total bytes of all entry files.
    size_bytes: AtomicU64,

    /// Number of entry files.
    entry_count: AtomicU64,

    /// Sequence for unique temp and trash names.
    sequence: AtomicU64,

    /// Serializes the stat-then-rename step of writes, deletes and clears
    /// so the counters stay exact when the same key is written concurrently.
    index_lock: Mutex<()>,
}

impl DiskCacheProvider {
    /// Open (or create) a disk cache rooted at `root`.
    ///
    /// Scans existing entries to initialise the size counters and schedules
    /// removal of any trash left behind by an interrupted clear.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, ServiceCacheError> {
        let root = root.into();
        let tiles_dir = root.join(TILES_DIR);
        tokio::fs::create_dir_all(&tiles_dir).await?;

        let scan_dir = tiles_dir.clone();
        let (entries, bytes) = tokio::task::spawn_blocking(move || scan_entries(&scan_dir))
            .await
            .map_err(|e| ServiceCacheError::SpawnError(e.to_string()))?;

        let provider = Self {
            root,
            size_bytes: AtomicU64::new(bytes),
            entry_count: AtomicU64::new(entries),
            sequence: AtomicU64::new(0),
            index_lock: Mutex::new(()),
        };

        provider.purge_stale_trash().await;

        info!(
            dir = %provider.root.display(),
            entries = entries,
            size_bytes = bytes,
            "Disk cache opened"
        );

        Ok(provider)
    }

    /// Root directory of this cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tiles_dir(&self) -> PathBuf {
        self.root.join(TILES_DIR)
    }

    /// Map a key onto its entry file, rejecting anything that could escape
    /// the tiles directory.
    fn key_path(&self, key: &str) -> Result<PathBuf, ServiceCacheError> {
        let invalid = || ServiceCacheError::InvalidKey(key.to_string());

        if key.is_empty() {
            return Err(invalid());
        }

        let mut path = self.tiles_dir();
        for segment in key.split('/') {
            let valid_chars = segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
            if segment.is_empty() || !valid_chars {
                return Err(invalid());
            }
            match Path::new(segment).components().next() {
                Some(Component::Normal(_)) => path.push(segment),
                _ => return Err(invalid()),
            }
        }
        path.set_extension(ENTRY_EXTENSION);
        Ok(path)
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// A trash path no other clear has used, in this process or a previous one.
    ///
    /// Trash from an earlier run may still be on disk while its removal is in
    /// progress, so the name carries the process id and clock as well as the
    /// sequence, and is skipped if it already exists.
    async fn unused_trash_dir(&self) -> Result<PathBuf, ServiceCacheError> {
        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        loop {
            let trash_dir = self.root.join(format!(
                "{}{}-{}-{}",
                TRASH_PREFIX,
                std::process::id(),
                stamp,
                self.next_sequence()
            ));
            if !tokio::fs::try_exists(&trash_dir).await? {
                return Ok(trash_dir);
            }
        }
    }

    /// Remove `.trash-*` directories left by a clear that did not finish.
    async fn purge_stale_trash(&self) {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.root.display(), error = %e, "Failed to scan cache root");
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_trash = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(TRASH_PREFIX));
            if is_trash {
                spawn_remove_dir(entry.path());
            }
        }
    }
}

impl Cache for DiskCacheProvider {
    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), ServiceCacheError>> {
        let path = self.key_path(key);
        Box::pin(async move {
            let path = path?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let temp_path = path.with_extension(format!(
                "{}.{}.tmp",
                ENTRY_EXTENSION,
                self.next_sequence()
            ));
            let new_len = value.len() as u64;
            if let Err(e) = tokio::fs::write(&temp_path, &value).await {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(e.into());
            }

            let _guard = self.index_lock.lock().await;
            let old_len = tokio::fs::metadata(&path).await.ok().map(|m| m.len());
            if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(e.into());
            }

            match old_len {
                Some(old) => {
                    self.size_bytes.fetch_sub(old, Ordering::Relaxed);
                }
                None => {
                    self.entry_count.fetch_add(1, Ordering::Relaxed);
                }
            }
            self.size_bytes.fetch_add(new_len, Ordering::Relaxed);
            Ok(())
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<CacheEntry>, ServiceCacheError>> {
        let path = self.key_path(key);
        Box::pin(async move {
            let path = path?;
            let value = match tokio::fs::read(&path).await {
                Ok(data) => data,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(ServiceCacheError::Io(e)),
            };

            let modified = tokio::fs::metadata(&path)
                .await
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            Ok(Some(CacheEntry { value, modified }))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
        let path = self.key_path(key);
        Box::pin(async move {
            let path = path?;
            let _guard = self.index_lock.lock().await;
            let len = match tokio::fs::metadata(&path).await {
                Ok(m) => m.len(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
                Err(e) => return Err(ServiceCacheError::Io(e)),
            };
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    self.size_bytes.fetch_sub(len, Ordering::Relaxed);
                    self.entry_count.fetch_sub(1, Ordering::Relaxed);
                    Ok(true)
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(ServiceCacheError::Io(e)),
            }
        })
    }

    fn contains(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
        let path = self.key_path(key);
        Box::pin(async move { Ok(tokio::fs::try_exists(path?).await?) })
    }

    fn clear(&self) -> BoxFuture<'_, Result<ClearResult, ServiceCacheError>> {
        Box::pin(async move {
            let _guard = self.index_lock.lock().await;
            let tiles_dir = self.tiles_dir();
            let trash_dir = self.unused_trash_dir().await?;

            match tokio::fs::rename(&tiles_dir, &trash_dir).await {
                Ok(()) => spawn_remove_dir(trash_dir),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(ServiceCacheError::Io(e)),
            }
            tokio::fs::create_dir_all(&tiles_dir).await?;

            let result = ClearResult {
                entries_removed: self.entry_count.swap(0, Ordering::Relaxed),
                bytes_freed: self.size_bytes.swap(0, Ordering::Relaxed),
            };

            info!(
                dir = %self.root.display(),
                entries_removed = result.entries_removed,
                bytes_freed = result.bytes_freed,
                "Disk cache cleared"
            );

            Ok(result)
        })
    }

    fn sync(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes.load(Ordering::Relaxed)
    }

    fn entry_count(&self) -> u64 {
        self.entry_count.load(Ordering::Relaxed)
    }
}

/// Delete a directory tree on the blocking pool without waiting for it.
fn spawn_remove_dir(dir: PathBuf) {
    tokio::task::spawn_blocking(move || {
        if let Err(e) = std::fs::remove_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "Failed to remove cleared cache directory");
        }
    });
}

/// Count entry files and their total size below `dir`.
fn scan_entries(dir: &Path) -> (u64, u64) {
    let mut entries = 0u64;
    let mut bytes = 0u64;
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        let read_dir = match std::fs::read_dir(&current) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                debug!(
                    dir = %current.display(),
                    error = %e,
                    "Failed to read directory during scan"
                );
                continue;
            }
        };

        for entry in read_dir.flatten() {
            let path = entry.path();
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if metadata.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                entries += 1;
                bytes += metadata.len();
            } else if path.extension().is_some_and(|ext| ext == "tmp") {
                // Leftover from an interrupted write
                let _ = std::fs::remove_file(&path);
            }
        }
    }

    (entries, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn create_test_provider() -> (TempDir, DiskCacheProvider) {
        let temp_dir = TempDir::new().unwrap();
        let provider = DiskCacheProvider::open(temp_dir.path()).await.unwrap();
        (temp_dir, provider)
    }

    #[tokio::test]
    async fn test_disk_provider_set_and_get() {
        let (_temp_dir, provider) = create_test_provider().await;

        provider.set("16/1/2", vec![1, 2, 3]).await.unwrap();

        let entry = provider.get("16/1/2").await.unwrap().unwrap();
        assert_eq!(entry.value, vec![1, 2, 3]);
        assert!(entry.modified <= Utc::now());
    }

    #[tokio::test]
    async fn test_disk_provider_layout_mirrors_key() {
        let (temp_dir, provider) = create_test_provider().await;

        provider.set("16/10483/25332", vec![9]).await.unwrap();

        let expected = temp_dir.path().join("tiles/16/10483/25332.tile");
        assert!(expected.exists(), "{} should exist", expected.display());
    }

    #[tokio::test]
    async fn test_disk_provider_get_missing() {
        let (_temp_dir, provider) = create_test_provider().await;
        assert!(provider.get("1/0/0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disk_provider_delete() {
        let (_temp_dir, provider) = create_test_provider().await;

        provider.set("1/0/0", vec![1, 2, 3]).await.unwrap();
        assert!(provider.delete("1/0/0").await.unwrap());
        assert!(provider.get("1/0/0").await.unwrap().is_none());
        assert!(!provider.delete("1/0/0").await.unwrap());
        assert_eq!(provider.entry_count(), 0);
        assert_eq!(provider.size_bytes(), 0);
    }

    #[tokio::test]
    async fn test_disk_provider_contains() {
        let (_temp_dir, provider) = create_test_provider().await;

        assert!(!provider.contains("1/0/1").await.unwrap());
        provider.set("1/0/1", vec![1]).await.unwrap();
        assert!(provider.contains("1/0/1").await.unwrap());
    }

    #[tokio::test]
    async fn test_disk_provider_replace_existing_keeps_counters_exact() {
        let (_temp_dir, provider) = create_test_provider().await;

        provider.set("1/1/1", vec![1, 2, 3]).await.unwrap();
        provider.set("1/1/1", vec![4, 5, 6, 7]).await.unwrap();

        let entry = provider.get("1/1/1").await.unwrap().unwrap();
        assert_eq!(entry.value, vec![4, 5, 6, 7]);
        assert_eq!(provider.entry_count(), 1);
        assert_eq!(provider.size_bytes(), 4);
    }

    #[tokio::test]
    async fn test_disk_provider_rejects_escaping_keys() {
        let (_temp_dir, provider) = create_test_provider().await;

        for key in ["", "../x", "a//b", "/abs", "a/../b", "a/./b", "a b"] {
            let result = provider.set(key, vec![1]).await;
            assert!(
                matches!(result, Err(ServiceCacheError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }

    #[tokio::test]
    async fn test_disk_provider_no_temp_files_remain() {
        let (temp_dir, provider) = create_test_provider().await;

        provider.set("3/1/1", vec![1, 2, 3]).await.unwrap();

        let dir = temp_dir.path().join("tiles/3/1");
        let temps: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(temps.is_empty(), "Temp files should not remain");
    }

    #[tokio::test]
    async fn test_disk_provider_clear() {
        let (temp_dir, provider) = create_test_provider().await;

        for y in 0..5 {
            provider.set(&format!("4/2/{}", y), vec![0u8; 100]).await.unwrap();
        }

        let result = provider.clear().await.unwrap();
        assert_eq!(result.entries_removed, 5);
        assert_eq!(result.bytes_freed, 500);
        assert_eq!(provider.entry_count(), 0);
        assert_eq!(provider.size_bytes(), 0);

        for y in 0..5 {
            assert!(provider.get(&format!("4/2/{}", y)).await.unwrap().is_none());
        }
        assert!(temp_dir.path().join("tiles").is_dir());

        // Cache remains usable after a clear
        provider.set("4/2/0", vec![1]).await.unwrap();
        assert_eq!(provider.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_disk_provider_reopen_scans_existing_entries() {
        let temp_dir = TempDir::new().unwrap();
        {
            let provider = DiskCacheProvider::open(temp_dir.path()).await.unwrap();
            provider.set("5/1/1", vec![0u8; 10]).await.unwrap();
            provider.set("5/1/2", vec![0u8; 20]).await.unwrap();
        }

        let reopened = DiskCacheProvider::open(temp_dir.path()).await.unwrap();
        assert_eq!(reopened.entry_count(), 2);
        assert_eq!(reopened.size_bytes(), 30);
        assert_eq!(reopened.get("5/1/2").await.unwrap().unwrap().value.len(), 20);
    }

    #[tokio::test]
    async fn test_disk_provider_clear_with_leftover_trash_from_previous_run() {
        let temp_dir = TempDir::new().unwrap();
        for name in [".trash-0", ".trash-1"] {
            let stale = temp_dir.path().join(name).join("16").join("10485");
            std::fs::create_dir_all(&stale).unwrap();
            for y in 0..200 {
                std::fs::write(stale.join(format!("{}.tile", y)), [0u8; 8]).unwrap();
            }
        }

        let provider = DiskCacheProvider::open(temp_dir.path()).await.unwrap();
        provider.set("16/10485/25328", vec![9; 32]).await.unwrap();

        let first = provider.clear().await.unwrap();
        assert_eq!(first.entries_removed, 1);
        assert!(provider.get("16/10485/25328").await.unwrap().is_none());

        provider.set("16/10485/25329", vec![9; 16]).await.unwrap();
        let second = provider.clear().await.unwrap();
        assert_eq!(second.entries_removed, 1);
        assert_eq!(provider.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_disk_provider_concurrent_distinct_writes() {
        let temp_dir = TempDir::new().unwrap();
        let provider = Arc::new(DiskCacheProvider::open(temp_dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..40u32 {
            let provider = Arc::clone(&provider);
            handles.push(tokio::spawn(async move {
                provider.set(&format!("8/{}/{}", i, i), vec![1u8; 10]).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(provider.entry_count(), 40);
        assert_eq!(provider.size_bytes(), 400);
    }
}
