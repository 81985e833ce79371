//! The offline map manager: single entry point for callers.
//!
//! Owns the tile store, the remote source, the download coordinator and the
//! current overlay mode. Constructed explicitly with its dependencies; there
//! is no global instance.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{
    Cache, ClearResult, DiskCacheProvider, MemoryCacheProvider, ServiceCacheError, TileStore,
};
use crate::config::{
    CacheBackend, ConfigFile, DownloadConfig, DEFAULT_CLEAR_TIMEOUT_MS, DEFAULT_MEMORY_CACHE_SIZE,
};
use crate::coord::{tiles_for, GeoPoint, RadiusPreset, ZoomLevel};
use crate::download::{DownloadCoordinator, DownloadHandle};
use crate::error::Error;
use crate::overlay::{tile_provider, AtomicOverlayMode, OverlayMode, OverlayProvider};
use crate::provider::{AsyncReqwestClient, HttpTileSource, TileSource};

use super::reachability::Reachability;

/// A request to download the tiles around a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadRequest {
    pub center: GeoPoint,
    pub zoom: ZoomLevel,
    pub radius: RadiusPreset,
    /// Overrides the configured parallelism when set.
    pub max_concurrency: Option<usize>,
}

impl DownloadRequest {
    pub fn new(center: GeoPoint, zoom: ZoomLevel, radius: RadiusPreset) -> Self {
        Self {
            center,
            zoom,
            radius,
            max_concurrency: None,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }
}

/// Cache size diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: u64,
    pub size_bytes: u64,
}

/// Coordinates tile downloads, cache maintenance and overlay selection.
pub struct OfflineMapManager {
    store: Arc<TileStore>,
    source: Arc<dyn TileSource>,
    coordinator: DownloadCoordinator,
    download: DownloadConfig,
    clear_timeout: Duration,
    mode: Arc<AtomicOverlayMode>,
    write_through: bool,
    runtime: Handle,
}

impl OfflineMapManager {
    /// Start building a manager.
    pub fn builder() -> OfflineMapManagerBuilder {
        OfflineMapManagerBuilder::default()
    }

    /// Build the production wiring from a config file: disk or memory cache
    /// plus an HTTP tile source.
    ///
    /// Must be called from within a tokio runtime, which the manager then
    /// uses for its background work.
    pub async fn from_config(config: &ConfigFile) -> Result<Self, Error> {
        let cache: Arc<dyn Cache> = match config.cache.backend {
            CacheBackend::Disk => {
                Arc::new(DiskCacheProvider::open(config.cache.directory.clone()).await?)
            }
            CacheBackend::Memory => {
                Arc::new(MemoryCacheProvider::new(config.cache.memory_size as u64))
            }
        };

        let client = AsyncReqwestClient::with_options(
            Duration::from_secs(config.download.timeout),
            &config.source.user_agent,
        )?;
        let source = HttpTileSource::new(
            client,
            config.source.url.clone(),
            config.source.subdomains.clone(),
        )?;

        info!(
            backend = %config.cache.backend,
            directory = %config.cache.directory.display(),
            url = %config.source.url,
            mode = %config.overlay.mode,
            "Offline map manager configured"
        );

        Self::builder()
            .cache(cache)
            .source(Arc::new(source))
            .download(config.download_config())
            .clear_timeout(config.cache.clear_timeout())
            .mode(config.overlay.mode)
            .write_through(config.overlay.write_through)
            .build()
    }

    /// Download every tile within `radius` of `center` at `zoom`.
    ///
    /// Input is validated before any I/O; invalid input returns
    /// [`Error::InvalidInput`] and starts nothing. The job runs on the
    /// manager's runtime and is observed through the returned handle.
    pub fn start_downloading(
        &self,
        center: GeoPoint,
        zoom: ZoomLevel,
        radius: RadiusPreset,
    ) -> Result<DownloadHandle, Error> {
        self.start_download(DownloadRequest::new(center, zoom, radius))
    }

    /// Like [`start_downloading`](Self::start_downloading) with per-request options.
    pub fn start_download(&self, request: DownloadRequest) -> Result<DownloadHandle, Error> {
        let max_concurrency = match request.max_concurrency {
            Some(0) => {
                return Err(Error::InvalidInput(
                    "max concurrency must be at least 1".to_string(),
                ))
            }
            Some(n) => n,
            None => self.download.parallel_downloads(),
        };

        let tiles = tiles_for(request.center, request.zoom, request.radius)?;

        info!(
            lat = request.center.lat,
            lon = request.center.lon,
            zoom = request.zoom.level(),
            radius_m = request.radius.meters(),
            tiles = tiles.len(),
            "Starting tile download"
        );

        Ok(self
            .coordinator
            .download_on(&self.runtime, tiles, max_concurrency))
    }

    /// Remove every cached tile.
    ///
    /// Waits up to the configured clear timeout for in-flight reads and
    /// writes. Returns [`Error::Busy`] (retryable) if they do not drain in
    /// time, in which case nothing was removed.
    pub async fn clear_cache(&self) -> Result<ClearResult, Error> {
        let store = Arc::clone(&self.store);
        let timeout = self.clear_timeout;

        let result = self
            .runtime
            .spawn(async move { store.clear(timeout).await })
            .await
            .map_err(|e| Error::Storage(ServiceCacheError::SpawnError(e.to_string())))??;

        Ok(result)
    }

    /// Tile provider for the current mode.
    pub fn current_overlay_provider(&self) -> OverlayProvider {
        self.provider_for(self.mode())
    }

    /// Current overlay mode.
    pub fn mode(&self) -> OverlayMode {
        self.mode.load()
    }

    /// Change the overlay mode for subsequent provider requests.
    ///
    /// Returns the previous mode. Providers already handed out keep their mode.
    pub fn set_mode(&self, mode: OverlayMode) -> OverlayMode {
        set_mode_logged(&self.mode, mode)
    }

    /// Set the mode and return the provider for it.
    pub fn reload_overlay(&self, mode: OverlayMode) -> OverlayProvider {
        self.set_mode(mode);
        self.provider_for(mode)
    }

    /// Update the mode from a reachability change.
    pub fn apply_reachability(&self, reachability: Reachability) -> OverlayMode {
        debug!(reachability = %reachability, "Reachability changed");
        let mode = reachability.overlay_mode();
        self.set_mode(mode);
        mode
    }

    /// Follow reachability events from `events` until the sender side closes.
    ///
    /// The listener runs on the manager's runtime.
    pub fn subscribe_reachability(
        &self,
        mut events: mpsc::Receiver<Reachability>,
    ) -> JoinHandle<()> {
        let mode = Arc::clone(&self.mode);
        self.runtime.spawn(async move {
            while let Some(reachability) = events.recv().await {
                debug!(reachability = %reachability, "Reachability changed");
                set_mode_logged(&mode, reachability.overlay_mode());
            }
            debug!("Reachability channel closed");
        })
    }

    /// Entry count and size of the cache.
    pub async fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entries: self.store.entry_count().await,
            size_bytes: self.store.size_bytes().await,
        }
    }

    pub fn store(&self) -> &Arc<TileStore> {
        &self.store
    }

    pub fn download_config(&self) -> DownloadConfig {
        self.download
    }

    pub fn clear_timeout(&self) -> Duration {
        self.clear_timeout
    }

    pub fn write_through(&self) -> bool {
        self.write_through
    }

    fn provider_for(&self, mode: OverlayMode) -> OverlayProvider {
        tile_provider(
            mode,
            Arc::clone(&self.store),
            Arc::clone(&self.source),
            self.write_through,
            self.runtime.clone(),
        )
    }
}

fn set_mode_logged(current: &AtomicOverlayMode, mode: OverlayMode) -> OverlayMode {
    let previous = current.swap(mode);
    if previous != mode {
        info!(from = %previous, to = %mode, "Overlay mode changed");
    }
    previous
}

/// Builder for [`OfflineMapManager`].
///
/// A tile source is required. Everything else has a default: an in-memory
/// cache, [`DownloadConfig::default`], live mode with write-through, and the
/// runtime the builder is called from.
#[derive(Default)]
pub struct OfflineMapManagerBuilder {
    source: Option<Arc<dyn TileSource>>,
    store: Option<Arc<TileStore>>,
    download: Option<DownloadConfig>,
    clear_timeout: Option<Duration>,
    mode: Option<OverlayMode>,
    write_through: Option<bool>,
    runtime: Option<Handle>,
}

impl OfflineMapManagerBuilder {
    /// Set the remote tile source.
    pub fn source(mut self, source: Arc<dyn TileSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Use `cache` as the storage backend.
    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.store = Some(Arc::new(TileStore::new(cache)));
        self
    }

    /// Share an existing tile store.
    pub fn store(mut self, store: Arc<TileStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the download configuration.
    pub fn download(mut self, config: DownloadConfig) -> Self {
        self.download = Some(config);
        self
    }

    /// Set how long a cache clear waits for exclusive access.
    pub fn clear_timeout(mut self, timeout: Duration) -> Self {
        self.clear_timeout = Some(timeout);
        self
    }

    /// Set the initial overlay mode.
    pub fn mode(mut self, mode: OverlayMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Store tiles fetched in live mode.
    pub fn write_through(mut self, enabled: bool) -> Self {
        self.write_through = Some(enabled);
        self
    }

    /// Run downloads and cache maintenance on `runtime`.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the manager.
    pub fn build(self) -> Result<OfflineMapManager, Error> {
        let source = self
            .source
            .ok_or_else(|| Error::InvalidInput("a tile source is required".to_string()))?;

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| {
                Error::InvalidInput(
                    "no tokio runtime: call from within a runtime or set one explicitly"
                        .to_string(),
                )
            })?,
        };

        let store = self.store.unwrap_or_else(|| {
            Arc::new(TileStore::new(Arc::new(MemoryCacheProvider::new(
                DEFAULT_MEMORY_CACHE_SIZE as u64,
            ))))
        });
        let download = self.download.unwrap_or_default();
        let coordinator = DownloadCoordinator::with_retry_policy(
            Arc::clone(&store),
            Arc::clone(&source),
            download.retry_policy(),
        );

        Ok(OfflineMapManager {
            store,
            source,
            coordinator,
            download,
            clear_timeout: self
                .clear_timeout
                .unwrap_or(Duration::from_millis(DEFAULT_CLEAR_TIMEOUT_MS)),
            mode: Arc::new(AtomicOverlayMode::new(self.mode.unwrap_or(OverlayMode::Live))),
            write_through: self.write_through.unwrap_or(true),
            runtime,
        })
    }
}
