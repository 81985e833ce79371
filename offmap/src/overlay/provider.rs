//! Per-mode tile providers for the map overlay.
//!
//! - **Live**: one request to the remote source per tile. On success the tile
//!   is optionally written to the store by a detached task, so rendering
//!   never waits on storage.
//! - **Offline**: store only. A miss is [`Error::NotFound`]; the renderer
//!   decides what to draw instead.
//!
//! Lookups run on the runtime the provider was built with, so a renderer may
//! poll [`OverlayProvider::tile`] from any thread or executor.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::cache::{ServiceCacheError, TileStore};
use crate::coord::TileCoord;
use crate::error::Error;
use crate::provider::TileSource;

use super::mode::OverlayMode;

/// Answers per-tile requests for one overlay mode.
#[derive(Clone)]
pub struct OverlayProvider {
    mode: OverlayMode,
    store: Arc<TileStore>,
    source: Arc<dyn TileSource>,
    write_through: bool,
    runtime: Handle,
}

/// Build the provider for `mode`.
///
/// `write_through` only affects live mode. Fetches, store reads and
/// write-through tasks run on `runtime`.
pub fn tile_provider(
    mode: OverlayMode,
    store: Arc<TileStore>,
    source: Arc<dyn TileSource>,
    write_through: bool,
    runtime: Handle,
) -> OverlayProvider {
    OverlayProvider {
        mode,
        store,
        source,
        write_through,
        runtime,
    }
}

impl OverlayProvider {
    pub fn mode(&self) -> OverlayMode {
        self.mode
    }

    pub fn write_through(&self) -> bool {
        self.write_through
    }

    /// Image bytes for `coord`.
    ///
    /// Does not need a tokio context on the calling thread.
    pub async fn tile(&self, coord: TileCoord) -> Result<Vec<u8>, Error> {
        let provider = self.clone();
        self.runtime
            .spawn(async move {
                match provider.mode {
                    OverlayMode::Offline => provider.cached_tile(coord).await,
                    OverlayMode::Live => provider.live_tile(coord).await,
                }
            })
            .await
            .map_err(|e| Error::Storage(ServiceCacheError::SpawnError(e.to_string())))?
    }

    async fn cached_tile(&self, coord: TileCoord) -> Result<Vec<u8>, Error> {
        match self.store.get(&coord).await? {
            Some(blob) => Ok(blob.bytes),
            None => {
                debug!(tile = %coord, "Offline tile not cached");
                Err(Error::NotFound(coord))
            }
        }
    }

    async fn live_tile(&self, coord: TileCoord) -> Result<Vec<u8>, Error> {
        let bytes = self.source.fetch_tile(coord).await.map_err(|e| {
            debug!(
                tile = %coord,
                source = self.source.name(),
                error = %e,
                "Live tile fetch failed"
            );
            Error::Network(e)
        })?;

        if self.write_through {
            let store = Arc::clone(&self.store);
            let copy = bytes.clone();
            self.runtime.spawn(async move {
                if let Err(e) = store.put(&coord, copy).await {
                    warn!(tile = %coord, error = %e, "Write-through of live tile failed");
                }
            });
        }

        Ok(bytes)
    }
}

impl std::fmt::Debug for OverlayProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayProvider")
            .field("mode", &self.mode)
            .field("source", &self.source.name())
            .field("write_through", &self.write_through)
            .finish()
    }
}
