//! Tile cache storage.
//!
//! Two layers:
//!
//! - [`Cache`]: a generic byte-valued key-value interface with a disk
//!   provider and an in-memory provider.
//! - [`TileStore`]: tile-coordinate keys and atomic clear on top of any
//!   `Cache`.

pub mod providers;
mod store;
mod traits;

pub use providers::{DiskCacheProvider, MemoryCacheProvider};
pub use store::{StoreError, TileBlob, TileStore};
pub use traits::{BoxFuture, Cache, CacheEntry, ClearResult, ServiceCacheError};
