//! Offline map manager facade.
//!
//! [`OfflineMapManager`] ties the other modules together:
//!
//! ```text
//! OfflineMapManager
//!         │
//!         ├── coord::tiles_for          (what to fetch)
//!         ├── DownloadCoordinator       (fetching into the store)
//!         ├── TileStore                 (cache, atomic clear)
//!         └── OverlayProvider           (live or offline tiles)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use offmap::config::ConfigFile;
//! use offmap::coord::{GeoPoint, RadiusPreset, ZoomLevel};
//! use offmap::manager::OfflineMapManager;
//!
//! let manager = OfflineMapManager::from_config(&ConfigFile::load()?).await?;
//! let handle = manager.start_downloading(
//!     GeoPoint::new(37.7749, -122.4194),
//!     ZoomLevel::Deep,
//!     RadiusPreset::Mile,
//! )?;
//! let report = handle.wait().await?;
//! ```

mod facade;
mod reachability;

pub use facade::{CacheStats, DownloadRequest, OfflineMapManager, OfflineMapManagerBuilder};
pub use reachability::Reachability;
