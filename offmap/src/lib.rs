//! Offmap - offline map tile cache and download manager
//!
//! This library downloads slippy-map tiles around a point into a local
//! cache and serves them back to a map view, either live (fetched from the
//! remote source on every request, optionally written through to the cache)
//! or offline (cache only, never touching the network).
//!
//! # Modules
//!
//! - [`coord`]: tile keys and Web Mercator math
//! - [`cache`]: cache backends and the [`TileStore`](cache::TileStore)
//! - [`provider`]: remote tile sources over HTTP
//! - [`download`]: bulk downloads with progress and cancellation
//! - [`overlay`]: live/offline tile providers for the map view
//! - [`manager`]: the [`OfflineMapManager`] facade
//! - [`config`]: `~/.offmap/config.ini` loading and saving

pub mod cache;
pub mod config;
pub mod coord;
pub mod download;
pub mod error;
pub mod logging;
pub mod manager;
pub mod overlay;
pub mod provider;

pub use error::{Error, Result};
pub use manager::{
    CacheStats, DownloadRequest, OfflineMapManager, OfflineMapManagerBuilder, Reachability,
};
