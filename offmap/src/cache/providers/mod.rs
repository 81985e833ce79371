//! Cache provider implementations.
//!
//! Each provider implements the [`Cache`](super::Cache) trait.
//!
//! # Available Providers
//!
//! - [`DiskCacheProvider`]: One file per tile under a cache directory (default)
//! - [`MemoryCacheProvider`]: In-memory LRU cache using moka

mod disk;
mod memory;

pub use disk::DiskCacheProvider;
pub use memory::MemoryCacheProvider;
