//! Overlay tile selection.
//!
//! [`OverlayMode`] chooses between live tiles from the remote source and
//! cached tiles only; [`tile_provider`] builds the matching
//! [`OverlayProvider`]. Switching modes never touches the cache.

mod mode;
mod provider;

pub use mode::{AtomicOverlayMode, OverlayMode};
pub use provider::{tile_provider, OverlayProvider};
