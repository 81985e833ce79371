//! Remote tile source abstraction
//!
//! This module provides the [`TileSource`] trait used by downloads and the
//! live overlay, plus an HTTP implementation driven by a URL template.
//!
//! ```ignore
//! use offmap::provider::{AsyncReqwestClient, HttpTileSource, DEFAULT_TILE_URL};
//!
//! let client = AsyncReqwestClient::new()?;
//! let source = HttpTileSource::new(client, DEFAULT_TILE_URL, Vec::new())?;
//! ```

mod http;
#[cfg(test)]
mod mock;
mod types;
mod xyz;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use types::{ProviderError, TileSource};
pub use xyz::{HttpTileSource, DEFAULT_TILE_URL};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
#[cfg(test)]
pub use mock::MockTileSource;
