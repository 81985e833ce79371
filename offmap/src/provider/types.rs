//! Provider types and traits

use std::fmt;

use crate::cache::BoxFuture;
use crate::coord::TileCoord;

/// Errors that can occur while fetching a tile from a remote source.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Server answered with a non-success status
    Status { code: u16, url: String },
    /// Request did not complete in time
    Timeout(String),
    /// Connection or transport failure
    HttpError(String),
    /// Response arrived but is not a usable tile
    InvalidResponse(String),
    /// Zoom level not supported by this source
    UnsupportedZoom(u8),
    /// URL template is malformed
    InvalidTemplate(String),
}

impl ProviderError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Client errors are permanent except for 408 (request timeout) and 429
    /// (rate limited). Server errors, timeouts and transport failures are
    /// transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Status { code, .. } => match code {
                408 | 429 => true,
                400..=499 => false,
                _ => true,
            },
            ProviderError::Timeout(_) | ProviderError::HttpError(_) => true,
            ProviderError::InvalidResponse(_)
            | ProviderError::UnsupportedZoom(_)
            | ProviderError::InvalidTemplate(_) => false,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Status { code, url } => write!(f, "HTTP {} from {}", code, url),
            ProviderError::Timeout(msg) => write!(f, "Request timed out: {}", msg),
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ProviderError::UnsupportedZoom(zoom) => {
                write!(f, "Zoom level {} not supported by tile source", zoom)
            }
            ProviderError::InvalidTemplate(msg) => write!(f, "Invalid URL template: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// A remote source of raster map tiles.
///
/// Dyn-compatible so the download coordinator and overlay providers can share
/// an `Arc<dyn TileSource>` and tests can inject fakes.
pub trait TileSource: Send + Sync {
    /// Fetch the encoded image bytes for one tile.
    fn fetch_tile(&self, coord: TileCoord) -> BoxFuture<'_, Result<Vec<u8>, ProviderError>>;

    /// Returns the source's name for logging and identification.
    fn name(&self) -> &str;
}
