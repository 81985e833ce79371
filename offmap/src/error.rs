//! Crate-level error type.
//!
//! Module errors ([`CoordError`], [`StoreError`], [`ProviderError`], ...)
//! convert into [`Error`], whose variants are the failure kinds callers act
//! on.

use std::fmt;

use crate::cache::{ServiceCacheError, StoreError};
use crate::config::ConfigFileError;
use crate::coord::{CoordError, TileCoord};
use crate::download::DownloadError;
use crate::provider::ProviderError;

/// Errors returned by the offline map manager.
#[derive(Debug)]
pub enum Error {
    /// Request parameters were rejected before any I/O.
    InvalidInput(String),

    /// Cache read, write or clear failed.
    Storage(ServiceCacheError),

    /// Remote tile fetch failed.
    Network(ProviderError),

    /// Tile is not cached (offline mode). A valid outcome, not a fault.
    NotFound(TileCoord),

    /// Cache clear could not get exclusive access in time. Retryable.
    Busy(String),

    /// Configuration could not be loaded or is invalid.
    Config(ConfigFileError),

    /// A background download task failed.
    Download(DownloadError),
}

impl Error {
    /// Whether the same call may succeed if retried later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Busy(_) => true,
            Error::Network(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Whether this is a cache miss rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::Storage(e) => write!(f, "Storage error: {}", e),
            Error::Network(e) => write!(f, "Network error: {}", e),
            Error::NotFound(coord) => write!(f, "Tile {} is not cached", coord),
            Error::Busy(msg) => write!(f, "Cache busy: {}", msg),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Download(e) => write!(f, "Download error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Storage(e) => Some(e),
            Error::Network(e) => Some(e),
            Error::Config(e) => Some(e),
            Error::Download(e) => Some(e),
            Error::InvalidInput(_) | Error::NotFound(_) | Error::Busy(_) => None,
        }
    }
}

impl From<CoordError> for Error {
    fn from(e: CoordError) -> Self {
        Error::InvalidInput(e.to_string())
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Cache(e) => Error::Storage(e),
            busy @ StoreError::Busy(_) => Error::Busy(busy.to_string()),
        }
    }
}

impl From<ServiceCacheError> for Error {
    fn from(e: ServiceCacheError) -> Self {
        Error::Storage(e)
    }
}

impl From<ProviderError> for Error {
    fn from(e: ProviderError) -> Self {
        Error::Network(e)
    }
}

impl From<ConfigFileError> for Error {
    fn from(e: ConfigFileError) -> Self {
        Error::Config(e)
    }
}

impl From<DownloadError> for Error {
    fn from(e: DownloadError) -> Self {
        Error::Download(e)
    }
}

/// Result alias using the crate error.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_busy_is_retryable() {
        let err: Error = StoreError::Busy(Duration::from_secs(5)).into();
        assert!(matches!(err, Error::Busy(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_network_retryability_follows_provider() {
        let transient: Error = ProviderError::Timeout("slow".into()).into();
        let permanent: Error = ProviderError::Status {
            code: 404,
            url: "u".into(),
        }
        .into();
        assert!(transient.is_retryable());
        assert!(!permanent.is_retryable());
    }

    #[test]
    fn test_coord_error_is_invalid_input() {
        let err: Error = CoordError::InvalidLatitude(91.0).into();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("91"));
    }

    #[test]
    fn test_store_cache_error_is_storage() {
        let err: Error = StoreError::Cache(ServiceCacheError::InvalidKey("x".into())).into();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound(TileCoord::new(16, 1, 2).unwrap());
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Tile 16/1/2 is not cached");
    }
}
