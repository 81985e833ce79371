//! XYZ (slippy map) tile source driven by a URL template.
//!
//! # URL Pattern
//!
//! `https://tile.openstreetmap.org/{z}/{x}/{y}.png`
//!
//! - `{z}`, `{x}`, `{y}` are replaced with the tile's zoom, column and row
//! - `{s}` is optional and rotates through the configured subdomains
//!   (e.g. `a`, `b`, `c`) to spread load across mirrors
//!
//! # Coordinate System
//!
//! Standard Web Mercator XYZ tile coordinates:
//! - X: Column (0 to 2^zoom - 1, west to east)
//! - Y: Row (0 to 2^zoom - 1, north to south)

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cache::BoxFuture;
use crate::coord::{TileCoord, MAX_ZOOM};
use crate::provider::{AsyncHttpClient, ProviderError, TileSource};

/// Default tile server template.
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Tile source fetching over HTTP from a templated URL.
pub struct HttpTileSource<C: AsyncHttpClient> {
    http_client: C,
    template: String,
    subdomains: Vec<String>,
    next_subdomain: AtomicUsize,
    max_zoom: u8,
}

impl<C: AsyncHttpClient> HttpTileSource<C> {
    /// Creates a tile source for `template`.
    ///
    /// The template must contain `{z}`, `{x}` and `{y}`. If it contains `{s}`,
    /// `subdomains` must be non-empty.
    pub fn new(
        http_client: C,
        template: impl Into<String>,
        subdomains: Vec<String>,
    ) -> Result<Self, ProviderError> {
        let template = template.into();

        for placeholder in ["{z}", "{x}", "{y}"] {
            if !template.contains(placeholder) {
                return Err(ProviderError::InvalidTemplate(format!(
                    "'{}' is missing {}",
                    template, placeholder
                )));
            }
        }
        if template.contains("{s}") && subdomains.is_empty() {
            return Err(ProviderError::InvalidTemplate(format!(
                "'{}' uses {{s}} but no subdomains are configured",
                template
            )));
        }

        Ok(Self {
            http_client,
            template,
            subdomains,
            next_subdomain: AtomicUsize::new(0),
            max_zoom: MAX_ZOOM,
        })
    }

    /// Limit the highest zoom this source will request.
    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    /// The URL template this source was built with.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Builds the tile URL for the given coordinates.
    fn build_url(&self, coord: &TileCoord) -> String {
        let mut url = self
            .template
            .replace("{z}", &coord.zoom.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());

        if url.contains("{s}") && !self.subdomains.is_empty() {
            let index = self.next_subdomain.fetch_add(1, Ordering::Relaxed) % self.subdomains.len();
            url = url.replace("{s}", &self.subdomains[index]);
        }
        url
    }
}

impl<C: AsyncHttpClient> TileSource for HttpTileSource<C> {
    fn fetch_tile(&self, coord: TileCoord) -> BoxFuture<'_, Result<Vec<u8>, ProviderError>> {
        Box::pin(async move {
            if coord.zoom > self.max_zoom {
                return Err(ProviderError::UnsupportedZoom(coord.zoom));
            }

            let url = self.build_url(&coord);
            let bytes = self.http_client.get(&url).await?;
            if bytes.is_empty() {
                return Err(ProviderError::InvalidResponse(format!(
                    "empty body from {}",
                    url
                )));
            }
            Ok(bytes)
        })
    }

    fn name(&self) -> &str {
        "XYZ"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAsyncHttpClient;

    fn coord() -> TileCoord {
        TileCoord::new(16, 10483, 25332).unwrap()
    }

    #[test]
    fn test_build_url_substitutes_placeholders() {
        let source = HttpTileSource::new(
            MockAsyncHttpClient::new(Ok(vec![1])),
            DEFAULT_TILE_URL,
            Vec::new(),
        )
        .unwrap();

        assert_eq!(
            source.build_url(&coord()),
            "https://tile.openstreetmap.org/16/10483/25332.png"
        );
    }

    #[test]
    fn test_build_url_rotates_subdomains() {
        let source = HttpTileSource::new(
            MockAsyncHttpClient::new(Ok(vec![1])),
            "https://{s}.tiles.example/{z}/{x}/{y}.png",
            vec!["a".into(), "b".into()],
        )
        .unwrap();

        let first = source.build_url(&coord());
        let second = source.build_url(&coord());
        let third = source.build_url(&coord());
        assert!(first.starts_with("https://a."));
        assert!(second.starts_with("https://b."));
        assert!(third.starts_with("https://a."));
    }

    #[test]
    fn test_rejects_incomplete_template() {
        let result = HttpTileSource::new(
            MockAsyncHttpClient::new(Ok(vec![1])),
            "https://tiles.example/{z}/{x}.png",
            Vec::new(),
        );
        assert!(matches!(result, Err(ProviderError::InvalidTemplate(_))));
    }

    #[test]
    fn test_rejects_subdomain_template_without_subdomains() {
        let result = HttpTileSource::new(
            MockAsyncHttpClient::new(Ok(vec![1])),
            "https://{s}.tiles.example/{z}/{x}/{y}.png",
            Vec::new(),
        );
        assert!(matches!(result, Err(ProviderError::InvalidTemplate(_))));
    }

    #[tokio::test]
    async fn test_fetch_tile_success() {
        let source = HttpTileSource::new(
            MockAsyncHttpClient::new(Ok(vec![0x89, 0x50, 0x4e, 0x47])),
            DEFAULT_TILE_URL,
            Vec::new(),
        )
        .unwrap();

        let bytes = source.fetch_tile(coord()).await.unwrap();
        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
        assert_eq!(
            source.http_client.requested_urls(),
            vec!["https://tile.openstreetmap.org/16/10483/25332.png"]
        );
    }

    #[tokio::test]
    async fn test_fetch_tile_empty_body_is_invalid() {
        let client = MockAsyncHttpClient::new(Ok(Vec::new()));
        let source = HttpTileSource::new(client, DEFAULT_TILE_URL, Vec::new()).unwrap();

        let result = source.fetch_tile(coord()).await;
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_fetch_tile_above_max_zoom() {
        let source = HttpTileSource::new(
            MockAsyncHttpClient::new(Ok(vec![1])),
            DEFAULT_TILE_URL,
            Vec::new(),
        )
        .unwrap()
        .with_max_zoom(15);

        let result = source.fetch_tile(coord()).await;
        assert_eq!(result, Err(ProviderError::UnsupportedZoom(16)));
        assert!(source.http_client.requested_urls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_tile_propagates_status() {
        let source = HttpTileSource::new(
            MockAsyncHttpClient::new(Err(ProviderError::Status {
                code: 404,
                url: "u".into(),
            })),
            DEFAULT_TILE_URL,
            Vec::new(),
        )
        .unwrap();

        let err = source.fetch_tile(coord()).await.unwrap_err();
        assert!(!err.is_retryable());
    }
}
