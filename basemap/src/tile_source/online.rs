//! Online tile source fetching tiles over HTTP.

use std::collections::HashMap;

use bytes::Bytes;
use reqwest::{Client, StatusCode};

use super::TileSource;
use crate::error::TileLoadError;
use crate::tile::TileIndex;

/// Tile source that fetches tiles from a `{z}/{x}/{y}` URL template.
pub struct OnlineTileSource {
    client: Client,
    url_template: String,
}

impl OnlineTileSource {
    /// Creates a source for the given URL template with a default HTTP
    /// client.
    ///
    /// The template uses `{z}`, `{x}` and `{y}` placeholders, e.g.
    /// `https://tiles.example.com/{z}/{x}/{y}.pbf`.
    pub fn new(url_template: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url_template)
    }

    /// Creates a source using the given HTTP client.
    pub fn with_client(client: Client, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
        }
    }

    fn tile_url(&self, index: TileIndex) -> Result<String, TileLoadError> {
        let vars = HashMap::from([
            ("z".to_string(), index.z.to_string()),
            ("x".to_string(), index.x.to_string()),
            ("y".to_string(), index.y.to_string()),
        ]);

        strfmt::strfmt(&self.url_template, &vars).map_err(|error| {
            log::error!("invalid tile url template {}: {error}", self.url_template);
            TileLoadError::Network
        })
    }
}

#[async_trait::async_trait]
impl TileSource for OnlineTileSource {
    async fn load_tile(&self, index: TileIndex) -> Result<Bytes, TileLoadError> {
        let url = self.tile_url(index)?;
        log::trace!("loading tile {index:?} from url {url}");

        let response = self.client.get(&url).send().await.map_err(|error| {
            log::warn!("network error loading tile {url}: {error}");
            TileLoadError::Network
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            log::trace!("tile not found (404): {url}");
            return Err(TileLoadError::DoesNotExist);
        }

        let response = response.error_for_status().map_err(|error| {
            log::warn!("error response for tile {url}: {error}");
            TileLoadError::Network
        })?;

        let bytes = response.bytes().await.map_err(|_| TileLoadError::Network)?;
        log::trace!("tile {index:?} loaded, byte size: {}", bytes.len());

        Ok(bytes)
    }
}
