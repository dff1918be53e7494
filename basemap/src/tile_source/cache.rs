//! Caching wrappers for tile sources.

use std::io::{Read, Write};
use std::path::Path;

use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::TileSource;
use crate::error::{BasemapError, TileLoadError};
use crate::tile::{TileIndex, ZoomRange};

/// Tile source wrapper that caches tiles gzip-compressed in memory.
///
/// Suitable when persistent storage is unavailable or undesired; the cache is
/// lost when the source is dropped.
pub struct CompressedCacheTileSource {
    inner: Box<dyn TileSource>,
    cache: quick_cache::sync::Cache<TileIndex, Bytes>,
}

impl CompressedCacheTileSource {
    /// Default number of cached tiles.
    pub const DEFAULT_CAPACITY: usize = 512;

    /// Wraps the given source with an in-memory cache holding up to
    /// `capacity` tiles.
    pub fn new(inner: Box<dyn TileSource>, capacity: usize) -> Self {
        Self {
            inner,
            cache: quick_cache::sync::Cache::new(capacity),
        }
    }
}

#[async_trait::async_trait]
impl TileSource for CompressedCacheTileSource {
    async fn load_tile(&self, index: TileIndex) -> Result<Bytes, TileLoadError> {
        if let Some(compressed) = self.cache.get(&index) {
            log::trace!("cache hit for tile {index:?}");
            return gunzip(&compressed).map_err(|error| {
                log::error!("failed to decompress cached tile {index:?}: {error}");
                TileLoadError::Decoding
            });
        }

        let bytes = self.inner.load_tile(index).await?;

        match gzip(&bytes) {
            Ok(compressed) => self.cache.insert(index, compressed),
            Err(error) => log::warn!("failed to compress tile {index:?}: {error}"),
        }

        Ok(bytes)
    }

    fn zoom_range(&self) -> ZoomRange {
        self.inner.zoom_range()
    }
}

/// Tile source wrapper that caches tiles in a database on disk.
///
/// The cache survives restarts; tiles already present are served without
/// touching the wrapped source.
pub struct PersistentCacheTileSource {
    inner: Box<dyn TileSource>,
    tree: sled::Tree,
    /// Keep the database handle alive for the lifetime of the source; the
    /// tree is only valid while its database is open.
    #[allow(dead_code)]
    db: sled::Db,
}

impl PersistentCacheTileSource {
    /// Wraps the given source with a cache stored at `path`.
    pub fn new(inner: Box<dyn TileSource>, path: impl AsRef<Path>) -> Result<Self, BasemapError> {
        let path = path.as_ref();
        let cache_err = |source| BasemapError::Cache {
            path: path.to_path_buf(),
            source,
        };

        let db = sled::open(path).map_err(cache_err)?;
        let tree = db.open_tree("tiles").map_err(cache_err)?;

        Ok(Self { inner, tree, db })
    }

    fn key(index: TileIndex) -> [u8; 9] {
        let mut key = [0u8; 9];
        key[0] = index.z;
        key[1..5].copy_from_slice(&index.x.to_be_bytes());
        key[5..9].copy_from_slice(&index.y.to_be_bytes());
        key
    }
}

#[async_trait::async_trait]
impl TileSource for PersistentCacheTileSource {
    async fn load_tile(&self, index: TileIndex) -> Result<Bytes, TileLoadError> {
        if let Ok(Some(data)) = self.tree.get(Self::key(index)) {
            log::trace!("persistent cache hit for tile {index:?}");
            return Ok(Bytes::from(data.to_vec()));
        }

        let bytes = self.inner.load_tile(index).await?;

        if let Err(error) = self.tree.insert(Self::key(index), bytes.to_vec()) {
            log::warn!("failed to cache tile {index:?}: {error}");
        }

        Ok(bytes)
    }

    fn zoom_range(&self) -> ZoomRange {
        self.inner.zoom_range()
    }
}

fn gzip(bytes: &[u8]) -> std::io::Result<Bytes> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(Bytes::from(encoder.finish()?))
}

fn gunzip(bytes: &[u8]) -> std::io::Result<Bytes> {
    let mut decoder = GzDecoder::new(bytes);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(Bytes::from(decompressed))
}
