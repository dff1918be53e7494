//! Tile sources: providers of raw tile bytes by index.
//!
//! A [`TileSource`] yields the encoded bytes of a tile; decoding them into
//! drawable features is the decoder's business. Sources compose: the online
//! source fetches over HTTP, and the cache wrappers add an in-memory
//! compressed cache or a persistent on-disk cache in front of it.

mod cache;
mod online;
mod package;

pub use cache::{CompressedCacheTileSource, PersistentCacheTileSource};
pub use online::OnlineTileSource;
pub use package::MbtilesTileSource;

use bytes::Bytes;

use crate::error::TileLoadError;
use crate::tile::{TileIndex, ZoomRange};

/// A provider of raw tile bytes.
#[async_trait::async_trait]
pub trait TileSource: Send + Sync {
    /// Loads the encoded bytes of the tile with the given index.
    async fn load_tile(&self, index: TileIndex) -> Result<Bytes, TileLoadError>;

    /// The zoom levels this source can serve.
    fn zoom_range(&self) -> ZoomRange {
        ZoomRange::default()
    }
}
