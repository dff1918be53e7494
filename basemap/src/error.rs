//! Error types for base layer management.

use std::io;
use std::path::PathBuf;

/// Error that can occur while reconfiguring the base map layer.
#[derive(Debug, thiserror::Error)]
pub enum BasemapError {
    /// A style package or bundled asset is missing or corrupt.
    #[error("style asset '{name}' could not be loaded")]
    AssetLoad {
        /// Name of the asset that failed to load.
        name: String,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },

    /// A bundled offline package could not be copied into writable storage.
    #[error("offline package '{name}' could not be staged")]
    PackageCopy {
        /// Name of the package that failed to stage.
        name: String,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },

    /// A staged offline package could not be opened as a tile database.
    #[error("offline package '{}' could not be opened", path.display())]
    PackageOpen {
        /// Path of the staged package file.
        path: PathBuf,
        /// Underlying database failure.
        #[source]
        source: rusqlite::Error,
    },

    /// The persistent tile cache could not be initialized.
    #[error("tile cache could not be initialized at '{}'", path.display())]
    Cache {
        /// Path of the cache database.
        path: PathBuf,
        /// Underlying storage failure.
        #[source]
        source: sled::Error,
    },
}

/// Error that can occur when trying to load a tile from a tile source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TileLoadError {
    /// The backing store (remote server or local database) could not be reached.
    #[error("tile source backing store could not be reached")]
    Network,
    /// Tile with the given index does not exist.
    #[error("tile does not exist")]
    DoesNotExist,
    /// Failed to decode the tile from the binary data.
    #[error("failed to decode tile data")]
    Decoding,
}
