//! Bundled asset access and offline package staging.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::BasemapError;

/// Source of bundled application assets (style packages, offline map
/// packages).
pub trait AssetReader: Send + Sync {
    /// Loads the raw bytes of the named asset.
    ///
    /// Fails with [`BasemapError::AssetLoad`] if the asset does not exist or
    /// cannot be read.
    fn load_bytes(&self, name: &str) -> Result<Bytes, BasemapError>;
}

/// Asset reader backed by a directory on the local file system.
pub struct DirAssetReader {
    root: PathBuf,
}

impl DirAssetReader {
    /// Creates a reader serving assets from the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetReader for DirAssetReader {
    fn load_bytes(&self, name: &str) -> Result<Bytes, BasemapError> {
        let path = self.root.join(name);
        fs::read(&path)
            .map(Bytes::from)
            .map_err(|source| BasemapError::AssetLoad {
                name: name.to_string(),
                source,
            })
    }
}

/// Copies a bundled package into writable storage and returns the path of the
/// staged file.
///
/// The package must be staged before it can be opened as a tile database;
/// bundled assets are not guaranteed to be addressable as plain files. Fails
/// with [`BasemapError::PackageCopy`] and leaves no partially written file
/// behind on error.
pub fn stage_package(
    assets: &dyn AssetReader,
    name: &str,
    target_dir: &Path,
) -> Result<PathBuf, BasemapError> {
    let bytes = assets.load_bytes(name).map_err(|error| match error {
        BasemapError::AssetLoad { name, source } => BasemapError::PackageCopy { name, source },
        other => other,
    })?;

    let copy_err = |source| BasemapError::PackageCopy {
        name: name.to_string(),
        source,
    };

    fs::create_dir_all(target_dir).map_err(copy_err)?;
    let target = target_dir.join(name);
    if let Err(source) = fs::write(&target, &bytes) {
        let _ = fs::remove_file(&target);
        return Err(copy_err(source));
    }

    log::info!("copied package {name} to {}", target.display());
    Ok(target)
}
