//! Style selection and style set assets.
//!
//! A map style is selected with a token of the form `"file"` or
//! `"file:substyle"`, where `file` names a bundled `.zip` style package and
//! `substyle` one named variant within it. The reserved token
//! [`STYLE_3D_TOKEN`] selects the main style with 3D buildings enabled.

use std::io;

use bytes::Bytes;

use crate::assets::AssetReader;
use crate::error::BasemapError;

/// Name of the main style package shipped with the map.
pub const MAIN_STYLE: &str = "osmbright-v3";

/// Reserved style token that selects [`MAIN_STYLE`] with 3D buildings.
pub const STYLE_3D_TOKEN: &str = "osmbright3d";

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// A parsed style selection.
///
/// Exactly one of the named substyle or the package default is selected:
/// `style_name` is `Some` only for `"file:substyle"` tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSelection {
    /// Name of the style package, without the `.zip` extension.
    pub style_file: String,
    /// Named substyle within the package, or `None` for the package default.
    pub style_name: Option<String>,
    /// Whether 3D buildings, markers and texts are enabled.
    pub buildings_3d: bool,
}

impl StyleSelection {
    /// Parses a style token.
    pub fn parse(token: &str) -> Self {
        if let Some((file, name)) = token.split_once(':') {
            Self {
                style_file: file.to_string(),
                style_name: Some(name.to_string()),
                buildings_3d: false,
            }
        } else if token == STYLE_3D_TOKEN {
            Self {
                style_file: MAIN_STYLE.to_string(),
                style_name: None,
                buildings_3d: true,
            }
        } else {
            Self {
                style_file: token.to_string(),
                style_name: None,
                buildings_3d: false,
            }
        }
    }

    /// Name of the bundled asset holding this style package.
    pub fn asset_name(&self) -> String {
        format!("{}.zip", self.style_file)
    }
}

/// Raw bytes of a loaded style package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSet {
    bytes: Bytes,
}

impl StyleSet {
    /// Loads the style package named `style_file` from the given assets.
    ///
    /// Fails with [`BasemapError::AssetLoad`] if the asset is missing or is
    /// not a ZIP archive.
    pub fn load(assets: &dyn AssetReader, style_file: &str) -> Result<Self, BasemapError> {
        let name = format!("{style_file}.zip");
        let bytes = assets.load_bytes(&name)?;

        if bytes.len() < ZIP_MAGIC.len() || bytes[0..ZIP_MAGIC.len()] != ZIP_MAGIC {
            log::error!("style asset {name} is not a zip archive");
            return Err(BasemapError::AssetLoad {
                name,
                source: io::Error::new(io::ErrorKind::InvalidData, "not a zip archive"),
            });
        }

        Ok(Self { bytes })
    }

    /// Raw bytes of the package.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}
