//! Offline map package tile source (MBTiles).

use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use flate2::read::GzDecoder;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};

use super::TileSource;
use crate::error::{BasemapError, TileLoadError};
use crate::tile::{TileIndex, ZoomRange};

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Tile source reading from a staged MBTiles package file.
///
/// MBTiles stores rows in TMS order (counted from the bottom), so the row is
/// flipped when looking up an XYZ index. Gzip-compressed tile blobs are
/// decompressed transparently.
pub struct MbtilesTileSource {
    conn: Mutex<Connection>,
    zoom_range: ZoomRange,
}

impl MbtilesTileSource {
    /// Opens the package at `path`, serving the given zoom range.
    pub fn open(path: impl AsRef<Path>, zoom_range: ZoomRange) -> Result<Self, BasemapError> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| BasemapError::PackageOpen {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
            zoom_range,
        })
    }
}

#[async_trait::async_trait]
impl TileSource for MbtilesTileSource {
    async fn load_tile(&self, index: TileIndex) -> Result<Bytes, TileLoadError> {
        // Zoom levels of 32 and above cannot be addressed with u32 rows.
        if !self.zoom_range.contains(index.z) || index.z >= 32 {
            return Err(TileLoadError::DoesNotExist);
        }

        // Flip vertical axis: MBTiles rows are TMS, tile indices are XYZ.
        let row = (1u32 << index.z) - 1 - index.y;

        let data: Vec<u8> = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT tile_data FROM tiles \
                 WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3",
                rusqlite::params![index.z, index.x, row],
                |r| r.get(0),
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => TileLoadError::DoesNotExist,
                other => {
                    log::error!("mbtiles query failed for tile {index:?}: {other}");
                    TileLoadError::Network
                }
            })?
        };

        if data.len() > GZIP_MAGIC.len() && data[0..GZIP_MAGIC.len()] == GZIP_MAGIC {
            let mut decoder = GzDecoder::new(&data[..]);
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed).map_err(|error| {
                log::error!("gzip decompression failed for tile {index:?}: {error}");
                TileLoadError::Decoding
            })?;
            Ok(Bytes::from(decompressed))
        } else {
            Ok(Bytes::from(data))
        }
    }

    fn zoom_range(&self) -> ZoomRange {
        self.zoom_range
    }
}
