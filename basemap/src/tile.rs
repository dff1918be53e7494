//! Tile addressing types.

/// Index of a tile in the XYZ addressing scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex {
    /// Column of the tile.
    pub x: u32,
    /// Row of the tile, counted from the top.
    pub y: u32,
    /// Zoom level of the tile.
    pub z: u8,
}

impl TileIndex {
    /// Creates a new tile index.
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }
}

/// Inclusive range of zoom levels served by a tile source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomRange {
    min: u8,
    max: u8,
}

impl ZoomRange {
    /// Creates a new zoom range. `min` must not be greater than `max`.
    pub const fn new(min: u8, max: u8) -> Self {
        debug_assert!(min <= max);
        Self { min, max }
    }

    /// Lowest zoom level in the range.
    pub fn min(&self) -> u8 {
        self.min
    }

    /// Highest zoom level in the range.
    pub fn max(&self) -> u8 {
        self.max
    }

    /// Returns true if the given zoom level is within the range.
    pub fn contains(&self, z: u8) -> bool {
        z >= self.min && z <= self.max
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { min: 0, max: 20 }
    }
}
