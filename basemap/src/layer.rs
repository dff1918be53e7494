//! Map layers and the ordered layer sequence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::decoder::VectorTileDecoder;
use crate::tile_source::TileSource;

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a layer within a [`LayerStack`].
pub type LayerId = u64;

/// A rendering layer drawing vector tiles from a tile source through a
/// decoder.
///
/// Layers are immutable once created; changing any parameter means building a
/// new layer and swapping it into the stack.
pub struct VectorTileLayer {
    id: LayerId,
    tile_source: Arc<dyn TileSource>,
    decoder: Arc<VectorTileDecoder>,
    base: bool,
}

impl VectorTileLayer {
    /// Creates an overlay layer.
    pub fn new(tile_source: Arc<dyn TileSource>, decoder: Arc<VectorTileDecoder>) -> Self {
        Self::with_base_tag(tile_source, decoder, false)
    }

    /// Creates a layer tagged as the base layer.
    pub fn new_base(tile_source: Arc<dyn TileSource>, decoder: Arc<VectorTileDecoder>) -> Self {
        Self::with_base_tag(tile_source, decoder, true)
    }

    fn with_base_tag(
        tile_source: Arc<dyn TileSource>,
        decoder: Arc<VectorTileDecoder>,
        base: bool,
    ) -> Self {
        Self {
            id: NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed),
            tile_source,
            decoder,
            base,
        }
    }

    /// Identifier of this layer.
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Whether this layer is tagged as the base layer.
    pub fn is_base(&self) -> bool {
        self.base
    }

    /// The tile source this layer draws from.
    pub fn tile_source(&self) -> &Arc<dyn TileSource> {
        &self.tile_source
    }

    /// The decoder this layer draws through.
    pub fn decoder(&self) -> &Arc<VectorTileDecoder> {
        &self.decoder
    }
}

/// Ordered sequence of map layers; position 0 is rendered lowest.
#[derive(Default)]
pub struct LayerStack {
    layers: Vec<VectorTileLayer>,
}

impl LayerStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a layer at the given position.
    pub fn insert(&mut self, position: usize, layer: VectorTileLayer) {
        self.layers.insert(position, layer);
    }

    /// Appends a layer on top of the stack.
    pub fn push(&mut self, layer: VectorTileLayer) {
        self.layers.push(layer);
    }

    /// Removes and returns the layer with the given id, if present.
    pub fn remove(&mut self, id: LayerId) -> Option<VectorTileLayer> {
        let position = self.layers.iter().position(|layer| layer.id() == id)?;
        Some(self.layers.remove(position))
    }

    /// Position of the layer with the given id, if present.
    pub fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id() == id)
    }

    /// The layer at the given position.
    pub fn get(&self, position: usize) -> Option<&VectorTileLayer> {
        self.layers.get(position)
    }

    /// Number of layers in the stack.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if the stack holds no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Iterates over the layers from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &VectorTileLayer> {
        self.layers.iter()
    }
}
