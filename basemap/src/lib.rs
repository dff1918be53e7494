//! Base-layer coordination for vector tile maps.
//!
//! This crate manages the single base layer of a map: which style package and
//! substyle it renders with, which language its labels use, and which tile
//! source feeds it. Every selection change rebuilds the decoder and swaps a
//! fresh layer into the bottom of the layer stack; failures leave the
//! previously active layer in place.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use basemap::assets::DirAssetReader;
//! use basemap::layer::LayerStack;
//! use basemap::{BaseLayerCoordinator, CoordinatorConfig};
//! use parking_lot::Mutex;
//!
//! let layers = Arc::new(Mutex::new(LayerStack::new()));
//! let assets = Arc::new(DirAssetReader::new("assets"));
//! let mut coordinator =
//!     BaseLayerCoordinator::new(CoordinatorConfig::default(), assets, Arc::clone(&layers));
//!
//! coordinator.initialize()?;
//! coordinator.set_language("de")?;
//! coordinator.set_style("osmbright-v3:dark")?;
//! # Ok::<(), basemap::BasemapError>(())
//! ```

pub mod assets;
pub mod coordinator;
pub mod decoder;
pub mod error;
pub mod layer;
pub mod style;
pub mod tile;
pub mod tile_source;

pub use coordinator::{BaseLayerCoordinator, CoordinatorConfig, DEFAULT_TILE_URL};
pub use error::{BasemapError, TileLoadError};
pub use style::{StyleSelection, MAIN_STYLE, STYLE_3D_TOKEN};
pub use tile::{TileIndex, ZoomRange};
