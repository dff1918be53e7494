//! Base layer coordination.
//!
//! [`BaseLayerCoordinator`] keeps the selected style, the selected language
//! and the 3D flag consistent with the single active base layer of the map.
//! Every selection change rebuilds the decoder and swaps a freshly built
//! layer into position 0 of the shared layer stack; the decoder's rule set is
//! immutable once constructed, so there is no partial update path.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::assets::{stage_package, AssetReader};
use crate::decoder::VectorTileDecoder;
use crate::error::BasemapError;
use crate::layer::{LayerId, LayerStack, VectorTileLayer};
use crate::style::{StyleSelection, StyleSet, MAIN_STYLE};
use crate::tile::ZoomRange;
use crate::tile_source::{
    CompressedCacheTileSource, MbtilesTileSource, OnlineTileSource, PersistentCacheTileSource,
    TileSource,
};

/// Default URL template for the online vector tile source.
pub const DEFAULT_TILE_URL: &str = "https://demotiles.maplibre.org/tiles/{z}/{x}/{y}.pbf";

/// Zoom range served by bundled offline packages.
const PACKAGE_ZOOM_RANGE: ZoomRange = ZoomRange::new(0, 4);

/// Initial configuration of a [`BaseLayerCoordinator`].
///
/// The cache policy is fixed at construction and does not change for the
/// lifetime of the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// URL template of the online tile source (`{z}`, `{x}`, `{y}`
    /// placeholders).
    pub url_template: String,
    /// Writable directory for the persistent cache and staged packages.
    pub data_dir: PathBuf,
    /// Cache the online source on disk instead of in memory.
    pub persistent_cache: bool,
    /// Initial style token.
    pub initial_style: String,
    /// Initial map language code.
    pub initial_language: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_TILE_URL.to_string(),
            data_dir: PathBuf::from("."),
            persistent_cache: false,
            initial_style: format!("{MAIN_STYLE}:default"),
            initial_language: "en".to_string(),
        }
    }
}

/// Owner of the active base layer and the selection state that produced it.
///
/// All operations take `&mut self` and complete synchronously, so calls are
/// serialized by construction. Failed operations leave the previously active
/// selection, decoder and layer untouched.
pub struct BaseLayerCoordinator {
    config: CoordinatorConfig,
    assets: Arc<dyn AssetReader>,
    layers: Arc<Mutex<LayerStack>>,
    selection: StyleSelection,
    language: String,
    tile_source: Option<Arc<dyn TileSource>>,
    decoder: Option<Arc<VectorTileDecoder>>,
    active_layer: Option<LayerId>,
}

impl BaseLayerCoordinator {
    /// Creates a coordinator over the given layer stack.
    ///
    /// No layer is built yet; call [`initialize`](Self::initialize) to
    /// install the base layer for the initial configuration.
    pub fn new(
        config: CoordinatorConfig,
        assets: Arc<dyn AssetReader>,
        layers: Arc<Mutex<LayerStack>>,
    ) -> Self {
        let selection = StyleSelection::parse(&config.initial_style);
        let language = config.initial_language.clone();

        Self {
            config,
            assets,
            layers,
            selection,
            language,
            tile_source: None,
            decoder: None,
            active_layer: None,
        }
    }

    /// Builds and installs the base layer for the initial configuration.
    pub fn initialize(&mut self) -> Result<(), BasemapError> {
        let decoder = self.build_decoder(&self.selection, &self.language)?;
        self.rebuild_layer(Arc::new(decoder))?;
        self.log_rebuilt();
        Ok(())
    }

    /// Selects a style by token and rebuilds the base layer.
    ///
    /// The token is either `"file"` (package default substyle) or
    /// `"file:substyle"`; the reserved 3D token selects the main style with
    /// 3D buildings. On error nothing changes.
    pub fn set_style(&mut self, token: &str) -> Result<(), BasemapError> {
        let selection = StyleSelection::parse(token);
        let decoder = self.build_decoder(&selection, &self.language)?;

        // The selection is committed only once the new layer is in place.
        self.rebuild_layer(Arc::new(decoder))?;
        self.selection = selection;
        self.log_rebuilt();
        Ok(())
    }

    /// Selects the map language and rebuilds the base layer.
    ///
    /// Re-selecting the current language still rebuilds; redundant calls are
    /// not detected.
    pub fn set_language(&mut self, code: &str) -> Result<(), BasemapError> {
        let decoder = self.build_decoder(&self.selection, code)?;

        self.rebuild_layer(Arc::new(decoder))?;
        self.language = code.to_string();
        self.log_rebuilt();
        Ok(())
    }

    /// Stages a bundled offline package and switches the base layer to it.
    ///
    /// The package is copied into the data directory and opened as an MBTiles
    /// tile source replacing the current tile source handle. A staging or
    /// open failure is non-fatal: the previous base layer remains active.
    pub fn use_offline_package(&mut self, name: &str) -> Result<(), BasemapError> {
        let decoder = match &self.decoder {
            Some(decoder) => Arc::clone(decoder),
            None => Arc::new(self.build_decoder(&self.selection, &self.language)?),
        };

        let staged = stage_package(self.assets.as_ref(), name, &self.config.data_dir)
            .inspect_err(|error| log::error!("package {name} cannot be staged: {error}"))?;
        let source = MbtilesTileSource::open(&staged, PACKAGE_ZOOM_RANGE)
            .inspect_err(|error| log::error!("package {name} cannot be opened: {error}"))?;

        self.tile_source = Some(Arc::new(source));
        self.rebuild_layer(decoder)?;
        self.log_rebuilt();
        Ok(())
    }

    /// The currently selected style.
    pub fn style_selection(&self) -> &StyleSelection {
        &self.selection
    }

    /// The currently selected language code.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Id of the active base layer, if one has been installed.
    pub fn active_layer(&self) -> Option<LayerId> {
        self.active_layer
    }

    fn build_decoder(
        &self,
        selection: &StyleSelection,
        language: &str,
    ) -> Result<VectorTileDecoder, BasemapError> {
        let style_set =
            StyleSet::load(self.assets.as_ref(), &selection.style_file).inspect_err(|error| {
                log::error!("style {} cannot be loaded: {error}", selection.style_file)
            })?;

        let mut decoder = VectorTileDecoder::new(style_set, selection.style_name.clone());

        // Language-specific texts from the vector tiles will be used.
        decoder.set_parameter("lang", language);

        let flag_3d = if selection.buildings_3d { "1" } else { "0" };
        decoder.set_parameter("buildings3d", flag_3d);
        decoder.set_parameter("markers3d", flag_3d);
        decoder.set_parameter("texts3d", flag_3d);

        Ok(decoder)
    }

    fn rebuild_layer(&mut self, decoder: Arc<VectorTileDecoder>) -> Result<(), BasemapError> {
        let tile_source = match &self.tile_source {
            Some(source) => Arc::clone(source),
            None => {
                let source = self.create_tile_source()?;
                self.tile_source = Some(Arc::clone(&source));
                source
            }
        };

        let layer = VectorTileLayer::new_base(tile_source, Arc::clone(&decoder));
        let new_id = layer.id();

        let previous = {
            let mut layers = self.layers.lock();
            let previous = self.active_layer.take().and_then(|id| layers.remove(id));
            layers.insert(0, layer);
            previous
        };

        // Ownership of the replaced layer and decoder ends here.
        drop(previous);
        drop(self.decoder.replace(decoder));

        self.active_layer = Some(new_id);
        Ok(())
    }

    fn log_rebuilt(&self) {
        log::info!(
            "base layer rebuilt: style={} substyle={:?} lang={}",
            self.selection.style_file,
            self.selection.style_name,
            self.language
        );
    }

    fn create_tile_source(&self) -> Result<Arc<dyn TileSource>, BasemapError> {
        let online = OnlineTileSource::new(self.config.url_template.clone());

        if self.config.persistent_cache {
            let cache_path = self.config.data_dir.join("mapcache.db");
            log::info!("using persistent tile cache at {}", cache_path.display());
            Ok(Arc::new(PersistentCacheTileSource::new(
                Box::new(online),
                cache_path,
            )?))
        } else {
            Ok(Arc::new(CompressedCacheTileSource::new(
                Box::new(online),
                CompressedCacheTileSource::DEFAULT_CAPACITY,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io;

    use bytes::Bytes;

    use super::*;
    use crate::style::STYLE_3D_TOKEN;

    struct MemoryAssets {
        files: HashMap<String, Bytes>,
    }

    impl MemoryAssets {
        fn with_styles(names: &[&str]) -> Self {
            let files = names
                .iter()
                .map(|name| {
                    (
                        format!("{name}.zip"),
                        Bytes::from_static(b"PK\x03\x04style-rules"),
                    )
                })
                .collect();
            Self { files }
        }

        fn insert(&mut self, name: &str, bytes: Bytes) {
            self.files.insert(name.to_string(), bytes);
        }
    }

    impl AssetReader for MemoryAssets {
        fn load_bytes(&self, name: &str) -> Result<Bytes, BasemapError> {
            self.files
                .get(name)
                .cloned()
                .ok_or_else(|| BasemapError::AssetLoad {
                    name: name.to_string(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                })
        }
    }

    fn coordinator_with(
        assets: MemoryAssets,
    ) -> (
        BaseLayerCoordinator,
        Arc<Mutex<LayerStack>>,
        tempfile::TempDir,
    ) {
        let data_dir = tempfile::tempdir().expect("temp dir");
        let config = CoordinatorConfig {
            data_dir: data_dir.path().to_path_buf(),
            ..CoordinatorConfig::default()
        };
        let layers = Arc::new(Mutex::new(LayerStack::new()));
        let coordinator = BaseLayerCoordinator::new(config, Arc::new(assets), Arc::clone(&layers));
        (coordinator, layers, data_dir)
    }

    fn base_layer_count(stack: &LayerStack) -> usize {
        stack.iter().filter(|layer| layer.is_base()).count()
    }

    #[test]
    fn initialize_installs_single_base_layer_at_position_zero() {
        let (mut coordinator, layers, _dir) =
            coordinator_with(MemoryAssets::with_styles(&[MAIN_STYLE]));

        coordinator.initialize().expect("initialize");

        let stack = layers.lock();
        assert_eq!(stack.len(), 1);
        let bottom = stack.get(0).expect("base layer");
        assert!(bottom.is_base());
        assert_eq!(Some(bottom.id()), coordinator.active_layer());
    }

    #[test]
    fn set_style_replaces_base_layer_below_overlays() {
        let (mut coordinator, layers, _dir) =
            coordinator_with(MemoryAssets::with_styles(&[MAIN_STYLE, "looseleaf"]));
        coordinator.initialize().expect("initialize");
        let first_id = coordinator.active_layer().expect("active layer");

        let overlay_id = {
            let mut stack = layers.lock();
            let base = stack.get(0).expect("base layer");
            let overlay = VectorTileLayer::new(
                Arc::clone(base.tile_source()),
                Arc::clone(base.decoder()),
            );
            let id = overlay.id();
            stack.push(overlay);
            id
        };

        coordinator.set_style("looseleaf").expect("set style");

        let stack = layers.lock();
        assert_eq!(stack.len(), 2);
        assert_eq!(base_layer_count(&stack), 1);
        let bottom = stack.get(0).expect("base layer");
        assert!(bottom.is_base());
        assert_ne!(bottom.id(), first_id);
        assert_eq!(stack.position(overlay_id), Some(1));
        drop(stack);
        assert_eq!(coordinator.style_selection().style_file, "looseleaf");
    }

    #[test]
    fn reserved_3d_token_builds_main_style_with_3d_parameters() {
        let (mut coordinator, layers, _dir) =
            coordinator_with(MemoryAssets::with_styles(&[MAIN_STYLE]));

        coordinator.set_style(STYLE_3D_TOKEN).expect("set style");

        assert_eq!(coordinator.style_selection().style_file, MAIN_STYLE);
        assert!(coordinator.style_selection().buildings_3d);

        let stack = layers.lock();
        let decoder = stack.get(0).expect("base layer").decoder();
        assert_eq!(decoder.parameter("buildings3d"), Some("1"));
        assert_eq!(decoder.parameter("markers3d"), Some("1"));
        assert_eq!(decoder.parameter("texts3d"), Some("1"));
    }

    #[test]
    fn failed_style_load_leaves_previous_layer_active() {
        let (mut coordinator, layers, _dir) =
            coordinator_with(MemoryAssets::with_styles(&[MAIN_STYLE]));
        coordinator.initialize().expect("initialize");
        let active_id = coordinator.active_layer().expect("active layer");

        let result = coordinator.set_style("missing-style");
        assert!(matches!(result, Err(BasemapError::AssetLoad { .. })));

        let stack = layers.lock();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.get(0).expect("base layer").id(), active_id);
        drop(stack);
        assert_eq!(coordinator.style_selection().style_file, MAIN_STYLE);
        assert_eq!(coordinator.active_layer(), Some(active_id));
    }

    #[test]
    fn repeated_language_selection_rebuilds_with_equivalent_decoders() {
        let (mut coordinator, layers, _dir) =
            coordinator_with(MemoryAssets::with_styles(&[MAIN_STYLE]));
        coordinator.initialize().expect("initialize");

        coordinator.set_language("de").expect("first set");
        let (first_id, first_decoder) = {
            let stack = layers.lock();
            let layer = stack.get(0).expect("base layer");
            (layer.id(), Arc::clone(layer.decoder()))
        };

        coordinator.set_language("de").expect("second set");
        let stack = layers.lock();
        let layer = stack.get(0).expect("base layer");

        assert_ne!(layer.id(), first_id);
        assert_eq!(*layer.decoder().as_ref(), *first_decoder.as_ref());
        assert_eq!(layer.decoder().parameter("lang"), Some("de"));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn failed_tile_source_creation_leaves_selection_unchanged() {
        let dir = tempfile::tempdir().expect("temp dir");
        // A plain file where the cache directory should go makes the
        // persistent cache fail to open, so the very first rebuild errors
        // after the decoder was already built.
        let bogus_data_dir = dir.path().join("data");
        std::fs::write(&bogus_data_dir, b"not a directory").expect("write");

        let config = CoordinatorConfig {
            data_dir: bogus_data_dir,
            persistent_cache: true,
            ..CoordinatorConfig::default()
        };
        let layers = Arc::new(Mutex::new(LayerStack::new()));
        let assets = MemoryAssets::with_styles(&[MAIN_STYLE, "looseleaf"]);
        let mut coordinator =
            BaseLayerCoordinator::new(config, Arc::new(assets), Arc::clone(&layers));

        let result = coordinator.initialize();
        assert!(matches!(result, Err(BasemapError::Cache { .. })));

        let result = coordinator.set_style("looseleaf");
        assert!(matches!(result, Err(BasemapError::Cache { .. })));
        assert_eq!(coordinator.style_selection().style_file, MAIN_STYLE);

        let result = coordinator.set_language("de");
        assert!(matches!(result, Err(BasemapError::Cache { .. })));
        assert_eq!(coordinator.language(), "en");

        assert_eq!(coordinator.active_layer(), None);
        assert!(layers.lock().is_empty());
    }

    #[test]
    fn tile_source_handle_is_reused_across_style_changes() {
        let (mut coordinator, layers, _dir) =
            coordinator_with(MemoryAssets::with_styles(&[MAIN_STYLE, "looseleaf"]));
        coordinator.initialize().expect("initialize");
        let first_source = Arc::clone(layers.lock().get(0).expect("base layer").tile_source());

        coordinator.set_style("looseleaf").expect("set style");
        let second_source = Arc::clone(layers.lock().get(0).expect("base layer").tile_source());

        assert!(Arc::ptr_eq(&first_source, &second_source));
    }

    #[test]
    fn offline_package_replaces_tile_source_and_base_layer() {
        let package_dir = tempfile::tempdir().expect("temp dir");
        let package_path = package_dir.path().join("world_0_4.mbtiles");
        let conn = rusqlite::Connection::open(&package_path).expect("create db");
        conn.execute_batch(
            "CREATE TABLE tiles (
                zoom_level INTEGER,
                tile_column INTEGER,
                tile_row INTEGER,
                tile_data BLOB
            );",
        )
        .expect("create schema");
        drop(conn);

        let mut assets = MemoryAssets::with_styles(&[MAIN_STYLE]);
        assets.insert(
            "world_0_4.mbtiles",
            Bytes::from(std::fs::read(&package_path).expect("read package")),
        );

        let (mut coordinator, layers, _dir) = coordinator_with(assets);
        coordinator.initialize().expect("initialize");
        let online_id = coordinator.active_layer().expect("active layer");

        coordinator
            .use_offline_package("world_0_4.mbtiles")
            .expect("switch to offline package");

        let stack = layers.lock();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.position(online_id), None);
        let layer = stack.get(0).expect("base layer");
        assert!(layer.is_base());
        assert_eq!(layer.tile_source().zoom_range(), ZoomRange::new(0, 4));
    }

    #[test]
    fn failed_package_staging_keeps_previous_base_layer() {
        let (mut coordinator, layers, _dir) =
            coordinator_with(MemoryAssets::with_styles(&[MAIN_STYLE]));
        coordinator.initialize().expect("initialize");
        let active_id = coordinator.active_layer().expect("active layer");

        let result = coordinator.use_offline_package("missing.mbtiles");
        assert!(matches!(result, Err(BasemapError::PackageCopy { .. })));

        let stack = layers.lock();
        assert_eq!(stack.get(0).expect("base layer").id(), active_id);
    }
}
