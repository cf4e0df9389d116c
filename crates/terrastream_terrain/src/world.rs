//! # Tile World
//!
//! Owns the whole terrain pipeline for one session and is driven by the
//! host's frame loop: [`TileWorld::initialize`] once, [`TileWorld::tick`]
//! every frame.

use terrastream_shared::Vec3;

use crate::autotile::AutotileTable;
use crate::builder::ChunkMeshBuilder;
use crate::catalog::TileCatalog;
use crate::chunk::{ChunkCoord, TileCoord};
use crate::config::WorldConfig;
use crate::error::{TerrainError, TerrainResult};
use crate::grid::ChunkGrid;
use crate::overlay::OverlayField;
use crate::render::RenderBackend;
use crate::streamer::{ChunkStreamer, StreamerStats, TickReport};
use crate::tile::TileGrid;

/// Chunked tile world bound to a render backend.
#[derive(Debug)]
pub struct TileWorld<B: RenderBackend> {
    config: WorldConfig,
    grid: ChunkGrid,
    streamer: ChunkStreamer,
    builder: ChunkMeshBuilder,
    backend: B,
    resources: Option<TileGrid>,
    overlay: Option<OverlayField>,
}

impl<B: RenderBackend> TileWorld<B> {
    /// Builds the autotile table, checks the tile grid against the config
    /// and catalog, and queues every chunk for loading.
    ///
    /// # Errors
    ///
    /// Any configuration error: invalid config, malformed templates, a grid
    /// of the wrong shape, or a tile id missing from the catalog.
    pub fn initialize(
        config: WorldConfig,
        catalog: TileCatalog,
        tiles: TileGrid,
        backend: B,
    ) -> TerrainResult<Self> {
        config.validate()?;
        for (_, _, id) in tiles.iter() {
            catalog.tile_type(id)?;
        }

        let table = AutotileTable::build()?;
        let builder = ChunkMeshBuilder::new(&config, table, catalog, tiles)?;
        let streamer = ChunkStreamer::new(&config);

        tracing::info!(
            map_size = config.map_size,
            chunk_size = config.chunk_size(),
            queued = streamer.stats().pending_loads,
            "tile world initialized"
        );

        Ok(Self {
            grid: ChunkGrid::new(config.chunk_size()),
            config,
            streamer,
            builder,
            backend,
            resources: None,
            overlay: None,
        })
    }

    /// Runs one frame with the viewer at `viewer`.
    ///
    /// # Errors
    ///
    /// Propagates chunk build failures.
    pub fn tick(&mut self, viewer: Vec3) -> TerrainResult<TickReport> {
        let report =
            self.streamer.tick(viewer, &mut self.grid, &mut self.builder, &mut self.backend)?;

        // Chunks built after the last resource update still need it
        if let Some(coord) = report.built {
            if let Some(resources) = self.resources.take() {
                let result = self.apply_resources_in(coord, &resources);
                self.resources = Some(resources);
                let (_, undecorated) = result?;
                warn_undecorated(undecorated);
            }
        }
        Ok(report)
    }

    /// Applies a later per-tick snapshot to decoration visibility.
    ///
    /// Tiles whose new type shows its decoration regrow it, tiles whose new
    /// type hides it deplete it; other types leave the decoration alone. The
    /// terrain itself is not rebuilt. Returns how many decorations changed.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::GridShape`] for a snapshot of the wrong size
    /// and [`TerrainError::UnknownTileId`] for ids missing from the catalog.
    pub fn apply_resource_update(&mut self, update: TileGrid) -> TerrainResult<usize> {
        if update.size() != self.config.map_size {
            return Err(TerrainError::GridShape {
                expected: self.config.map_size,
                found: format!("{}x{} update", update.size(), update.size()),
            });
        }

        let built: Vec<ChunkCoord> = self.streamer.loaded().to_vec();
        let mut changed = 0;
        let mut undecorated = 0;
        for coord in built {
            let (c, u) = self.apply_resources_in(coord, &update)?;
            changed += c;
            undecorated += u;
        }
        self.resources = Some(update);

        warn_undecorated(undecorated);
        tracing::debug!(changed, "resource update applied");
        Ok(changed)
    }

    /// Returns how many decorations changed and how many tiles asked for a
    /// decoration they were never built with.
    fn apply_resources_in(
        &mut self,
        coord: ChunkCoord,
        update: &TileGrid,
    ) -> TerrainResult<(usize, usize)> {
        let size = self.config.chunk_size();
        let Some(first) = coord.origin_tile(size) else {
            return Ok((0, 0));
        };

        let mut changed = 0;
        let mut undecorated = 0;
        for row in first.row..first.row + size {
            for col in first.col..first.col + size {
                let Some(id) = update.get(row, col) else {
                    continue;
                };
                let ty = self.builder.catalog().tile_type(id)?;
                if ty.decoration.is_none() {
                    continue;
                }
                let tile = TileCoord::new(row, col);
                if !self.grid.contains_tile(tile) {
                    undecorated += 1;
                    continue;
                }
                let depleted = !ty.decoration_shown;
                if self.grid.set_depleted(tile, depleted, &mut self.backend)? {
                    changed += 1;
                }
            }
        }
        Ok((changed, undecorated))
    }

    /// Replaces the overlay field; `None` clears it to black.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::GridShape`] if the field is not `map_size` square.
    pub fn set_overlay(&mut self, overlay: Option<OverlayField>) -> TerrainResult<()> {
        if let Some(field) = &overlay {
            if field.size() != self.config.map_size {
                return Err(TerrainError::GridShape {
                    expected: self.config.map_size,
                    found: format!("{}x{} overlay", field.size(), field.size()),
                });
            }
        }
        self.backend.set_overlay(overlay.as_ref());
        self.overlay = overlay;
        Ok(())
    }

    /// Current overlay field.
    #[must_use]
    pub const fn overlay(&self) -> Option<&OverlayField> {
        self.overlay.as_ref()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Chunk storage.
    #[must_use]
    pub const fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    /// Mesh builder (tile grid, catalog, table).
    #[must_use]
    pub const fn builder(&self) -> &ChunkMeshBuilder {
        &self.builder
    }

    /// Render backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable render backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Streaming totals.
    #[must_use]
    pub const fn stats(&self) -> StreamerStats {
        self.streamer.stats()
    }

    /// Whether chunks are still waiting to be built.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.streamer.is_loading()
    }
}

fn warn_undecorated(count: usize) {
    if count > 0 {
        tracing::warn!(tiles = count, "resource update on tiles without decoration");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogManifest, ProceduralPrototypes};
    use crate::render::HeadlessBackend;
    use crate::tile::TileId;

    const SCRUB: TileId = TileId(3);
    const FOREST: TileId = TileId(4);

    fn catalog() -> TileCatalog {
        let manifest = CatalogManifest::default();
        TileCatalog::from_manifest(&manifest, &mut ProceduralPrototypes::for_manifest(&manifest))
            .unwrap()
    }

    fn small_config() -> WorldConfig {
        WorldConfig { map_size: 8, chunks_per_side: 2, chunk_radius: 1, ..WorldConfig::default() }
    }

    #[test]
    fn test_initialize_rejects_unknown_ids() {
        let tiles = TileGrid::from_fn(8, |r, c| if (r, c) == (5, 5) { TileId(9) } else { FOREST });
        let err = TileWorld::initialize(small_config(), catalog(), tiles, HeadlessBackend::new())
            .unwrap_err();
        assert_eq!(err, TerrainError::UnknownTileId(TileId(9)));
    }

    #[test]
    fn test_resource_update_toggles_decorations() {
        let tiles = TileGrid::filled(8, FOREST);
        let mut world =
            TileWorld::initialize(small_config(), catalog(), tiles, HeadlessBackend::new())
                .unwrap();
        let viewer = Vec3::new(1.0, 0.0, 1.0);
        while world.is_loading() {
            world.tick(viewer).unwrap();
        }
        let handle = world.grid().get_tile(TileCoord::new(1, 1)).unwrap().handle;
        assert!(world.backend().is_visible(handle));

        let update = TileGrid::from_fn(8, |r, _| if r < 4 { SCRUB } else { FOREST });
        assert_eq!(world.apply_resource_update(update).unwrap(), 32);
        assert!(!world.backend().is_visible(handle));

        assert_eq!(world.apply_resource_update(TileGrid::filled(8, FOREST)).unwrap(), 32);
        assert!(world.backend().is_visible(handle));
    }

    #[test]
    fn test_resource_update_reaches_chunks_built_later() {
        let mut world = TileWorld::initialize(
            small_config(),
            catalog(),
            TileGrid::filled(8, FOREST),
            HeadlessBackend::new(),
        )
        .unwrap();
        let viewer = Vec3::new(1.0, 0.0, 1.0);
        assert_eq!(world.apply_resource_update(TileGrid::filled(8, SCRUB)).unwrap(), 0);

        while world.is_loading() {
            world.tick(viewer).unwrap();
        }
        let deco = world.grid().get_tile(TileCoord::new(2, 2)).unwrap();
        assert!(deco.depleted);
        assert!(!world.backend().is_visible(deco.handle));
    }

    #[test]
    fn test_undecorated_tiles_are_counted_per_update() {
        const GRASS: TileId = TileId(2);
        let mut world = TileWorld::initialize(
            small_config(),
            catalog(),
            TileGrid::filled(8, GRASS),
            HeadlessBackend::new(),
        )
        .unwrap();
        while world.is_loading() {
            world.tick(Vec3::new(1.0, 0.0, 1.0)).unwrap();
        }

        let update = TileGrid::filled(8, FOREST);
        let coord = ChunkCoord::new(0, 0);
        assert_eq!(world.apply_resources_in(coord, &update).unwrap(), (0, 16));
        assert_eq!(world.apply_resource_update(update).unwrap(), 0);
    }

    #[test]
    fn test_overlay_size_checked() {
        let mut world = TileWorld::initialize(
            small_config(),
            catalog(),
            TileGrid::filled(8, FOREST),
            HeadlessBackend::new(),
        )
        .unwrap();
        assert!(world.set_overlay(Some(OverlayField::black(4))).is_err());

        let mut field = OverlayField::black(8);
        field.set(2, 3, [1.0, 0.0, 0.0]).unwrap();
        world.set_overlay(Some(field)).unwrap();
        assert_eq!(world.backend().overlay().map(OverlayField::lit_count), Some(1));

        world.set_overlay(None).unwrap();
        assert!(world.backend().overlay().is_none());
    }
}
