//! # Chunk Mesh Builder
//!
//! Turns one chunk's footprint of tile ids into render objects:
//!
//! 1. resolve every tile's variant (border, autotile family, or plain),
//! 2. bake the variant prototypes into one chunk-local mesh,
//! 3. register that mesh twice (terrain and overlay pass),
//! 4. spawn hidden decorations for decorated tile types.
//!
//! Any missing catalog or table entry aborts the build; there is no
//! fallback geometry.

use std::collections::HashMap;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use terrastream_shared::{Quaternion, Transform, Vec3};

use crate::autotile::{AutotileTable, TileVariant};
use crate::catalog::{TileCatalog, TileType};
use crate::chunk::{Chunk, ChunkCoord, Decoration, TileCoord};
use crate::config::WorldConfig;
use crate::error::{TerrainError, TerrainResult};
use crate::mesh::Mesh;
use crate::render::{RenderBackend, RenderPass};
use crate::tile::TileGrid;

/// Mirror scale applied to flipped variants.
const FLIP_Z: f32 = -1.0;

/// Builds chunks from the immutable tile grid.
#[derive(Clone, Debug)]
pub struct ChunkMeshBuilder {
    table: AutotileTable,
    catalog: TileCatalog,
    tiles: TileGrid,
    rng: ChaCha8Rng,
    chunk_size: usize,
    chunks_per_side: usize,
    tile_size: f32,
    decoration_scale: Vec3,
}

impl ChunkMeshBuilder {
    /// Creates a builder over `tiles`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] for an invalid config and
    /// [`TerrainError::GridShape`] if `tiles` is not `map_size` square.
    pub fn new(
        config: &WorldConfig,
        table: AutotileTable,
        catalog: TileCatalog,
        tiles: TileGrid,
    ) -> TerrainResult<Self> {
        config.validate()?;
        if tiles.size() != config.map_size {
            return Err(TerrainError::GridShape {
                expected: config.map_size,
                found: format!("{}x{} grid", tiles.size(), tiles.size()),
            });
        }
        Ok(Self {
            table,
            catalog,
            tiles,
            rng: ChaCha8Rng::seed_from_u64(config.decoration_seed),
            chunk_size: config.chunk_size(),
            chunks_per_side: config.chunks_per_side,
            tile_size: config.tile_size,
            decoration_scale: config.decoration_scale(),
        })
    }

    /// The tile grid being built from.
    #[must_use]
    pub const fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    /// The tile catalog.
    #[must_use]
    pub const fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    /// The autotile table.
    #[must_use]
    pub const fn table(&self) -> &AutotileTable {
        &self.table
    }

    /// Variant for the tile at `tile`.
    ///
    /// Border tiles always get [`TileVariant::EDGE`]; tiles of an autotile
    /// family go through the table, and unmatched neighborhoods fall back to
    /// [`TileVariant::PLAIN`]; everything else is [`TileVariant::PLAIN`].
    ///
    /// # Errors
    ///
    /// Fails for tiles outside the grid, unknown tile ids and table misses.
    pub fn resolve_variant(&self, tile: TileCoord) -> TerrainResult<TileVariant> {
        self.resolve(tile).map(|(variant, _)| variant)
    }

    /// Prototype name the tile at `tile` is drawn with.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve_variant`].
    pub fn prototype_name(&self, tile: TileCoord) -> TerrainResult<String> {
        let (variant, ty) = self.resolve(tile)?;
        Ok(ty.variant_name(&variant))
    }

    fn resolve(&self, tile: TileCoord) -> TerrainResult<(TileVariant, &TileType)> {
        let id = self
            .tiles
            .get(tile.row, tile.col)
            .ok_or(TerrainError::TileNotFound { row: tile.row, col: tile.col })?;
        let ty = self.catalog.tile_type(id)?;

        let variant = if self.tiles.is_border(tile.row, tile.col) {
            TileVariant::EDGE
        } else if ty.family.is_some() {
            self.table.lookup(self.tiles.neighbor_bitmask(tile.row, tile.col))?
        } else {
            TileVariant::PLAIN
        };
        Ok((variant, ty))
    }

    /// Builds the chunk at `coord` and registers its objects with `backend`.
    ///
    /// The returned chunk is inactive; every object it owns starts hidden.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ChunkNotFound`] outside the grid, or the
    /// first catalog/table miss encountered.
    pub fn build(
        &mut self,
        coord: ChunkCoord,
        backend: &mut impl RenderBackend,
    ) -> TerrainResult<Chunk> {
        if !coord.in_bounds(self.chunks_per_side) {
            return Err(TerrainError::ChunkNotFound(coord));
        }
        let first = coord.origin_tile(self.chunk_size).ok_or(TerrainError::ChunkNotFound(coord))?;
        let origin = coord.world_origin(self.chunk_size, self.tile_size);

        let mut parts: Vec<(Arc<Mesh>, Transform)> =
            Vec::with_capacity(self.chunk_size * self.chunk_size);
        let mut decorations = HashMap::new();

        for dr in 0..self.chunk_size {
            for dc in 0..self.chunk_size {
                let tile = TileCoord::new(first.row + dr, first.col + dc);
                let (variant, ty) = self.resolve(tile)?;
                let prototype = Arc::clone(self.catalog.lookup_by_name(&ty.variant_name(&variant))?);

                let local = self.local_offset(dr, dc);
                let z_scale = if variant.flip { FLIP_Z } else { 1.0 };
                let transform = Transform::new(
                    local,
                    Quaternion::from_rotation_y(f32::from(variant.rotation.degrees())),
                    Vec3::new(self.tile_size, 1.0, self.tile_size * z_scale),
                );
                parts.push((prototype, transform));

                if let Some(decoration) = self.spawn_decoration(tile, origin + local, backend)? {
                    decorations.insert(tile, decoration);
                }
            }
        }

        let mesh = Arc::new(Mesh::combine(parts.iter().map(|(mesh, t)| (&**mesh, *t))));
        let terrain = backend.create_batch(Arc::clone(&mesh), RenderPass::Terrain, origin);
        let overlay = backend.create_batch(Arc::clone(&mesh), RenderPass::Overlay, origin);

        tracing::debug!(
            %coord,
            vertices = mesh.vertex_count(),
            decorations = decorations.len(),
            "chunk built"
        );
        Ok(Chunk::new(coord, terrain, overlay, mesh, decorations))
    }

    #[allow(clippy::cast_precision_loss)]
    fn local_offset(&self, dr: usize, dc: usize) -> Vec3 {
        Vec3::new(dr as f32 * self.tile_size, 0.0, dc as f32 * self.tile_size)
    }

    fn spawn_decoration(
        &mut self,
        tile: TileCoord,
        position: Vec3,
        backend: &mut impl RenderBackend,
    ) -> TerrainResult<Option<Decoration>> {
        let Some(id) = self.tiles.get(tile.row, tile.col) else {
            return Ok(None);
        };
        let ty = self.catalog.tile_type(id)?;
        let Some(name) = &ty.decoration else {
            return Ok(None);
        };
        let depleted = !ty.decoration_shown;
        let prototype = self.catalog.lookup_by_name(name)?;

        let angle = self.rng.gen_range(0.0..360.0);
        let transform =
            Transform::new(position, Quaternion::from_rotation_y(angle), self.decoration_scale);
        let handle = backend.create_decoration(prototype, &transform);
        Ok(Some(Decoration { handle, depleted }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autotile::Rotation;
    use crate::catalog::{CatalogManifest, ProceduralPrototypes};
    use crate::render::HeadlessBackend;
    use crate::tile::TileId;

    const SAND: TileId = TileId(1);
    const GRASS: TileId = TileId(2);
    const FOREST: TileId = TileId(4);
    const STONE: TileId = TileId(5);

    fn builder(config: &WorldConfig, tiles: TileGrid) -> ChunkMeshBuilder {
        let manifest = CatalogManifest::default();
        let catalog =
            TileCatalog::from_manifest(&manifest, &mut ProceduralPrototypes::for_manifest(&manifest))
                .unwrap();
        ChunkMeshBuilder::new(config, AutotileTable::build().unwrap(), catalog, tiles).unwrap()
    }

    fn small_config() -> WorldConfig {
        WorldConfig { map_size: 8, chunks_per_side: 2, ..WorldConfig::default() }
    }

    #[test]
    fn test_grid_shape_checked() {
        let manifest = CatalogManifest::default();
        let catalog =
            TileCatalog::from_manifest(&manifest, &mut ProceduralPrototypes::new()).unwrap();
        let err = ChunkMeshBuilder::new(
            &small_config(),
            AutotileTable::build().unwrap(),
            catalog,
            TileGrid::filled(9, SAND),
        )
        .unwrap_err();
        assert!(matches!(err, TerrainError::GridShape { expected: 8, .. }));
    }

    #[test]
    fn test_plain_and_family_resolution() {
        let tiles = TileGrid::from_fn(8, |r, _| if r < 4 { STONE } else { GRASS });
        let b = builder(&small_config(), tiles);

        assert_eq!(b.resolve_variant(TileCoord::new(5, 3)).unwrap(), TileVariant::PLAIN);
        assert_eq!(b.prototype_name(TileCoord::new(5, 3)).unwrap(), "Grass");

        // Bottom edge of the stone band: top, left, right and top corners match
        let v = b.resolve_variant(TileCoord::new(3, 3)).unwrap();
        assert_eq!(v.mesh_suffix, "3c");
        assert_eq!(v.rotation, Rotation::R0);
        assert_eq!(b.prototype_name(TileCoord::new(3, 3)).unwrap(), "Stone3c");
    }

    #[test]
    fn test_isolated_family_tile_uses_base_prototype() {
        const LAVA: TileId = TileId(0);
        let tiles = TileGrid::from_fn(8, |r, c| match (r, c) {
            (3, 3) => LAVA,
            (3, 5) => SAND,
            (5, 3) => STONE,
            _ => GRASS,
        });
        let b = builder(&small_config(), tiles);

        assert_eq!(b.resolve_variant(TileCoord::new(3, 3)).unwrap(), TileVariant::PLAIN);
        assert_eq!(b.prototype_name(TileCoord::new(3, 3)).unwrap(), "Lava");
        assert_eq!(b.prototype_name(TileCoord::new(3, 5)).unwrap(), "Sand");
        assert_eq!(b.prototype_name(TileCoord::new(5, 3)).unwrap(), "Stone0a");

        // Same-type neighbor on a cardinal side still autotiles with the family
        let pair = TileGrid::from_fn(8, |r, c| if r == 3 && (3..5).contains(&c) { LAVA } else { GRASS });
        let b = builder(&small_config(), pair);
        assert_eq!(b.prototype_name(TileCoord::new(3, 3)).unwrap(), "Sand1a");
    }

    #[test]
    fn test_border_forced_to_edge() {
        let b = builder(&small_config(), TileGrid::from_fn(8, |r, c| TileId(((r + c) % 6) as u16)));
        for i in 0..8 {
            for tile in [TileCoord::new(0, i), TileCoord::new(7, i), TileCoord::new(i, 0)] {
                assert_eq!(b.resolve_variant(tile).unwrap(), TileVariant::EDGE);
            }
        }
        assert_eq!(b.prototype_name(TileCoord::new(0, 5)).unwrap(), "Stone4f");
        assert_eq!(b.prototype_name(TileCoord::new(0, 2)).unwrap(), "Grass");
    }

    #[test]
    fn test_unknown_tile_id_aborts_build() {
        let mut b = builder(&small_config(), TileGrid::filled(8, TileId(42)));
        let mut backend = HeadlessBackend::new();
        let err = b.build(ChunkCoord::new(0, 0), &mut backend).unwrap_err();
        assert_eq!(err, TerrainError::UnknownTileId(TileId(42)));
    }

    #[test]
    fn test_build_registers_hidden_batches_and_decorations() {
        let tiles = TileGrid::from_fn(8, |r, c| if r < 4 && c < 4 { FOREST } else { SAND });
        let mut b = builder(&small_config(), tiles);
        let mut backend = HeadlessBackend::new();

        let chunk = b.build(ChunkCoord::new(0, 0), &mut backend).unwrap();
        assert!(!chunk.is_active());
        assert_eq!(chunk.decorations.len(), 16);
        assert_eq!(chunk.mesh.vertex_count(), 16 * 4);
        assert!(Arc::ptr_eq(
            &backend.object(chunk.terrain).unwrap().mesh,
            &backend.object(chunk.overlay).unwrap().mesh
        ));
        assert_eq!(backend.object_count(), 2 + 16);
        assert_eq!(backend.visible_count(), 0);

        let other = b.build(ChunkCoord::new(1, 1), &mut backend).unwrap();
        assert!(other.decorations.is_empty());
        let origin = backend.object(other.terrain).unwrap().transform.position;
        assert_eq!(origin, Vec3::new(4.0, 0.0, 4.0));
    }

    #[test]
    fn test_out_of_range_chunk_rejected() {
        let mut b = builder(&small_config(), TileGrid::filled(8, SAND));
        let mut backend = HeadlessBackend::new();
        assert!(b.build(ChunkCoord::new(2, 0), &mut backend).is_err());
        assert!(b.build(ChunkCoord::new(-1, 0), &mut backend).is_err());
    }
}
