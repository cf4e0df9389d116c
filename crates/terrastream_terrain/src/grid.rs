//! # Chunk Grid
//!
//! Owns every built chunk and the set of currently active ones.
//!
//! ## Invariant
//!
//! `active` always equals `{ c : chunks[c].active }`. Only
//! [`ChunkGrid::set_active`] and [`ChunkGrid::set_chunk`] touch either side,
//! and both update the two together.

use std::collections::{HashMap, HashSet};

use crate::chunk::{Chunk, ChunkCoord, Decoration, TileCoord};
use crate::error::{TerrainError, TerrainResult};
use crate::render::RenderBackend;

/// Chunk storage, decoration lookup and activation state.
#[derive(Clone, Debug)]
pub struct ChunkGrid {
    chunk_size: usize,
    chunks: HashMap<ChunkCoord, Chunk>,
    active: HashSet<ChunkCoord>,
}

impl ChunkGrid {
    /// Creates an empty grid for chunks of `chunk_size` tiles.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size, chunks: HashMap::new(), active: HashSet::new() }
    }

    /// Chunk side length in tiles.
    #[inline]
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Chunk at `coord`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ChunkNotFound`] if it has not been built.
    pub fn get_chunk(&self, coord: ChunkCoord) -> TerrainResult<&Chunk> {
        self.chunks.get(&coord).ok_or(TerrainError::ChunkNotFound(coord))
    }

    /// Whether a chunk has been built at `coord`.
    #[inline]
    #[must_use]
    pub fn contains_chunk(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Stores `chunk` at `coord`, returning whatever was there before.
    ///
    /// The active set follows the stored chunk's flag.
    pub fn set_chunk(&mut self, coord: ChunkCoord, mut chunk: Chunk) -> Option<Chunk> {
        chunk.coord = coord;
        if chunk.active {
            self.active.insert(coord);
        } else {
            self.active.remove(&coord);
        }
        let previous = self.chunks.insert(coord, chunk);
        if previous.is_some() {
            tracing::warn!(%coord, "chunk replaced");
        }
        previous
    }

    /// Decoration on world tile `tile`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::TileNotFound`] if the owning chunk is not
    /// built or the tile carries no decoration.
    pub fn get_tile(&self, tile: TileCoord) -> TerrainResult<&Decoration> {
        self.chunks
            .get(&self.owner(tile))
            .and_then(|chunk| chunk.decoration(tile))
            .ok_or(TerrainError::TileNotFound { row: tile.row, col: tile.col })
    }

    /// Whether world tile `tile` has a decoration in a built chunk.
    #[must_use]
    pub fn contains_tile(&self, tile: TileCoord) -> bool {
        self.get_tile(tile).is_ok()
    }

    /// Shows or hides a chunk with its decorations.
    ///
    /// Returns `false` without touching the backend when the chunk is
    /// already in the requested state.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ChunkNotFound`] if it has not been built.
    pub fn set_active(
        &mut self,
        coord: ChunkCoord,
        active: bool,
        backend: &mut impl RenderBackend,
    ) -> TerrainResult<bool> {
        let chunk = self.chunks.get_mut(&coord).ok_or(TerrainError::ChunkNotFound(coord))?;
        if chunk.active == active {
            return Ok(false);
        }

        chunk.active = active;
        backend.set_visible(chunk.terrain, active);
        backend.set_visible(chunk.overlay, active);
        for decoration in chunk.decorations.values().filter(|d| !d.depleted) {
            backend.set_visible(decoration.handle, active);
        }

        if active {
            self.active.insert(coord);
        } else {
            self.active.remove(&coord);
        }
        tracing::trace!(%coord, active, "chunk visibility changed");
        Ok(true)
    }

    /// Marks the decoration on `tile` as depleted or regrown.
    ///
    /// Visibility follows immediately when the owning chunk is active.
    /// Returns whether the flag changed.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::TileNotFound`] if the tile has no decoration.
    pub fn set_depleted(
        &mut self,
        tile: TileCoord,
        depleted: bool,
        backend: &mut impl RenderBackend,
    ) -> TerrainResult<bool> {
        let owner = self.owner(tile);
        let chunk = self
            .chunks
            .get_mut(&owner)
            .ok_or(TerrainError::TileNotFound { row: tile.row, col: tile.col })?;
        let active = chunk.active;
        let decoration = chunk
            .decorations
            .get_mut(&tile)
            .ok_or(TerrainError::TileNotFound { row: tile.row, col: tile.col })?;

        if decoration.depleted == depleted {
            return Ok(false);
        }
        decoration.depleted = depleted;
        if active {
            backend.set_visible(decoration.handle, decoration.visible_when(true));
        }
        Ok(true)
    }

    /// Coordinates of all active chunks.
    #[must_use]
    pub const fn active_chunks(&self) -> &HashSet<ChunkCoord> {
        &self.active
    }

    /// Number of built chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Iterates over built chunks in no particular order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    fn owner(&self, tile: TileCoord) -> ChunkCoord {
        ChunkCoord::from_tile(tile, self.chunk_size)
    }
}
