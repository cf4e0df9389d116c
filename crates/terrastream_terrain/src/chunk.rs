//! # Chunks
//!
//! A chunk is a `chunk_size x chunk_size` block of tiles: the unit of mesh
//! batching and of streaming. Built once, then only shown or hidden.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use terrastream_shared::Vec3;

use crate::mesh::Mesh;
use crate::render::RenderHandle;

/// Chunk position in chunk units. Signed so that viewer-relative windows
/// may extend past the grid edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// Chunk row (world X).
    pub row: i32,
    /// Chunk column (world Z).
    pub col: i32,
}

impl ChunkCoord {
    /// Creates a chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Chunk owning the tile at `tile`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const fn from_tile(tile: TileCoord, chunk_size: usize) -> Self {
        Self::new((tile.row / chunk_size) as i32, (tile.col / chunk_size) as i32)
    }

    /// First tile of this chunk, or `None` for negative coordinates.
    #[must_use]
    pub fn origin_tile(self, chunk_size: usize) -> Option<TileCoord> {
        let row = usize::try_from(self.row).ok()?;
        let col = usize::try_from(self.col).ok()?;
        Some(TileCoord::new(row * chunk_size, col * chunk_size))
    }

    /// World-space position of the chunk's first tile.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn world_origin(self, chunk_size: usize, tile_size: f32) -> Vec3 {
        let extent = chunk_size as f32 * tile_size;
        Vec3::new(self.row as f32 * extent, 0.0, self.col as f32 * extent)
    }

    /// Whether the coordinate lies inside a `chunks_per_side` square grid.
    #[must_use]
    pub fn in_bounds(self, chunks_per_side: usize) -> bool {
        let within = |v: i32| usize::try_from(v).is_ok_and(|v| v < chunks_per_side);
        within(self.row) && within(self.col)
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Tile position in the world grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Tile row (world X).
    pub row: usize,
    /// Tile column (world Z).
    pub col: usize,
}

impl TileCoord {
    /// Creates a tile coordinate.
    #[inline]
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Per-tile foliage instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoration {
    /// Backend object.
    pub handle: RenderHandle,
    /// Depleted decorations stay hidden even in active chunks.
    pub depleted: bool,
}

impl Decoration {
    /// Whether the decoration should be drawn when its chunk is `active`.
    #[inline]
    #[must_use]
    pub const fn visible_when(&self, active: bool) -> bool {
        active && !self.depleted
    }
}

/// A built chunk: its batches, its decorations and whether it is shown.
#[derive(Clone, Debug)]
pub struct Chunk {
    /// Position in the chunk grid.
    pub coord: ChunkCoord,
    /// Shown state. Only `ChunkGrid::set_active` changes it.
    pub(crate) active: bool,
    /// Terrain pass batch.
    pub terrain: RenderHandle,
    /// Overlay pass batch (same geometry).
    pub overlay: RenderHandle,
    /// Combined chunk geometry, in chunk-local space.
    pub mesh: Arc<Mesh>,
    /// Decorations keyed by world tile coordinate.
    pub decorations: HashMap<TileCoord, Decoration>,
}

impl Chunk {
    /// Creates an inactive chunk.
    #[must_use]
    pub fn new(
        coord: ChunkCoord,
        terrain: RenderHandle,
        overlay: RenderHandle,
        mesh: Arc<Mesh>,
        decorations: HashMap<TileCoord, Decoration>,
    ) -> Self {
        Self { coord, active: false, terrain, overlay, mesh, decorations }
    }

    /// Whether the chunk is shown.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Decoration at world tile `tile`.
    #[must_use]
    pub fn decoration(&self, tile: TileCoord) -> Option<&Decoration> {
        self.decorations.get(&tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_to_chunk_uses_integer_division() {
        assert_eq!(ChunkCoord::from_tile(TileCoord::new(0, 0), 10), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_tile(TileCoord::new(9, 10), 10), ChunkCoord::new(0, 1));
        assert_eq!(ChunkCoord::from_tile(TileCoord::new(79, 45), 10), ChunkCoord::new(7, 4));
    }

    #[test]
    fn test_origins() {
        let coord = ChunkCoord::new(2, 3);
        assert_eq!(coord.origin_tile(10), Some(TileCoord::new(20, 30)));
        assert_eq!(coord.world_origin(10, 1.0), Vec3::new(20.0, 0.0, 30.0));
        assert_eq!(ChunkCoord::new(-1, 0).origin_tile(10), None);
    }

    #[test]
    fn test_bounds() {
        assert!(ChunkCoord::new(0, 7).in_bounds(8));
        assert!(!ChunkCoord::new(8, 0).in_bounds(8));
        assert!(!ChunkCoord::new(-1, 3).in_bounds(8));
    }

    #[test]
    fn test_depleted_decoration_never_visible() {
        let deco = Decoration { handle: RenderHandle(0), depleted: true };
        assert!(!deco.visible_when(true));
        let deco = Decoration { depleted: false, ..deco };
        assert!(deco.visible_when(true));
        assert!(!deco.visible_when(false));
    }
}
