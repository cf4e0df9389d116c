//! # Terrain Error Types
//!
//! Everything here is a configuration or programming error: the terrain
//! core does no I/O of its own once the catalog is loaded, so nothing is
//! worth retrying.

use thiserror::Error;

use crate::chunk::ChunkCoord;
use crate::tile::TileId;

/// Errors that can occur while building or streaming the tile world.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerrainError {
    /// A grid cell carries a tile id with no catalog entry.
    #[error("unknown tile id: {0}")]
    UnknownTileId(TileId),

    /// A mesh or variant name has no registered prototype.
    #[error("missing prototype: {0}")]
    MissingPrototype(String),

    /// The autotile table has no entry for this neighbor bitmask.
    #[error("autotile table has no entry for bitmask {0:#010b}")]
    MissingAutotileEntry(u8),

    /// A hand-authored autotile template is malformed.
    #[error("invalid autotile template {name}: {reason}")]
    InvalidTemplate {
        /// Template variant name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Invalid configuration value or file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The tile grid does not have the configured shape.
    #[error("tile grid shape mismatch: expected {expected}x{expected}, {found}")]
    GridShape {
        /// Configured side length.
        expected: usize,
        /// Description of what was found instead.
        found: String,
    },

    /// No chunk exists at this coordinate.
    #[error("chunk not found: {0}")]
    ChunkNotFound(ChunkCoord),

    /// No decoration entity exists at this tile.
    #[error("tile not found: ({row}, {col})")]
    TileNotFound {
        /// Tile row.
        row: usize,
        /// Tile column.
        col: usize,
    },
}

/// Result type for terrain operations.
pub type TerrainResult<T> = Result<T, TerrainError>;
