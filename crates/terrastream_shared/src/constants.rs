//! # World Constants
//!
//! Defaults baked into the client. Every value here can be overridden by
//! `WorldConfig`, but the snapshot the server sends at connect time is
//! sized with [`MAP_SIZE`].

/// Side length of the square tile grid, in tiles.
pub const MAP_SIZE: usize = 80;

/// Number of chunks along each side of the grid.
pub const CHUNKS_PER_SIDE: usize = 8;

/// Side length of one chunk, in tiles.
pub const CHUNK_SIZE: usize = MAP_SIZE / CHUNKS_PER_SIDE;

/// Streaming radius around the viewer's chunk, in chunks.
///
/// The active window is the half-open range `[center - r, center + r)`
/// on both axes.
pub const CHUNK_RADIUS: i32 = 2;

/// World units covered by one tile.
pub const TILE_SIZE: f32 = 1.0;
