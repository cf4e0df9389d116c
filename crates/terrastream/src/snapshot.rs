//! # World Snapshot
//!
//! The server sends the tile grid once at connect time as a JSON object whose
//! `map` field is a nested array of numbers. Everything else in the message
//! belongs to other subsystems and is ignored here.
//!
//! ```json
//! { "map": [[2, 2, 5], [2, 5, 5], [1, 1, 5]], "players": [] }
//! ```

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use terrastream_terrain::{TerrainError, TileGrid, TileId};

use crate::error::{ClientError, ClientResult};

/// Number of distinct tile types in the stock catalog.
const STOCK_TILE_TYPES: u16 = 6;

/// Largest integer an `f64` represents exactly.
const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

/// The part of the connect-time message this client reads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Row-major tile ids. Numbers may arrive as floats.
    pub map: Vec<Vec<f64>>,
}

impl WorldSnapshot {
    /// Decodes a snapshot message.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Snapshot`] for malformed JSON or a missing `map`.
    pub fn from_json_str(text: &str) -> ClientResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and decodes a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_json_str`].
    pub fn load(path: &Path) -> ClientResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ClientError::Io { path: path.to_path_buf(), source })?;
        Self::from_json_str(&text)
    }

    /// Captures a tile grid as a snapshot.
    #[must_use]
    pub fn from_grid(grid: &TileGrid) -> Self {
        let size = grid.size();
        let mut map = vec![Vec::with_capacity(size); size];
        for (row, _, id) in grid.iter() {
            map[row].push(f64::from(id.raw()));
        }
        Self { map }
    }

    /// Converts the `map` field into a `size x size` tile grid.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::GridShape`] (wrapped) for a wrong shape or a
    /// value that is not a non-negative integer tile id.
    pub fn into_grid(self, size: usize) -> ClientResult<TileGrid> {
        let mut rows = Vec::with_capacity(self.map.len());
        for (r, row) in self.map.iter().enumerate() {
            let mut ids = Vec::with_capacity(row.len());
            for (c, &value) in row.iter().enumerate() {
                ids.push(integral(value).ok_or_else(|| TerrainError::GridShape {
                    expected: size,
                    found: format!("value {value} at ({r}, {c}) is not a tile id"),
                })?);
            }
            rows.push(ids);
        }
        Ok(TileGrid::from_rows(size, &rows)?)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn integral(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT)
        .then_some(value as i64)
}

/// Deterministic stand-in for a server snapshot: patches of every stock
/// tile type, grown around randomly placed sites.
#[must_use]
pub fn synthetic_tiles(size: usize, seed: u64) -> TileGrid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let site_count = (size * size / 64).max(1);
    let sites: Vec<(usize, usize, TileId)> = (0..site_count)
        .map(|_| {
            (
                rng.gen_range(0..size.max(1)),
                rng.gen_range(0..size.max(1)),
                TileId(rng.gen_range(0..STOCK_TILE_TYPES)),
            )
        })
        .collect();

    TileGrid::from_fn(size, |row, col| {
        sites
            .iter()
            .min_by_key(|(r, c, _)| r.abs_diff(row).pow(2) + c.abs_diff(col).pow(2))
            .map_or(TileId(0), |&(_, _, id)| id)
    })
}
