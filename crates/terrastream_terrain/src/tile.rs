//! # Tile Grid
//!
//! The immutable `size x size` grid of tile-type ids delivered once by the
//! server at connect time. Rows map to world X, columns to world Z.

use std::fmt;

use crate::autotile::{NeighborBitmask, NEIGHBOR_OFFSETS};
use crate::error::{TerrainError, TerrainResult};

/// Terrain/vegetation type of one grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u16);

impl TileId {
    /// Creates a tile id.
    #[inline]
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Square grid of tile ids, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    size: usize,
    cells: Vec<TileId>,
}

impl TileGrid {
    /// Creates a grid by evaluating `f(row, col)` for every cell.
    #[must_use]
    pub fn from_fn(size: usize, mut f: impl FnMut(usize, usize) -> TileId) -> Self {
        let mut cells = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                cells.push(f(row, col));
            }
        }
        Self { size, cells }
    }

    /// Creates a grid filled with a single tile id.
    #[must_use]
    pub fn filled(size: usize, id: TileId) -> Self {
        Self { size, cells: vec![id; size * size] }
    }

    /// Builds a grid from the nested numeric array of a decoded snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::GridShape`] if the rows are not all `size`
    /// long, there are not `size` rows, or a value does not fit a tile id.
    pub fn from_rows(size: usize, rows: &[Vec<i64>]) -> TerrainResult<Self> {
        if rows.len() != size {
            return Err(TerrainError::GridShape {
                expected: size,
                found: format!("{} rows", rows.len()),
            });
        }

        let mut cells = Vec::with_capacity(size * size);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(TerrainError::GridShape {
                    expected: size,
                    found: format!("row {r} has {} columns", row.len()),
                });
            }
            for (c, &value) in row.iter().enumerate() {
                let id = u16::try_from(value).map_err(|_| TerrainError::GridShape {
                    expected: size,
                    found: format!("value {value} at ({r}, {c}) is not a tile id"),
                })?;
                cells.push(TileId(id));
            }
        }

        Ok(Self { size, cells })
    }

    /// Side length in tiles.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Tile id at `(row, col)`, or `None` outside the grid.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<TileId> {
        if row < self.size && col < self.size {
            Some(self.cells[row * self.size + col])
        } else {
            None
        }
    }

    /// Signed lookup for neighbor probing; negative indices are outside.
    #[inline]
    fn get_signed(&self, row: isize, col: isize) -> Option<TileId> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        self.get(row, col)
    }

    /// True for cells in the first/last row or column.
    #[inline]
    #[must_use]
    pub const fn is_border(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row + 1 == self.size || col + 1 == self.size
    }

    /// Same/different encoding of the 8 neighbors of `(row, col)`.
    ///
    /// A neighbor outside the grid counts as different.
    #[must_use]
    pub fn neighbor_bitmask(&self, row: usize, col: usize) -> NeighborBitmask {
        let Some(center) = self.get(row, col) else {
            return NeighborBitmask::NONE;
        };

        let mut same = [false; 8];
        for (slot, (dr, dc)) in NEIGHBOR_OFFSETS.iter().enumerate() {
            #[allow(clippy::cast_possible_wrap)]
            let neighbor = self.get_signed(row as isize + dr, col as isize + dc);
            same[slot] = neighbor == Some(center);
        }
        NeighborBitmask::from_slots(same)
    }

    /// Iterates over `(row, col, id)` for every cell.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, TileId)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &id)| (i / self.size, i % self.size, id))
    }
}
