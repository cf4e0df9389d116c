//! # Autotile Table
//!
//! Maps an 8-neighbor same/different bitmask to the mesh variant, rotation
//! and mirror flag a tile should be drawn with.
//!
//! ## Bitmask Layout
//!
//! ```text
//!   bit7 bit6 bit5        TL  T  TR
//!   bit4  --  bit3   =    L   .  R
//!   bit2 bit1 bit0        BL  B  BR
//! ```
//!
//! A set bit means the neighbor has the same tile id as the center. Ported
//! template data only resolves correctly with exactly this ordering.
//!
//! ## Construction
//!
//! Each [`Template`] is an 8-slot pattern where a slot is `0` (different),
//! `1` (same) or `-1` (don't care). Every enabled rotation of the pattern is
//! produced by a fixed slot permutation, then every wildcard is expanded to
//! both values. Each concrete bitmask is written into the table and later
//! writes overwrite earlier ones, so template order encodes precedence.

use std::fmt;

use crate::error::{TerrainError, TerrainResult};

/// Row/column offsets of the 8 neighbor slots, in bitmask order (bit7 first).
pub const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Slot permutation for a quarter turn: `rotated[i] = pattern[ROTATE_90[i]]`.
///
/// Top goes to right, right to bottom, bottom to left, left to top.
const ROTATE_90: [usize; 8] = [5, 3, 0, 6, 1, 7, 4, 2];

/// Wildcard slot value.
pub const ANY: i8 = -1;

/// Suffix of the variant forced onto world-border tiles.
pub const EDGE_SUFFIX: &str = "4f";

/// Suffix of the catch-all variant: the tile type's own base prototype.
pub const BASE_SUFFIX: &str = "";

/// Every variant suffix an autotile family must provide a prototype for.
pub const AUTOTILE_SUFFIXES: [&str; 14] = [
    "0a", "1a", "2a", "2b", "2c", "3a", "3b", "3c", "4a", "4b", "4c", "4d", "4e", "4f",
];

/// 8-bit same/different encoding of a tile's neighbors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NeighborBitmask(pub u8);

impl NeighborBitmask {
    /// No neighbor matches.
    pub const NONE: Self = Self(0);
    /// Every neighbor matches.
    pub const ALL: Self = Self(0xFF);

    /// Packs per-slot flags (slot 0 = top-left = bit7).
    #[must_use]
    pub fn from_slots(same: [bool; 8]) -> Self {
        let mut bits = 0u8;
        for (slot, &is_same) in same.iter().enumerate() {
            if is_same {
                bits |= 1 << (7 - slot);
            }
        }
        Self(bits)
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether the neighbor in `slot` matches.
    #[inline]
    #[must_use]
    pub const fn is_same(self, slot: usize) -> bool {
        self.0 & (1 << (7 - slot)) != 0
    }
}

impl fmt::Display for NeighborBitmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010b}", self.0)
    }
}

/// Rotation about the vertical axis, in quarter turns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    /// No rotation.
    #[default]
    R0,
    /// 90 degrees.
    R90,
    /// 180 degrees.
    R180,
    /// 270 degrees.
    R270,
}

impl Rotation {
    /// All rotations in template flag order.
    pub const ALL: [Self; 4] = [Self::R0, Self::R90, Self::R180, Self::R270];

    /// Angle in degrees.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }
}

/// Resolved look of one tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileVariant {
    /// Variant suffix appended to the family name, e.g. `"2c"`.
    pub mesh_suffix: &'static str,
    /// Rotation about the vertical axis.
    pub rotation: Rotation,
    /// Mirror along local Z.
    pub flip: bool,
}

impl TileVariant {
    /// The variant forced onto world-border tiles.
    pub const EDGE: Self = Self { mesh_suffix: EDGE_SUFFIX, rotation: Rotation::R0, flip: false };

    /// Base prototype, unrotated. Used by types outside any autotile family
    /// and by family tiles no template matches.
    pub const PLAIN: Self = Self { mesh_suffix: BASE_SUFFIX, rotation: Rotation::R0, flip: false };
}

/// Hand-authored neighbor pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Template {
    /// Variant suffix this template selects.
    pub name: &'static str,
    /// Mirror the mesh along local Z.
    pub flip: bool,
    /// Enabled rotations, indexed like [`Rotation::ALL`].
    pub rotations: [bool; 4],
    /// Slot values in bitmask order: `0`, `1` or [`ANY`].
    pub pattern: [i8; 8],
}

impl Template {
    const fn new(name: &'static str, flip: bool, rotations: [bool; 4], pattern: [i8; 8]) -> Self {
        Self { name, flip, rotations, pattern }
    }

    fn validate(&self) -> TerrainResult<()> {
        let invalid = |reason: String| TerrainError::InvalidTemplate {
            name: self.name.to_string(),
            reason,
        };
        if let Some(bad) = self.pattern.iter().find(|v| !matches!(**v, ANY | 0 | 1)) {
            return Err(invalid(format!("slot value {bad} is not 0, 1 or -1")));
        }
        if !self.rotations.iter().any(|&enabled| enabled) {
            return Err(invalid("no rotation enabled".to_string()));
        }
        Ok(())
    }

    /// The pattern turned by `rotation`.
    #[must_use]
    pub fn rotated(&self, rotation: Rotation) -> [i8; 8] {
        let turns = rotation.degrees() / 90;
        let mut pattern = self.pattern;
        for _ in 0..turns {
            pattern = rotate_90(pattern);
        }
        pattern
    }
}

fn rotate_90(pattern: [i8; 8]) -> [i8; 8] {
    let mut out = [0i8; 8];
    for (slot, &from) in ROTATE_90.iter().enumerate() {
        out[slot] = pattern[from];
    }
    out
}

const ALL_ROTATIONS: [bool; 4] = [true, true, true, true];
const HALF_TURNS: [bool; 4] = [true, true, false, false];
const NO_ROTATION: [bool; 4] = [true, false, false, false];

/// The built-in template set, lowest precedence first.
///
/// The first entry is a catch-all resolving to the base prototype so the
/// table is total; the remaining order puts `3b` before `3c` so the fully
/// enclosed top row wins where they overlap.
pub const TEMPLATES: [Template; 15] = [
    Template::new(BASE_SUFFIX, false, NO_ROTATION, [ANY, ANY, ANY, ANY, ANY, ANY, ANY, ANY]),
    Template::new("1a", false, ALL_ROTATIONS, [ANY, 1, ANY, 0, 0, ANY, 0, ANY]),
    Template::new("2a", false, ALL_ROTATIONS, [0, 1, ANY, 1, 0, ANY, 0, ANY]),
    Template::new("2b", false, HALF_TURNS, [ANY, 0, ANY, 1, 1, ANY, 0, ANY]),
    Template::new("2c", false, ALL_ROTATIONS, [1, 1, ANY, 1, 0, ANY, 0, ANY]),
    Template::new("3a", false, ALL_ROTATIONS, [0, 1, 0, 1, 1, ANY, 0, ANY]),
    Template::new("3b", false, ALL_ROTATIONS, [1, 1, ANY, 1, 1, ANY, 0, ANY]),
    Template::new("3b", true, ALL_ROTATIONS, [0, 1, 1, 1, 1, ANY, 0, ANY]),
    Template::new("3c", false, ALL_ROTATIONS, [1, 1, 1, 1, 1, ANY, 0, ANY]),
    Template::new("4a", false, NO_ROTATION, [0, 1, 0, 1, 1, 0, 1, 0]),
    Template::new("4b", false, ALL_ROTATIONS, [0, 1, 1, 1, 1, 0, 1, 0]),
    Template::new("4c", false, ALL_ROTATIONS, [1, 1, 1, 1, 1, 0, 1, 0]),
    Template::new("4d", false, HALF_TURNS, [0, 1, 1, 1, 1, 1, 1, 0]),
    Template::new("4e", false, ALL_ROTATIONS, [1, 1, 1, 1, 1, 1, 1, 0]),
    Template::new("4f", false, NO_ROTATION, [1, 1, 1, 1, 1, 1, 1, 1]),
];

/// Total lookup from [`NeighborBitmask`] to [`TileVariant`].
#[derive(Clone, Debug)]
pub struct AutotileTable {
    entries: [Option<TileVariant>; 256],
    writes: usize,
}

impl AutotileTable {
    /// Builds the table from the built-in [`TEMPLATES`].
    ///
    /// # Errors
    ///
    /// Returns an error if a template is malformed or the result has a hole.
    pub fn build() -> TerrainResult<Self> {
        Self::build_from(&TEMPLATES)
    }

    /// Builds the table from a custom template list, later entries winning.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidTemplate`] for malformed templates and
    /// [`TerrainError::MissingAutotileEntry`] if some bitmask is not covered.
    pub fn build_from(templates: &[Template]) -> TerrainResult<Self> {
        let mut table = Self { entries: [None; 256], writes: 0 };

        for template in templates {
            template.validate()?;
            for (rotation, _) in Rotation::ALL
                .iter()
                .zip(template.rotations)
                .filter(|(_, enabled)| *enabled)
            {
                let variant = TileVariant {
                    mesh_suffix: template.name,
                    rotation: *rotation,
                    flip: template.flip,
                };
                let pattern = template.rotated(*rotation);
                expand(pattern, 0, &mut |bits| {
                    table.entries[usize::from(bits)] = Some(variant);
                    table.writes += 1;
                });
            }
        }

        if let Some((bits, _)) = (0..=u8::MAX).zip(table.entries.iter()).find(|(_, e)| e.is_none()) {
            return Err(TerrainError::MissingAutotileEntry(bits));
        }

        tracing::debug!(writes = table.writes, "autotile table built");
        Ok(table)
    }

    /// Resolves a bitmask.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::MissingAutotileEntry`] if the bitmask is absent.
    #[inline]
    pub fn lookup(&self, mask: NeighborBitmask) -> TerrainResult<TileVariant> {
        self.entries[usize::from(mask.bits())].ok_or(TerrainError::MissingAutotileEntry(mask.bits()))
    }

    /// Number of registrations performed, overwrites included.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }

    /// Iterates over `(bitmask, variant)` for every covered bitmask.
    pub fn iter(&self) -> impl Iterator<Item = (NeighborBitmask, TileVariant)> + '_ {
        (0..=u8::MAX)
            .zip(self.entries.iter())
            .filter_map(|(bits, entry)| entry.map(|variant| (NeighborBitmask(bits), variant)))
    }
}

/// Recursively substitutes every wildcard with 0 and 1, calling `emit` with
/// each concrete bitmask.
fn expand(mut pattern: [i8; 8], slot: usize, emit: &mut impl FnMut(u8)) {
    if slot == pattern.len() {
        let bits = pattern
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &v)| if v == 1 { acc | (1 << (7 - i)) } else { acc });
        emit(bits);
        return;
    }

    if pattern[slot] == ANY {
        for value in [0, 1] {
            pattern[slot] = value;
            expand(pattern, slot + 1, emit);
        }
    } else {
        expand(pattern, slot + 1, emit);
    }
}
