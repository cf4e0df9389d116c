//! # World Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file at all) gives the stock 80x80 world in 8x8 chunks.
//!
//! ```toml
//! map_size = 80
//! chunks_per_side = 8
//! chunk_radius = 2
//! tile_size = 1.0
//! decoration_seed = 7
//! decoration_scale = [0.9, 0.2, 0.9]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use terrastream_shared::{Vec3, CHUNKS_PER_SIDE, CHUNK_RADIUS, MAP_SIZE, TILE_SIZE};

use crate::error::{TerrainError, TerrainResult};

/// Tunables for grid shape, streaming and decoration placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Side length of the tile grid.
    pub map_size: usize,
    /// Chunks along each side of the grid.
    pub chunks_per_side: usize,
    /// Streaming radius in chunks.
    pub chunk_radius: i32,
    /// World units per tile.
    pub tile_size: f32,
    /// Seed for decoration rotations.
    pub decoration_seed: u64,
    /// Non-uniform scale applied to every decoration.
    pub decoration_scale: [f32; 3],
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            map_size: MAP_SIZE,
            chunks_per_side: CHUNKS_PER_SIDE,
            chunk_radius: CHUNK_RADIUS,
            tile_size: TILE_SIZE,
            decoration_seed: 0,
            decoration_scale: [0.9, 0.2, 0.9],
        }
    }
}

impl WorldConfig {
    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] on parse or validation errors.
    pub fn from_toml_str(text: &str) -> TerrainResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| TerrainError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] if the file cannot be read,
    /// parsed or validated.
    pub fn load(path: &Path) -> TerrainResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TerrainError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks that the grid splits evenly into chunks and the sizes are usable.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> TerrainResult<()> {
        if self.map_size == 0 || self.chunks_per_side == 0 {
            return Err(TerrainError::InvalidConfig(
                "map_size and chunks_per_side must be positive".to_string(),
            ));
        }
        if self.map_size % self.chunks_per_side != 0 {
            return Err(TerrainError::InvalidConfig(format!(
                "map_size {} is not divisible by chunks_per_side {}",
                self.map_size, self.chunks_per_side
            )));
        }
        if i32::try_from(self.chunks_per_side).is_err() {
            return Err(TerrainError::InvalidConfig(format!(
                "chunks_per_side {} is too large",
                self.chunks_per_side
            )));
        }
        if self.chunk_radius < 0 {
            return Err(TerrainError::InvalidConfig(format!(
                "chunk_radius {} is negative",
                self.chunk_radius
            )));
        }
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(TerrainError::InvalidConfig(format!(
                "tile_size {} must be positive",
                self.tile_size
            )));
        }
        Ok(())
    }

    /// Side length of one chunk, in tiles.
    #[inline]
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.map_size / self.chunks_per_side
    }

    /// Side length of one chunk, in world units.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn chunk_world_size(&self) -> f32 {
        self.chunk_size() as f32 * self.tile_size
    }

    /// Decoration scale as a vector.
    #[must_use]
    pub const fn decoration_scale(&self) -> Vec3 {
        Vec3::from_array(self.decoration_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_constants() {
        let config = WorldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size(), 10);
        assert_eq!(config.chunk_world_size(), 10.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = WorldConfig::from_toml_str("map_size = 64\ndecoration_seed = 9").unwrap();
        assert_eq!(config.map_size, 64);
        assert_eq!(config.chunk_size(), 8);
        assert_eq!(config.chunk_radius, 2);
        assert_eq!(config.decoration_seed, 9);
    }

    #[test]
    fn test_validation_failures() {
        assert!(WorldConfig::from_toml_str("map_size = 81").is_err());
        assert!(WorldConfig::from_toml_str("chunks_per_side = 0").is_err());
        assert!(WorldConfig::from_toml_str("tile_size = 0.0").is_err());
        assert!(WorldConfig::from_toml_str("chunk_radius = -1").is_err());
        assert!(WorldConfig::from_toml_str("map_size = \"big\"").is_err());
    }
}
