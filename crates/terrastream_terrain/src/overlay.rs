//! Per-tile overlay colors sampled by the overlay pass.

use crate::error::{TerrainError, TerrainResult};

/// Row-major `size x size` field of RGB values in `[0, 1]`.
///
/// Black means "no overlay" for that tile.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayField {
    size: usize,
    values: Vec<[f32; 3]>,
}

impl OverlayField {
    /// All-black field.
    #[must_use]
    pub fn black(size: usize) -> Self {
        Self { size, values: vec![[0.0; 3]; size * size] }
    }

    /// Wraps row-major values, clamping each channel into `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::GridShape`] if `values` is not `size * size`
    /// long, or [`TerrainError::InvalidConfig`] for non-finite channels.
    pub fn new(size: usize, values: Vec<[f32; 3]>) -> TerrainResult<Self> {
        if values.len() != size * size {
            return Err(TerrainError::GridShape {
                expected: size,
                found: format!("{} overlay values", values.len()),
            });
        }
        if values.iter().flatten().any(|v| !v.is_finite()) {
            return Err(TerrainError::InvalidConfig("overlay value is not finite".to_string()));
        }
        let values = values.into_iter().map(|rgb| rgb.map(|v| v.clamp(0.0, 1.0))).collect();
        Ok(Self { size, values })
    }

    /// Side length in tiles.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Color at `(row, col)`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<[f32; 3]> {
        (row < self.size && col < self.size).then(|| self.values[row * self.size + col])
    }

    /// Sets the color at `(row, col)`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::TileNotFound`] outside the field.
    pub fn set(&mut self, row: usize, col: usize, rgb: [f32; 3]) -> TerrainResult<()> {
        if row >= self.size || col >= self.size {
            return Err(TerrainError::TileNotFound { row, col });
        }
        self.values[row * self.size + col] = rgb.map(|v| v.clamp(0.0, 1.0));
        Ok(())
    }

    /// Number of tiles with a non-black overlay.
    #[must_use]
    pub fn lit_count(&self) -> usize {
        self.values.iter().filter(|rgb| rgb.iter().any(|&v| v > 0.0)).count()
    }

    /// Raw values for texture upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.values)
    }
}
