//! CPU-side meshes and batching.
//!
//! Tile prototypes are tiny meshes; a chunk's terrain is the concatenation
//! of all its tiles' prototypes with each tile's placement transform baked
//! into the vertices, so the renderer issues one draw per chunk and pass.

use bytemuck::{Pod, Zeroable};
use terrastream_shared::{Transform, Vec3};

use crate::error::{TerrainError, TerrainResult};

/// Vertex layout shared by prototypes and combined batches.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position [x, y, z]
    pub position: [f32; 3],
    /// Normal [nx, ny, nz]
    pub normal: [f32; 3],
    /// Texture coordinates [u, v]
    pub uv: [f32; 2],
}

impl Vertex {
    /// Creates a vertex.
    #[must_use]
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, normal, uv }
    }
}

/// Indexed triangle mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Creates a mesh, checking that indices form whole, in-range triangles.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] for a malformed index buffer.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> TerrainResult<Self> {
        if indices.len() % 3 != 0 {
            return Err(TerrainError::InvalidConfig(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(TerrainError::InvalidConfig(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }
        Ok(Self { vertices, indices })
    }

    /// Flat unit tile on the y = 0 plane, centered on the origin.
    #[must_use]
    pub fn unit_tile() -> Self {
        let up = [0.0, 1.0, 0.0];
        Self {
            vertices: vec![
                Vertex::new([-0.5, 0.0, -0.5], up, [0.0, 0.0]),
                Vertex::new([-0.5, 0.0, 0.5], up, [0.0, 1.0]),
                Vertex::new([0.5, 0.0, 0.5], up, [1.0, 1.0]),
                Vertex::new([0.5, 0.0, -0.5], up, [1.0, 0.0]),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// Two crossed vertical quads, the usual billboard-free foliage shape.
    #[must_use]
    pub fn crossed_quads() -> Self {
        let mut vertices = Vec::with_capacity(8);
        let mut indices = Vec::with_capacity(12);
        for (dir, normal) in [([1.0, 0.0], [0.0, 0.0, 1.0]), ([0.0, 1.0], [1.0, 0.0, 0.0])] {
            let base = vertices.len() as u32;
            let (dx, dz) = (dir[0] * 0.5, dir[1] * 0.5);
            vertices.push(Vertex::new([-dx, 0.0, -dz], normal, [0.0, 0.0]));
            vertices.push(Vertex::new([-dx, 1.0, -dz], normal, [0.0, 1.0]));
            vertices.push(Vertex::new([dx, 1.0, dz], normal, [1.0, 1.0]));
            vertices.push(Vertex::new([dx, 0.0, dz], normal, [1.0, 0.0]));
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self { vertices, indices }
    }

    /// Concatenates `parts`, baking each part's transform into its vertices.
    ///
    /// Mirrored transforms get their triangle winding reversed so faces keep
    /// pointing outward.
    #[must_use]
    pub fn combine<'a>(parts: impl IntoIterator<Item = (&'a Mesh, Transform)>) -> Self {
        let mut out = Self::default();
        for (mesh, transform) in parts {
            #[allow(clippy::cast_possible_truncation)]
            let base = out.vertices.len() as u32;

            out.vertices.extend(mesh.vertices.iter().map(|v| {
                let p = transform.transform_point(Vec3::from_array(v.position));
                let n = transform.transform_normal(Vec3::from_array(v.normal));
                Vertex::new(p.to_array(), n.to_array(), v.uv)
            }));

            let mirrored = transform.is_mirrored();
            for tri in mesh.indices.chunks_exact(3) {
                if mirrored {
                    out.indices.extend_from_slice(&[base + tri[0], base + tri[2], base + tri[1]]);
                } else {
                    out.indices.extend_from_slice(&[base + tri[0], base + tri[1], base + tri[2]]);
                }
            }
        }
        out
    }

    /// Vertex slice.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Index slice.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True when the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Vertex data as raw bytes for upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as raw bytes for upload.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Axis-aligned bounds, or `None` for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = Vec3::from_array(self.vertices.first()?.position);
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            let p = Vec3::from_array(v.position);
            (
                Vec3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Vec3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrastream_shared::Quaternion;

    #[test]
    fn test_new_validates_indices() {
        let verts = vec![Vertex::default(); 3];
        assert!(Mesh::new(verts.clone(), vec![0, 1, 2]).is_ok());
        assert!(Mesh::new(verts.clone(), vec![0, 1]).is_err());
        assert!(Mesh::new(verts, vec![0, 1, 3]).is_err());
    }

    #[test]
    fn test_combine_rebases_indices() {
        let tile = Mesh::unit_tile();
        let parts = [
            (&tile, Transform::from_position(Vec3::new(0.0, 0.0, 0.0))),
            (&tile, Transform::from_position(Vec3::new(1.0, 0.0, 0.0))),
        ];
        let combined = Mesh::combine(parts);
        assert_eq!(combined.vertex_count(), 8);
        assert_eq!(combined.triangle_count(), 4);
        assert_eq!(&combined.indices()[6..9], &[4, 5, 6]);

        let (lo, hi) = combined.bounds().unwrap();
        assert_eq!(lo, Vec3::new(-0.5, 0.0, -0.5));
        assert_eq!(hi, Vec3::new(1.5, 0.0, 0.5));
    }

    #[test]
    fn test_mirrored_part_reverses_winding() {
        let tile = Mesh::unit_tile();
        let flip = Transform::new(Vec3::ZERO, Quaternion::IDENTITY, Vec3::new(1.0, 1.0, -1.0));
        let combined = Mesh::combine([(&tile, flip)]);
        assert_eq!(&combined.indices()[..3], &[0, 2, 1]);
        // The face still points up
        assert_eq!(combined.vertices()[0].normal, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_upload_bytes() {
        let tile = Mesh::unit_tile();
        assert_eq!(tile.vertex_bytes().len(), 4 * std::mem::size_of::<Vertex>());
        assert_eq!(tile.index_bytes().len(), 6 * 4);
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }
}
