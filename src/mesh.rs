//! Mesh input: flat vertex, texture coordinate and index arrays
//!
//! Meshes come from an external loader already split into flat arrays.
//! Every index addresses both the position and the texture coordinate
//! arrays, three indices per triangle.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rasterizer::{Vec2, Vec3};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    #[error("position array length {0} is not a multiple of 3")]
    Positions(usize),
    #[error("texture coordinate array length {0} is not a multiple of 2")]
    TexCoords(usize),
    #[error("index array length {0} is not a multiple of 3")]
    Indices(usize),
    #[error("index {index} out of range for {count} vertices")]
    IndexOutOfRange { index: usize, count: usize },
}

/// Triangle mesh in the flat array layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMesh")]
pub struct Mesh {
    positions: Vec<f32>,
    texcoords: Vec<f32>,
    indices: Vec<usize>,
}

/// Unchecked on-disk form, validated through [`Mesh::new`]
#[derive(Deserialize)]
struct RawMesh {
    positions: Vec<f32>,
    #[serde(default)]
    texcoords: Vec<f32>,
    indices: Vec<usize>,
}

impl TryFrom<RawMesh> for Mesh {
    type Error = MeshError;

    fn try_from(raw: RawMesh) -> Result<Self, Self::Error> {
        Mesh::new(raw.positions, raw.texcoords, raw.indices)
    }
}

impl Mesh {
    /// Validate and wrap the flat arrays. `texcoords` may be empty for an
    /// untextured mesh.
    pub fn new(positions: Vec<f32>, texcoords: Vec<f32>, indices: Vec<usize>) -> Result<Self, MeshError> {
        if positions.len() % 3 != 0 {
            return Err(MeshError::Positions(positions.len()));
        }
        if texcoords.len() % 2 != 0 {
            return Err(MeshError::TexCoords(texcoords.len()));
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::Indices(indices.len()));
        }

        let vertex_count = positions.len() / 3;
        let uv_count = texcoords.len() / 2;
        let count = if uv_count == 0 { vertex_count } else { vertex_count.min(uv_count) };
        if let Some(&index) = indices.iter().find(|&&i| i >= count) {
            return Err(MeshError::IndexOutOfRange { index, count });
        }

        Ok(Self {
            positions,
            texcoords,
            indices,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_texcoords(&self) -> bool {
        !self.texcoords.is_empty()
    }

    pub fn vertex(&self, i: usize) -> Vec3 {
        [self.positions[i * 3], self.positions[i * 3 + 1], self.positions[i * 3 + 2]]
    }

    /// Texture coordinate of vertex `i`, v pointing up
    pub fn texcoord(&self, i: usize) -> Option<Vec2> {
        if self.has_texcoords() {
            Some([self.texcoords[i * 2], self.texcoords[i * 2 + 1]])
        } else {
            None
        }
    }

    /// Vertex indices of every triangle
    pub fn faces(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices.chunks_exact(3).map(|f| [f[0], f[1], f[2]])
    }

    /// Unit cube centered at the origin, textured per face
    pub fn cube() -> Self {
        let mut positions = Vec::new();
        let mut texcoords = Vec::new();
        let mut indices = Vec::new();

        // Corners of each face, counter-clockwise seen from outside
        let faces: [[Vec3; 4]; 6] = [
            // Front
            [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]],
            // Back
            [[1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0]],
            // Top
            [[-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0]],
            // Bottom
            [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]],
            // Right
            [[1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0]],
            // Left
            [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0]],
        ];
        let uvs: [Vec2; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        for (face_idx, corners) in faces.iter().enumerate() {
            for (corner, uv) in corners.iter().zip(uvs.iter()) {
                positions.extend_from_slice(corner);
                texcoords.extend_from_slice(uv);
            }
            let base = face_idx * 4;
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            positions,
            texcoords,
            indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_accessors() {
        let mesh = Mesh::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            vec![0, 1, 2],
        )
        .unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vertex(1), [1.0, 0.0, 0.0]);
        assert_eq!(mesh.texcoord(2), Some([0.0, 1.0]));
        assert_eq!(mesh.faces().collect::<Vec<_>>(), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_mesh_rejects_bad_layout() {
        assert_eq!(Mesh::new(vec![0.0; 4], vec![], vec![]), Err(MeshError::Positions(4)));
        assert_eq!(Mesh::new(vec![0.0; 3], vec![0.0], vec![]), Err(MeshError::TexCoords(1)));
        assert_eq!(Mesh::new(vec![0.0; 9], vec![], vec![0, 1]), Err(MeshError::Indices(2)));
        assert_eq!(
            Mesh::new(vec![0.0; 9], vec![], vec![0, 1, 3]),
            Err(MeshError::IndexOutOfRange { index: 3, count: 3 })
        );
        // Indices must also be valid texture coordinate indices
        assert_eq!(
            Mesh::new(vec![0.0; 9], vec![0.0; 4], vec![0, 1, 2]),
            Err(MeshError::IndexOutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn test_untextured_mesh() {
        let mesh = Mesh::new(vec![0.0; 9], vec![], vec![0, 1, 2]).unwrap();
        assert!(!mesh.has_texcoords());
        assert_eq!(mesh.texcoord(0), None);
    }

    #[test]
    fn test_cube() {
        let cube = Mesh::cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.face_count(), 12);
        assert!(cube.has_texcoords());
    }

    #[test]
    fn test_mesh_ron_validates() {
        let mesh: Mesh = ron::from_str("(positions: [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], indices: [0, 1, 2])").unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert!(ron::from_str::<Mesh>("(positions: [0.0, 0.0, 0.0], indices: [0, 1, 2])").is_err());
    }
}
