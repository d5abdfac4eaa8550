use crate::element::HEX_FACES;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod procedural;

/// Vertex indices of a trilinear hexahedral cell.
///
/// The first four vertices form the bottom face (`ξ₃ = -1`) in counter-clockwise order when
/// viewed from above, the last four the top face in the same order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hex8Connectivity(pub [usize; 8]);

impl Hex8Connectivity {
    pub fn vertex_indices(&self) -> &[usize] {
        &self.0
    }

    /// Vertex indices of the given local face.
    pub fn face(&self, local_face: usize) -> [usize; 4] {
        HEX_FACES[local_face].map(|corner| self.0[corner])
    }
}

/// A face referenced by exactly one cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BoundaryFace {
    pub cell: usize,
    pub local_face: usize,
    pub vertices: [usize; 4],
}

/// An unstructured conforming hexahedral mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HexMesh {
    vertices: Vec<Point3<f64>>,
    cells: Vec<Hex8Connectivity>,
}

impl HexMesh {
    /// # Panics
    ///
    /// Panics if a cell references a vertex that does not exist.
    pub fn from_vertices_and_connectivity(vertices: Vec<Point3<f64>>, cells: Vec<Hex8Connectivity>) -> Self {
        assert!(
            cells
                .iter()
                .flat_map(|cell| cell.vertex_indices())
                .all(|&v| v < vertices.len()),
            "Connectivity references out-of-bounds vertex"
        );
        Self { vertices, cells }
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn cells(&self) -> &[Hex8Connectivity] {
        &self.cells
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_vertices(&self, cell: usize) -> [Point3<f64>; 8] {
        self.cells[cell].0.map(|v| self.vertices[v])
    }

    pub fn transform_vertices<F>(&mut self, mut transformation: F)
    where
        F: FnMut(&mut Point3<f64>),
    {
        for v in &mut self.vertices {
            transformation(v)
        }
    }

    /// Faces that belong to exactly one cell.
    ///
    /// Faces are matched by their sorted vertex indices. The result is sorted by those indices,
    /// which makes it deterministic.
    pub fn find_boundary_faces(&self) -> Vec<BoundaryFace> {
        let mut face_counts: BTreeMap<[usize; 4], (BoundaryFace, usize)> = BTreeMap::new();
        for (cell_idx, cell) in self.cells.iter().enumerate() {
            for local_face in 0..HEX_FACES.len() {
                let vertices = cell.face(local_face);
                let mut key = vertices;
                key.sort_unstable();
                let face = BoundaryFace {
                    cell: cell_idx,
                    local_face,
                    vertices,
                };
                face_counts
                    .entry(key)
                    .and_modify(|(_, count)| *count += 1)
                    .or_insert((face, 1));
            }
        }

        face_counts
            .into_values()
            .filter(|&(_, count)| count == 1)
            .map(|(face, _)| face)
            .collect()
    }

    /// Sorted list of vertices that belong to at least one boundary face.
    pub fn find_boundary_vertices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .find_boundary_faces()
            .iter()
            .flat_map(|face| face.vertices)
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}
