//! Scalar Lagrange finite element spaces on hexahedral meshes.
use crate::element::{ElementDegree, LagrangeHex};
use crate::error::SolverError;
use crate::mesh::HexMesh;
use crate::reorder::{reverse_cuthill_mckee, Permutation};
use log::debug;
use nalgebra::{DVector, Point3};
use nalgebra_sparse::pattern::SparsityPattern;
use rustc_hash::{FxHashMap, FxHashSet};
use spacetime_sparse::csr::assemble_pattern;
use std::collections::BTreeMap;

mod values;

pub use values::{CellValues, ReferenceValues};

/// A scalar finite element space: a mesh, an element and a global dof numbering.
///
/// Global dofs are shared between cells through their *parent vertices*: a dof located at a mesh
/// vertex, an edge midpoint, a face center or a cell center is identified by the sorted set of
/// 1, 2, 4 or 8 mesh vertices it sits between. The numbering is permuted with reverse
/// Cuthill-McKee to reduce the bandwidth of assembled matrices.
#[derive(Debug, Clone)]
pub struct FiniteElementSpace {
    mesh: HexMesh,
    element: LagrangeHex,
    geometry: LagrangeHex,
    dofs_per_cell: usize,
    cell_dofs: Vec<usize>,
    support_points: Vec<Point3<f64>>,
    boundary_dofs: Vec<usize>,
    vertex_dofs: Vec<Option<usize>>,
}

impl FiniteElementSpace {
    pub fn new(mesh: HexMesh, degree: ElementDegree) -> Result<Self, SolverError> {
        if mesh.num_cells() == 0 {
            return Err(SolverError::EmptyMesh);
        }

        let element = LagrangeHex::new(degree);
        let geometry = LagrangeHex::trilinear();
        let dofs_per_cell = element.num_nodes();

        let parents: Vec<Vec<usize>> = (0..dofs_per_cell)
            .map(|node| element.parent_corners(node))
            .collect();
        let mut geometry_values = vec![0.0; geometry.num_nodes()];

        let mut labels: FxHashMap<Vec<usize>, usize> = FxHashMap::default();
        let mut dof_keys = Vec::new();
        let mut support_points = Vec::new();
        let mut cell_dofs = Vec::with_capacity(mesh.num_cells() * dofs_per_cell);

        for (cell_idx, cell) in mesh.cells().iter().enumerate() {
            let corners = mesh.cell_vertices(cell_idx);
            for (node, node_parents) in parents.iter().enumerate() {
                let mut key: Vec<usize> = node_parents.iter().map(|&c| cell.0[c]).collect();
                key.sort_unstable();
                let next_index = labels.len();
                let dof = *labels.entry(key).or_insert_with_key(|key| {
                    dof_keys.push(key.clone());
                    let xi = element.node_reference_coords(node);
                    geometry.populate_basis(&xi, &mut geometry_values);
                    let point = corners
                        .iter()
                        .zip(&geometry_values)
                        .fold(Point3::origin(), |acc, (x, &n)| acc + x.coords * n);
                    support_points.push(point);
                    next_index
                });
                cell_dofs.push(dof);
            }
        }

        let boundary_keys = boundary_keys(&mesh);
        let boundary_dofs: Vec<usize> = dof_keys
            .iter()
            .enumerate()
            .filter(|(_, key)| boundary_keys.contains(*key))
            .map(|(dof, _)| dof)
            .collect();

        let mut vertex_dofs = vec![None; mesh.vertices().len()];
        for (dof, key) in dof_keys.iter().enumerate() {
            if let [vertex] = key.as_slice() {
                vertex_dofs[*vertex] = Some(dof);
            }
        }

        let mut space = Self {
            mesh,
            element,
            geometry,
            dofs_per_cell,
            cell_dofs,
            support_points,
            boundary_dofs,
            vertex_dofs,
        };

        let permutation = reverse_cuthill_mckee(&space.sparsity_pattern());
        space.renumber(&permutation);

        debug!(
            "Distributed {} dofs over {} cells ({} per cell, {} on boundary)",
            space.num_dofs(),
            space.num_cells(),
            space.dofs_per_cell,
            space.boundary_dofs.len()
        );

        Ok(space)
    }

    /// Renumbers the dofs so that new dof `i` is old dof `permutation.source_index(i)`.
    pub fn renumber(&mut self, permutation: &Permutation) {
        assert_eq!(permutation.len(), self.num_dofs());
        let new_index = permutation.inverse();
        for dof in &mut self.cell_dofs {
            *dof = new_index.source_index(*dof);
        }
        for dof in &mut self.boundary_dofs {
            *dof = new_index.source_index(*dof);
        }
        self.boundary_dofs.sort_unstable();
        for dof in self.vertex_dofs.iter_mut().flatten() {
            *dof = new_index.source_index(*dof);
        }
        self.support_points = permutation.apply_to_slice(&self.support_points);
    }

    pub fn mesh(&self) -> &HexMesh {
        &self.mesh
    }

    pub fn element(&self) -> &LagrangeHex {
        &self.element
    }

    pub fn geometry_element(&self) -> &LagrangeHex {
        &self.geometry
    }

    pub fn degree(&self) -> ElementDegree {
        self.element.degree()
    }

    pub fn num_dofs(&self) -> usize {
        self.support_points.len()
    }

    pub fn num_cells(&self) -> usize {
        self.mesh.num_cells()
    }

    pub fn dofs_per_cell(&self) -> usize {
        self.dofs_per_cell
    }

    /// Global dof indices of the cell, in element node order.
    pub fn cell_dofs(&self, cell: usize) -> &[usize] {
        let n = self.dofs_per_cell;
        &self.cell_dofs[n * cell..n * (cell + 1)]
    }

    pub fn support_points(&self) -> &[Point3<f64>] {
        &self.support_points
    }

    /// Sorted dofs that lie on the boundary of the mesh.
    pub fn boundary_dofs(&self) -> &[usize] {
        &self.boundary_dofs
    }

    /// The dof located at the given mesh vertex.
    pub fn vertex_dof(&self, vertex: usize) -> Option<usize> {
        self.vertex_dofs.get(vertex).copied().flatten()
    }

    /// Sparsity pattern coupling all dofs that share a cell.
    pub fn sparsity_pattern(&self) -> SparsityPattern {
        assemble_pattern(self.num_dofs(), self.cell_dofs.chunks_exact(self.dofs_per_cell))
    }

    /// Interpolates `f` at the dof support points.
    pub fn interpolate(&self, f: impl Fn(&Point3<f64>) -> f64) -> DVector<f64> {
        DVector::from_iterator(self.num_dofs(), self.support_points.iter().map(|p| f(p)))
    }

    /// Values of `f` at the support points of the boundary dofs.
    pub fn interpolate_boundary_values(&self, f: impl Fn(&Point3<f64>) -> f64) -> BTreeMap<usize, f64> {
        self.boundary_dofs
            .iter()
            .map(|&dof| (dof, f(&self.support_points[dof])))
            .collect()
    }

    /// Values of a finite element function at the mesh vertices.
    pub fn vertex_values(&self, coefficients: &DVector<f64>) -> Vec<f64> {
        (0..self.mesh.vertices().len())
            .map(|vertex| {
                self.vertex_dof(vertex)
                    .map(|dof| coefficients[dof])
                    .unwrap_or(f64::NAN)
            })
            .collect()
    }
}

/// Sorted parent-vertex keys of every dof location on a boundary face: the face corners, the face
/// edges and the face itself.
fn boundary_keys(mesh: &HexMesh) -> FxHashSet<Vec<usize>> {
    let mut keys = FxHashSet::default();
    for face in mesh.find_boundary_faces() {
        let v = face.vertices;
        for i in 0..4 {
            keys.insert(vec![v[i]]);
            let (a, b) = (v[i], v[(i + 1) % 4]);
            keys.insert(vec![a.min(b), a.max(b)]);
        }
        let mut all = v.to_vec();
        all.sort_unstable();
        keys.insert(all);
    }
    keys
}
