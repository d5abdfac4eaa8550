//! Lagrange finite elements on the reference hexahedron `[-1, 1]³`.
//!
//! Basis functions are tensor products of 1D Lagrange polynomials on the nodes `{-1, 1}`
//! (degree 1) or `{-1, 0, 1}` (degree 2). Each node is identified by its reference coordinate
//! triple `α ∈ {-1, 0, 1}³`, which also doubles as the argument to the 1D basis.
use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

#[inline]
pub fn phi_linear_1d(alpha: f64, xi: f64) -> f64 {
    (1.0 + alpha * xi) / 2.0
}

#[inline]
pub fn phi_linear_1d_grad(alpha: f64) -> f64 {
    alpha / 2.0
}

/// Quadratic 1D Lagrange polynomial equal to one at `xi = alpha` and zero at the other two
/// nodes of `{-1, 0, 1}`.
#[inline]
pub fn phi_quadratic_1d(alpha: f64, xi: f64) -> f64 {
    let alpha2 = alpha * alpha;
    (1.5 * alpha2 - 1.0) * xi * xi + 0.5 * alpha * xi + 1.0 - alpha2
}

#[inline]
pub fn phi_quadratic_1d_grad(alpha: f64, xi: f64) -> f64 {
    2.0 * (1.5 * alpha * alpha - 1.0) * xi + 0.5 * alpha
}

#[inline]
pub fn phi_quadratic_1d_grad2(alpha: f64) -> f64 {
    2.0 * (1.5 * alpha * alpha - 1.0)
}

/// Polynomial degree of the Lagrange element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementDegree {
    /// Trilinear, 8 nodes.
    Linear,
    /// Triquadratic, 27 nodes.
    Quadratic,
}

impl ElementDegree {
    pub fn order(&self) -> usize {
        match self {
            Self::Linear => 1,
            Self::Quadratic => 2,
        }
    }

    /// Number of Gauss points per axis that integrates the mass matrix exactly on affine cells.
    pub fn gauss_points_per_axis(&self) -> usize {
        self.order() + 1
    }

    fn evaluate_1d(&self, alpha: f64, xi: f64) -> (f64, f64, f64) {
        match self {
            Self::Linear => (phi_linear_1d(alpha, xi), phi_linear_1d_grad(alpha), 0.0),
            Self::Quadratic => (
                phi_quadratic_1d(alpha, xi),
                phi_quadratic_1d_grad(alpha, xi),
                phi_quadratic_1d_grad2(alpha),
            ),
        }
    }
}

impl Default for ElementDegree {
    fn default() -> Self {
        Self::Quadratic
    }
}

#[rustfmt::skip]
pub const HEX_CORNERS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0],
    [ 1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0],
    [-1.0, -1.0,  1.0],
    [ 1.0, -1.0,  1.0],
    [ 1.0,  1.0,  1.0],
    [-1.0,  1.0,  1.0],
];

#[rustfmt::skip]
const HEX27_HIGHER_ORDER_NODES: [[f64; 3]; 19] = [
    // Edges
    [ 0.0, -1.0, -1.0],
    [-1.0,  0.0, -1.0],
    [-1.0, -1.0,  0.0],
    [ 1.0,  0.0, -1.0],
    [ 1.0, -1.0,  0.0],
    [ 0.0,  1.0, -1.0],
    [ 1.0,  1.0,  0.0],
    [-1.0,  1.0,  0.0],
    [ 0.0, -1.0,  1.0],
    [-1.0,  0.0,  1.0],
    [ 1.0,  0.0,  1.0],
    [ 0.0,  1.0,  1.0],
    // Faces
    [ 0.0,  0.0, -1.0],
    [ 0.0, -1.0,  0.0],
    [-1.0,  0.0,  0.0],
    [ 1.0,  0.0,  0.0],
    [ 0.0,  1.0,  0.0],
    [ 0.0,  0.0,  1.0],
    // Center
    [ 0.0,  0.0,  0.0],
];

/// Local corner indices of the six faces of a hexahedron, oriented with outward normals.
#[rustfmt::skip]
pub const HEX_FACES: [[usize; 4]; 6] = [
    [0, 3, 2, 1],
    [0, 1, 5, 4],
    [1, 2, 6, 5],
    [2, 3, 7, 6],
    [0, 4, 7, 3],
    [4, 5, 6, 7],
];

/// A Lagrange element on the reference hexahedron.
///
/// Node order follows the usual convention: the eight corners first, then (for degree 2) the
/// twelve edge midpoints, the six face centers and the cell center.
#[derive(Debug, Clone, PartialEq)]
pub struct LagrangeHex {
    degree: ElementDegree,
    nodes: Vec<[f64; 3]>,
}

impl LagrangeHex {
    pub fn new(degree: ElementDegree) -> Self {
        let mut nodes = HEX_CORNERS.to_vec();
        if degree == ElementDegree::Quadratic {
            nodes.extend_from_slice(&HEX27_HIGHER_ORDER_NODES);
        }
        Self { degree, nodes }
    }

    /// The trilinear element, also used as the geometry map of every cell.
    pub fn trilinear() -> Self {
        Self::new(ElementDegree::Linear)
    }

    pub fn degree(&self) -> ElementDegree {
        self.degree
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_reference_coords(&self, node: usize) -> Point3<f64> {
        let [x, y, z] = self.nodes[node];
        Point3::new(x, y, z)
    }

    /// The corners whose convex hull has the node at its center.
    ///
    /// Corners yield themselves, edge nodes their two end points, face nodes the four face corners
    /// and the center node all eight corners. The returned indices are sorted.
    pub fn parent_corners(&self, node: usize) -> Vec<usize> {
        let alpha = self.nodes[node];
        HEX_CORNERS
            .iter()
            .enumerate()
            .filter(|(_, corner)| (0..3).all(|d| alpha[d] == 0.0 || alpha[d] == corner[d]))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Evaluates all basis functions, reference gradients and reference Hessians at `xi`.
    ///
    /// # Panics
    ///
    /// Panics if any output slice does not have one entry per node.
    pub fn evaluate(
        &self,
        xi: &Point3<f64>,
        values: &mut [f64],
        gradients: &mut [Vector3<f64>],
        hessians: &mut [Matrix3<f64>],
    ) {
        assert_eq!(values.len(), self.num_nodes());
        assert_eq!(gradients.len(), self.num_nodes());
        assert_eq!(hessians.len(), self.num_nodes());

        for (node, alpha) in self.nodes.iter().enumerate() {
            let (fx, dfx, ddfx) = self.degree.evaluate_1d(alpha[0], xi.x);
            let (fy, dfy, ddfy) = self.degree.evaluate_1d(alpha[1], xi.y);
            let (fz, dfz, ddfz) = self.degree.evaluate_1d(alpha[2], xi.z);

            values[node] = fx * fy * fz;
            gradients[node] = Vector3::new(dfx * fy * fz, fx * dfy * fz, fx * fy * dfz);

            let hxy = dfx * dfy * fz;
            let hxz = dfx * fy * dfz;
            let hyz = fx * dfy * dfz;
            #[rustfmt::skip]
            let hessian = Matrix3::new(
                ddfx * fy * fz, hxy,            hxz,
                hxy,            fx * ddfy * fz, hyz,
                hxz,            hyz,            fx * fy * ddfz,
            );
            hessians[node] = hessian;
        }
    }

    /// Evaluates only the basis functions at `xi`.
    pub fn populate_basis(&self, xi: &Point3<f64>, values: &mut [f64]) {
        assert_eq!(values.len(), self.num_nodes());
        for (node, alpha) in self.nodes.iter().enumerate() {
            values[node] = self.degree.evaluate_1d(alpha[0], xi.x).0
                * self.degree.evaluate_1d(alpha[1], xi.y).0
                * self.degree.evaluate_1d(alpha[2], xi.z).0;
        }
    }
}
