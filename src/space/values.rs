use crate::element::LagrangeHex;
use crate::error::SolverError;
use crate::quadrature::HexQuadrature;
use crate::space::FiniteElementSpace;
use crate::tensor::{Slot, Sym3};
use nalgebra::{Matrix3, Point3, Vector3};

/// Basis functions and geometry map evaluated once on the reference cell.
///
/// Per-point arrays are stored point-major: entry `q * n + i` belongs to quadrature point `q`
/// and basis function `i`.
#[derive(Debug, Clone)]
pub struct ReferenceValues {
    quadrature: HexQuadrature,
    num_basis: usize,
    values: Vec<f64>,
    gradients: Vec<Vector3<f64>>,
    hessians: Vec<Matrix3<f64>>,
    geometry_values: Vec<f64>,
    geometry_gradients: Vec<Vector3<f64>>,
    geometry_hessians: Vec<Matrix3<f64>>,
}

impl ReferenceValues {
    pub fn new(element: &LagrangeHex, geometry: &LagrangeHex, quadrature: HexQuadrature) -> Self {
        let (values, gradients, hessians) = tabulate(element, &quadrature);
        let (geometry_values, geometry_gradients, geometry_hessians) = tabulate(geometry, &quadrature);
        Self {
            num_basis: element.num_nodes(),
            quadrature,
            values,
            gradients,
            hessians,
            geometry_values,
            geometry_gradients,
            geometry_hessians,
        }
    }

    /// Gauss rule with `degree + 1` points per axis for the elements of the space.
    pub fn for_space(space: &FiniteElementSpace) -> Self {
        let quadrature = HexQuadrature::gauss(space.degree().gauss_points_per_axis());
        Self::new(space.element(), space.geometry_element(), quadrature)
    }

    pub fn quadrature(&self) -> &HexQuadrature {
        &self.quadrature
    }

    pub fn num_basis(&self) -> usize {
        self.num_basis
    }

    pub fn num_points(&self) -> usize {
        self.quadrature.len()
    }
}

fn tabulate(element: &LagrangeHex, quadrature: &HexQuadrature) -> (Vec<f64>, Vec<Vector3<f64>>, Vec<Matrix3<f64>>) {
    let n = element.num_nodes();
    let m = quadrature.len();
    let mut values = vec![0.0; n * m];
    let mut gradients = vec![Vector3::zeros(); n * m];
    let mut hessians = vec![Matrix3::zeros(); n * m];
    for (q, xi) in quadrature.points().iter().enumerate() {
        let range = q * n..(q + 1) * n;
        element.evaluate(
            xi,
            &mut values[range.clone()],
            &mut gradients[range.clone()],
            &mut hessians[range],
        );
    }
    (values, gradients, hessians)
}

/// Basis function values, physical gradients and physical Hessians on one cell.
///
/// Buffers are resized on first use and reused by subsequent calls to [`CellValues::reinit`], so
/// one instance per thread serves every cell without allocating.
#[derive(Debug, Clone, Default)]
pub struct CellValues {
    cell: usize,
    num_basis: usize,
    values: Vec<f64>,
    gradients: Vec<Vector3<f64>>,
    hessians: Vec<Matrix3<f64>>,
    jxw: Vec<f64>,
    points: Vec<Point3<f64>>,
}

impl CellValues {
    /// Recomputes all physical quantities for `cell`.
    ///
    /// Gradients transform as `J⁻ᵀ ∇ξ φ`. Hessians include the curvature of the geometry map:
    /// `J⁻ᵀ (Hξ φ − Σ_k ∂φ/∂x_k Hξ x_k) J⁻¹`.
    pub fn reinit(
        &mut self,
        space: &FiniteElementSpace,
        reference: &ReferenceValues,
        cell: usize,
    ) -> Result<(), SolverError> {
        let n = reference.num_basis;
        let m = reference.num_points();
        let num_corners = space.geometry_element().num_nodes();
        if self.values.len() != n * m || self.num_basis != n {
            self.values.clone_from(&reference.values);
            self.gradients.resize(n * m, Vector3::zeros());
            self.hessians.resize(n * m, Matrix3::zeros());
            self.jxw.resize(m, 0.0);
            self.points.resize(m, Point3::origin());
            self.num_basis = n;
        }
        self.cell = cell;

        let corners = space.mesh().cell_vertices(cell);
        let weights = reference.quadrature.weights();

        for q in 0..m {
            let mut jacobian = Matrix3::zeros();
            let mut point = Point3::origin();
            let mut curvature = [Matrix3::zeros(); 3];
            for (c, x) in corners.iter().enumerate() {
                let idx = q * num_corners + c;
                jacobian += x.coords * reference.geometry_gradients[idx].transpose();
                point += x.coords * reference.geometry_values[idx];
                for (k, curvature_k) in curvature.iter_mut().enumerate() {
                    *curvature_k += reference.geometry_hessians[idx] * x[k];
                }
            }

            let determinant = jacobian.determinant();
            let inverse = match jacobian.try_inverse() {
                Some(inverse) if determinant.is_finite() && determinant != 0.0 => inverse,
                _ => return Err(SolverError::SingularJacobian { cell, determinant }),
            };
            let inverse_t = inverse.transpose();

            self.jxw[q] = determinant.abs() * weights[q];
            self.points[q] = point;

            for i in 0..n {
                let idx = q * n + i;
                let gradient = inverse_t * reference.gradients[idx];
                let mut hessian = reference.hessians[idx];
                for k in 0..3 {
                    hessian -= curvature[k] * gradient[k];
                }
                self.gradients[idx] = gradient;
                self.hessians[idx] = inverse_t * hessian * inverse;
            }
        }
        Ok(())
    }

    pub fn cell(&self) -> usize {
        self.cell
    }

    pub fn num_points(&self) -> usize {
        self.jxw.len()
    }

    pub fn num_basis(&self) -> usize {
        self.num_basis
    }

    #[inline]
    pub fn shape_value(&self, basis: usize, q: usize) -> f64 {
        self.values[q * self.num_basis + basis]
    }

    #[inline]
    pub fn shape_gradient(&self, basis: usize, q: usize) -> &Vector3<f64> {
        &self.gradients[q * self.num_basis + basis]
    }

    #[inline]
    pub fn shape_hessian(&self, basis: usize, q: usize) -> &Matrix3<f64> {
        &self.hessians[q * self.num_basis + basis]
    }

    /// Quadrature weight times the Jacobian determinant.
    #[inline]
    pub fn jxw(&self, q: usize) -> f64 {
        self.jxw[q]
    }

    #[inline]
    pub fn quadrature_point(&self, q: usize) -> &Point3<f64> {
        &self.points[q]
    }

    /// Value at point `q` of the function with local coefficients `local`.
    #[inline]
    pub fn value(&self, local: &[f64], q: usize) -> f64 {
        let row = &self.values[q * self.num_basis..(q + 1) * self.num_basis];
        row.iter().zip(local).map(|(phi, c)| phi * c).sum()
    }

    #[inline]
    pub fn gradient(&self, local: &[f64], q: usize) -> Vector3<f64> {
        let row = &self.gradients[q * self.num_basis..(q + 1) * self.num_basis];
        row.iter()
            .zip(local)
            .fold(Vector3::zeros(), |acc, (grad, c)| acc + grad * *c)
    }

    #[inline]
    pub fn hessian(&self, local: &[f64], q: usize) -> Sym3<f64> {
        let row = &self.hessians[q * self.num_basis..(q + 1) * self.num_basis];
        let mut result = Sym3::zeros();
        for (hessian, c) in row.iter().zip(local) {
            for slot in Slot::ALL {
                let (a, b) = slot.axes();
                result[slot] += c * hessian[(a, b)];
            }
        }
        result
    }
}
