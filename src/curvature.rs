//! Pointwise tensor algebra for the spatial metric.
//!
//! All functions operate on a single sample point. Nothing here guards against a degenerate
//! metric: a vanishing or negative determinant propagates as `inf`/`NaN` through the inverse,
//! the connection and the curvature. Callers that need to detect this inspect the determinant.
use crate::tensor::{Connection, Slot, Sym3};
use nalgebra::Vector3;

/// Determinant of a symmetric 3x3 tensor by cofactor expansion along the first row.
#[inline]
pub fn determinant(g: &Sym3<f64>) -> f64 {
    use Slot::*;
    let (g11, g12, g13) = (g[S11], g[S12], g[S13]);
    let (g22, g23, g33) = (g[S22], g[S23], g[S33]);
    g11 * (g22 * g33 - g23 * g23) - g12 * (g12 * g33 - g23 * g13) + g13 * (g12 * g23 - g22 * g13)
}

/// Inverse of a symmetric 3x3 tensor given its determinant.
#[inline]
pub fn inverse(g: &Sym3<f64>, det: f64) -> Sym3<f64> {
    use Slot::*;
    let (g11, g12, g13) = (g[S11], g[S12], g[S13]);
    let (g22, g23, g33) = (g[S22], g[S23], g[S33]);
    Sym3::new([
        (g22 * g33 - g23 * g23) / det,
        (g13 * g23 - g12 * g33) / det,
        (g12 * g23 - g13 * g22) / det,
        (g11 * g33 - g13 * g13) / det,
        (g12 * g13 - g11 * g23) / det,
        (g11 * g22 - g12 * g12) / det,
    ])
}

/// Christoffel symbols of the second kind,
/// `Γ(i, j, k) = Σ_l ½ g⁻¹(i, l) (∂_k g(l, j) + ∂_j g(l, k) − ∂_l g(j, k))`.
///
/// `gradient[slot(a, b)][c]` holds `∂_c g(a, b)`.
pub fn connection(inverse: &Sym3<f64>, gradient: &Sym3<Vector3<f64>>) -> Connection {
    let dg = |a: usize, b: usize, c: usize| gradient[Slot::of(a, b)][c];
    let mut gamma = Connection::zeros();
    for slot in Slot::ALL {
        let (i, j) = slot.axes();
        for k in 0..3 {
            let value = (0..3)
                .map(|l| 0.5 * inverse.get(i, l) * (dg(l, j, k) + dg(l, k, j) - dg(j, k, l)))
                .sum();
            gamma.set(slot, k, value);
        }
    }
    gamma
}

/// Ricci tensor from metric second derivatives and the connection.
///
/// The second-derivative part runs over the six distinct pairs `(k, l)` with off-diagonal pairs
/// counted twice; the connection part runs over all nine `(k, l)`:
///
/// ```text
/// Ric(i, j) = Σ_(k,l) ½ g⁻¹(k, l) (∂_i∂_l g(k, j) + ∂_k∂_j g(i, l) − ∂_i∂_j g(k, l) − ∂_k∂_l g(i, j))
///           + Σ_k Σ_l Γ(i, j, k) Γ(k, l, l) − Γ(i, l, k) − Γ(j, k, l)
/// ```
///
/// `hessian[slot(a, b)][slot(c, d)]` holds `∂_c∂_d g(a, b)`.
pub fn ricci(inverse: &Sym3<f64>, hessian: &Sym3<Sym3<f64>>, gamma: &Connection) -> Sym3<f64> {
    let ddg = |a: usize, b: usize, c: usize, d: usize| hessian[Slot::of(a, b)].get(c, d);
    Sym3::from_fn(|slot| {
        let (i, j) = slot.axes();

        let second_derivative_part: f64 = Slot::ALL
            .iter()
            .map(|&pair| {
                let (k, l) = pair.axes();
                pair.multiplicity()
                    * 0.5
                    * inverse[pair]
                    * (ddg(k, j, i, l) + ddg(i, l, k, j) - ddg(k, l, i, j) - ddg(i, j, k, l))
            })
            .sum();

        let mut connection_part = 0.0;
        for k in 0..3 {
            for l in 0..3 {
                connection_part += gamma.get(i, j, k) * gamma.get(k, l, l) - gamma.get(i, l, k) - gamma.get(j, k, l);
            }
        }

        second_derivative_part + connection_part
    })
}

/// Trace `g⁻¹(i, j) K(i, j)` summed over all nine index pairs.
#[inline]
pub fn trace(inverse: &Sym3<f64>, tensor: &Sym3<f64>) -> f64 {
    inverse.contract(tensor)
}

/// The product `(K g⁻¹ K)(i, j) = Σ_k Σ_l K(i, k) g⁻¹(k, l) K(l, j)`.
pub fn raised_product(tensor: &Sym3<f64>, inverse: &Sym3<f64>) -> Sym3<f64> {
    Sym3::from_fn(|slot| {
        let (i, j) = slot.axes();
        let mut sum = 0.0;
        for k in 0..3 {
            for l in 0..3 {
                sum += tensor.get(i, k) * inverse.get(k, l) * tensor.get(l, j);
            }
        }
        sum
    })
}

/// Metric quantities derived at one sample point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricGeometry {
    pub determinant: f64,
    pub inverse: Sym3<f64>,
    pub connection: Connection,
    pub ricci: Sym3<f64>,
}

impl MetricGeometry {
    /// Evaluates determinant, inverse, connection and Ricci tensor from a metric sample.
    pub fn compute(metric: &Sym3<f64>, gradient: &Sym3<Vector3<f64>>, hessian: &Sym3<Sym3<f64>>) -> Self {
        let determinant = determinant(metric);
        let inverse = inverse(metric, determinant);
        let connection = connection(&inverse, gradient);
        let ricci = ricci(&inverse, hessian, &connection);
        Self {
            determinant,
            inverse,
            connection,
            ricci,
        }
    }

    /// Whether the determinant is finite and positive.
    pub fn is_regular(&self) -> bool {
        self.determinant.is_finite() && self.determinant > 0.0
    }
}
