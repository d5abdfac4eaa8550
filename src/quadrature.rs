//! Gauss-Legendre quadrature on `[-1, 1]` and on the reference hexahedron `[-1, 1]³`.
use nalgebra::Point3;
use std::f64::consts::PI;

/// Evaluates `P_n(x)` and `P_n'(x)` with the three-term recurrence
/// `m P_m(x) = (2m - 1) x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)`.
///
/// The derivative formula is singular at `|x| = 1`; only interior points are evaluated.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut current = 1.0;
    let mut previous = 0.0;
    for m in 1..=n {
        let m = m as f64;
        let before = previous;
        previous = current;
        current = ((2.0 * m - 1.0) * x * previous - (m - 1.0) * before) / m;
    }
    let n = n as f64;
    let derivative = n * (x * current - previous) / (x * x - 1.0);
    (current, derivative)
}

const MAX_NEWTON_ITERATIONS: usize = 100;

/// Gauss-Legendre rule with `n` points on `[-1, 1]`, exact for polynomials of degree `2n - 1`.
///
/// Returns `(weights, points)` with points in descending order.
///
/// # Panics
///
/// Panics if `n` is zero.
pub fn gauss_1d(n: usize) -> (Vec<f64>, Vec<f64>) {
    assert!(n > 0, "number of points must be positive");

    let half = (n + 1) / 2;
    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    for i in 0..half {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let (p, dp) = legendre(n, x);
            let dx = -p / dp;
            x += dx;
            if dx.abs() <= 1e-15 {
                break;
            }
        }
        let (_, dp) = legendre(n, x);
        points.push(x);
        weights.push(2.0 / ((1.0 - x * x) * dp * dp));
    }

    for i in half..n {
        let mirror = n - i - 1;
        points.push(-points[mirror]);
        weights.push(weights[mirror]);
    }

    (weights, points)
}

/// A quadrature rule on the reference hexahedron.
#[derive(Debug, Clone, PartialEq)]
pub struct HexQuadrature {
    weights: Vec<f64>,
    points: Vec<Point3<f64>>,
}

impl HexQuadrature {
    /// Tensor-product Gauss rule with `n` points per axis.
    pub fn gauss(n: usize) -> Self {
        let (weights_1d, points_1d) = gauss_1d(n);
        let mut weights = Vec::with_capacity(n * n * n);
        let mut points = Vec::with_capacity(n * n * n);
        for (wz, z) in weights_1d.iter().zip(&points_1d) {
            for (wy, y) in weights_1d.iter().zip(&points_1d) {
                for (wx, x) in weights_1d.iter().zip(&points_1d) {
                    weights.push(wx * wy * wz);
                    points.push(Point3::new(*x, *y, *z));
                }
            }
        }
        Self { weights, points }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Integrates `f` over the reference hexahedron.
    pub fn integrate(&self, f: impl Fn(&Point3<f64>) -> f64) -> f64 {
        self.weights
            .iter()
            .zip(&self.points)
            .map(|(w, p)| w * f(p))
            .sum()
    }
}
