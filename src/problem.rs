//! Initial and boundary data of an evolution.
use crate::config::Context;
use crate::tensor::Sym3;
use nalgebra::Point3;

/// Supplies the initial state and the Dirichlet data of an evolution.
///
/// Boundary data defaults to the initial data, so a problem with a stationary exact solution only
/// needs to provide the latter.
pub trait SpacetimeProblem: Sync {
    fn initial_metric(&self, point: &Point3<f64>) -> Sym3<f64>;

    fn initial_extrinsic(&self, point: &Point3<f64>) -> Sym3<f64>;

    fn boundary_metric(&self, point: &Point3<f64>) -> Sym3<f64> {
        self.initial_metric(point)
    }

    fn boundary_extrinsic(&self, point: &Point3<f64>) -> Sym3<f64> {
        self.initial_extrinsic(point)
    }

    /// Dirichlet value of the lapse. `None` leaves the lapse unconstrained.
    fn boundary_lapse(&self, _point: &Point3<f64>) -> Option<f64> {
        None
    }
}

/// Flat space: `g = diag(1, 1, 1)`, `K = 0`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Minkowski;

impl SpacetimeProblem for Minkowski {
    fn initial_metric(&self, _point: &Point3<f64>) -> Sym3<f64> {
        Sym3::identity()
    }

    fn initial_extrinsic(&self, _point: &Point3<f64>) -> Sym3<f64> {
        Sym3::zeros()
    }
}

/// The Schwarzschild solution of a point mass in isotropic coordinates,
/// `g = ψ⁴ δ` with `ψ = 1 + G M / (2 c² r)` and `K = 0`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IsotropicSchwarzschild {
    pub mass: f64,
    pub center: Point3<f64>,
    pub context: Context,
}

impl IsotropicSchwarzschild {
    pub fn new(mass: f64, center: Point3<f64>, context: Context) -> Self {
        Self { mass, center, context }
    }

    /// The Schwarzschild radius `2 G M / c²`.
    pub fn horizon_radius(&self) -> f64 {
        let c = self.context.speed_of_light;
        2.0 * self.context.gravitational_constant * self.mass / (c * c)
    }

    /// Conformal factor `ψ` at `point`.
    pub fn conformal_factor(&self, point: &Point3<f64>) -> f64 {
        let r = (point - self.center).norm();
        1.0 + self.horizon_radius() / (4.0 * r)
    }

    /// Exact metric determinant `ψ¹²`.
    pub fn analytical_determinant(&self, point: &Point3<f64>) -> f64 {
        self.conformal_factor(point).powi(12)
    }
}

impl SpacetimeProblem for IsotropicSchwarzschild {
    fn initial_metric(&self, point: &Point3<f64>) -> Sym3<f64> {
        let psi4 = self.conformal_factor(point).powi(4);
        Sym3::diagonal(psi4, psi4, psi4)
    }

    fn initial_extrinsic(&self, _point: &Point3<f64>) -> Sym3<f64> {
        Sym3::zeros()
    }
}
