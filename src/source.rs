//! Matter source terms coupled into the extrinsic curvature equation.
use crate::tensor::Sym3;
use nalgebra::{Point3, Vector3};

/// Matter content at a point, as measured by the normal observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatterSample {
    /// Energy density `ρ`.
    pub energy_density: f64,
    /// Momentum density `j_i`.
    pub momentum_density: Vector3<f64>,
    /// Spatial stress (momentum flux) `S_ij`.
    pub momentum_flux: Sym3<f64>,
}

impl MatterSample {
    pub fn vacuum() -> Self {
        Self {
            energy_density: 0.0,
            momentum_density: Vector3::zeros(),
            momentum_flux: Sym3::zeros(),
        }
    }

    pub fn is_vacuum(&self) -> bool {
        self.energy_density == 0.0 && self.momentum_density == Vector3::zeros() && self.momentum_flux == Sym3::zeros()
    }
}

impl Default for MatterSample {
    fn default() -> Self {
        Self::vacuum()
    }
}

/// Provides matter source terms at physical points of the domain.
///
/// Evaluated once per quadrature point during right-hand side assembly, possibly from several
/// threads at once.
pub trait MatterSource: Sync {
    fn evaluate(&self, point: &Point3<f64>) -> MatterSample;
}

impl<S: ?Sized + MatterSource> MatterSource for &S {
    fn evaluate(&self, point: &Point3<f64>) -> MatterSample {
        S::evaluate(self, point)
    }
}

/// Empty space: no matter anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vacuum;

impl MatterSource for Vacuum {
    #[inline]
    fn evaluate(&self, _point: &Point3<f64>) -> MatterSample {
        MatterSample::vacuum()
    }
}

/// Matter source defined by a closure.
pub struct FnMatterSource<F> {
    function: F,
}

impl<F> FnMatterSource<F>
where
    F: Fn(&Point3<f64>) -> MatterSample + Sync,
{
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<F> MatterSource for FnMatterSource<F>
where
    F: Fn(&Point3<f64>) -> MatterSample + Sync,
{
    fn evaluate(&self, point: &Point3<f64>) -> MatterSample {
        (self.function)(point)
    }
}
