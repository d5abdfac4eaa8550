use matrixcompare::assert_scalar_eq;
use nalgebra::Vector3;
use spacetime::adm::{evolution_rates, lapse_source, matter_coupling, PointFields};
use spacetime::source::MatterSample;
use spacetime::tensor::{Slot, Sym3};
use std::f64::consts::PI;

struct Sample {
    metric: Sym3<f64>,
    gradient: Sym3<Vector3<f64>>,
    hessian: Sym3<Sym3<f64>>,
    extrinsic: Sym3<f64>,
    lapse: f64,
    lapse_hessian: Sym3<f64>,
}

impl Sample {
    fn flat() -> Self {
        Self {
            metric: Sym3::identity(),
            gradient: Sym3::splat(Vector3::zeros()),
            hessian: Sym3::splat(Sym3::zeros()),
            extrinsic: Sym3::zeros(),
            lapse: 1.0,
            lapse_hessian: Sym3::zeros(),
        }
    }

    fn point(&self) -> PointFields {
        PointFields {
            metric: &self.metric,
            metric_gradient: &self.gradient,
            metric_hessian: &self.hessian,
            extrinsic: &self.extrinsic,
            lapse: self.lapse,
            lapse_hessian: &self.lapse_hessian,
        }
    }
}

#[test]
fn lapse_source_of_unit_determinant_is_one() {
    assert_eq!(lapse_source(1.0), 1.0);
    assert_scalar_eq!(lapse_source(std::f64::consts::E), 2.0, comp = abs, tol = 1e-15);
    assert!(lapse_source(0.0).is_infinite());
    assert!(lapse_source(-1.0).is_nan());
}

#[test]
fn matter_coupling_in_geometrized_units() {
    assert_scalar_eq!(matter_coupling(1.0, 1.0), 8.0 * PI, comp = abs, tol = 1e-14);
    assert_scalar_eq!(matter_coupling(2.0, 2.0), PI, comp = abs, tol = 1e-14);
}

#[test]
fn flat_vacuum_rates_vanish() {
    let sample = Sample::flat();
    let rates = evolution_rates(&sample.point(), &MatterSample::vacuum(), 8.0 * PI);
    assert_eq!(rates.metric, Sym3::zeros());
    assert_eq!(rates.extrinsic, Sym3::zeros());
    assert_eq!(rates.determinant, 1.0);
}

#[test]
fn metric_rate_is_lapse_times_extrinsic_curvature() {
    let mut sample = Sample::flat();
    sample.lapse = 2.0;
    sample.extrinsic = Sym3::new([0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    let rates = evolution_rates(&sample.point(), &MatterSample::vacuum(), 0.0);
    for slot in Slot::ALL {
        assert_scalar_eq!(rates.metric[slot], -4.0 * sample.extrinsic[slot], comp = abs, tol = 1e-15);
    }
}

#[test]
fn extrinsic_rate_of_diagonal_curvature_in_flat_space() {
    // K = k I with g = I: K g⁻¹ K = k² I and tr K = 3k, so ∂_t K = α (−2k² + 3k²) I = α k² I
    let mut sample = Sample::flat();
    sample.extrinsic = Sym3::diagonal(0.5, 0.5, 0.5);
    sample.lapse = 3.0;
    let rates = evolution_rates(&sample.point(), &MatterSample::vacuum(), 0.0);
    assert_scalar_eq!(rates.extrinsic[Slot::S11], 0.75, comp = abs, tol = 1e-14);
    assert_scalar_eq!(rates.extrinsic[Slot::S22], 0.75, comp = abs, tol = 1e-14);
    assert_scalar_eq!(rates.extrinsic[Slot::S12], 0.0, comp = abs, tol = 1e-14);
}

#[test]
fn lapse_hessian_enters_extrinsic_rate() {
    let mut sample = Sample::flat();
    sample.lapse_hessian = Sym3::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let rates = evolution_rates(&sample.point(), &MatterSample::vacuum(), 0.0);
    assert_eq!(rates.extrinsic, sample.lapse_hessian * -1.0);
}

#[test]
fn energy_density_sources_extrinsic_rate() {
    // S = 0, ρ = 1: ∂_t K = −κ α (−½ g (0 − 1)) = −½ κ g
    let sample = Sample::flat();
    let matter = MatterSample {
        energy_density: 1.0,
        ..MatterSample::vacuum()
    };
    let coupling = 2.0;
    let rates = evolution_rates(&sample.point(), &matter, coupling);
    assert_scalar_eq!(rates.extrinsic[Slot::S11], -1.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(rates.extrinsic[Slot::S33], -1.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(rates.extrinsic[Slot::S12], 0.0, comp = abs, tol = 1e-15);
    assert_eq!(rates.metric, Sym3::zeros());
}

#[test]
fn degenerate_metric_propagates_non_finite_rates() {
    let mut sample = Sample::flat();
    sample.metric = Sym3::zeros();
    let rates = evolution_rates(&sample.point(), &MatterSample::vacuum(), 0.0);
    assert_eq!(rates.determinant, 0.0);
    assert!(!rates.extrinsic.is_finite());
}
