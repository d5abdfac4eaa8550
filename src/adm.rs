//! Right-hand sides of the ADM evolution system at a single sample point.
use crate::curvature::{raised_product, trace, MetricGeometry};
use crate::source::MatterSample;
use crate::tensor::{Slot, Sym3};
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Field values at one quadrature point.
#[derive(Debug, Clone, Copy)]
pub struct PointFields<'a> {
    pub metric: &'a Sym3<f64>,
    /// `metric_gradient[slot(a, b)][c] = ∂_c g(a, b)`
    pub metric_gradient: &'a Sym3<Vector3<f64>>,
    /// `metric_hessian[slot(a, b)][slot(c, d)] = ∂_c∂_d g(a, b)`
    pub metric_hessian: &'a Sym3<Sym3<f64>>,
    pub extrinsic: &'a Sym3<f64>,
    pub lapse: f64,
    pub lapse_hessian: &'a Sym3<f64>,
}

/// Time derivatives of the metric and extrinsic curvature at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvolutionRates {
    pub metric: Sym3<f64>,
    pub extrinsic: Sym3<f64>,
    /// Metric determinant used to produce the rates.
    pub determinant: f64,
}

/// The coupling constant `8πG/c⁴` of the matter terms.
pub fn matter_coupling(gravitational_constant: f64, speed_of_light: f64) -> f64 {
    let c2 = speed_of_light * speed_of_light;
    8.0 * PI * gravitational_constant / (c2 * c2)
}

/// Source of the lapse equation, `1 + ln(det g)`.
#[inline]
pub fn lapse_source(determinant: f64) -> f64 {
    1.0 + determinant.ln()
}

/// Evaluates
///
/// ```text
/// ∂_t g(i, j) = −2 α K(i, j)
/// ∂_t K(i, j) = α (Ric(i, j) − 2 (K g⁻¹ K)(i, j) + tr(K) K(i, j)) − ∂_i∂_j α
///               − 8πG/c⁴ α (S(i, j) − ½ g(i, j) (tr(S) − ρ))
/// ```
///
/// where `coupling` is `8πG/c⁴` and traces are taken with the inverse metric.
pub fn evolution_rates(fields: &PointFields, matter: &MatterSample, coupling: f64) -> EvolutionRates {
    let geometry = MetricGeometry::compute(fields.metric, fields.metric_gradient, fields.metric_hessian);
    evolution_rates_with_geometry(fields, &geometry, matter, coupling)
}

pub fn evolution_rates_with_geometry(
    fields: &PointFields,
    geometry: &MetricGeometry,
    matter: &MatterSample,
    coupling: f64,
) -> EvolutionRates {
    let lapse = fields.lapse;
    let k = fields.extrinsic;
    let k_trace = trace(&geometry.inverse, k);
    let kk = raised_product(k, &geometry.inverse);

    let flux = &matter.momentum_flux;
    let flux_trace = trace(&geometry.inverse, flux);
    let matter_scale = coupling * lapse;

    let metric = Sym3::from_fn(|slot| -2.0 * lapse * k[slot]);
    let extrinsic = Sym3::from_fn(|slot: Slot| {
        let curvature = geometry.ricci[slot] - 2.0 * kk[slot] + k_trace * k[slot];
        let matter_term = flux[slot] - 0.5 * fields.metric[slot] * (flux_trace - matter.energy_density);
        lapse * curvature - fields.lapse_hessian[slot] - matter_scale * matter_term
    });

    EvolutionRates {
        metric,
        extrinsic,
        determinant: geometry.determinant,
    }
}
