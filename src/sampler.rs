//! Sampling of the evolved fields at the quadrature points of a cell.
use crate::adm::PointFields;
use crate::fields::SpacetimeFields;
use crate::space::CellValues;
use crate::tensor::{Slot, Sym3};
use nalgebra::{DVector, Vector3};

/// Per-cell scratch holding local coefficients and the sampled fields at every quadrature point.
///
/// Buffers grow to the size of the largest cell seen and are overwritten by every call to
/// [`FieldSamples::sample`], so one instance per thread can be reused for all cells.
#[derive(Debug, Clone, Default)]
pub struct FieldSamples {
    local_metric: [Vec<f64>; 6],
    local_extrinsic: [Vec<f64>; 6],
    local_lapse: Vec<f64>,
    metric: Vec<Sym3<f64>>,
    metric_gradient: Vec<Sym3<Vector3<f64>>>,
    metric_hessian: Vec<Sym3<Sym3<f64>>>,
    extrinsic: Vec<Sym3<f64>>,
    lapse: Vec<f64>,
    lapse_hessian: Vec<Sym3<f64>>,
}

fn gather(local: &mut Vec<f64>, global: &DVector<f64>, dofs: &[usize]) {
    local.clear();
    local.extend(dofs.iter().map(|&dof| global[dof]));
}

impl FieldSamples {
    fn resize(&mut self, num_points: usize) {
        self.metric.resize(num_points, Sym3::zeros());
        self.metric_gradient
            .resize(num_points, Sym3::splat(Vector3::zeros()));
        self.metric_hessian
            .resize(num_points, Sym3::splat(Sym3::zeros()));
        self.extrinsic.resize(num_points, Sym3::zeros());
        self.lapse.resize(num_points, 0.0);
        self.lapse_hessian.resize(num_points, Sym3::zeros());
    }

    /// Samples values of the metric components only.
    pub fn sample_metric(&mut self, values: &CellValues, fields: &SpacetimeFields, dofs: &[usize]) {
        let num_points = values.num_points();
        self.resize(num_points);
        for slot in Slot::ALL {
            let local = &mut self.local_metric[slot.index()];
            gather(local, &fields.metric[slot], dofs);
            for q in 0..num_points {
                self.metric[q][slot] = values.value(local, q);
            }
        }
    }

    /// Samples every quantity needed by the evolution equations: metric values, gradients and
    /// Hessians, extrinsic curvature values, and lapse values and Hessians.
    pub fn sample(&mut self, values: &CellValues, fields: &SpacetimeFields, dofs: &[usize]) {
        let num_points = values.num_points();
        self.resize(num_points);

        for slot in Slot::ALL {
            let local = &mut self.local_metric[slot.index()];
            gather(local, &fields.metric[slot], dofs);
            for q in 0..num_points {
                self.metric[q][slot] = values.value(local, q);
                self.metric_gradient[q][slot] = values.gradient(local, q);
                self.metric_hessian[q][slot] = values.hessian(local, q);
            }

            let local = &mut self.local_extrinsic[slot.index()];
            gather(local, &fields.extrinsic[slot], dofs);
            for q in 0..num_points {
                self.extrinsic[q][slot] = values.value(local, q);
            }
        }

        gather(&mut self.local_lapse, &fields.lapse, dofs);
        for q in 0..num_points {
            self.lapse[q] = values.value(&self.local_lapse, q);
            self.lapse_hessian[q] = values.hessian(&self.local_lapse, q);
        }
    }

    pub fn metric(&self, q: usize) -> &Sym3<f64> {
        &self.metric[q]
    }

    pub fn lapse(&self, q: usize) -> f64 {
        self.lapse[q]
    }

    /// Borrowed view of all samples at point `q`. Only valid after [`FieldSamples::sample`].
    pub fn point(&self, q: usize) -> PointFields<'_> {
        PointFields {
            metric: &self.metric[q],
            metric_gradient: &self.metric_gradient[q],
            metric_hessian: &self.metric_hessian[q],
            extrinsic: &self.extrinsic[q],
            lapse: self.lapse[q],
            lapse_hessian: &self.lapse_hessian[q],
        }
    }
}
