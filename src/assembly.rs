//! Cell-wise assembly of the mass matrix and the weak-form right-hand sides.
//!
//! Cell contributions are computed independently, optionally in parallel, into a buffer with one
//! contiguous block per cell. The blocks are then scattered into the global vectors on the calling
//! thread through [`AffineConstraints`], exactly once per cell and field.
use crate::adm::{evolution_rates, lapse_source};
use crate::constraints::AffineConstraints;
use crate::curvature::determinant;
use crate::error::SolverError;
use crate::fields::{SpacetimeFields, TensorField};
use crate::sampler::FieldSamples;
use crate::source::MatterSource;
use crate::space::{CellValues, FiniteElementSpace, ReferenceValues};
use crate::tensor::{Slot, Sym3};
use itertools::izip;
use nalgebra::{DMatrix, DVector, Point3};
use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;
use std::cell::RefCell;
use thread_local::ThreadLocal;

/// Global right-hand sides of the 13 field equations.
#[derive(Debug, Clone, PartialEq)]
pub struct RhsVectors {
    pub metric: TensorField,
    pub extrinsic: TensorField,
    pub lapse: DVector<f64>,
}

impl RhsVectors {
    pub fn zeros(num_dofs: usize) -> Self {
        Self {
            metric: TensorField::zeros(num_dofs),
            extrinsic: TensorField::zeros(num_dofs),
            lapse: DVector::zeros(num_dofs),
        }
    }
}

#[derive(Debug, Default)]
struct CellScratch {
    values: CellValues,
    samples: FieldSamples,
}

fn is_degenerate(determinant: f64) -> bool {
    !(determinant.is_finite() && determinant > 0.0)
}

/// Assembles global matrices and vectors for one finite element space.
#[derive(Debug)]
pub struct Assembler {
    reference: ReferenceValues,
    scratch: ThreadLocal<RefCell<CellScratch>>,
    serial: CellScratch,
    local_buffer: Vec<f64>,
    local_matrix: DMatrix<f64>,
    parallel: bool,
}

impl Assembler {
    pub fn new(space: &FiniteElementSpace) -> Self {
        Self {
            reference: ReferenceValues::for_space(space),
            scratch: ThreadLocal::new(),
            serial: CellScratch::default(),
            local_buffer: Vec::new(),
            local_matrix: DMatrix::zeros(0, 0),
            parallel: true,
        }
    }

    /// Whether cell contributions are computed on the rayon thread pool.
    pub fn with_parallel(self, parallel: bool) -> Self {
        Self { parallel, ..self }
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn reference_values(&self) -> &ReferenceValues {
        &self.reference
    }

    /// Assembles `M(i, j) = ∫ φ_i φ_j` into `matrix`, overwriting its previous values.
    ///
    /// The pattern of `matrix` must contain the pattern of the space.
    pub fn assemble_mass_matrix(
        &mut self,
        space: &FiniteElementSpace,
        constraints: &AffineConstraints,
        matrix: &mut CsrMatrix<f64>,
    ) -> Result<(), SolverError> {
        matrix.values_mut().fill(0.0);
        let n = space.dofs_per_cell();
        self.local_matrix.resize_mut(n, n, 0.0);

        for cell in 0..space.num_cells() {
            let values = &mut self.serial.values;
            values.reinit(space, &self.reference, cell)?;
            let local = &mut self.local_matrix;
            local.fill(0.0);
            for q in 0..values.num_points() {
                let jxw = values.jxw(q);
                for i in 0..n {
                    let phi_i = values.shape_value(i, q) * jxw;
                    for j in i..n {
                        local[(i, j)] += phi_i * values.shape_value(j, q);
                    }
                }
            }
            for i in 0..n {
                for j in 0..i {
                    local[(i, j)] = local[(j, i)];
                }
            }
            constraints.distribute_local_to_global_matrix(local, space.cell_dofs(cell), matrix)?;
        }
        Ok(())
    }

    /// Assembles `∫ f_s φ_i` for every component `s` of a symmetric tensor valued function.
    pub fn assemble_projection_rhs<F>(
        &mut self,
        space: &FiniteElementSpace,
        constraints: &AffineConstraints,
        function: F,
        rhs: &mut TensorField,
    ) -> Result<(), SolverError>
    where
        F: Fn(&Point3<f64>) -> Sym3<f64> + Sync,
    {
        let n = space.dofs_per_cell();
        self.compute_cells(space, 6 * n, |scratch, reference, cell, out| {
            let values = &mut scratch.values;
            values.reinit(space, reference, cell)?;
            for q in 0..values.num_points() {
                let f = function(values.quadrature_point(q));
                let jxw = values.jxw(q);
                for slot in Slot::ALL {
                    let block = &mut out[slot.index() * n..(slot.index() + 1) * n];
                    let weight = f[slot] * jxw;
                    for (i, entry) in block.iter_mut().enumerate() {
                        *entry += weight * values.shape_value(i, q);
                    }
                }
            }
            Ok(0)
        })?;

        let mut targets: Vec<&mut DVector<f64>> = rhs.iter_mut().map(|(_, v)| v).collect();
        self.scatter(space, constraints, &mut targets);
        Ok(())
    }

    /// Assembles `∫ (1 + ln det g) φ_i` into `rhs`.
    ///
    /// Returns the number of quadrature points with a non-positive or non-finite metric
    /// determinant. Such points still contribute, so NaN or infinite values propagate into `rhs`.
    pub fn assemble_lapse_rhs(
        &mut self,
        space: &FiniteElementSpace,
        constraints: &AffineConstraints,
        fields: &SpacetimeFields,
        rhs: &mut DVector<f64>,
    ) -> Result<usize, SolverError> {
        let degenerate = self.compute_cells(space, space.dofs_per_cell(), |scratch, reference, cell, out| {
            let CellScratch { values, samples } = scratch;
            values.reinit(space, reference, cell)?;
            samples.sample_metric(values, fields, space.cell_dofs(cell));
            let mut degenerate = 0;
            for q in 0..values.num_points() {
                let det = determinant(samples.metric(q));
                if is_degenerate(det) {
                    degenerate += 1;
                }
                let weight = lapse_source(det) * values.jxw(q);
                for (i, entry) in out.iter_mut().enumerate() {
                    *entry += weight * values.shape_value(i, q);
                }
            }
            Ok(degenerate)
        })?;

        self.scatter(space, constraints, &mut [rhs]);
        Ok(degenerate)
    }

    /// Assembles the weak-form time derivatives `∫ ∂_t g(s) φ_i` and `∫ ∂_t K(s) φ_i` for all six
    /// slots `s`.
    ///
    /// `coupling` is the matter coupling constant `8πG/c⁴`. Returns the number of degenerate
    /// metric samples, as for [`Assembler::assemble_lapse_rhs`].
    pub fn assemble_evolution_rhs<S: MatterSource>(
        &mut self,
        space: &FiniteElementSpace,
        constraints: &AffineConstraints,
        fields: &SpacetimeFields,
        source: &S,
        coupling: f64,
        rhs: &mut RhsVectors,
    ) -> Result<usize, SolverError> {
        let n = space.dofs_per_cell();
        let degenerate = self.compute_cells(space, 12 * n, |scratch, reference, cell, out| {
            let CellScratch { values, samples } = scratch;
            values.reinit(space, reference, cell)?;
            samples.sample(values, fields, space.cell_dofs(cell));

            let (metric_out, extrinsic_out) = out.split_at_mut(6 * n);
            let mut degenerate = 0;
            for q in 0..values.num_points() {
                let matter = source.evaluate(values.quadrature_point(q));
                let rates = evolution_rates(&samples.point(q), &matter, coupling);
                if is_degenerate(rates.determinant) {
                    degenerate += 1;
                }

                let jxw = values.jxw(q);
                for slot in Slot::ALL {
                    let range = slot.index() * n..(slot.index() + 1) * n;
                    let metric_weight = rates.metric[slot] * jxw;
                    let extrinsic_weight = rates.extrinsic[slot] * jxw;
                    for (i, g, k) in izip!(0.., &mut metric_out[range.clone()], &mut extrinsic_out[range]) {
                        let phi = values.shape_value(i, q);
                        *g += metric_weight * phi;
                        *k += extrinsic_weight * phi;
                    }
                }
            }
            Ok(degenerate)
        })?;

        let RhsVectors { metric, extrinsic, .. } = rhs;
        let mut targets: Vec<&mut DVector<f64>> = metric
            .iter_mut()
            .chain(extrinsic.iter_mut())
            .map(|(_, v)| v)
            .collect();
        self.scatter(space, constraints, &mut targets);
        Ok(degenerate)
    }

    /// Runs `kernel` for every cell on a zeroed block of `width` entries of the local buffer and
    /// sums the counts it returns.
    fn compute_cells<K>(&mut self, space: &FiniteElementSpace, width: usize, kernel: K) -> Result<usize, SolverError>
    where
        K: Fn(&mut CellScratch, &ReferenceValues, usize, &mut [f64]) -> Result<usize, SolverError> + Sync,
    {
        self.local_buffer.clear();
        self.local_buffer.resize(width * space.num_cells(), 0.0);
        let reference = &self.reference;

        if self.parallel {
            let scratch = &self.scratch;
            self.local_buffer
                .par_chunks_mut(width)
                .enumerate()
                .with_min_len(8)
                .map(|(cell, out)| {
                    let mut scratch = scratch.get_or_default().borrow_mut();
                    kernel(&mut scratch, reference, cell, out)
                })
                .try_reduce(|| 0, |a, b| Ok(a + b))
        } else {
            let scratch = &mut self.serial;
            self.local_buffer
                .chunks_mut(width)
                .enumerate()
                .try_fold(0, |count, (cell, out)| -> Result<usize, SolverError> {
                    Ok(count + kernel(scratch, reference, cell, out)?)
                })
        }
    }

    /// Adds the blocks of the local buffer to `targets`. Block `c` of each cell goes to
    /// `targets[c]`.
    fn scatter(&self, space: &FiniteElementSpace, constraints: &AffineConstraints, targets: &mut [&mut DVector<f64>]) {
        let n = space.dofs_per_cell();
        let width = n * targets.len();
        for target in targets.iter_mut() {
            target.fill(0.0);
        }
        for (cell, block) in self.local_buffer.chunks_exact(width).enumerate() {
            let dofs = space.cell_dofs(cell);
            for (local, target) in block.chunks_exact(n).zip(targets.iter_mut()) {
                constraints.distribute_local_to_global_vector(local, dofs, target);
            }
        }
    }
}
