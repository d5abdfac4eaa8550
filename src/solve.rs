//! Mass matrix solves with Dirichlet substitution.
use crate::config::SolveAccuracy;
use crate::constraints::AffineConstraints;
use crate::error::SolverError;
use log::{debug, warn};
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use spacetime_sparse::cg::{AbsoluteResidualCriterion, CgWorkspace, ConjugateGradient, SolveErrorKind};
use spacetime_sparse::csr::apply_boundary_values;
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of a single conjugate gradient solve.
///
/// Only `Converged` meets the requested tolerance. The other variants still leave the last iterate
/// in the solution vector.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SolveStatus {
    Converged { iterations: usize, residual: f64 },
    /// The iteration cap was reached.
    NotConverged { iterations: usize, residual: f64 },
    /// The operator or preconditioner was found to be indefinite.
    Breakdown { iterations: usize, residual: f64 },
}

impl SolveStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, SolveStatus::Converged { .. })
    }

    pub fn iterations(&self) -> usize {
        match *self {
            SolveStatus::Converged { iterations, .. }
            | SolveStatus::NotConverged { iterations, .. }
            | SolveStatus::Breakdown { iterations, .. } => iterations,
        }
    }

    pub fn residual(&self) -> f64 {
        match *self {
            SolveStatus::Converged { residual, .. }
            | SolveStatus::NotConverged { residual, .. }
            | SolveStatus::Breakdown { residual, .. } => residual,
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolveStatus::Converged { .. } => "converged",
            SolveStatus::NotConverged { .. } => "not converged",
            SolveStatus::Breakdown { .. } => "breakdown",
        };
        write!(
            f,
            "{} after {} iterations (residual {:.3e})",
            label,
            self.iterations(),
            self.residual()
        )
    }
}

/// Solves `M x = b` for the mass matrix `M` of a space, with optional Dirichlet values.
///
/// Boundary substitution modifies the matrix, so every solve works on a private copy of the mass
/// matrix values. The CG workspace is reused across solves.
#[derive(Debug)]
pub struct MassSolver {
    system: CsrMatrix<f64>,
    workspace: CgWorkspace<f64>,
}

impl MassSolver {
    /// Creates a solver for mass matrices with the sparsity pattern of `mass`.
    pub fn new(mass: &CsrMatrix<f64>) -> Self {
        Self {
            system: mass.clone(),
            workspace: CgWorkspace::default(),
        }
    }

    /// Solves `M x = rhs` with `solution` as the initial guess.
    ///
    /// `rhs` is modified by the boundary substitution. Constrained entries of the solution are
    /// filled from their masters afterwards. Slow convergence and breakdown are reported in the
    /// returned status, not as errors. A matrix with a different pattern or vectors of the wrong
    /// length are rejected before anything is modified.
    #[allow(clippy::too_many_arguments)]
    pub fn solve(
        &mut self,
        field: &str,
        mass: &CsrMatrix<f64>,
        rhs: &mut DVector<f64>,
        solution: &mut DVector<f64>,
        boundary_values: &BTreeMap<usize, f64>,
        constraints: &AffineConstraints,
        accuracy: &SolveAccuracy,
    ) -> Result<SolveStatus, SolverError> {
        if mass.nnz() != self.system.nnz() || mass.nrows() != self.system.nrows() {
            return Err(SolverError::PatternMismatch {
                expected_nnz: self.system.nnz(),
                actual_nnz: mass.nnz(),
            });
        }
        for len in [rhs.len(), solution.len()] {
            if len != mass.nrows() {
                return Err(SolverError::DofCountMismatch {
                    expected: mass.nrows(),
                    actual: len,
                });
            }
        }
        self.system.values_mut().copy_from_slice(mass.values());
        apply_boundary_values(&mut self.system, rhs, solution, boundary_values)?;

        let result = ConjugateGradient::with_workspace(&mut self.workspace)
            .with_operator(&self.system)
            .with_stopping_criterion(AbsoluteResidualCriterion::new(accuracy.residual))
            .with_max_iter(accuracy.max_iterations)
            .solve_with_guess(&*rhs, &mut *solution);

        let status = match result {
            Ok(output) => SolveStatus::Converged {
                iterations: output.num_iterations,
                residual: output.residual_norm,
            },
            Err(err) if err.kind.is_numerical() => {
                let iterations = err.output.num_iterations;
                let residual = err.output.residual_norm;
                let status = match &err.kind {
                    SolveErrorKind::MaxIterationsReached { .. } => SolveStatus::NotConverged { iterations, residual },
                    _ => SolveStatus::Breakdown { iterations, residual },
                };
                warn!("Solve for {} did not converge: {}", field, err);
                status
            }
            Err(err) => {
                return Err(SolverError::LinearSolve {
                    field: field.to_string(),
                    message: err.to_string(),
                })
            }
        };

        constraints.distribute(solution);
        debug!("Solve for {}: {}", field, status);
        Ok(status)
    }
}
