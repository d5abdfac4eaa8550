//! Affine dof constraints `x_c = Σ_j w_j x_j + b`.
//!
//! Conforming meshes produce no constraints, but every cell contribution is still routed through
//! [`AffineConstraints`] so that meshes with hanging nodes only need to add lines.
use crate::error::SolverError;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintLine {
    /// Master dofs and their weights.
    pub entries: Vec<(usize, f64)>,
    pub inhomogeneity: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffineConstraints {
    lines: BTreeMap<usize, ConstraintLine>,
    closed: bool,
}

impl AffineConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrains `dof` to `Σ w_j x_j + inhomogeneity`. Replaces any previous line for `dof`.
    pub fn add_line(&mut self, dof: usize, entries: Vec<(usize, f64)>, inhomogeneity: f64) {
        self.lines.insert(dof, ConstraintLine { entries, inhomogeneity });
        self.closed = false;
    }

    /// Checks that no line refers to another constrained dof.
    pub fn close(&mut self) -> Result<(), SolverError> {
        for (&dof, line) in &self.lines {
            if let Some(&(master, _)) = line
                .entries
                .iter()
                .find(|(master, _)| self.lines.contains_key(master))
            {
                return Err(SolverError::ChainedConstraint { dof, master });
            }
        }
        self.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_constrained(&self, dof: usize) -> bool {
        self.lines.contains_key(&dof)
    }

    pub fn line(&self, dof: usize) -> Option<&ConstraintLine> {
        self.lines.get(&dof)
    }

    /// Cell dofs extended by the masters of constrained dofs, for building sparsity patterns.
    pub fn expand_dofs(&self, dofs: &[usize], output: &mut Vec<usize>) {
        output.clear();
        output.extend_from_slice(dofs);
        for dof in dofs {
            if let Some(line) = self.lines.get(dof) {
                output.extend(line.entries.iter().map(|(master, _)| *master));
            }
        }
        output.sort_unstable();
        output.dedup();
    }

    /// Adds a cell vector to the global vector, moving contributions of constrained dofs to their
    /// masters.
    pub fn distribute_local_to_global_vector(&self, local: &[f64], dofs: &[usize], global: &mut DVector<f64>) {
        debug_assert_eq!(local.len(), dofs.len());
        if self.lines.is_empty() {
            for (&dof, value) in dofs.iter().zip(local) {
                global[dof] += value;
            }
            return;
        }

        for (&dof, &value) in dofs.iter().zip(local) {
            match self.lines.get(&dof) {
                Some(line) => {
                    for &(master, weight) in &line.entries {
                        global[master] += weight * value;
                    }
                }
                None => global[dof] += value,
            }
        }
    }

    /// Adds a cell matrix to the global matrix, condensing constrained rows and columns onto their
    /// masters. Constrained dofs keep the cell diagonal on their own diagonal entry so that the
    /// global matrix stays invertible.
    pub fn distribute_local_to_global_matrix(
        &self,
        local: &DMatrix<f64>,
        dofs: &[usize],
        matrix: &mut CsrMatrix<f64>,
    ) -> Result<(), SolverError> {
        if self.lines.is_empty() {
            spacetime_sparse::csr::add_local_matrix(matrix, dofs, local)?;
            return Ok(());
        }

        let expand = |dof: usize| -> Vec<(usize, f64)> {
            match self.lines.get(&dof) {
                Some(line) => line.entries.clone(),
                None => vec![(dof, 1.0)],
            }
        };

        for (a, &dof_a) in dofs.iter().enumerate() {
            let rows = expand(dof_a);
            for (b, &dof_b) in dofs.iter().enumerate() {
                let value = local[(a, b)];
                for &(row, row_weight) in &rows {
                    for (col, col_weight) in expand(dof_b) {
                        add_entry(matrix, row, col, row_weight * col_weight * value)?;
                    }
                }
            }
            if self.lines.contains_key(&dof_a) {
                add_entry(matrix, dof_a, dof_a, local[(a, a)])?;
            }
        }
        Ok(())
    }

    /// Sets every constrained entry of `solution` from its masters.
    pub fn distribute(&self, solution: &mut DVector<f64>) {
        for (&dof, line) in &self.lines {
            solution[dof] = line
                .entries
                .iter()
                .map(|&(master, weight)| weight * solution[master])
                .sum::<f64>()
                + line.inhomogeneity;
        }
    }
}

fn add_entry(matrix: &mut CsrMatrix<f64>, row: usize, col: usize, value: f64) -> Result<(), SolverError> {
    let mut csr_row = matrix.row_mut(row);
    let (cols, values) = csr_row.cols_and_values_mut();
    let idx = cols
        .binary_search(&col)
        .map_err(|_| spacetime_sparse::csr::MissingEntryError { row, col })?;
    values[idx] += value;
    Ok(())
}
