//! Assembly helpers for CSR matrices.
use core::fmt;
use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut, RealField, Scalar};
use nalgebra_sparse::ops::serial::spmm_csr_dense;
use nalgebra_sparse::ops::Op;
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use num::Zero;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;

/// Builds the symmetric sparsity pattern that couples every pair of dofs sharing a cell.
///
/// Each item of `cells` is the list of global dof indices of one cell.
pub fn assemble_pattern<'a, I>(num_dofs: usize, cells: I) -> SparsityPattern
where
    I: IntoIterator<Item = &'a [usize]>,
{
    let mut rows = vec![BTreeSet::new(); num_dofs];
    for cell_dofs in cells {
        for &row in cell_dofs {
            rows[row].extend(cell_dofs.iter().copied());
        }
    }

    let mut offsets = Vec::with_capacity(num_dofs + 1);
    let mut column_indices = Vec::new();
    offsets.push(0);
    for row in rows {
        column_indices.extend(row);
        offsets.push(column_indices.len());
    }

    SparsityPattern::try_from_offsets_and_indices(num_dofs, num_dofs, offsets, column_indices)
        .expect("Internal error: pattern assembled from sorted rows must be valid")
}

/// Creates a zero-valued CSR matrix with the given pattern.
pub fn zeros_from_pattern<T: Scalar + Zero>(pattern: SparsityPattern) -> CsrMatrix<T> {
    let nnz = pattern.nnz();
    CsrMatrix::try_from_pattern_and_values(pattern, vec![T::zero(); nnz])
        .expect("Internal error: value count matches pattern")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingEntryError {
    pub row: usize,
    pub col: usize,
}

impl fmt::Display for MissingEntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entry ({}, {}) is not part of the sparsity pattern",
            self.row, self.col
        )
    }
}

impl Error for MissingEntryError {}

/// Adds a dense cell matrix into the global CSR matrix.
///
/// `local[(a, b)]` is added to the global entry `(dofs[a], dofs[b])`.
pub fn add_local_matrix<T>(
    matrix: &mut CsrMatrix<T>,
    dofs: &[usize],
    local: &DMatrix<T>,
) -> Result<(), MissingEntryError>
where
    T: RealField + Copy,
{
    assert_eq!(local.nrows(), dofs.len());
    assert_eq!(local.ncols(), dofs.len());
    for (a, &row) in dofs.iter().enumerate() {
        let mut csr_row = matrix.row_mut(row);
        let (cols, values) = csr_row.cols_and_values_mut();
        for (b, &col) in dofs.iter().enumerate() {
            let idx = cols
                .binary_search(&col)
                .map_err(|_| MissingEntryError { row, col })?;
            values[idx] += local[(a, b)];
        }
    }
    Ok(())
}

/// Computes `y += A x`.
pub fn mul_add<'a, T>(matrix: &CsrMatrix<T>, x: impl Into<DVectorView<'a, T>>, y: impl Into<DVectorViewMut<'a, T>>)
where
    T: RealField + Copy,
{
    let x = x.into();
    let mut y = y.into();
    spmm_csr_dense(T::one(), &mut y, T::one(), Op::NoOp(matrix), Op::NoOp(&x));
}

/// Substitutes Dirichlet values into an assembled symmetric system `A x = b`.
///
/// For every constrained dof `i` with value `v`, row `i` is reduced to its diagonal `d`,
/// `b_i = d v` and `x_i = v`. Column `i` is eliminated from the remaining rows by moving
/// `A_ji v` to the right-hand side, so that the system stays symmetric. A zero diagonal is
/// replaced by the mean absolute diagonal of the matrix.
///
/// The matrix must have a structurally symmetric pattern.
pub fn apply_boundary_values<T>(
    matrix: &mut CsrMatrix<T>,
    rhs: &mut DVector<T>,
    solution: &mut DVector<T>,
    boundary_values: &BTreeMap<usize, T>,
) -> Result<(), MissingEntryError>
where
    T: RealField + Copy,
{
    assert_eq!(matrix.nrows(), matrix.ncols(), "Matrix must be square.");
    assert_eq!(rhs.len(), matrix.nrows());
    assert_eq!(solution.len(), matrix.nrows());

    if boundary_values.is_empty() {
        return Ok(());
    }

    let fallback_diagonal = mean_absolute_diagonal(matrix);
    let mut coupled = Vec::new();

    for (&i, &value) in boundary_values {
        coupled.clear();
        let diagonal = {
            let mut row = matrix.row_mut(i);
            let (cols, values) = row.cols_and_values_mut();
            let mut diagonal = None;
            for (&j, a_ij) in cols.iter().zip(values.iter_mut()) {
                if j == i {
                    if *a_ij == T::zero() {
                        *a_ij = fallback_diagonal;
                    }
                    diagonal = Some(*a_ij);
                } else {
                    coupled.push(j);
                    *a_ij = T::zero();
                }
            }
            diagonal.ok_or(MissingEntryError { row: i, col: i })?
        };

        rhs[i] = diagonal * value;
        solution[i] = value;

        for &j in &coupled {
            let mut row = matrix.row_mut(j);
            let (cols, values) = row.cols_and_values_mut();
            let idx = cols
                .binary_search(&i)
                .map_err(|_| MissingEntryError { row: j, col: i })?;
            rhs[j] -= values[idx] * value;
            values[idx] = T::zero();
        }
    }

    Ok(())
}

fn mean_absolute_diagonal<T: RealField + Copy>(matrix: &CsrMatrix<T>) -> T {
    let mut sum = T::zero();
    let mut count = 0usize;
    for (i, row) in matrix.row_iter().enumerate() {
        if let Ok(idx) = row.col_indices().binary_search(&i) {
            let d = row.values()[idx].abs();
            if d != T::zero() {
                sum += d;
                count += 1;
            }
        }
    }
    if count == 0 {
        T::one()
    } else {
        sum / nalgebra::convert::<f64, T>(count as f64)
    }
}
