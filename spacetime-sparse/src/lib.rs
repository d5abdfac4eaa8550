//! Sparse linear algebra used by the `spacetime` evolution kernel.
//!
//! The crate covers the three things the kernel needs from a sparse backend: building a CSR
//! sparsity pattern from cell connectivity and accumulating dense cell matrices into it,
//! Dirichlet substitution on an assembled system, and a preconditioned conjugate gradient solver.

pub mod cg;
pub mod csr;

pub use nalgebra_sparse::pattern::SparsityPattern;
pub use nalgebra_sparse::CsrMatrix;
