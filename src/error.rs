//! Error types.
use spacetime_sparse::csr::MissingEntryError;
use std::error::Error;
use std::fmt;

/// A descriptor failed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A quantity that must be positive and finite was not.
    NotPositive { name: &'static str, value: f64 },
    /// The inner radius of a shell is not smaller than its outer radius.
    InvalidShell { inner_radius: f64, outer_radius: f64 },
    /// Uniform refinement beyond what the solver accepts.
    RefinementTooLarge { refinement: u32, max: u32 },
    /// A CG solve must be allowed at least one iteration.
    ZeroIterations { equation: &'static str },
    /// The time step is negative or not finite.
    InvalidTimeStep(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPositive { name, value } => {
                write!(f, "{} must be positive and finite, got {}", name, value)
            }
            Self::InvalidShell {
                inner_radius,
                outer_radius,
            } => write!(
                f,
                "Shell inner radius {} must be smaller than outer radius {}",
                inner_radius, outer_radius
            ),
            Self::RefinementTooLarge { refinement, max } => {
                write!(f, "Refinement level {} exceeds maximum of {}", refinement, max)
            }
            Self::ZeroIterations { equation } => {
                write!(f, "Iteration cap of the {} solve must be at least 1", equation)
            }
            Self::InvalidTimeStep(dt) => write!(f, "Time step must be non-negative and finite, got {}", dt),
        }
    }
}

impl Error for ConfigError {}

/// Failure of mesh setup, assembly or a linear solve.
#[derive(Debug)]
#[non_exhaustive]
pub enum SolverError {
    Config(ConfigError),
    /// The mesh has no cells.
    EmptyMesh,
    /// The geometry map of a cell is singular or inverted at a quadrature point.
    SingularJacobian { cell: usize, determinant: f64 },
    /// Assembly touched a matrix entry outside the sparsity pattern.
    Pattern(MissingEntryError),
    /// The linear solver failed for a reason other than slow convergence or breakdown.
    LinearSolve { field: String, message: String },
    /// A constraint refers to a master dof that is itself constrained.
    ChainedConstraint { dof: usize, master: usize },
    /// A vector does not have one entry per dof.
    DofCountMismatch { expected: usize, actual: usize },
    /// A matrix does not have the sparsity pattern the consumer was set up with.
    PatternMismatch { expected_nnz: usize, actual_nnz: usize },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "Invalid configuration: {}", err),
            Self::EmptyMesh => write!(f, "Mesh has no cells"),
            Self::SingularJacobian { cell, determinant } => write!(
                f,
                "Singular element Jacobian encountered in cell {} (determinant {})",
                cell, determinant
            ),
            Self::Pattern(err) => write!(f, "Assembly error: {}", err),
            Self::LinearSolve { field, message } => write!(f, "Solve for {} failed: {}", field, message),
            Self::ChainedConstraint { dof, master } => write!(
                f,
                "Constraint of dof {} refers to constrained dof {}",
                dof, master
            ),
            Self::DofCountMismatch { expected, actual } => {
                write!(f, "Expected {} dofs, got {}", expected, actual)
            }
            Self::PatternMismatch {
                expected_nnz,
                actual_nnz,
            } => write!(
                f,
                "Matrix has {} nonzeros, but the solver was set up for {}",
                actual_nnz, expected_nnz
            ),
        }
    }
}

impl Error for SolverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Pattern(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for SolverError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<MissingEntryError> for SolverError {
    fn from(err: MissingEntryError) -> Self {
        Self::Pattern(err)
    }
}

/// A particle was requested by an index that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleNotFound {
    pub index: usize,
    pub count: usize,
}

impl fmt::Display for ParticleNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Particle {} not found ({} particles)", self.index, self.count)
    }
}

impl Error for ParticleNotFound {}
