//! Finite element evolution of the 3+1 ADM equations on hexahedral meshes.
//!
//! The spatial metric, the extrinsic curvature and the lapse are represented as 13 scalar
//! Lagrange fields on a shared [`space::FiniteElementSpace`]. An [`evolution::Evolution`] advances
//! them with an explicit weak-form update in which every component is projected back onto the
//! finite element space with a mass matrix solve.
pub mod adm;
pub mod assembly;
pub mod config;
pub mod constraints;
pub mod curvature;
pub mod element;
pub mod error;
pub mod evolution;
pub mod fields;
pub mod mesh;
pub mod nbody;
pub mod problem;
pub mod quadrature;
pub mod reorder;
pub mod sampler;
pub mod solve;
pub mod solver;
pub mod source;
pub mod space;
pub mod tensor;

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
pub extern crate spacetime_sparse;

pub use error::{ConfigError, ParticleNotFound, SolverError};
pub use tensor::{Slot, Sym3};
