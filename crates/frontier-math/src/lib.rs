//! # Frontier Math
//!
//! Mathematical utilities for the Frontier portfolio optimization library.
//!
//! This crate provides:
//!
//! - **Linear Algebra**: Symmetry and PSD checks, quadratic forms, extreme eigenpairs
//! - **Optimization**: Sparse conic program assembly and a pluggable
//!   interior-point solve capability (Clarabel backend)
//!
//! ## Design Philosophy
//!
//! - **Solver as a collaborator**: Programs are plain data; solving goes
//!   through the [`optimization::ConicSolver`] trait
//! - **Outcomes are data**: Infeasible and unbounded programs are statuses,
//!   only malformed input is an error
//! - **Dense in, sparse out**: Callers hand over `nalgebra` matrices, the
//!   backend receives CSC storage

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::float_cmp)]
#![allow(clippy::uninlined_format_args)]

pub mod error;
pub mod linear_algebra;
pub mod optimization;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::linear_algebra::{
        check_positive_semidefinite, check_shape, check_symmetric, min_eigenpair, quad_form,
        PSD_TOLERANCE, SYMMETRY_TOLERANCE,
    };
    pub use crate::optimization::{
        ClarabelSolver, Cone, ConicProblem, ConicSolution, ConicSolver, LinearConstraint,
        ProblemBuilder, Sense, SolveStatus, SolverSettings, SparseMatrix,
    };
}

pub use error::{MathError, MathResult};
