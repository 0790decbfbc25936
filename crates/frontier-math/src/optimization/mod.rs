//! Conic optimization.
//!
//! This module models quadratic and second-order cone programs and hands
//! them to an interior-point backend through the [`ConicSolver`] trait.
//!
//! - [`ProblemBuilder`] / [`ConicProblem`]: sparse program assembly
//! - [`ConicSolver`]: the solve capability consumed by the portfolio layer
//! - [`ClarabelSolver`]: default backend built on `clarabel`
//!
//! # Example
//!
//! ```rust
//! use frontier_math::optimization::{
//!     ClarabelSolver, ConicSolver, LinearConstraint, ProblemBuilder, SolveStatus,
//! };
//! use nalgebra::DMatrix;
//!
//! // minimize x₀² + x₁² subject to x₀ + x₁ = 1
//! let problem = ProblemBuilder::new(2)
//!     .quadratic_form(0, &DMatrix::identity(2, 2), 1.0)
//!     .constraint(LinearConstraint::equal(vec![(0, 1.0), (1, 1.0)], 1.0))
//!     .build()
//!     .unwrap();
//!
//! let solution = ClarabelSolver::default().solve(&problem).unwrap();
//! assert_eq!(solution.status, SolveStatus::Optimal);
//! assert!((solution.x[0] - 0.5).abs() < 1e-6);
//! ```

mod backend;
mod problem;
mod sparse;

pub use backend::ClarabelSolver;
pub use problem::{
    diagonal_form_triplets, quadratic_form_triplets, Cone, ConicProblem, LinearConstraint,
    ProblemBuilder, Sense,
};
pub use sparse::SparseMatrix;

use crate::error::MathResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a conic solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Solved to the requested tolerances.
    Optimal,
    /// Solved to reduced tolerances.
    OptimalInaccurate,
    /// The constraints admit no point.
    Infeasible,
    /// The objective is unbounded over the feasible set.
    Unbounded,
    /// Iteration/time limit, numerical trouble, or setup rejection.
    SolverError,
}

impl SolveStatus {
    /// True when a primal solution is available.
    #[must_use]
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::OptimalInaccurate)
    }

    /// True only for a full-accuracy optimum.
    #[must_use]
    pub fn is_optimal(self) -> bool {
        self == SolveStatus::Optimal
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::OptimalInaccurate => "optimal_inaccurate",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::SolverError => "solver_error",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interior-point solver settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Maximum interior-point iterations.
    pub max_iter: u32,
    /// Wall-clock limit in seconds (`None` for no limit).
    pub time_limit: Option<f64>,
    /// Absolute duality-gap tolerance.
    pub tol_gap_abs: f64,
    /// Relative duality-gap tolerance.
    pub tol_gap_rel: f64,
    /// Feasibility tolerance.
    pub tol_feas: f64,
    /// Print solver progress.
    pub verbose: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iter: 200,
            time_limit: None,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
            tol_feas: 1e-8,
            verbose: false,
        }
    }
}

impl SolverSettings {
    /// Sets the iteration limit.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the time limit in seconds.
    #[must_use]
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    /// Sets all three convergence tolerances at once.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tol_gap_abs = tolerance;
        self.tol_gap_rel = tolerance;
        self.tol_feas = tolerance;
        self
    }

    /// Enables or disables solver output.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Primal result of a conic solve.
#[derive(Debug, Clone)]
pub struct ConicSolution {
    /// Termination status.
    pub status: SolveStatus,
    /// Primal point (meaningful only if `status.has_solution()`).
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub objective_value: f64,
    /// Interior-point iterations used.
    pub iterations: u32,
    /// Solve time in seconds.
    pub solve_time: f64,
}

/// A convex conic solve capability.
///
/// Implementations must be free of side effects visible to callers: the
/// same problem solved twice yields the same status.
pub trait ConicSolver {
    /// Solves the program.
    ///
    /// Returns `Err` only when the backend refuses the program data;
    /// infeasible or unbounded programs are reported through
    /// [`ConicSolution::status`].
    fn solve(&self, problem: &ConicProblem) -> MathResult<ConicSolution>;
}

impl<S: ConicSolver + ?Sized> ConicSolver for &S {
    fn solve(&self, problem: &ConicProblem) -> MathResult<ConicSolution> {
        (**self).solve(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_helpers() {
        assert!(SolveStatus::Optimal.has_solution());
        assert!(SolveStatus::OptimalInaccurate.has_solution());
        assert!(!SolveStatus::OptimalInaccurate.is_optimal());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert_eq!(SolveStatus::SolverError.to_string(), "solver_error");
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&SolveStatus::OptimalInaccurate).unwrap();
        assert_eq!(json, "\"optimal_inaccurate\"");
        let parsed: SolveStatus = serde_json::from_str("\"unbounded\"").unwrap();
        assert_eq!(parsed, SolveStatus::Unbounded);
    }

    #[test]
    fn test_settings_builder() {
        let settings = SolverSettings::default()
            .with_max_iter(50)
            .with_tolerance(1e-6)
            .with_time_limit(2.0);

        assert_eq!(settings.max_iter, 50);
        assert_eq!(settings.tol_feas, 1e-6);
        assert_eq!(settings.time_limit, Some(2.0));
        assert!(!settings.verbose);
    }

    #[test]
    fn test_settings_partial_deserialize() {
        let settings: SolverSettings = serde_json::from_str(r#"{"max_iter": 75}"#).unwrap();
        assert_eq!(settings.max_iter, 75);
        assert_eq!(settings.tol_gap_abs, 1e-8);
    }
}
