//! Clarabel interior-point backend.

use super::problem::{Cone, ConicProblem};
use super::sparse::SparseMatrix;
use super::{ConicSolution, ConicSolver, SolveStatus, SolverSettings};
use crate::error::{MathError, MathResult};

use ::clarabel::algebra::CscMatrix;
// Glob import brings the `IPSolver` trait that provides `solve()`.
use ::clarabel::solver::*;

/// [`ConicSolver`] backed by the Clarabel interior-point method.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClarabelSolver {
    settings: SolverSettings,
}

impl ClarabelSolver {
    /// Creates a solver with explicit settings.
    #[must_use]
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Borrow the solver settings.
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }
}

fn to_csc(matrix: &SparseMatrix) -> CscMatrix<f64> {
    CscMatrix::new(
        matrix.nrows(),
        matrix.ncols(),
        matrix.colptr().to_vec(),
        matrix.rowval().to_vec(),
        matrix.nzval().to_vec(),
    )
}

fn to_cone(cone: Cone) -> SupportedConeT<f64> {
    match cone {
        Cone::Zero(d) => SupportedConeT::ZeroConeT(d),
        Cone::Nonnegative(d) => SupportedConeT::NonnegativeConeT(d),
        Cone::SecondOrder(d) => SupportedConeT::SecondOrderConeT(d),
    }
}

fn map_status(status: SolverStatus) -> SolveStatus {
    match status {
        SolverStatus::Solved => SolveStatus::Optimal,
        SolverStatus::AlmostSolved => SolveStatus::OptimalInaccurate,
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            SolveStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            SolveStatus::Unbounded
        }
        _ => SolveStatus::SolverError,
    }
}

impl ConicSolver for ClarabelSolver {
    fn solve(&self, problem: &ConicProblem) -> MathResult<ConicSolution> {
        let p = to_csc(problem.p());
        let a = to_csc(problem.a());
        let cones: Vec<SupportedConeT<f64>> = problem.cones().iter().copied().map(to_cone).collect();

        let settings = DefaultSettingsBuilder::default()
            .max_iter(self.settings.max_iter)
            .time_limit(self.settings.time_limit.unwrap_or(f64::INFINITY))
            .tol_gap_abs(self.settings.tol_gap_abs)
            .tol_gap_rel(self.settings.tol_gap_rel)
            .tol_feas(self.settings.tol_feas)
            .verbose(self.settings.verbose)
            .build()
            .map_err(|e| MathError::solver_setup(format!("invalid settings: {e}")))?;

        let mut solver = DefaultSolver::new(&p, problem.q(), &a, problem.b(), &cones, settings)
            .map_err(|e| MathError::solver_setup(format!("{e:?}")))?;
        solver.solve();

        let status = map_status(solver.solution.status);
        log::debug!(
            "clarabel finished: status={:?} iterations={} vars={} rows={}",
            solver.solution.status,
            solver.solution.iterations,
            problem.num_vars(),
            problem.num_rows()
        );

        Ok(ConicSolution {
            status,
            x: solver.solution.x.clone(),
            objective_value: solver.solution.obj_val,
            iterations: solver.solution.iterations,
            solve_time: solver.solution.solve_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{LinearConstraint, ProblemBuilder};
    use approx::assert_abs_diff_eq;
    use nalgebra::DMatrix;

    #[test]
    fn test_equality_constrained_qp() {
        // minimize x₀² + 2x₁² subject to x₀ + x₁ = 1  →  x = (2/3, 1/3)
        let q = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 2.0]);
        let problem = ProblemBuilder::new(2)
            .quadratic_form(0, &q, 1.0)
            .constraint(LinearConstraint::equal(vec![(0, 1.0), (1, 1.0)], 1.0))
            .build()
            .unwrap();

        let solution = ClarabelSolver::default().solve(&problem).unwrap();

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_abs_diff_eq!(solution.x[0], 2.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.x[1], 1.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_bound_constrained_lp() {
        // maximize x subject to x ≤ 3
        let problem = ProblemBuilder::new(1)
            .linear(0, -1.0)
            .constraint(LinearConstraint::less_equal(vec![(0, 1.0)], 3.0))
            .build()
            .unwrap();

        let solution = ClarabelSolver::default().solve(&problem).unwrap();

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_abs_diff_eq!(solution.x[0], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_infeasible_program() {
        let problem = ProblemBuilder::new(1)
            .constraint(LinearConstraint::greater_equal(vec![(0, 1.0)], 2.0))
            .constraint(LinearConstraint::less_equal(vec![(0, 1.0)], 1.0))
            .build()
            .unwrap();

        let solution = ClarabelSolver::default().solve(&problem).unwrap();
        assert_eq!(solution.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_unbounded_program() {
        // maximize x with no upper bound
        let problem = ProblemBuilder::new(1)
            .linear(0, -1.0)
            .constraint(LinearConstraint::greater_equal(vec![(0, 1.0)], 0.0))
            .build()
            .unwrap();

        let solution = ClarabelSolver::default().solve(&problem).unwrap();
        assert_eq!(solution.status, SolveStatus::Unbounded);
    }

    #[test]
    fn test_second_order_cone() {
        // minimize t subject to ‖(x₀ − 3, x₁ − 4)‖ ≤ t, x free  →  t = 0
        // then pin x₀ = 0, x₁ = 0  →  t = 5
        let problem = ProblemBuilder::new(3)
            .linear(2, 1.0)
            .constraint(LinearConstraint::equal(vec![(0, 1.0)], 0.0))
            .constraint(LinearConstraint::equal(vec![(1, 1.0)], 0.0))
            .second_order(vec![
                (vec![(2, -1.0)], 0.0),
                (vec![(0, -1.0)], -3.0),
                (vec![(1, -1.0)], -4.0),
            ])
            .build()
            .unwrap();

        let solution = ClarabelSolver::default().solve(&problem).unwrap();

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_abs_diff_eq!(solution.x[2], 5.0, epsilon = 1e-5);
    }
}
