//! Parametrized Markowitz program.
//!
//! A [`MarkowitzProblem`] holds an assembled conic program whose only
//! parameter is the risk aversion γ. Constraint rows, cones and the linear
//! cost are built once; changing γ rescales the stored unit-γ quadratic
//! cost in place, which is what makes risk-curve sweeps cheap.

use crate::constraints::{build_constraints, VariableLayout};
use crate::error::{PortfolioError, PortfolioResult};
use crate::risk_model::RiskModel;
use crate::types::{ConstraintSet, OptimizationResult};
use frontier_math::optimization::{
    ClarabelSolver, ConicProblem, ConicSolution, ConicSolver, ProblemBuilder, SolveStatus,
    SparseMatrix,
};
use nalgebra::DVector;
use tracing::{debug, warn};

/// Checks a risk-aversion value.
pub fn validate_risk_aversion(gamma: f64) -> PortfolioResult<()> {
    if !gamma.is_finite() || gamma < 0.0 {
        return Err(PortfolioError::InvalidRiskAversion { gamma });
    }
    Ok(())
}

/// An assembled Markowitz program, re-solvable at different risk aversions.
///
/// Solves `min γ·variance(w) − μ'w` subject to the constraint set.
#[derive(Debug, Clone)]
pub struct MarkowitzProblem<S = ClarabelSolver> {
    solver: S,
    layout: VariableLayout,
    expected_returns: DVector<f64>,
    risk_model: RiskModel,
    unit_quadratic: SparseMatrix,
    program: ConicProblem,
    risk_aversion: f64,
}

impl<S: ConicSolver> MarkowitzProblem<S> {
    /// Assembles the program. Inputs are assumed validated by the caller.
    pub(crate) fn assemble(
        solver: S,
        expected_returns: DVector<f64>,
        risk_model: RiskModel,
        constraints: &ConstraintSet,
        leverage_limit: f64,
        risk_aversion: f64,
    ) -> PortfolioResult<Self> {
        validate_risk_aversion(risk_aversion)?;

        let n = expected_returns.len();
        risk_model.validate(n)?;
        let layout = VariableLayout::for_constraints(n, risk_model.num_factors(), constraints);
        let rows = build_constraints(constraints, leverage_limit, &layout, risk_model.loadings())?;

        let unit_quadratic = SparseMatrix::from_triplets(
            layout.num_vars(),
            layout.num_vars(),
            &risk_model.quadratic_triplets(layout.weights().start, layout.factors().start),
        )?;

        let builder = layout
            .weights()
            .zip(expected_returns.iter())
            .fold(ProblemBuilder::new(layout.num_vars()), |b, (i, mu)| b.linear(i, -mu));
        let mut program = builder.constraints(rows).build()?;
        program.set_quadratic(unit_quadratic.scaled(risk_aversion))?;

        debug!(
            assets = n,
            factors = layout.num_factors(),
            vars = layout.num_vars(),
            rows = program.num_rows(),
            "assembled markowitz program"
        );

        Ok(Self {
            solver,
            layout,
            expected_returns,
            risk_model,
            unit_quadratic,
            program,
            risk_aversion,
        })
    }

    /// Current risk aversion.
    #[must_use]
    pub fn risk_aversion(&self) -> f64 {
        self.risk_aversion
    }

    /// Changes γ in place. Constraint data is untouched.
    pub fn set_risk_aversion(&mut self, gamma: f64) -> PortfolioResult<()> {
        validate_risk_aversion(gamma)?;
        self.program.set_quadratic(self.unit_quadratic.scaled(gamma))?;
        self.risk_aversion = gamma;
        Ok(())
    }

    /// Variable layout of the program.
    #[must_use]
    pub fn layout(&self) -> &VariableLayout {
        &self.layout
    }

    /// The assembled conic program at the current γ.
    #[must_use]
    pub fn program(&self) -> &ConicProblem {
        &self.program
    }

    /// The risk model.
    #[must_use]
    pub fn risk_model(&self) -> &RiskModel {
        &self.risk_model
    }

    /// Expected returns μ.
    #[must_use]
    pub fn expected_returns(&self) -> &DVector<f64> {
        &self.expected_returns
    }

    /// Solves at the current γ.
    ///
    /// Never fails: solver rejections and non-optimal outcomes are
    /// reported through the result's status.
    pub fn solve(&self) -> OptimizationResult {
        let gamma = self.risk_aversion;
        let solution = match self.solver.solve(&self.program) {
            Ok(solution) => solution,
            Err(e) => {
                warn!(gamma, error = %e, "solver rejected markowitz program");
                return OptimizationResult::without_solution(SolveStatus::SolverError, gamma, 0);
            }
        };

        debug!(
            gamma,
            status = %solution.status,
            iterations = solution.iterations,
            "markowitz solve finished"
        );

        if !solution.status.has_solution() {
            warn!(gamma, status = %solution.status, "markowitz solve produced no solution");
            return OptimizationResult::without_solution(solution.status, gamma, solution.iterations);
        }
        if solution.x.len() != self.layout.num_vars() {
            warn!(
                gamma,
                expected = self.layout.num_vars(),
                actual = solution.x.len(),
                "solver returned a point of the wrong length"
            );
            return OptimizationResult::without_solution(
                SolveStatus::SolverError,
                gamma,
                solution.iterations,
            );
        }

        self.extract(&solution)
    }

    fn extract(&self, solution: &ConicSolution) -> OptimizationResult {
        let weights = DVector::from_column_slice(&solution.x[self.layout.weights()]);
        let portfolio_return = self.expected_returns.dot(&weights);
        let portfolio_variance = self.risk_model.variance(&weights).ok();
        let factor_exposures = if self.layout.num_factors() > 0 {
            Some(solution.x[self.layout.factors()].to_vec())
        } else {
            None
        };

        OptimizationResult {
            status: solution.status,
            risk_aversion: self.risk_aversion,
            weights: Some(weights.as_slice().to_vec()),
            portfolio_return: Some(portfolio_return),
            portfolio_variance,
            factor_exposures,
            iterations: solution.iterations,
        }
    }
}
