//! Minimum-risk portfolio with a return floor.
//!
//! ```text
//! minimize   variance(w)
//! subject to Σw = 1,  μ'w ≥ target,  ‖w‖₁ ≤ gross_limit
//! ```

use crate::constraints::{factor_link, gross_exposure, sum_to_one, VariableLayout};
use crate::error::{PortfolioError, PortfolioResult};
use crate::risk_model::RiskModel;
use crate::types::{MinRiskConfig, MinimumRiskPortfolio};
use frontier_math::optimization::{
    ClarabelSolver, ConicSolver, LinearConstraint, ProblemBuilder, SolveStatus, SparseMatrix,
};
use nalgebra::DVector;
use tracing::{debug, warn};

/// Solver for the minimum-risk formulation.
#[derive(Debug, Clone, Default)]
pub struct MinimumRiskOptimizer<S = ClarabelSolver> {
    solver: S,
    config: MinRiskConfig,
}

impl MinimumRiskOptimizer {
    /// Creates an optimizer with the default backend.
    #[must_use]
    pub fn new(config: MinRiskConfig) -> Self {
        Self::with_solver(ClarabelSolver::default(), config)
    }
}

impl<S: ConicSolver> MinimumRiskOptimizer<S> {
    /// Creates an optimizer around a custom solver.
    #[must_use]
    pub fn with_solver(solver: S, config: MinRiskConfig) -> Self {
        Self { solver, config }
    }

    /// Settings in use.
    #[must_use]
    pub fn config(&self) -> &MinRiskConfig {
        &self.config
    }

    /// Finds the lowest-variance fully invested portfolio whose expected
    /// return is at least `target_return`.
    ///
    /// An unreachable target is reported as a non-optimal status.
    pub fn solve(
        &self,
        expected_returns: &DVector<f64>,
        risk_model: &RiskModel,
        target_return: f64,
    ) -> PortfolioResult<MinimumRiskPortfolio> {
        if !target_return.is_finite() {
            return Err(PortfolioError::invalid_parameter(
                "target_return",
                format!("must be finite, got {target_return}"),
            ));
        }
        self.config.validate()?;
        let n = expected_returns.len();
        if n == 0 {
            return Err(PortfolioError::invalid_input("asset universe is empty"));
        }
        risk_model.validate(n)?;

        let layout = VariableLayout::new(n)
            .with_factors(risk_model.num_factors())
            .with_leverage_aux(true);

        let mut rows = vec![sum_to_one(&layout)];
        rows.push(LinearConstraint::greater_equal(
            layout.weights().zip(expected_returns.iter()).map(|(i, m)| (i, *m)).collect(),
            target_return,
        ));
        rows.extend(gross_exposure(&layout, self.config.gross_limit)?);
        if let Some(loadings) = risk_model.loadings() {
            rows.extend(factor_link(&layout, loadings)?);
        }

        let mut program = ProblemBuilder::new(layout.num_vars()).constraints(rows).build()?;
        program.set_quadratic(SparseMatrix::from_triplets(
            layout.num_vars(),
            layout.num_vars(),
            &risk_model.quadratic_triplets(layout.weights().start, layout.factors().start),
        )?)?;

        let solution = match self.solver.solve(&program) {
            Ok(solution) => solution,
            Err(e) => {
                warn!(error = %e, "solver rejected minimum-risk program");
                return Ok(MinimumRiskPortfolio {
                    status: SolveStatus::SolverError,
                    weights: None,
                });
            }
        };
        debug!(
            target_return,
            status = %solution.status,
            iterations = solution.iterations,
            "minimum-risk solve finished"
        );

        if !solution.status.has_solution() || solution.x.len() != layout.num_vars() {
            warn!(target_return, status = %solution.status, "minimum-risk portfolio not found");
            return Ok(MinimumRiskPortfolio {
                status: solution.status,
                weights: None,
            });
        }

        Ok(MinimumRiskPortfolio {
            status: solution.status,
            weights: Some(solution.x[layout.weights()].to_vec()),
        })
    }
}

/// Minimum-risk portfolio with the default backend and settings.
pub fn minimum_risk_portfolio(
    expected_returns: &DVector<f64>,
    risk_model: &RiskModel,
    target_return: f64,
) -> PortfolioResult<MinimumRiskPortfolio> {
    MinimumRiskOptimizer::new(MinRiskConfig::default()).solve(expected_returns, risk_model, target_return)
}
