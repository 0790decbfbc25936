//! Markowitz mean-variance optimizer.
//!
//! ```text
//! maximize   μ'w − γ·variance(w)
//! subject to the requested constraint set
//! ```

use crate::constraints::{validate_leverage_limit, DEFAULT_LEVERAGE_LIMIT};
use crate::error::{PortfolioError, PortfolioResult};
use crate::problem::MarkowitzProblem;
use crate::risk_model::RiskModel;
use crate::types::{ConstraintSet, OptimizationResult};
use frontier_math::optimization::{ClarabelSolver, ConicSolver, SolverSettings};
use nalgebra::{DMatrix, DVector};

/// Builder for a [`MarkowitzOptimizer`].
///
/// Every input is validated in [`build`](Self::build), before any solve is
/// attempted.
///
/// # Example
///
/// ```rust
/// use frontier_portfolio::prelude::*;
/// use nalgebra::{DMatrix, DVector};
///
/// let optimizer = MarkowitzBuilder::new()
///     .expected_returns(DVector::from_vec(vec![0.10, 0.05, 0.08]))
///     .covariance(DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 2.0, 3.0])))
///     .constraints(["sum_to_one", "long_only"])
///     .risk_aversion(1.0)
///     .build()
///     .unwrap();
///
/// let result = optimizer.solve();
/// assert!(result.is_optimal());
/// ```
#[derive(Debug, Clone)]
pub struct MarkowitzBuilder<S = ClarabelSolver> {
    solver: S,
    num_assets: Option<usize>,
    expected_returns: Option<DVector<f64>>,
    risk_model: Option<RiskModel>,
    covariance: Option<DMatrix<f64>>,
    factor_covariance: Option<DMatrix<f64>>,
    idiosyncratic: Option<DMatrix<f64>>,
    loadings: Option<DMatrix<f64>>,
    constraint_names: Vec<String>,
    constraint_set: Option<ConstraintSet>,
    risk_aversion: f64,
    leverage_limit: f64,
}

impl Default for MarkowitzBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkowitzBuilder {
    /// Creates a builder using the default Clarabel backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_solver(ClarabelSolver::default())
    }

    /// Sets the Clarabel solver settings.
    #[must_use]
    pub fn settings(self, settings: SolverSettings) -> Self {
        self.solver(ClarabelSolver::new(settings))
    }
}

impl<S: ConicSolver> MarkowitzBuilder<S> {
    /// Creates a builder around a custom solver.
    #[must_use]
    pub fn with_solver(solver: S) -> Self {
        Self {
            solver,
            num_assets: None,
            expected_returns: None,
            risk_model: None,
            covariance: None,
            factor_covariance: None,
            idiosyncratic: None,
            loadings: None,
            constraint_names: Vec::new(),
            constraint_set: None,
            risk_aversion: 0.0,
            leverage_limit: DEFAULT_LEVERAGE_LIMIT,
        }
    }

    /// Replaces the solver.
    #[must_use]
    pub fn solver<T: ConicSolver>(self, solver: T) -> MarkowitzBuilder<T> {
        MarkowitzBuilder {
            solver,
            num_assets: self.num_assets,
            expected_returns: self.expected_returns,
            risk_model: self.risk_model,
            covariance: self.covariance,
            factor_covariance: self.factor_covariance,
            idiosyncratic: self.idiosyncratic,
            loadings: self.loadings,
            constraint_names: self.constraint_names,
            constraint_set: self.constraint_set,
            risk_aversion: self.risk_aversion,
            leverage_limit: self.leverage_limit,
        }
    }

    /// Declares the universe size. Optional; checked against every input.
    #[must_use]
    pub fn num_assets(mut self, n: usize) -> Self {
        self.num_assets = Some(n);
        self
    }

    /// Sets the expected return vector μ.
    #[must_use]
    pub fn expected_returns(mut self, mu: DVector<f64>) -> Self {
        self.expected_returns = Some(mu);
        self
    }

    /// Sets a prebuilt risk model.
    #[must_use]
    pub fn risk_model(mut self, model: RiskModel) -> Self {
        self.risk_model = Some(model);
        self
    }

    /// Uses a dense asset covariance Σ.
    #[must_use]
    pub fn covariance(mut self, sigma: DMatrix<f64>) -> Self {
        self.covariance = Some(sigma);
        self
    }

    /// Sets the factor covariance Σ_f (factor model).
    #[must_use]
    pub fn factor_covariance(mut self, sigma_f: DMatrix<f64>) -> Self {
        self.factor_covariance = Some(sigma_f);
        self
    }

    /// Sets the diagonal idiosyncratic covariance D (factor model).
    #[must_use]
    pub fn idiosyncratic(mut self, d: DMatrix<f64>) -> Self {
        self.idiosyncratic = Some(d);
        self
    }

    /// Sets the factor loadings F (factor model).
    #[must_use]
    pub fn loadings(mut self, f: DMatrix<f64>) -> Self {
        self.loadings = Some(f);
        self
    }

    /// Adds constraints by name.
    #[must_use]
    pub fn constraints<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.constraint_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Uses an already validated constraint set.
    #[must_use]
    pub fn constraint_set(mut self, set: ConstraintSet) -> Self {
        self.constraint_set = Some(set);
        self
    }

    /// Sets the risk aversion γ (default 0).
    #[must_use]
    pub fn risk_aversion(mut self, gamma: f64) -> Self {
        self.risk_aversion = gamma;
        self
    }

    /// Sets the leverage limit (default 1).
    #[must_use]
    pub fn leverage_limit(mut self, limit: f64) -> Self {
        self.leverage_limit = limit;
        self
    }

    fn resolve_risk_model(&mut self) -> PortfolioResult<RiskModel> {
        let has_factor_parts = self.factor_covariance.is_some()
            || self.idiosyncratic.is_some()
            || self.loadings.is_some();
        let sources = [self.risk_model.is_some(), self.covariance.is_some(), has_factor_parts]
            .into_iter()
            .filter(|s| *s)
            .count();
        if sources > 1 {
            return Err(PortfolioError::invalid_input(
                "supply exactly one of a risk model, a dense covariance or factor model parts",
            ));
        }

        if let Some(model) = self.risk_model.take() {
            Ok(model)
        } else if let Some(sigma) = self.covariance.take() {
            RiskModel::dense(sigma)
        } else if has_factor_parts {
            RiskModel::from_parts(
                self.factor_covariance.take(),
                self.idiosyncratic.take(),
                self.loadings.take(),
            )
        } else {
            Err(PortfolioError::missing_field("covariance"))
        }
    }

    /// Validates every input and assembles the optimizer.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - μ or the risk model is missing, or their sizes disagree
    /// - a constraint name is unknown, or two constraints conflict
    /// - γ is negative or the leverage limit is below 1
    /// - the covariance is not symmetric positive semidefinite
    pub fn build(mut self) -> PortfolioResult<MarkowitzOptimizer<S>> {
        let expected_returns = self
            .expected_returns
            .take()
            .ok_or_else(|| PortfolioError::missing_field("expected_returns"))?;

        let n = self.num_assets.unwrap_or(expected_returns.len());
        if expected_returns.len() != n {
            return Err(PortfolioError::dimension_mismatch(
                "expected_returns",
                n.to_string(),
                expected_returns.len().to_string(),
            ));
        }
        if n == 0 {
            return Err(PortfolioError::invalid_input("asset universe is empty"));
        }
        if let Some(i) = expected_returns.iter().position(|m| !m.is_finite()) {
            return Err(PortfolioError::invalid_input(format!(
                "expected return of asset {i} is not finite"
            )));
        }

        let constraints = match self.constraint_set.take() {
            Some(set) if self.constraint_names.is_empty() => set,
            Some(set) => {
                let mut names: Vec<String> =
                    set.iter().map(|k| k.as_str().to_string()).collect();
                names.append(&mut self.constraint_names);
                ConstraintSet::from_names(names)?
            }
            None => ConstraintSet::from_names(&self.constraint_names)?,
        };
        validate_leverage_limit(self.leverage_limit)?;

        let risk_model = self.resolve_risk_model()?;

        let problem = MarkowitzProblem::assemble(
            self.solver,
            expected_returns,
            risk_model,
            &constraints,
            self.leverage_limit,
            self.risk_aversion,
        )?;

        Ok(MarkowitzOptimizer {
            problem,
            constraints,
            leverage_limit: self.leverage_limit,
        })
    }
}

/// A validated Markowitz optimizer.
#[derive(Debug, Clone)]
pub struct MarkowitzOptimizer<S = ClarabelSolver> {
    problem: MarkowitzProblem<S>,
    constraints: ConstraintSet,
    leverage_limit: f64,
}

impl MarkowitzOptimizer {
    /// Starts a builder with the default backend.
    #[must_use]
    pub fn builder() -> MarkowitzBuilder {
        MarkowitzBuilder::new()
    }
}

impl<S: ConicSolver> MarkowitzOptimizer<S> {
    /// Number of assets.
    #[must_use]
    pub fn num_assets(&self) -> usize {
        self.problem.layout().num_assets()
    }

    /// Risk aversion the optimizer solves at.
    #[must_use]
    pub fn risk_aversion(&self) -> f64 {
        self.problem.risk_aversion()
    }

    /// Validated constraint set.
    #[must_use]
    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Leverage limit.
    #[must_use]
    pub fn leverage_limit(&self) -> f64 {
        self.leverage_limit
    }

    /// Risk model.
    #[must_use]
    pub fn risk_model(&self) -> &RiskModel {
        self.problem.risk_model()
    }

    /// Expected returns μ.
    #[must_use]
    pub fn expected_returns(&self) -> &DVector<f64> {
        self.problem.expected_returns()
    }

    /// Solves once at the configured γ.
    pub fn solve(&self) -> OptimizationResult {
        self.problem.solve()
    }

    /// A reusable problem handle whose γ can be changed between solves.
    #[must_use]
    pub fn problem(&self) -> MarkowitzProblem<S>
    where
        S: Clone,
    {
        self.problem.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConstraintKind;
    use approx::assert_abs_diff_eq;
    use frontier_math::optimization::SolveStatus;

    fn mu() -> DVector<f64> {
        DVector::from_vec(vec![0.1, 0.05, 0.08])
    }

    fn sigma() -> DMatrix<f64> {
        DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 2.0, 3.0]))
    }

    #[test]
    fn test_long_only_budget() {
        let result = MarkowitzBuilder::new()
            .expected_returns(mu())
            .covariance(sigma())
            .constraints(["sum_to_one", "long_only"])
            .risk_aversion(0.5)
            .build()
            .unwrap()
            .solve();

        assert_eq!(result.status, SolveStatus::Optimal);
        let w = result.weights.as_ref().unwrap();
        assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-6);
        assert!(w.iter().all(|x| *x >= -1e-6));
        let expected_return: f64 = w.iter().zip(mu().iter()).map(|(a, b)| a * b).sum();
        assert_abs_diff_eq!(result.portfolio_return.unwrap(), expected_return, epsilon = 1e-12);
    }

    #[test]
    fn test_leverage_limit_respected() {
        let mu = DVector::from_vec(vec![0.3, -0.2, 0.1]);
        let result = MarkowitzBuilder::new()
            .expected_returns(mu)
            .covariance(sigma() * 0.01)
            .constraints(["sum_to_one", "leverage_limit"])
            .leverage_limit(1.6)
            .risk_aversion(0.1)
            .build()
            .unwrap()
            .solve();

        assert!(result.is_optimal());
        assert!(result.gross_exposure().unwrap() <= 1.6 + 1e-6);
        assert_abs_diff_eq!(result.net_exposure().unwrap(), 1.0, epsilon = 1e-6);
        // shorting the negative-return asset is worth using the limit
        assert!(result.weights.unwrap()[1] < -1e-3);
    }

    #[test]
    fn test_eager_validation() {
        let base = || MarkowitzBuilder::new().expected_returns(mu()).covariance(sigma());

        assert!(matches!(
            base().constraints(["long_only", "leverage_limit"]).build(),
            Err(PortfolioError::ConflictingConstraints { .. })
        ));
        assert!(matches!(
            base().constraints(["no_such"]).build(),
            Err(PortfolioError::UnsupportedConstraint { .. })
        ));
        assert!(matches!(
            base().risk_aversion(-0.1).build(),
            Err(PortfolioError::InvalidRiskAversion { .. })
        ));
        assert!(matches!(
            base().leverage_limit(0.9).build(),
            Err(PortfolioError::InvalidParameter { .. })
        ));
        assert!(matches!(
            base().num_assets(4).build(),
            Err(PortfolioError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            MarkowitzBuilder::new().covariance(sigma()).build(),
            Err(PortfolioError::MissingField { .. })
        ));
        assert!(matches!(
            MarkowitzBuilder::new()
                .expected_returns(DVector::from_vec(vec![0.1, 0.2]))
                .covariance(sigma())
                .build(),
            Err(PortfolioError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_unchecked_risk_model_rejected_at_build() {
        let model = RiskModel::Dense {
            covariance: DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]),
        };
        let err = MarkowitzBuilder::new()
            .expected_returns(DVector::from_vec(vec![0.1, 0.05]))
            .risk_model(model)
            .constraints(["sum_to_one"])
            .build()
            .unwrap_err();

        assert!(matches!(
            err,
            PortfolioError::Math(frontier_math::MathError::NotPositiveSemidefinite { .. })
        ));
    }

    #[test]
    fn test_incomplete_factor_model() {
        let err = MarkowitzBuilder::new()
            .expected_returns(mu())
            .factor_covariance(DMatrix::identity(1, 1))
            .loadings(DMatrix::from_element(3, 1, 1.0))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            PortfolioError::IncompleteFactorModel {
                missing: vec!["idiosyncratic".to_string()],
            }
        );
    }

    #[test]
    fn test_factor_exposures_reported() {
        let loadings = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.5, 0.5, 0.0, 1.0]);
        let optimizer = MarkowitzBuilder::new()
            .expected_returns(mu())
            .factor_covariance(DMatrix::from_row_slice(2, 2, &[0.04, 0.01, 0.01, 0.02]))
            .idiosyncratic(DMatrix::from_diagonal(&DVector::from_vec(vec![0.01, 0.02, 0.03])))
            .loadings(loadings.clone())
            .constraints(["sum_to_one", "long_only"])
            .risk_aversion(1.0)
            .build()
            .unwrap();
        assert_eq!(optimizer.risk_model().num_factors(), 2);

        let result = optimizer.solve();
        assert!(result.is_optimal());
        let w = DVector::from_vec(result.weights.clone().unwrap());
        let f = result.factor_exposures.unwrap();
        let implied = loadings.tr_mul(&w);
        assert_abs_diff_eq!(f[0], implied[0], epsilon = 1e-6);
        assert_abs_diff_eq!(f[1], implied[1], epsilon = 1e-6);
    }

    #[test]
    fn test_constraint_set_and_names_merge() {
        let optimizer = MarkowitzBuilder::new()
            .expected_returns(mu())
            .covariance(sigma())
            .constraint_set(ConstraintSet::new([ConstraintKind::SumToOne]).unwrap())
            .constraints(["long_only"])
            .build()
            .unwrap();
        assert_eq!(optimizer.constraints().len(), 2);
        assert_eq!(optimizer.risk_aversion(), 0.0);
        assert_eq!(optimizer.leverage_limit(), 1.0);
    }

    #[test]
    fn test_gamma_zero_picks_best_asset() {
        let result = MarkowitzBuilder::new()
            .expected_returns(mu())
            .covariance(sigma())
            .constraints(["sum_to_one", "long_only"])
            .build()
            .unwrap()
            .solve();

        let w = result.weights.unwrap();
        assert_abs_diff_eq!(w[0], 1.0, epsilon = 1e-5);
    }
}
