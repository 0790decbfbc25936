//! Result records returned by the optimizers.

use frontier_math::optimization::SolveStatus;
use serde::{Deserialize, Serialize};

/// Outcome of a single Markowitz solve.
///
/// Numerical fields are populated only when the status carries a solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Solver status.
    pub status: SolveStatus,
    /// Risk aversion the problem was solved at.
    pub risk_aversion: f64,
    /// Optimal weights.
    pub weights: Option<Vec<f64>>,
    /// Realized expected return μ'w.
    pub portfolio_return: Option<f64>,
    /// Realized variance under the risk model.
    pub portfolio_variance: Option<f64>,
    /// Factor exposures F'w (factor risk model only).
    pub factor_exposures: Option<Vec<f64>>,
    /// Interior-point iterations used.
    pub iterations: u32,
}

impl OptimizationResult {
    pub(crate) fn without_solution(status: SolveStatus, risk_aversion: f64, iterations: u32) -> Self {
        Self {
            status,
            risk_aversion,
            weights: None,
            portfolio_return: None,
            portfolio_variance: None,
            factor_exposures: None,
            iterations,
        }
    }

    /// True when weights are available.
    #[must_use]
    pub fn has_solution(&self) -> bool {
        self.status.has_solution()
    }

    /// True for a full-accuracy optimum.
    #[must_use]
    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    /// Standard deviation of the portfolio.
    #[must_use]
    pub fn volatility(&self) -> Option<f64> {
        self.portfolio_variance.map(|v| v.max(0.0).sqrt())
    }

    /// Gross exposure ‖w‖₁.
    #[must_use]
    pub fn gross_exposure(&self) -> Option<f64> {
        self.weights.as_ref().map(|w| w.iter().map(|x| x.abs()).sum())
    }

    /// Net exposure Σw.
    #[must_use]
    pub fn net_exposure(&self) -> Option<f64> {
        self.weights.as_ref().map(|w| w.iter().sum())
    }
}

/// Outcome of the minimum-risk formulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimumRiskPortfolio {
    /// Solver status.
    pub status: SolveStatus,
    /// Optimal weights, when solved.
    pub weights: Option<Vec<f64>>,
}

impl MinimumRiskPortfolio {
    /// True when weights are available.
    #[must_use]
    pub fn has_solution(&self) -> bool {
        self.status.has_solution()
    }
}

/// Outcome of the worst-case risk analysis for a fixed portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorstCaseRisk {
    /// Solver status of the last perturbation LP.
    pub status: SolveStatus,
    /// √(w'Σw) under the nominal covariance.
    pub nominal_risk: f64,
    /// √(w'(Σ+Δ)w) under the worst perturbation found.
    pub worst_case_risk: Option<f64>,
    /// The perturbation Δ, row-major N×N.
    pub delta: Option<Vec<Vec<f64>>>,
    /// Number of eigenvector cuts added.
    pub cuts: usize,
}

impl WorstCaseRisk {
    /// Ratio of worst-case to nominal risk.
    #[must_use]
    pub fn risk_ratio(&self) -> Option<f64> {
        match self.worst_case_risk {
            Some(worst) if self.nominal_risk > 0.0 => Some(worst / self.nominal_risk),
            _ => None,
        }
    }
}

/// Risk/return trade-off traced across a risk-aversion grid.
///
/// The four sequences have equal length and are ordered by increasing
/// risk aversion. Grid points without a solution hold `NaN`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskCurve {
    /// Risk-aversion grid.
    pub gammas: Vec<f64>,
    /// Realized variance per grid point.
    pub variances: Vec<f64>,
    /// Realized expected return per grid point.
    pub returns: Vec<f64>,
    /// Solver status per grid point.
    pub statuses: Vec<SolveStatus>,
}

impl RiskCurve {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            gammas: Vec::with_capacity(n),
            variances: Vec::with_capacity(n),
            returns: Vec::with_capacity(n),
            statuses: Vec::with_capacity(n),
        }
    }

    pub(crate) fn push(&mut self, result: &OptimizationResult) {
        self.gammas.push(result.risk_aversion);
        self.variances.push(result.portfolio_variance.unwrap_or(f64::NAN));
        self.returns.push(result.portfolio_return.unwrap_or(f64::NAN));
        self.statuses.push(result.status);
    }

    /// Number of grid points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gammas.len()
    }

    /// True for an empty grid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gammas.is_empty()
    }

    /// Number of grid points solved to full accuracy.
    #[must_use]
    pub fn optimal_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_optimal()).count()
    }

    /// True when every grid point solved to full accuracy.
    #[must_use]
    pub fn all_optimal(&self) -> bool {
        self.statuses.iter().all(|s| s.is_optimal())
    }

    /// `(gamma, variance, return)` for the points that carry a solution.
    pub fn optimal_points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.statuses
            .iter()
            .enumerate()
            .filter(|(_, s)| s.has_solution())
            .map(|(i, _)| (self.gammas[i], self.variances[i], self.returns[i]))
    }

    /// Standard deviations, `NaN` where unsolved.
    #[must_use]
    pub fn volatilities(&self) -> Vec<f64> {
        // f64::max would turn NaN into 0
        self.variances
            .iter()
            .map(|&v| if v < 0.0 { 0.0 } else { v.sqrt() })
            .collect()
    }
}
