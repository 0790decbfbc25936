//! Worst-case risk of a fixed portfolio under covariance uncertainty.
//!
//! For weights `w` and nominal covariance `Σ`, finds the perturbation
//!
//! ```text
//! maximize   w'(Σ + Δ)w
//! subject to Δ symmetric, diag(Δ) = 0, |Δᵢⱼ| ≤ bound, Σ + Δ ⪰ 0
//! ```
//!
//! The PSD constraint is replaced by an outer approximation. Each round
//! solves an LP over the off-diagonal entries of Δ; if `Σ + Δ` has a
//! negative eigenvalue with eigenvector `v`, the cut `v'(Σ + Δ)v ≥ 0` is
//! added and the LP re-solved. When the cut budget runs out, Δ is scaled
//! back toward zero by bisection until `Σ + Δ` is PSD again. Δ = 0 is always
//! feasible, so the reported risk never falls below the nominal risk.

use crate::error::{PortfolioError, PortfolioResult};
use crate::risk_model::{check_covariance, RiskModel};
use crate::types::{WorstCaseConfig, WorstCaseRisk};
use frontier_math::linear_algebra::{min_eigenpair, symmetrize};
use frontier_math::optimization::{
    ClarabelSolver, ConicSolver, LinearConstraint, ProblemBuilder, SolveStatus,
};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

/// Upper-triangle index pairs `(i, j)`, `i < j`, in row order.
fn upper_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

fn delta_matrix(n: usize, pairs: &[(usize, usize)], values: &[f64]) -> DMatrix<f64> {
    let mut delta = DMatrix::zeros(n, n);
    for (&(i, j), &v) in pairs.iter().zip(values) {
        delta[(i, j)] = v;
        delta[(j, i)] = v;
    }
    delta
}

/// Worst-case risk analysis.
#[derive(Debug, Clone, Default)]
pub struct WorstCaseAnalyzer<S = ClarabelSolver> {
    solver: S,
    config: WorstCaseConfig,
}

impl WorstCaseAnalyzer {
    /// Creates an analyzer with the default backend.
    #[must_use]
    pub fn new(config: WorstCaseConfig) -> Self {
        Self::with_solver(ClarabelSolver::default(), config)
    }
}

impl<S: ConicSolver> WorstCaseAnalyzer<S> {
    /// Creates an analyzer around a custom solver.
    #[must_use]
    pub fn with_solver(solver: S, config: WorstCaseConfig) -> Self {
        Self { solver, config }
    }

    /// Settings in use.
    #[must_use]
    pub fn config(&self) -> &WorstCaseConfig {
        &self.config
    }

    /// Analyzes `weights` against the asset covariance implied by a risk model.
    pub fn analyze_model(
        &self,
        weights: &DVector<f64>,
        risk_model: &RiskModel,
    ) -> PortfolioResult<WorstCaseRisk> {
        risk_model.check()?;
        self.analyze(weights, &risk_model.asset_covariance())
    }

    /// Analyzes `weights` against a nominal covariance.
    ///
    /// The weights are not checked against any budget; any finite vector of
    /// the right length is accepted.
    pub fn analyze(
        &self,
        weights: &DVector<f64>,
        covariance: &DMatrix<f64>,
    ) -> PortfolioResult<WorstCaseRisk> {
        self.config.validate()?;
        check_covariance("covariance", covariance)?;
        let sigma = symmetrize(covariance);
        let n = sigma.nrows();
        if weights.len() != n {
            return Err(PortfolioError::dimension_mismatch(
                "weights",
                n.to_string(),
                weights.len().to_string(),
            ));
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(PortfolioError::invalid_input("weights contain NaN or infinite values"));
        }

        let nominal_variance = weights.dot(&(&sigma * weights));
        let nominal_risk = nominal_variance.max(0.0).sqrt();
        let pairs = upper_pairs(n);
        if pairs.is_empty() || self.config.delta_bound == 0.0 {
            return Ok(WorstCaseRisk {
                status: SolveStatus::Optimal,
                nominal_risk,
                worst_case_risk: Some(nominal_risk),
                delta: Some(vec![vec![0.0; n]; n]),
                cuts: 0,
            });
        }

        let tolerance = self.config.psd_tolerance * sigma.amax().max(f64::MIN_POSITIVE);
        let bound = self.config.delta_bound;
        let budget = self.config.cut_budget(pairs.len());

        let mut base = ProblemBuilder::new(pairs.len());
        for (k, &(i, j)) in pairs.iter().enumerate() {
            base = base
                .linear(k, -2.0 * weights[i] * weights[j])
                .constraint(LinearConstraint::less_equal(vec![(k, 1.0)], bound))
                .constraint(LinearConstraint::greater_equal(vec![(k, 1.0)], -bound));
        }

        let mut cuts: Vec<LinearConstraint> = Vec::new();
        let (status, delta) = loop {
            let program = base.clone().constraints(cuts.iter().cloned()).build()?;
            let solution = match self.solver.solve(&program) {
                Ok(solution) => solution,
                Err(e) => {
                    warn!(error = %e, cuts = cuts.len(), "solver rejected worst-case program");
                    return Ok(self.unsolved(SolveStatus::SolverError, nominal_risk, cuts.len()));
                }
            };
            if !solution.status.has_solution() || solution.x.len() != pairs.len() {
                warn!(status = %solution.status, cuts = cuts.len(), "worst-case LP not solved");
                return Ok(self.unsolved(solution.status, nominal_risk, cuts.len()));
            }

            let delta = delta_matrix(n, &pairs, &solution.x);
            let (min_eigenvalue, v) = min_eigenpair(&(&sigma + &delta))?;
            if min_eigenvalue >= -tolerance {
                break (solution.status, delta);
            }
            if cuts.len() >= budget {
                debug!(
                    cuts = cuts.len(),
                    min_eigenvalue, "cut budget exhausted, shrinking perturbation"
                );
                let delta = self.shrink(&sigma, delta, tolerance);
                break (SolveStatus::OptimalInaccurate, delta);
            }

            // v'(Σ+Δ)v ≥ 0  ⇔  Σ_{i<j} 2vᵢvⱼΔᵢⱼ ≥ −v'Σv
            let terms = pairs
                .iter()
                .enumerate()
                .map(|(k, &(i, j))| (k, 2.0 * v[i] * v[j]))
                .filter(|(_, c)| *c != 0.0)
                .collect();
            cuts.push(LinearConstraint::greater_equal(terms, -v.dot(&(&sigma * &v))));
        };

        let mut delta = delta;
        let mut worst_variance = weights.dot(&((&sigma + &delta) * weights));
        if worst_variance < nominal_variance {
            // only reachable through solver round-off
            delta.fill(0.0);
            worst_variance = nominal_variance;
        }

        debug!(
            cuts = cuts.len(),
            nominal_risk,
            worst_case_risk = worst_variance.max(0.0).sqrt(),
            "worst-case analysis finished"
        );

        Ok(WorstCaseRisk {
            status,
            nominal_risk,
            worst_case_risk: Some(worst_variance.max(0.0).sqrt()),
            delta: Some(
                (0..n)
                    .map(|i| delta.row(i).iter().copied().collect())
                    .collect(),
            ),
            cuts: cuts.len(),
        })
    }

    /// Largest `α ∈ [0, 1]` (by bisection) with `Σ + αΔ` PSD, applied to Δ.
    fn shrink(&self, sigma: &DMatrix<f64>, delta: DMatrix<f64>, tolerance: f64) -> DMatrix<f64> {
        let is_psd = |alpha: f64| {
            min_eigenpair(&(sigma + &delta * alpha))
                .map(|(lambda, _)| lambda >= -tolerance)
                .unwrap_or(false)
        };

        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..self.config.shrink_iterations {
            let mid = 0.5 * (lo + hi);
            if is_psd(mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        delta * lo
    }

    fn unsolved(&self, status: SolveStatus, nominal_risk: f64, cuts: usize) -> WorstCaseRisk {
        WorstCaseRisk {
            status,
            nominal_risk,
            worst_case_risk: None,
            delta: None,
            cuts,
        }
    }
}

/// Worst-case risk with the default backend and settings.
pub fn worst_case_risk(
    weights: &DVector<f64>,
    covariance: &DMatrix<f64>,
) -> PortfolioResult<WorstCaseRisk> {
    WorstCaseAnalyzer::new(WorstCaseConfig::default()).analyze(weights, covariance)
}
