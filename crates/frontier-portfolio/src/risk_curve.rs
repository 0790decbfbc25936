//! Risk-curve (efficient frontier) sweeps.
//!
//! The sweeper solves one Markowitz program per risk-aversion value on a
//! log-spaced grid and records the realized variance and return of each
//! optimum. Sequential sweeps reuse a single [`MarkowitzProblem`]; with the
//! `parallel` feature, each rayon worker clones its own.

use crate::error::PortfolioResult;
use crate::markowitz::MarkowitzOptimizer;
use crate::problem::MarkowitzProblem;
use crate::types::{OptimizationResult, RiskCurve, SweepConfig};
use frontier_math::optimization::{ConicSolver, SolveStatus};
use tracing::{debug, info, warn};

/// `num` points spaced evenly in log10 between `10^min_exp` and `10^max_exp`.
///
/// Both endpoints are included; a single point sits at `10^min_exp`.
#[must_use]
pub fn logspace(min_exp: f64, max_exp: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![10f64.powf(min_exp)],
        _ => {
            let step = (max_exp - min_exp) / (num - 1) as f64;
            let mut grid: Vec<f64> = (0..num)
                .map(|k| 10f64.powf(min_exp + step * k as f64))
                .collect();
            grid[num - 1] = 10f64.powf(max_exp);
            grid
        }
    }
}

/// Traces risk curves for an optimizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskCurveSweeper {
    config: SweepConfig,
}

impl RiskCurveSweeper {
    /// Creates a sweeper from settings.
    #[must_use]
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    /// Overrides the grid size.
    #[must_use]
    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.config.num_samples = num_samples;
        self
    }

    /// Sweep settings.
    #[must_use]
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// The risk-aversion grid, in increasing order.
    #[must_use]
    pub fn grid(&self) -> Vec<f64> {
        logspace(
            self.config.gamma_min_exponent,
            self.config.gamma_max_exponent,
            self.config.num_samples,
        )
    }

    /// Solves the optimizer at every grid point.
    ///
    /// The optimizer's own risk aversion is ignored. Grid points that do not
    /// solve are recorded with their status and the sweep continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the grid exponents are reversed, not finite, or
    /// outside the range where `10^x` is a finite positive `f64`.
    pub fn sweep<S>(&self, optimizer: &MarkowitzOptimizer<S>) -> PortfolioResult<RiskCurve>
    where
        S: ConicSolver + Clone + Send + Sync,
    {
        self.config.validate()?;
        let gammas = self.grid();
        let results = if self.config.should_parallelize(gammas.len()) {
            sweep_parallel(optimizer, &gammas)
        } else {
            sweep_sequential(&mut optimizer.problem(), &gammas)
        };

        let mut curve = RiskCurve::with_capacity(results.len());
        for result in &results {
            curve.push(result);
        }

        let optimal = curve.optimal_count();
        if curve.all_optimal() {
            info!(points = curve.len(), "risk curve: all problems solved optimally");
        } else {
            warn!(
                points = curve.len(),
                optimal,
                "risk curve: some problems did not solve optimally"
            );
        }
        Ok(curve)
    }
}

/// Sweeps `num_samples` points over the default grid `[10^-2, 10^2]`.
pub fn risk_curve<S>(optimizer: &MarkowitzOptimizer<S>, num_samples: usize) -> PortfolioResult<RiskCurve>
where
    S: ConicSolver + Clone + Send + Sync,
{
    RiskCurveSweeper::default()
        .with_num_samples(num_samples)
        .sweep(optimizer)
}

fn solve_point<S: ConicSolver>(problem: &mut MarkowitzProblem<S>, gamma: f64) -> OptimizationResult {
    match problem.set_risk_aversion(gamma) {
        Ok(()) => problem.solve(),
        Err(e) => {
            warn!(gamma, error = %e, "risk aversion rejected, recording failed grid point");
            OptimizationResult::without_solution(SolveStatus::SolverError, gamma, 0)
        }
    }
}

fn sweep_sequential<S: ConicSolver>(
    problem: &mut MarkowitzProblem<S>,
    gammas: &[f64],
) -> Vec<OptimizationResult> {
    debug!(points = gammas.len(), "sequential risk curve sweep");
    gammas.iter().map(|&gamma| solve_point(problem, gamma)).collect()
}

#[cfg(feature = "parallel")]
fn sweep_parallel<S>(optimizer: &MarkowitzOptimizer<S>, gammas: &[f64]) -> Vec<OptimizationResult>
where
    S: ConicSolver + Clone + Send + Sync,
{
    use rayon::prelude::*;

    debug!(points = gammas.len(), "parallel risk curve sweep");
    gammas
        .par_iter()
        .map_init(|| optimizer.problem(), |problem, &gamma| solve_point(problem, gamma))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn sweep_parallel<S>(optimizer: &MarkowitzOptimizer<S>, gammas: &[f64]) -> Vec<OptimizationResult>
where
    S: ConicSolver + Clone + Send + Sync,
{
    sweep_sequential(&mut optimizer.problem(), gammas)
}
