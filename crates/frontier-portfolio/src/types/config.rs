//! Configuration for optimization runs.

use crate::error::{PortfolioError, PortfolioResult};
use frontier_math::optimization::SolverSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level optimizer configuration.
///
/// Every section falls back to its defaults, so a TOML file only needs the
/// values it changes:
///
/// ```toml
/// [solver]
/// max_iter = 100
///
/// [sweep]
/// num_samples = 500
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Interior-point settings shared by every solve.
    pub solver: SolverSettings,
    /// Risk-curve sweep settings.
    pub sweep: SweepConfig,
    /// Minimum-risk formulation settings.
    pub min_risk: MinRiskConfig,
    /// Worst-case risk analysis settings.
    pub worst_case: WorstCaseConfig,
}

impl OptimizerConfig {
    /// Creates a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a config from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> PortfolioResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| PortfolioError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> PortfolioResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PortfolioError::config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Serializes the config to TOML.
    pub fn to_toml_string(&self) -> PortfolioResult<String> {
        toml::to_string(self).map_err(|e| PortfolioError::config(e.to_string()))
    }

    /// Sets the solver settings.
    #[must_use]
    pub fn with_solver(mut self, solver: SolverSettings) -> Self {
        self.solver = solver;
        self
    }

    /// Sets the sweep settings.
    #[must_use]
    pub fn with_sweep(mut self, sweep: SweepConfig) -> Self {
        self.sweep = sweep;
        self
    }

    /// Sets the minimum-risk settings.
    #[must_use]
    pub fn with_min_risk(mut self, min_risk: MinRiskConfig) -> Self {
        self.min_risk = min_risk;
        self
    }

    /// Sets the worst-case settings.
    #[must_use]
    pub fn with_worst_case(mut self, worst_case: WorstCaseConfig) -> Self {
        self.worst_case = worst_case;
        self
    }

    /// Checks every section.
    pub fn validate(&self) -> PortfolioResult<()> {
        if self.solver.max_iter == 0 {
            return Err(PortfolioError::invalid_parameter("solver.max_iter", "must be positive"));
        }
        if let Some(limit) = self.solver.time_limit {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(PortfolioError::invalid_parameter(
                    "solver.time_limit",
                    format!("must be positive, got {limit}"),
                ));
            }
        }
        self.sweep.validate()?;
        self.min_risk.validate()?;
        self.worst_case.validate()
    }
}

/// Risk-curve sweep settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Number of risk-aversion values on the grid.
    pub num_samples: usize,
    /// Base-10 exponent of the smallest risk aversion.
    pub gamma_min_exponent: f64,
    /// Base-10 exponent of the largest risk aversion.
    pub gamma_max_exponent: f64,
    /// Enable parallel sweeps (requires 'parallel' feature).
    pub parallel: bool,
    /// Minimum grid size to trigger a parallel sweep.
    /// Each worker assembles its own problem, so small grids stay sequential.
    pub parallel_threshold: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            num_samples: 10_000,
            gamma_min_exponent: -2.0,
            gamma_max_exponent: 2.0,
            parallel: false,
            parallel_threshold: 256,
        }
    }
}

impl SweepConfig {
    /// Creates a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the grid size.
    #[must_use]
    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    /// Sets the grid range as base-10 exponents.
    #[must_use]
    pub fn with_exponents(mut self, min: f64, max: f64) -> Self {
        self.gamma_min_exponent = min;
        self.gamma_max_exponent = max;
        self
    }

    /// Sets whether to use parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Sets the threshold for parallel processing.
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Returns true if a sweep of `count` points should run in parallel.
    #[must_use]
    pub fn should_parallelize(&self, count: usize) -> bool {
        cfg!(feature = "parallel") && self.parallel && count >= self.parallel_threshold
    }

    pub(crate) fn validate(&self) -> PortfolioResult<()> {
        let (lo, hi) = (self.gamma_min_exponent, self.gamma_max_exponent);
        if !lo.is_finite() || !hi.is_finite() {
            return Err(PortfolioError::invalid_parameter(
                "sweep.gamma_exponents",
                "must be finite",
            ));
        }
        let range = f64::from(f64::MIN_10_EXP)..=f64::from(f64::MAX_10_EXP);
        if !range.contains(&lo) || !range.contains(&hi) {
            return Err(PortfolioError::invalid_parameter(
                "sweep.gamma_exponents",
                format!(
                    "must lie in [{}, {}], got [{lo}, {hi}]",
                    f64::MIN_10_EXP,
                    f64::MAX_10_EXP
                ),
            ));
        }
        if lo > hi {
            return Err(PortfolioError::invalid_parameter(
                "sweep.gamma_exponents",
                format!("min exponent {lo} exceeds max exponent {hi}"),
            ));
        }
        Ok(())
    }
}

/// Minimum-risk formulation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinRiskConfig {
    /// Upper bound on gross exposure ‖w‖₁.
    pub gross_limit: f64,
}

impl Default for MinRiskConfig {
    fn default() -> Self {
        Self { gross_limit: 2.0 }
    }
}

impl MinRiskConfig {
    /// Sets the gross exposure limit.
    #[must_use]
    pub fn with_gross_limit(mut self, gross_limit: f64) -> Self {
        self.gross_limit = gross_limit;
        self
    }

    pub(crate) fn validate(&self) -> PortfolioResult<()> {
        if !self.gross_limit.is_finite() || self.gross_limit < 1.0 {
            return Err(PortfolioError::invalid_parameter(
                "min_risk.gross_limit",
                format!("must be finite and at least 1, got {}", self.gross_limit),
            ));
        }
        Ok(())
    }
}

/// Worst-case risk analysis settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorstCaseConfig {
    /// Elementwise bound on the covariance perturbation.
    pub delta_bound: f64,
    /// Minimum number of eigenvector cuts before giving up.
    pub max_cuts: usize,
    /// Additional cut allowance per off-diagonal pair; the effective
    /// budget is `max(max_cuts, cuts_per_pair · N(N−1)/2)`.
    pub cuts_per_pair: usize,
    /// Largest negative eigenvalue accepted as positive semidefinite.
    pub psd_tolerance: f64,
    /// Bisection steps used to pull an infeasible perturbation back
    /// into the PSD cone.
    pub shrink_iterations: usize,
}

impl Default for WorstCaseConfig {
    fn default() -> Self {
        Self {
            delta_bound: 0.2,
            max_cuts: 100,
            cuts_per_pair: 8,
            psd_tolerance: 1e-9,
            shrink_iterations: 60,
        }
    }
}

impl WorstCaseConfig {
    /// Sets the perturbation bound.
    #[must_use]
    pub fn with_delta_bound(mut self, delta_bound: f64) -> Self {
        self.delta_bound = delta_bound;
        self
    }

    /// Sets the cut budget.
    #[must_use]
    pub fn with_max_cuts(mut self, max_cuts: usize) -> Self {
        self.max_cuts = max_cuts;
        self
    }

    /// Sets the per-pair cut allowance.
    #[must_use]
    pub fn with_cuts_per_pair(mut self, cuts_per_pair: usize) -> Self {
        self.cuts_per_pair = cuts_per_pair;
        self
    }

    /// Cut budget for a problem with `pairs` off-diagonal entries.
    #[must_use]
    pub fn cut_budget(&self, pairs: usize) -> usize {
        self.max_cuts.max(self.cuts_per_pair.saturating_mul(pairs))
    }

    /// Sets the PSD acceptance tolerance.
    #[must_use]
    pub fn with_psd_tolerance(mut self, psd_tolerance: f64) -> Self {
        self.psd_tolerance = psd_tolerance;
        self
    }

    pub(crate) fn validate(&self) -> PortfolioResult<()> {
        if !self.delta_bound.is_finite() || self.delta_bound < 0.0 {
            return Err(PortfolioError::invalid_parameter(
                "worst_case.delta_bound",
                format!("must be finite and non-negative, got {}", self.delta_bound),
            ));
        }
        if !self.psd_tolerance.is_finite() || self.psd_tolerance < 0.0 {
            return Err(PortfolioError::invalid_parameter(
                "worst_case.psd_tolerance",
                format!("must be finite and non-negative, got {}", self.psd_tolerance),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = OptimizerConfig::default();
        assert_eq!(config.sweep.num_samples, 10_000);
        assert_eq!(config.sweep.gamma_min_exponent, -2.0);
        assert_eq!(config.sweep.gamma_max_exponent, 2.0);
        assert!(!config.sweep.parallel);
        assert_eq!(config.min_risk.gross_limit, 2.0);
        assert_eq!(config.worst_case.delta_bound, 0.2);
        assert_eq!(config.worst_case.cut_budget(3), 100);
        assert_eq!(config.worst_case.cut_budget(45), 360);
        assert_eq!(config.solver.max_iter, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = OptimizerConfig::new()
            .with_sweep(SweepConfig::new().with_num_samples(50).with_exponents(-1.0, 1.0))
            .with_min_risk(MinRiskConfig::default().with_gross_limit(1.5))
            .with_worst_case(WorstCaseConfig::default().with_max_cuts(10));

        assert_eq!(config.sweep.num_samples, 50);
        assert_eq!(config.sweep.gamma_max_exponent, 1.0);
        assert_eq!(config.min_risk.gross_limit, 1.5);
        assert_eq!(config.worst_case.max_cuts, 10);
    }

    #[test]
    fn test_partial_toml() {
        let config = OptimizerConfig::from_toml_str(
            r#"
            [solver]
            max_iter = 80

            [sweep]
            num_samples = 25
            "#,
        )
        .unwrap();

        assert_eq!(config.solver.max_iter, 80);
        assert_eq!(config.solver.tol_feas, 1e-8);
        assert_eq!(config.sweep.num_samples, 25);
        assert_eq!(config.sweep.gamma_min_exponent, -2.0);
        assert_eq!(config.worst_case, WorstCaseConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = OptimizerConfig::new()
            .with_sweep(SweepConfig::new().with_num_samples(7).with_parallel(true));
        let text = config.to_toml_string().unwrap();
        let parsed = OptimizerConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = OptimizerConfig::from_toml_str("[sweep]\ngamma_min_exponent = 3.0").unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidParameter { .. }));

        let err = OptimizerConfig::from_toml_str("[min_risk]\ngross_limit = -1.0").unwrap_err();
        assert!(err.is_configuration_error());

        let err = OptimizerConfig::from_toml_str("[sweep\nnum_samples = 1").unwrap_err();
        assert!(matches!(err, PortfolioError::Config { .. }));

        let err = OptimizerConfig::from_toml_str("[sweep]\ngamma_max_exponent = 400.0").unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidParameter { .. }));
    }

    #[test]
    fn test_time_limit_must_be_positive_and_finite() {
        for limit in [f64::NAN, f64::INFINITY, 0.0, -5.0] {
            let config = OptimizerConfig::new().with_solver(SolverSettings::default().with_time_limit(limit));
            assert!(
                matches!(config.validate(), Err(PortfolioError::InvalidParameter { .. })),
                "time limit {limit} accepted"
            );
        }
        let config = OptimizerConfig::new().with_solver(SolverSettings::default().with_time_limit(2.5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frontier.toml");
        std::fs::write(&path, "[worst_case]\ndelta_bound = 0.1\n").unwrap();

        let config = OptimizerConfig::from_file(&path).unwrap();
        assert_eq!(config.worst_case.delta_bound, 0.1);

        let missing = OptimizerConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(PortfolioError::Config { .. })));
    }

    #[test]
    fn test_should_parallelize() {
        let config = SweepConfig::new().with_parallel(true).with_threshold(100);

        #[cfg(feature = "parallel")]
        {
            assert!(!config.should_parallelize(50));
            assert!(config.should_parallelize(100));
        }

        #[cfg(not(feature = "parallel"))]
        {
            assert!(!config.should_parallelize(50));
            assert!(!config.should_parallelize(100));
        }

        assert!(!SweepConfig::new().should_parallelize(100_000));
    }
}
