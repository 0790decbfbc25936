//! # Frontier Portfolio
//!
//! Mean-variance portfolio optimization.
//!
//! This crate formulates Markowitz problems over a weight vector and hands
//! them to a conic solver from `frontier-math`.
//!
//! ## Design Philosophy
//!
//! - **Fail fast on configuration**: Unknown or conflicting constraints, bad
//!   shapes and invalid parameters are rejected when the optimizer is built
//! - **Solver outcomes are data**: Infeasible, unbounded and failed solves are
//!   statuses on the result, never errors
//! - **Tagged risk models**: Dense and factor covariance are variants of
//!   [`RiskModel`], chosen at construction
//! - **Config-driven parallelism**: Optional rayon support for risk-curve sweeps
//!
//! ## Features
//!
//! - **Markowitz Optimization**: `sum_to_one`, `long_only` and `leverage_limit`
//!   constraint sets over dense or factor risk models
//! - **Risk Curves**: Efficient-frontier sweeps over a log-spaced risk-aversion grid
//! - **Minimum Risk**: Lowest-variance portfolio above a return floor
//! - **Worst-Case Risk**: Risk of a fixed portfolio under bounded covariance error
//! - **Preprocessing**: Expected returns, covariance and implied risk aversion
//!   from price histories
//!
//! ## Quick Start
//!
//! ```rust
//! use frontier_portfolio::prelude::*;
//! use nalgebra::{DMatrix, DVector};
//!
//! let optimizer = MarkowitzBuilder::new()
//!     .expected_returns(DVector::from_vec(vec![0.10, 0.05, 0.08]))
//!     .covariance(DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 2.0, 3.0])))
//!     .constraints(["sum_to_one", "long_only"])
//!     .build()
//!     .unwrap();
//!
//! let curve = risk_curve(&optimizer, 20).unwrap();
//! assert!(curve.all_optimal());
//! ```
//!
//! ## Module Overview
//!
//! - [`constraints`] - Constraint catalog and decision-vector layout
//! - [`risk_model`] - Dense and factor covariance models
//! - [`markowitz`] - Optimizer builder
//! - [`problem`] - Parametrized program reused across risk aversions
//! - [`risk_curve`] - Efficient-frontier sweeps
//! - [`min_risk`] - Minimum-risk formulation
//! - [`worst_case`] - Worst-case risk analysis
//! - [`preprocess`] - Estimation from price histories
//! - [`types`] - Constraint sets, result records, configuration
//!
//! ## Feature Flags
//!
//! - `parallel`: Enable rayon-based parallel risk-curve sweeps

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod constraints;
pub mod error;
pub mod markowitz;
pub mod min_risk;
pub mod preprocess;
pub mod problem;
pub mod risk_curve;
pub mod risk_model;
pub mod types;
pub mod worst_case;

// Re-export error types at crate root
pub use error::{PortfolioError, PortfolioResult};

pub use types::{
    ConstraintKind, ConstraintSet, MinRiskConfig, MinimumRiskPortfolio, OptimizationResult,
    OptimizerConfig, RiskCurve, SweepConfig, WorstCaseConfig, WorstCaseRisk,
};

pub use constraints::{build_constraints, VariableLayout, DEFAULT_LEVERAGE_LIMIT};
pub use markowitz::{MarkowitzBuilder, MarkowitzOptimizer};
pub use min_risk::{minimum_risk_portfolio, MinimumRiskOptimizer};
pub use preprocess::{implied_risk_aversion, MarketEstimates, PriceHistory, TRADING_DAYS_PER_YEAR};
pub use problem::MarkowitzProblem;
pub use risk_curve::{logspace, risk_curve, RiskCurveSweeper};
pub use risk_model::RiskModel;
pub use worst_case::{worst_case_risk, WorstCaseAnalyzer};

/// Prelude module for convenient imports.
///
/// ```rust
/// use frontier_portfolio::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{PortfolioError, PortfolioResult};

    pub use crate::types::{
        ConstraintKind, ConstraintSet, MinRiskConfig, MinimumRiskPortfolio, OptimizationResult,
        OptimizerConfig, RiskCurve, SweepConfig, WorstCaseConfig, WorstCaseRisk,
    };

    pub use crate::markowitz::{MarkowitzBuilder, MarkowitzOptimizer};
    pub use crate::min_risk::{minimum_risk_portfolio, MinimumRiskOptimizer};
    pub use crate::preprocess::{implied_risk_aversion, MarketEstimates, PriceHistory};
    pub use crate::problem::MarkowitzProblem;
    pub use crate::risk_curve::{risk_curve, RiskCurveSweeper};
    pub use crate::risk_model::RiskModel;
    pub use crate::worst_case::{worst_case_risk, WorstCaseAnalyzer};

    // Re-export commonly used types from dependencies
    pub use frontier_math::optimization::{ClarabelSolver, ConicSolver, SolveStatus, SolverSettings};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_compiles() {
        let err = PortfolioError::missing_field("covariance");
        assert!(err.to_string().contains("covariance"));
    }
}
