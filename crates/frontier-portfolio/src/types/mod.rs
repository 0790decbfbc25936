//! Domain types for portfolio optimization.
//!
//! - [`ConstraintKind`] / [`ConstraintSet`]: validated named constraints
//! - [`OptimizationResult`], [`RiskCurve`], [`MinimumRiskPortfolio`],
//!   [`WorstCaseRisk`]: result records
//! - [`OptimizerConfig`]: TOML-loadable run configuration

mod config;
mod constraint;
mod result;

pub use config::{MinRiskConfig, OptimizerConfig, SweepConfig, WorstCaseConfig};
pub use constraint::{ConstraintKind, ConstraintSet};
pub use result::{MinimumRiskPortfolio, OptimizationResult, RiskCurve, WorstCaseRisk};
