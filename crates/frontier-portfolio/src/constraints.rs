//! Constraint catalog.
//!
//! Translates a [`ConstraintSet`] into scalar linear constraints over the
//! decision vector. The decision vector is laid out as
//!
//! ```text
//! [ w (N) | f (M, factor model only) | t (N, leverage limit only) ]
//! ```
//!
//! where `f = F'w` are factor exposures and `t` bounds `|w|` elementwise.

use crate::error::{PortfolioError, PortfolioResult};
use crate::types::{ConstraintKind, ConstraintSet};
use frontier_math::optimization::LinearConstraint;
use nalgebra::DMatrix;
use std::ops::Range;

/// Default leverage limit.
pub const DEFAULT_LEVERAGE_LIMIT: f64 = 1.0;

/// Position of each variable block in the decision vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableLayout {
    num_assets: usize,
    num_factors: usize,
    leverage_aux: bool,
}

impl VariableLayout {
    /// Layout with weights only.
    #[must_use]
    pub fn new(num_assets: usize) -> Self {
        Self {
            num_assets,
            num_factors: 0,
            leverage_aux: false,
        }
    }

    /// Layout sized for a constraint set and factor count.
    #[must_use]
    pub fn for_constraints(num_assets: usize, num_factors: usize, constraints: &ConstraintSet) -> Self {
        Self::new(num_assets)
            .with_factors(num_factors)
            .with_leverage_aux(constraints.contains(ConstraintKind::LeverageLimit))
    }

    /// Reserves `num_factors` factor-exposure variables.
    #[must_use]
    pub fn with_factors(mut self, num_factors: usize) -> Self {
        self.num_factors = num_factors;
        self
    }

    /// Reserves auxiliary absolute-value variables.
    #[must_use]
    pub fn with_leverage_aux(mut self, enabled: bool) -> Self {
        self.leverage_aux = enabled;
        self
    }

    /// Number of assets N.
    #[must_use]
    pub fn num_assets(&self) -> usize {
        self.num_assets
    }

    /// Number of factor-exposure variables.
    #[must_use]
    pub fn num_factors(&self) -> usize {
        self.num_factors
    }

    /// True if auxiliary leverage variables are reserved.
    #[must_use]
    pub fn has_leverage_aux(&self) -> bool {
        self.leverage_aux
    }

    /// Indices of the weights.
    #[must_use]
    pub fn weights(&self) -> Range<usize> {
        0..self.num_assets
    }

    /// Indices of the factor exposures.
    #[must_use]
    pub fn factors(&self) -> Range<usize> {
        let start = self.num_assets;
        start..start + self.num_factors
    }

    /// Indices of the auxiliary leverage variables (empty if not reserved).
    #[must_use]
    pub fn auxiliary(&self) -> Range<usize> {
        let start = self.num_assets + self.num_factors;
        let len = if self.leverage_aux { self.num_assets } else { 0 };
        start..start + len
    }

    /// Total number of decision variables.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.auxiliary().end
    }
}

/// Checks a leverage limit.
pub fn validate_leverage_limit(limit: f64) -> PortfolioResult<()> {
    if !limit.is_finite() || limit < 1.0 {
        return Err(PortfolioError::invalid_parameter(
            "leverage_limit",
            format!("must be finite and at least 1, got {limit}"),
        ));
    }
    Ok(())
}

/// Σw = 1.
#[must_use]
pub fn sum_to_one(layout: &VariableLayout) -> LinearConstraint {
    LinearConstraint::equal(layout.weights().map(|i| (i, 1.0)).collect(), 1.0)
}

/// w ≥ 0.
#[must_use]
pub fn long_only(layout: &VariableLayout) -> Vec<LinearConstraint> {
    layout
        .weights()
        .map(|i| LinearConstraint::greater_equal(vec![(i, 1.0)], 0.0))
        .collect()
}

/// ‖w‖₁ ≤ `limit` through `−t ≤ w ≤ t`, `Σt ≤ limit`.
///
/// The layout must reserve auxiliary variables.
pub fn gross_exposure(layout: &VariableLayout, limit: f64) -> PortfolioResult<Vec<LinearConstraint>> {
    if !layout.has_leverage_aux() {
        return Err(PortfolioError::invalid_input(
            "gross exposure limit needs auxiliary variables in the layout",
        ));
    }

    let mut rows = Vec::with_capacity(2 * layout.num_assets() + 1);
    for (w, t) in layout.weights().zip(layout.auxiliary()) {
        rows.push(LinearConstraint::less_equal(vec![(w, 1.0), (t, -1.0)], 0.0));
        rows.push(LinearConstraint::less_equal(vec![(w, -1.0), (t, -1.0)], 0.0));
    }
    rows.push(LinearConstraint::less_equal(
        layout.auxiliary().map(|t| (t, 1.0)).collect(),
        limit,
    ));
    Ok(rows)
}

/// f − F'w = 0.
pub fn factor_link(layout: &VariableLayout, loadings: &DMatrix<f64>) -> PortfolioResult<Vec<LinearConstraint>> {
    if loadings.nrows() != layout.num_assets() || loadings.ncols() != layout.num_factors() {
        return Err(PortfolioError::dimension_mismatch(
            "loadings",
            format!("{}x{}", layout.num_assets(), layout.num_factors()),
            format!("{}x{}", loadings.nrows(), loadings.ncols()),
        ));
    }

    Ok(layout
        .factors()
        .enumerate()
        .map(|(k, f)| {
            let mut terms = Vec::with_capacity(layout.num_assets() + 1);
            terms.push((f, 1.0));
            terms.extend(
                layout
                    .weights()
                    .map(|i| (i, -loadings[(i, k)]))
                    .filter(|(_, v)| *v != 0.0),
            );
            LinearConstraint::equal(terms, 0.0)
        })
        .collect())
}

/// Emits the rows for `constraints`, plus the factor link when the layout
/// reserves factor variables.
///
/// `loadings` must be supplied exactly when the layout has factors.
pub fn build_constraints(
    constraints: &ConstraintSet,
    leverage_limit: f64,
    layout: &VariableLayout,
    loadings: Option<&DMatrix<f64>>,
) -> PortfolioResult<Vec<LinearConstraint>> {
    let mut rows = Vec::new();

    for kind in constraints.iter() {
        match kind {
            ConstraintKind::SumToOne => rows.push(sum_to_one(layout)),
            ConstraintKind::LongOnly => rows.extend(long_only(layout)),
            ConstraintKind::LeverageLimit => {
                validate_leverage_limit(leverage_limit)?;
                rows.extend(gross_exposure(layout, leverage_limit)?);
            }
        }
    }

    match (layout.num_factors(), loadings) {
        (0, None) => {}
        (0, Some(_)) => {
            return Err(PortfolioError::missing_factor_inputs(
                "loadings supplied but no factor exposure variables reserved",
            ));
        }
        (_, None) => {
            return Err(PortfolioError::missing_factor_inputs(
                "factor exposure variables reserved but no loading matrix supplied",
            ));
        }
        (_, Some(f)) => rows.extend(factor_link(layout, f)?),
    }

    Ok(rows)
}
