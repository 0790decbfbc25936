//! Portfolio risk models.
//!
//! A [`RiskModel`] is either a dense asset covariance matrix or a factor
//! decomposition `Σ = F Σ_f F' + D`. The mode is fixed at construction;
//! every constructor validates shapes, symmetry and positive
//! semidefiniteness so that the optimizer only ever sees convex objectives.

use crate::error::{PortfolioError, PortfolioResult};
use frontier_math::linear_algebra::{
    check_finite, check_positive_semidefinite, check_symmetric, is_diagonal, PSD_TOLERANCE,
    SYMMETRY_TOLERANCE,
};
use frontier_math::optimization::{diagonal_form_triplets, quadratic_form_triplets};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Covariance model used to measure portfolio variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", try_from = "RawRiskModel")]
pub enum RiskModel {
    /// Full N×N asset covariance.
    Dense {
        /// Asset covariance Σ.
        covariance: DMatrix<f64>,
    },
    /// Factor model with M factors.
    Factor {
        /// Factor covariance Σ_f (M×M).
        factor_covariance: DMatrix<f64>,
        /// Factor loadings F (N×M).
        loadings: DMatrix<f64>,
        /// Diagonal of the idiosyncratic covariance D (length N).
        idiosyncratic: DVector<f64>,
    },
}

fn shape(m: &DMatrix<f64>) -> String {
    format!("{}x{}", m.nrows(), m.ncols())
}

pub(crate) fn check_covariance(name: &str, matrix: &DMatrix<f64>) -> PortfolioResult<()> {
    if matrix.nrows() != matrix.ncols() {
        return Err(PortfolioError::dimension_mismatch(
            name,
            format!("{0}x{0}", matrix.nrows()),
            shape(matrix),
        ));
    }
    check_finite(matrix)?;
    check_symmetric(matrix, SYMMETRY_TOLERANCE)?;
    check_positive_semidefinite(matrix, PSD_TOLERANCE)?;
    Ok(())
}

fn check_factor_parts(
    factor_covariance: &DMatrix<f64>,
    loadings: &DMatrix<f64>,
    idiosyncratic: &DVector<f64>,
) -> PortfolioResult<()> {
    check_covariance("factor_covariance", factor_covariance)?;
    let m = factor_covariance.nrows();

    if loadings.ncols() != m {
        return Err(PortfolioError::dimension_mismatch(
            "loadings",
            format!("{}x{m}", loadings.nrows()),
            shape(loadings),
        ));
    }
    check_finite(loadings)?;

    let n = loadings.nrows();
    if idiosyncratic.len() != n {
        return Err(PortfolioError::dimension_mismatch(
            "idiosyncratic",
            n.to_string(),
            idiosyncratic.len().to_string(),
        ));
    }
    if let Some((i, d)) = idiosyncratic
        .iter()
        .enumerate()
        .find(|(_, d)| !d.is_finite() || **d < 0.0)
    {
        return Err(PortfolioError::invalid_input(format!(
            "idiosyncratic variance of asset {i} must be finite and non-negative, got {d}"
        )));
    }
    Ok(())
}

/// Wire form of [`RiskModel`]; deserialized values go through the same
/// checks as the constructors.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawRiskModel {
    Dense {
        covariance: DMatrix<f64>,
    },
    Factor {
        factor_covariance: DMatrix<f64>,
        loadings: DMatrix<f64>,
        idiosyncratic: DVector<f64>,
    },
}

impl TryFrom<RawRiskModel> for RiskModel {
    type Error = PortfolioError;

    fn try_from(raw: RawRiskModel) -> PortfolioResult<Self> {
        match raw {
            RawRiskModel::Dense { covariance } => Self::dense(covariance),
            RawRiskModel::Factor {
                factor_covariance,
                loadings,
                idiosyncratic,
            } => Self::factor(factor_covariance, loadings, idiosyncratic),
        }
    }
}

impl RiskModel {
    /// Dense model from an asset covariance matrix.
    pub fn dense(covariance: DMatrix<f64>) -> PortfolioResult<Self> {
        check_covariance("covariance", &covariance)?;
        Ok(Self::Dense { covariance })
    }

    /// Factor model from Σ_f, F and the diagonal of D.
    pub fn factor(
        factor_covariance: DMatrix<f64>,
        loadings: DMatrix<f64>,
        idiosyncratic: DVector<f64>,
    ) -> PortfolioResult<Self> {
        check_factor_parts(&factor_covariance, &loadings, &idiosyncratic)?;
        Ok(Self::Factor {
            factor_covariance,
            loadings,
            idiosyncratic,
        })
    }

    /// Factor model from Σ_f, F and D given as a full N×N diagonal matrix.
    pub fn factor_with_matrix(
        factor_covariance: DMatrix<f64>,
        loadings: DMatrix<f64>,
        idiosyncratic: &DMatrix<f64>,
    ) -> PortfolioResult<Self> {
        let n = loadings.nrows();
        if idiosyncratic.nrows() != n || idiosyncratic.ncols() != n {
            return Err(PortfolioError::dimension_mismatch(
                "idiosyncratic",
                format!("{n}x{n}"),
                shape(idiosyncratic),
            ));
        }
        if !is_diagonal(idiosyncratic, 0.0) {
            return Err(PortfolioError::invalid_input(
                "idiosyncratic covariance must be diagonal",
            ));
        }
        Self::factor(factor_covariance, loadings, idiosyncratic.diagonal())
    }

    /// Factor model from optional parts.
    ///
    /// All three parts must be present; the error names every missing one.
    pub fn from_parts(
        factor_covariance: Option<DMatrix<f64>>,
        idiosyncratic: Option<DMatrix<f64>>,
        loadings: Option<DMatrix<f64>>,
    ) -> PortfolioResult<Self> {
        match (factor_covariance, idiosyncratic, loadings) {
            (Some(sigma_f), Some(d), Some(f)) => Self::factor_with_matrix(sigma_f, f, &d),
            (sigma_f, d, f) => {
                let missing = [
                    ("factor_covariance", sigma_f.is_none()),
                    ("idiosyncratic", d.is_none()),
                    ("loadings", f.is_none()),
                ]
                .into_iter()
                .filter(|(_, absent)| *absent)
                .map(|(name, _)| name.to_string())
                .collect();
                Err(PortfolioError::IncompleteFactorModel { missing })
            }
        }
    }

    /// Number of assets N.
    #[must_use]
    pub fn num_assets(&self) -> usize {
        match self {
            Self::Dense { covariance } => covariance.nrows(),
            Self::Factor { loadings, .. } => loadings.nrows(),
        }
    }

    /// Number of factors M (zero for a dense model).
    #[must_use]
    pub fn num_factors(&self) -> usize {
        match self {
            Self::Dense { .. } => 0,
            Self::Factor { loadings, .. } => loadings.ncols(),
        }
    }

    /// True for the factor variant.
    #[must_use]
    pub fn is_factor(&self) -> bool {
        matches!(self, Self::Factor { .. })
    }

    /// Factor loadings, if this is a factor model.
    #[must_use]
    pub fn loadings(&self) -> Option<&DMatrix<f64>> {
        match self {
            Self::Dense { .. } => None,
            Self::Factor { loadings, .. } => Some(loadings),
        }
    }

    /// Re-runs the constructor checks: shapes, finiteness, symmetry,
    /// positive semidefiniteness and D ≥ 0.
    pub fn check(&self) -> PortfolioResult<()> {
        match self {
            Self::Dense { covariance } => check_covariance("covariance", covariance),
            Self::Factor {
                factor_covariance,
                loadings,
                idiosyncratic,
            } => check_factor_parts(factor_covariance, loadings, idiosyncratic),
        }
    }

    /// Checks the model and its size against a universe of `num_assets`.
    pub fn validate(&self, num_assets: usize) -> PortfolioResult<()> {
        self.check()?;
        let n = self.num_assets();
        if n != num_assets {
            let what = match self {
                Self::Dense { .. } => "covariance",
                Self::Factor { .. } => "loadings",
            };
            return Err(PortfolioError::dimension_mismatch(
                what,
                format!("{num_assets} assets"),
                format!("{n} assets"),
            ));
        }
        Ok(())
    }

    fn check_weights(&self, weights: &DVector<f64>) -> PortfolioResult<()> {
        if weights.len() != self.num_assets() {
            return Err(PortfolioError::dimension_mismatch(
                "weights",
                self.num_assets().to_string(),
                weights.len().to_string(),
            ));
        }
        Ok(())
    }

    /// Factor exposures f = F'w, if this is a factor model.
    pub fn factor_exposures(&self, weights: &DVector<f64>) -> PortfolioResult<Option<DVector<f64>>> {
        self.check_weights(weights)?;
        Ok(self.loadings().map(|f| f.tr_mul(weights)))
    }

    /// Portfolio variance of `weights` under this model.
    pub fn variance(&self, weights: &DVector<f64>) -> PortfolioResult<f64> {
        self.check_weights(weights)?;
        let variance = match self {
            Self::Dense { covariance } => weights.dot(&(covariance * weights)),
            Self::Factor {
                factor_covariance,
                loadings,
                idiosyncratic,
            } => {
                let f = loadings.tr_mul(weights);
                let specific: f64 = weights
                    .iter()
                    .zip(idiosyncratic.iter())
                    .map(|(w, d)| d * w * w)
                    .sum();
                f.dot(&(factor_covariance * &f)) + specific
            }
        };
        Ok(variance)
    }

    /// The asset covariance this model implies.
    ///
    /// For a factor model this is `F Σ_f F' + D`.
    #[must_use]
    pub fn asset_covariance(&self) -> DMatrix<f64> {
        match self {
            Self::Dense { covariance } => covariance.clone(),
            Self::Factor {
                factor_covariance,
                loadings,
                idiosyncratic,
            } => {
                loadings * factor_covariance * loadings.transpose()
                    + DMatrix::from_diagonal(idiosyncratic)
            }
        }
    }

    /// Upper-triangular quadratic-cost entries of `variance` at unit risk
    /// aversion, with weights at `weight_offset` and factor exposures at
    /// `factor_offset`.
    #[must_use]
    pub fn quadratic_triplets(
        &self,
        weight_offset: usize,
        factor_offset: usize,
    ) -> Vec<(usize, usize, f64)> {
        match self {
            Self::Dense { covariance } => quadratic_form_triplets(weight_offset, covariance, 1.0),
            Self::Factor {
                factor_covariance,
                idiosyncratic,
                ..
            } => {
                let mut triplets =
                    diagonal_form_triplets(weight_offset, idiosyncratic.as_slice(), 1.0);
                triplets.extend(quadratic_form_triplets(factor_offset, factor_covariance, 1.0));
                triplets
            }
        }
    }
}
