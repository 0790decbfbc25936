//! Return and covariance estimation from price histories.
//!
//! Pure computation on aligned price series; fetching and calendar
//! alignment are the caller's concern. Gaps are forward filled before any
//! return is taken, so a missing print continues the last known price.

use crate::error::{PortfolioError, PortfolioResult};
use crate::risk_model::RiskModel;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Trading periods per year used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 250.0;

/// Aligned price series for a set of assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    assets: Vec<String>,
    prices: Vec<Vec<Option<f64>>>,
}

/// Expected returns and covariance for an asset universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEstimates {
    /// Asset identifiers, in vector order.
    pub assets: Vec<String>,
    /// Mean simple return per period.
    pub expected_returns: DVector<f64>,
    /// Sample covariance of log returns.
    pub covariance: DMatrix<f64>,
}

impl MarketEstimates {
    /// Dense risk model over the estimated covariance.
    pub fn risk_model(&self) -> PortfolioResult<RiskModel> {
        RiskModel::dense(self.covariance.clone())
    }
}

impl PriceHistory {
    /// Creates a history from one price series per asset.
    ///
    /// `None` marks a missing observation. Present prices must be finite and
    /// positive.
    pub fn new(assets: Vec<String>, prices: Vec<Vec<Option<f64>>>) -> PortfolioResult<Self> {
        if assets.len() != prices.len() {
            return Err(PortfolioError::dimension_mismatch(
                "prices",
                format!("{} series", assets.len()),
                format!("{} series", prices.len()),
            ));
        }
        let periods = prices.first().map_or(0, Vec::len);
        for (asset, series) in assets.iter().zip(&prices) {
            if series.len() != periods {
                return Err(PortfolioError::dimension_mismatch(
                    format!("prices of {asset}"),
                    format!("{periods} periods"),
                    format!("{} periods", series.len()),
                ));
            }
            if let Some(p) = series.iter().flatten().find(|p| !p.is_finite() || **p <= 0.0) {
                return Err(PortfolioError::invalid_input(format!(
                    "price of {asset} must be finite and positive, got {p}"
                )));
            }
        }
        Ok(Self { assets, prices })
    }

    /// Creates a history from dense series, treating `NaN` as missing.
    pub fn from_dense(assets: Vec<String>, prices: Vec<Vec<f64>>) -> PortfolioResult<Self> {
        let prices = prices
            .into_iter()
            .map(|s| s.into_iter().map(|p| (!p.is_nan()).then_some(p)).collect())
            .collect();
        Self::new(assets, prices)
    }

    /// Asset identifiers.
    #[must_use]
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Number of assets.
    #[must_use]
    pub fn num_assets(&self) -> usize {
        self.assets.len()
    }

    /// Number of price observations per asset.
    #[must_use]
    pub fn num_periods(&self) -> usize {
        self.prices.first().map_or(0, Vec::len)
    }

    /// A copy with every gap replaced by the last known price.
    ///
    /// Gaps before the first observation stay missing.
    #[must_use]
    pub fn forward_filled(&self) -> Self {
        let prices = self
            .prices
            .iter()
            .map(|series| {
                let mut last = None;
                series
                    .iter()
                    .map(|p| {
                        if p.is_some() {
                            last = *p;
                        }
                        last
                    })
                    .collect()
            })
            .collect();
        Self {
            assets: self.assets.clone(),
            prices,
        }
    }

    /// Simple period returns `pₜ/pₜ₋₁ − 1` of the forward-filled prices,
    /// one shorter than the price series.
    #[must_use]
    pub fn simple_returns(&self) -> Vec<Vec<Option<f64>>> {
        self.forward_filled()
            .prices
            .iter()
            .map(|series| {
                series
                    .windows(2)
                    .map(|w| match (w[0], w[1]) {
                        (Some(a), Some(b)) => Some(b / a - 1.0),
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    /// Log returns `ln(1 + r)` of the simple returns.
    #[must_use]
    pub fn log_returns(&self) -> Vec<Vec<Option<f64>>> {
        self.simple_returns()
            .into_iter()
            .map(|series| series.into_iter().map(|r| r.map(f64::ln_1p)).collect())
            .collect()
    }

    /// Mean simple return per asset, skipping missing observations.
    pub fn expected_returns(&self) -> PortfolioResult<DVector<f64>> {
        let returns = self.simple_returns();
        let means = returns
            .iter()
            .zip(&self.assets)
            .map(|(series, asset)| {
                mean(series.iter().flatten().copied()).ok_or_else(|| {
                    PortfolioError::invalid_input(format!("no returns observed for {asset}"))
                })
            })
            .collect::<PortfolioResult<Vec<f64>>>()?;
        Ok(DVector::from_vec(means))
    }

    /// Sample covariance (ddof = 1) of log returns over pairwise-complete
    /// observations.
    pub fn covariance(&self) -> PortfolioResult<DMatrix<f64>> {
        let returns = self.log_returns();
        let n = self.num_assets();
        let mut cov = DMatrix::zeros(n, n);

        for i in 0..n {
            for j in i..n {
                let pairs: Vec<(f64, f64)> = returns[i]
                    .iter()
                    .zip(&returns[j])
                    .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                    .collect();
                let c = sample_covariance(&pairs).ok_or_else(|| {
                    PortfolioError::invalid_input(format!(
                        "fewer than two overlapping returns for {} and {}",
                        self.assets[i], self.assets[j]
                    ))
                })?;
                cov[(i, j)] = c;
                cov[(j, i)] = c;
            }
        }
        Ok(cov)
    }

    /// Annualized volatility of log returns, `σ·√periods`.
    pub fn annualized_volatility(&self, periods_per_year: f64) -> PortfolioResult<DVector<f64>> {
        let cov = self.covariance()?;
        Ok(cov.diagonal().map(|v| (v * periods_per_year).sqrt()))
    }

    /// Expected returns and covariance in one pass.
    pub fn estimate(&self) -> PortfolioResult<MarketEstimates> {
        let expected_returns = self.expected_returns()?;
        let covariance = self.covariance()?;

        for (asset, var) in self.assets.iter().zip(covariance.diagonal().iter()) {
            debug!(
                asset = %asset,
                annual_std = (var * TRADING_DAYS_PER_YEAR).sqrt(),
                "estimated volatility"
            );
        }

        Ok(MarketEstimates {
            assets: self.assets.clone(),
            expected_returns,
            covariance,
        })
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn sample_covariance(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let mx = mean(pairs.iter().map(|p| p.0))?;
    let my = mean(pairs.iter().map(|p| p.1))?;
    let s: f64 = pairs.iter().map(|(x, y)| (x - mx) * (y - my)).sum();
    Some(s / (pairs.len() - 1) as f64)
}

/// Market-implied risk aversion `(E[r] − r_f) / Var[r]`.
///
/// `benchmark_prices` are periodic (typically year-end) benchmark levels;
/// returns are taken as `ln(1 + r)` and the variance uses ddof = 1. The
/// result is the γ at which the benchmark is mean-variance optimal.
pub fn implied_risk_aversion(benchmark_prices: &[f64], risk_free_rate: f64) -> PortfolioResult<f64> {
    if !risk_free_rate.is_finite() {
        return Err(PortfolioError::invalid_parameter("risk_free_rate", "must be finite"));
    }
    let history = PriceHistory::from_dense(vec!["benchmark".to_string()], vec![benchmark_prices.to_vec()])?;
    let returns: Vec<f64> = history.log_returns()[0].iter().flatten().copied().collect();

    let pairs: Vec<(f64, f64)> = returns.iter().map(|r| (*r, *r)).collect();
    let variance = sample_covariance(&pairs)
        .ok_or_else(|| PortfolioError::invalid_input("need at least three benchmark prices"))?;
    if variance <= 0.0 {
        return Err(PortfolioError::invalid_input("benchmark returns have zero variance"));
    }
    let expected = mean(returns.iter().copied())
        .ok_or_else(|| PortfolioError::invalid_input("need at least three benchmark prices"))?;

    Ok((expected - risk_free_rate) / variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("A{i}")).collect()
    }

    #[test]
    fn test_forward_fill() {
        let history = PriceHistory::new(
            names(1),
            vec![vec![None, Some(10.0), None, None, Some(12.0)]],
        )
        .unwrap();
        let filled = history.forward_filled();
        assert_eq!(
            filled.prices[0],
            vec![None, Some(10.0), Some(10.0), Some(10.0), Some(12.0)]
        );
    }

    #[test]
    fn test_expected_returns() {
        let history = PriceHistory::from_dense(
            names(2),
            vec![vec![100.0, 110.0, 99.0], vec![50.0, f64::NAN, 55.0]],
        )
        .unwrap();
        let mu = history.expected_returns().unwrap();

        // (0.1 + (-0.1)) / 2 and (0 + 0.1) / 2 after filling the gap
        assert_relative_eq!(mu[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(mu[1], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_covariance_hand_computed() {
        let history = PriceHistory::from_dense(
            names(2),
            vec![vec![100.0, 110.0, 121.0, 108.9], vec![10.0, 10.5, 10.5, 11.025]],
        )
        .unwrap();
        let cov = history.covariance().unwrap();

        let a = [1.1f64.ln(), 1.1f64.ln(), 0.9f64.ln()];
        let b = [1.05f64.ln(), 0.0, 1.05f64.ln()];
        let ma = a.iter().sum::<f64>() / 3.0;
        let mb = b.iter().sum::<f64>() / 3.0;
        let var_a = a.iter().map(|x| (x - ma).powi(2)).sum::<f64>() / 2.0;
        let cov_ab = a.iter().zip(&b).map(|(x, y)| (x - ma) * (y - mb)).sum::<f64>() / 2.0;

        assert_relative_eq!(cov[(0, 0)], var_a, epsilon = 1e-12);
        assert_relative_eq!(cov[(0, 1)], cov_ab, epsilon = 1e-12);
        assert_eq!(cov[(0, 1)], cov[(1, 0)]);

        let vol = history.annualized_volatility(TRADING_DAYS_PER_YEAR).unwrap();
        assert_relative_eq!(vol[0], (var_a * 250.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_estimate_feeds_risk_model() {
        let history = PriceHistory::from_dense(
            names(2),
            vec![vec![1.0, 1.1, 1.05, 1.2], vec![2.0, 1.9, 2.1, 2.0]],
        )
        .unwrap();
        let estimates = history.estimate().unwrap();
        assert_eq!(estimates.assets, names(2));
        assert_eq!(estimates.expected_returns.len(), 2);
        assert!(estimates.risk_model().is_ok());
    }

    #[test]
    fn test_invalid_histories() {
        assert!(PriceHistory::new(names(2), vec![vec![Some(1.0)]]).is_err());
        assert!(PriceHistory::new(names(2), vec![vec![Some(1.0)], vec![]]).is_err());
        assert!(PriceHistory::new(names(1), vec![vec![Some(-1.0)]]).is_err());

        let short = PriceHistory::from_dense(names(1), vec![vec![1.0, 1.1]]).unwrap();
        assert!(matches!(
            short.covariance(),
            Err(PortfolioError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_implied_risk_aversion() {
        let prices = [100.0, 110.0, 104.5, 120.175];
        let r: Vec<f64> = vec![1.1f64.ln(), 0.95f64.ln(), 1.15f64.ln()];
        let m = r.iter().sum::<f64>() / 3.0;
        let var = r.iter().map(|x| (x - m).powi(2)).sum::<f64>() / 2.0;

        let gamma = implied_risk_aversion(&prices, 0.02).unwrap();
        assert_relative_eq!(gamma, (m - 0.02) / var, max_relative = 1e-9);

        assert!(implied_risk_aversion(&[100.0, 101.0], 0.02).is_err());
        assert!(implied_risk_aversion(&[100.0, 100.0, 100.0], 0.02).is_err());
    }
}
