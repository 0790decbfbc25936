//! Property-based tests for optimizer invariants.
//!
//! These tests verify properties that should hold for any valid input:
//! - Optimal weights satisfy every requested constraint
//! - Worst-case risk never falls below nominal risk
//! - Risk-aversion grids are increasing with exact endpoints
//! - Unknown constraint names are always rejected

use frontier_portfolio::prelude::*;
use frontier_portfolio::logspace;
use nalgebra::{DMatrix, DVector};
use proptest::prelude::*;

const FEASIBILITY_TOL: f64 = 1e-5;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

/// Universe of 2..=6 assets: μ in [0, 0.3), Σ = BᵀB + 0.05·I.
fn universe() -> impl Strategy<Value = (DVector<f64>, DMatrix<f64>)> {
    (2usize..=6).prop_flat_map(|n| {
        (
            prop::collection::vec(0.0f64..0.3, n),
            prop::collection::vec(-1.0f64..1.0, n * n),
        )
            .prop_map(move |(mu, b)| {
                let b = DMatrix::from_row_slice(n, n, &b);
                let sigma = b.transpose() * &b + DMatrix::identity(n, n) * 0.05;
                (DVector::from_vec(mu), sigma)
            })
    })
}

/// Every conflict-free subset of the constraint catalog.
fn constraint_names() -> impl Strategy<Value = Vec<&'static str>> {
    prop_oneof![
        Just(vec![]),
        Just(vec!["sum_to_one"]),
        Just(vec!["long_only"]),
        Just(vec!["leverage_limit"]),
        Just(vec!["sum_to_one", "long_only"]),
        Just(vec!["sum_to_one", "leverage_limit"]),
    ]
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn optimal_weights_satisfy_constraints(
        (mu, sigma) in universe(),
        names in constraint_names(),
        gamma in 0.01f64..10.0,
        limit in 1.0f64..3.0,
    ) {
        let n = mu.len();
        let optimizer = MarkowitzBuilder::new()
            .expected_returns(mu.clone())
            .covariance(sigma.clone())
            .constraints(names.iter().copied())
            .leverage_limit(limit)
            .risk_aversion(gamma)
            .build()
            .unwrap();

        let result = optimizer.solve();
        prop_assert!(result.has_solution(), "status {:?}", result.status);

        let w = result.weights.clone().unwrap();
        prop_assert_eq!(w.len(), n);
        if names.contains(&"sum_to_one") {
            prop_assert!((w.iter().sum::<f64>() - 1.0).abs() < FEASIBILITY_TOL);
        }
        if names.contains(&"long_only") {
            prop_assert!(w.iter().all(|x| *x >= -FEASIBILITY_TOL));
        }
        if names.contains(&"leverage_limit") {
            prop_assert!(w.iter().map(|x| x.abs()).sum::<f64>() <= limit + FEASIBILITY_TOL);
        }

        let wv = DVector::from_vec(w);
        let variance = wv.dot(&(&sigma * &wv));
        let expected_return = mu.dot(&wv);
        prop_assert!((result.portfolio_variance.unwrap() - variance).abs() <= 1e-9 * (1.0 + variance.abs()));
        prop_assert!(
            (result.portfolio_return.unwrap() - expected_return).abs() <= 1e-9 * (1.0 + expected_return.abs())
        );
    }

    #[test]
    fn worst_case_never_below_nominal(
        (_, sigma) in universe(),
        raw in prop::collection::vec(-1.0f64..1.0, 6),
        bound in 0.0f64..0.5,
    ) {
        let n = sigma.nrows();
        let weights = DVector::from_iterator(n, raw.into_iter().take(n));

        let risk = WorstCaseAnalyzer::new(WorstCaseConfig::default().with_delta_bound(bound))
            .analyze(&weights, &sigma)
            .unwrap();

        prop_assert!(risk.status.has_solution(), "status {:?}", risk.status);
        let worst = risk.worst_case_risk.unwrap();
        prop_assert!(worst >= risk.nominal_risk);

        let delta = risk.delta.unwrap();
        for i in 0..n {
            prop_assert_eq!(delta[i][i], 0.0);
            for j in 0..n {
                prop_assert!(delta[i][j].abs() <= bound + FEASIBILITY_TOL);
                prop_assert_eq!(delta[i][j], delta[j][i]);
            }
        }
    }

    #[test]
    fn logspace_is_increasing_with_exact_endpoints(
        lo in -4.0f64..0.0,
        span in 0.5f64..6.0,
        num in 2usize..400,
    ) {
        let hi = lo + span;
        let grid = logspace(lo, hi, num);

        prop_assert_eq!(grid.len(), num);
        prop_assert_eq!(grid[0], 10f64.powf(lo));
        prop_assert_eq!(grid[num - 1], 10f64.powf(hi));
        prop_assert!(grid.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn unknown_constraint_names_are_rejected(name in "[a-z_]{1,16}") {
        prop_assume!(name.parse::<ConstraintKind>().is_err());

        let err = ConstraintSet::from_names(["sum_to_one", name.as_str()]).unwrap_err();
        prop_assert!(
            matches!(err, PortfolioError::UnsupportedConstraint { ref names } if names == &vec![name.clone()]),
            "unexpected error: {:?}",
            err
        );
    }
}
