//! Benchmarks for the frontier-portfolio optimizers.
//!
//! Run with: cargo bench -p frontier-portfolio

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use frontier_portfolio::prelude::*;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

fn create_universe(n: usize) -> (DVector<f64>, DMatrix<f64>) {
    let mut rng = StdRng::seed_from_u64(42);
    let mu = DVector::from_fn(n, |_, _| {
        let z: f64 = StandardNormal.sample(&mut rng);
        z.abs()
    });
    let a = DMatrix::<f64>::from_fn(n, n, |_, _| StandardNormal.sample(&mut rng));
    (mu, a.transpose() * &a)
}

fn create_factor_model(n: usize, m: usize) -> (DVector<f64>, RiskModel) {
    let mut rng = StdRng::seed_from_u64(7);
    let mu = DVector::from_fn(n, |_, _| {
        let z: f64 = StandardNormal.sample(&mut rng);
        0.05 + 0.02 * z
    });
    let b = DMatrix::<f64>::from_fn(m, m, |_, _| StandardNormal.sample(&mut rng));
    let sigma_f = b.transpose() * &b * 0.01;
    let loadings = DMatrix::from_fn(n, m, |_, _| StandardNormal.sample(&mut rng));
    let d = DVector::from_element(n, 0.02);
    let model = RiskModel::factor(sigma_f, loadings, d).unwrap();
    (mu, model)
}

fn create_optimizer(n: usize) -> MarkowitzOptimizer {
    let (mu, sigma) = create_universe(n);
    MarkowitzBuilder::new()
        .expected_returns(mu)
        .covariance(sigma)
        .constraints(["sum_to_one", "long_only"])
        .risk_aversion(1.0)
        .build()
        .unwrap()
}

// =============================================================================
// SINGLE SOLVE BENCHMARKS
// =============================================================================

fn bench_single_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("markowitz_solve");

    for size in [10, 50, 100].iter() {
        let optimizer = create_optimizer(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(&optimizer).solve())
        });
    }

    group.finish();
}

fn bench_factor_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("factor_solve");

    for size in [100, 500].iter() {
        let (mu, model) = create_factor_model(*size, 10);
        let optimizer = MarkowitzBuilder::new()
            .expected_returns(mu)
            .risk_model(model)
            .constraints(["sum_to_one", "leverage_limit"])
            .leverage_limit(1.5)
            .risk_aversion(1.0)
            .build()
            .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(&optimizer).solve())
        });
    }

    group.finish();
}

// =============================================================================
// RISK CURVE BENCHMARKS
// =============================================================================

fn bench_risk_curve(c: &mut Criterion) {
    let optimizer = create_optimizer(10);

    let mut group = c.benchmark_group("risk_curve_100");
    group.sample_size(20);
    group.throughput(Throughput::Elements(100));

    let sequential = RiskCurveSweeper::new(SweepConfig::new().with_num_samples(100));
    group.bench_function("sequential", |b| {
        b.iter(|| sequential.sweep(black_box(&optimizer)).unwrap())
    });

    let parallel = RiskCurveSweeper::new(
        SweepConfig::new()
            .with_num_samples(100)
            .with_parallel(true)
            .with_threshold(1),
    );
    group.bench_function("parallel", |b| {
        b.iter(|| parallel.sweep(black_box(&optimizer)).unwrap())
    });

    group.finish();
}

// =============================================================================
// WORST-CASE BENCHMARKS
// =============================================================================

fn bench_worst_case(c: &mut Criterion) {
    let mut group = c.benchmark_group("worst_case");
    group.sample_size(20);

    for size in [5, 10, 20].iter() {
        let (_, sigma) = create_universe(*size);
        let weights = DVector::from_element(*size, 1.0 / *size as f64);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| worst_case_risk(black_box(&weights), black_box(&sigma)).unwrap())
        });
    }

    group.finish();
}

// =============================================================================
// CRITERION GROUPS
// =============================================================================

criterion_group!(solve, bench_single_solve, bench_factor_solve,);

criterion_group!(sweeps, bench_risk_curve,);

criterion_group!(robust, bench_worst_case,);

criterion_main!(solve, sweeps, robust);
