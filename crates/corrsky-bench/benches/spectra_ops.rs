//! Criterion micro-benchmarks for spectrum transforms, correlated
//! generation and spectrum recovery.

use std::hint::black_box;

use corrsky_bench::{reference_alms, reference_spectra};
use corrsky_core::{LRange, WorkerConfig};
use corrsky_spectra::{estimate_all, CoefficientGenerator, SpectrumTransform};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

/// Benchmark: spectrum -> correlation -> spectrum at several lengths.
fn bench_transform_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_round_trip");
    for n in [256usize, 1024, 4096] {
        let plan = SpectrumTransform::new(n);
        let cl: Vec<f64> = (0..n).map(|l| 1.0 / (1.0 + l as f64)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &cl, |b, cl| {
            b.iter(|| {
                let xi = plan.to_correlation(cl).unwrap();
                black_box(plan.to_spectrum(&xi).unwrap());
            });
        });
    }
    group.finish();
}

/// Benchmark: Cholesky factors for 10 entries up to l = 512.
fn bench_factorize(c: &mut Criterion) {
    let set = reference_spectra(10, 512).unwrap();
    c.bench_function("factorize_10x512", |b| {
        b.iter(|| black_box(CoefficientGenerator::new(&set, LRange::new(1, 512)).unwrap()));
    });
}

/// Benchmark: correlated coefficients for 10 entries, 4 workers.
fn bench_generate(c: &mut Criterion) {
    let set = reference_spectra(10, 512).unwrap();
    let generator = CoefficientGenerator::new(&set, LRange::new(1, 512)).unwrap();
    let pool = WorkerConfig::fixed(4).build_pool().unwrap();
    c.bench_function("generate_10x512", |b| {
        b.iter(|| black_box(generator.generate(42, &pool)));
    });
}

/// Benchmark: all 55 auto and cross spectra of 10 entries.
fn bench_estimate(c: &mut Criterion) {
    let pool = WorkerConfig::fixed(4).build_pool().unwrap();
    let alms = reference_alms(10, 512, 42, &pool).unwrap();
    c.bench_function("estimate_all_10x512", |b| {
        b.iter(|| black_box(estimate_all(&alms, LRange::new(2, 512), None, &pool).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_transform_round_trip,
    bench_factorize,
    bench_generate,
    bench_estimate
);
criterion_main!(benches);
