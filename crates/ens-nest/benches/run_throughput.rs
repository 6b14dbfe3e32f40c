use criterion::{criterion_group, criterion_main, Criterion};

use ens_nest::{nest, BoundConfig, NestConfig};

fn loglike(x: &[f64]) -> f64 {
    -x.iter().map(|xi| (xi - 0.5).powi(2)).sum::<f64>() / (2.0 * 0.01)
}

fn prior(u: &[f64]) -> Vec<f64> {
    u.to_vec()
}

fn bench_run(c: &mut Criterion) {
    let single = NestConfig::default();
    c.bench_function("nest_single_3d", |b| {
        b.iter(|| nest(loglike, prior, 3, &single).unwrap())
    });

    let multi = NestConfig {
        bound: BoundConfig::multi(),
        ..NestConfig::default()
    };
    c.bench_function("nest_multi_2d", |b| {
        b.iter(|| nest(loglike, prior, 2, &multi).unwrap())
    });
}

criterion_group!(benches, bench_run);
criterion_main!(benches);
