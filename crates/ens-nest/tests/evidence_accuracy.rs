use ens_nest::{nest, BoundConfig, FnObserver, IterationEvent, NestConfig, Sampler, FnModel};

const SIGMA: f64 = 0.1;

fn gaussian_loglike(x: &[f64]) -> f64 {
    // Normalized over the plane, so the evidence over the cube is ~1.
    let norm = x.len() as f64 * 0.5 * (2.0 * std::f64::consts::PI * SIGMA * SIGMA).ln();
    let r2: f64 = x.iter().map(|xi| (xi - 0.5).powi(2)).sum();
    -r2 / (2.0 * SIGMA * SIGMA) - norm
}

fn twin_loglike(x: &[f64]) -> f64 {
    let sigma: f64 = 0.05;
    let norm = (2.0 * std::f64::consts::PI * sigma * sigma).ln();
    let peak = |cx: f64| -((x[0] - cx).powi(2) + (x[1] - 0.5).powi(2)) / (2.0 * sigma * sigma) - norm;
    let (a, b) = (peak(0.25), peak(0.75));
    let hi = a.max(b);
    hi + ((a - hi).exp() + (b - hi).exp()).ln() - 2f64.ln()
}

fn identity(u: &[f64]) -> Vec<f64> {
    u.to_vec()
}

#[test]
fn flat_likelihood_has_unit_evidence() {
    let config = NestConfig::default();
    let result = nest(|_: &[f64]| 0.0, identity, 3, &config).unwrap();
    assert!(result.logz.abs() < 1e-9, "logz = {}", result.logz);
    assert!(result.h.abs() < 1e-9);
    // Weights decline from the second iteration on, so the decline rule
    // fires once eleven consecutive declines have been seen.
    assert_eq!(result.niter, 12);
    assert_eq!(result.nsamples(), result.niter + config.nobj);
}

#[test]
fn flat_likelihood_with_multi_bound() {
    let config = NestConfig {
        bound: BoundConfig::multi(),
        ..NestConfig::default()
    };
    let result = nest(|_: &[f64]| 0.0, identity, 2, &config).unwrap();
    assert!(result.logz.abs() < 1e-9, "logz = {}", result.logz);
}

#[test]
fn gaussian_evidence_within_reported_error() {
    let config = NestConfig {
        nobj: 100,
        ..NestConfig::default()
    };
    for seed in [11u64, 23, 57] {
        let result = Sampler::new(FnModel::new(gaussian_loglike, identity), 2, &config)
            .with_seed(seed)
            .run()
            .unwrap();
        assert!(result.logzerr > 0.0);
        assert!(
            result.logz.abs() < 4.0 * result.logzerr,
            "seed {seed}: logz = {} +/- {}",
            result.logz,
            result.logzerr
        );
        let mean = result.posterior_mean();
        assert!((mean[0] - 0.5).abs() < 0.05 && (mean[1] - 0.5).abs() < 0.05);
        let cov = result.posterior_covariance();
        assert!((cov[0][0] - SIGMA * SIGMA).abs() < 0.5 * SIGMA * SIGMA);
        assert!(result.loglmax <= gaussian_loglike(&[0.5, 0.5]));
    }
}

#[test]
fn bimodal_evidence_with_multi_bound() {
    let config = NestConfig {
        nobj: 100,
        bound: BoundConfig::multi(),
        ..NestConfig::default()
    };
    let mut max_bound = 0;
    let result = Sampler::new(FnModel::new(twin_loglike, identity), 2, &config)
        .with_seed(4)
        .observe(FnObserver(|event: &IterationEvent| {
            max_bound = max_bound.max(event.nbound)
        }))
        .run()
        .unwrap();
    assert!(result.logz.abs() < 1.5, "logz = {}", result.logz);
    assert!(max_bound >= 2, "the live set never split");
    let left = result
        .samples_parvals
        .iter()
        .zip(&result.samples_wt)
        .filter(|(x, _)| x[0] < 0.5)
        .map(|(_, wt)| wt)
        .sum::<f64>();
    assert!(left > 0.2 && left < 0.8, "left mode mass = {left}");
}
