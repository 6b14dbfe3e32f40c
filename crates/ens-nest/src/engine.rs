use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ens_core::errors::ErrorInfo;
use ens_core::{FnModel, Model, NestError, Point, RngHandle};
use ens_ellipsoid::{partition, Ellipsoid, EllipsoidCover};
use thiserror::Error;

use crate::config::NestConfig;
use crate::evidence::EvidenceAccumulator;
use crate::live::LivePointSet;
use crate::observer::{IterationEvent, Observer, TracingObserver};
use crate::result::{RunResult, SampleRecord};

/// Consecutive declining weights required before the run may stop.
const DECLINE_MIN: usize = 10;

/// Substream feeding the multi-ellipsoid clustering, kept apart from the
/// stream that draws replacement candidates.
const CLUSTER_SUBSTREAM: u64 = 1;

/// Failure of a run: either the engine itself or one of the model callbacks.
#[derive(Debug, Error)]
pub enum RunError<E> {
    /// Engine failure.
    #[error(transparent)]
    Nest(#[from] NestError),
    /// Error returned unchanged by the prior transform or the likelihood.
    #[error("model callback failed: {0}")]
    Model(#[source] E),
}

impl From<RunError<Infallible>> for NestError {
    fn from(err: RunError<Infallible>) -> Self {
        match err {
            RunError::Nest(err) => err,
            RunError::Model(never) => match never {},
        }
    }
}

/// Cooperative cancellation shared between a running sampler and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Fresh, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; observed at the start of the next iteration.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Configured nested sampling run over a [`Model`].
///
/// ```ignore
/// let result = Sampler::new(model, 2, &config)
///     .with_seed(7)
///     .observe(TracingObserver::new())
///     .run()?;
/// ```
pub struct Sampler<'a, M: Model> {
    model: M,
    npar: usize,
    config: NestConfig,
    rng: RngHandle,
    cluster_rng: RngHandle,
    observers: Vec<Box<dyn Observer + 'a>>,
    cancel: Option<CancelFlag>,
}

impl<'a, M: Model> Sampler<'a, M> {
    /// Sampler seeded from `config.seed_policy.master_seed`.
    pub fn new(model: M, npar: usize, config: &NestConfig) -> Self {
        let seed = config.seed_policy.master_seed;
        Self {
            model,
            npar,
            rng: RngHandle::from_seed(seed),
            cluster_rng: RngHandle::substream(seed, CLUSTER_SUBSTREAM),
            config: config.clone(),
            observers: Vec::new(),
            cancel: None,
        }
    }

    /// Overrides the seed of both the sampling and the clustering stream.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = RngHandle::from_seed(seed);
        self.cluster_rng = RngHandle::substream(seed, CLUSTER_SUBSTREAM);
        self
    }

    /// Registers a progress observer.
    pub fn observe(mut self, observer: impl Observer + 'a) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Stops the run with [`NestError::Cancelled`] once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Runs the sampler to termination.
    pub fn run(mut self) -> Result<RunResult, RunError<M::Error>> {
        self.config.validate(self.npar)?;
        let nobj = self.config.nobj;
        let maxiter = self.config.maxiter;
        tracing::info!(
            label = self.config.label.as_deref().unwrap_or(""),
            npar = self.npar,
            nobj,
            maxiter,
            bound = ?self.config.bound,
            "starting nested sampling"
        );

        let mut initial = Vec::with_capacity(nobj);
        for _ in 0..nobj {
            let u = self.rng.unit_cube(self.npar);
            initial.push(self.evaluate(u)?);
        }
        let mut live = LivePointSet::new(initial)?;
        let mut ncalls = nobj;
        let mut evidence = EvidenceAccumulator::new(nobj);
        let mut records = Vec::with_capacity(maxiter.min(16 * nobj) + nobj);

        let started = Instant::now();
        let mut niter = 0;
        let mut ndecl = 0usize;
        let mut logwt_prev: Option<f64> = None;
        for iteration in 0..maxiter {
            if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                return Err(NestError::Cancelled(
                    ErrorInfo::new("cancelled", "run cancelled by caller")
                        .with_context("iteration", iteration.to_string())
                        .with_context("ncalls", ncalls.to_string()),
                )
                .into());
            }

            let worst = live.worst_index();
            let logl_worst = live.get(worst).logl;
            let logwidth = evidence.logwidth();
            let logwt = evidence.fold(logl_worst);
            records.push(SampleRecord {
                parvals: live.get(worst).v.clone(),
                logwt,
            });

            // Bound includes the worst point; its floor is the expected prior
            // volume left after this iteration.
            let min_volume = (-((iteration + 1) as f64) / nobj as f64).exp();
            let bound = self.fit_bound(&live, min_volume)?;
            let (replacement, calls) = self.draw_replacement(&bound, live.get(worst), iteration)?;
            ncalls += calls;
            live.replace(worst, replacement);
            evidence.shrink();
            niter = iteration + 1;

            let event = IterationEvent {
                iteration,
                logz: evidence.logz(),
                logwidth,
                logwt,
                logl_worst,
                ncalls,
                nbound: bound.len(),
            };
            for observer in &mut self.observers {
                observer.on_iteration(&event);
            }

            match logwt_prev {
                Some(prev) if logwt < prev => ndecl += 1,
                _ => ndecl = 0,
            }
            if ndecl > DECLINE_MIN && ndecl > iteration / 6 {
                break;
            }
            logwt_prev = Some(logwt);
        }
        let time = started.elapsed().as_secs_f64();

        evidence.finalize_width(niter);
        for point in live.iter() {
            let logwt = evidence.fold(point.logl);
            records.push(SampleRecord {
                parvals: point.v.clone(),
                logwt,
            });
        }

        let result = RunResult::from_records(niter, ncalls, time, live.max_logl(), &evidence, records);
        tracing::info!(
            label = self.config.label.as_deref().unwrap_or(""),
            niter = result.niter,
            ncalls = result.ncalls,
            logz = result.logz,
            logzerr = result.logzerr,
            "nested sampling converged"
        );
        for observer in &mut self.observers {
            observer.on_finish(&result);
        }
        Ok(result)
    }

    fn evaluate(&mut self, u: Vec<f64>) -> Result<Point, RunError<M::Error>> {
        let v = self.model.prior_transform(&u).map_err(RunError::Model)?;
        let logl = self.model.log_likelihood(&v).map_err(RunError::Model)?;
        Ok(Point::new(u, v, logl, self.rng.uniform()))
    }

    fn fit_bound(&mut self, live: &LivePointSet, min_volume: f64) -> Result<EllipsoidCover, NestError> {
        let positions = live.positions();
        // `enlarge` scales the axes, so the shape grows by its square.
        let factor = self.config.enlarge * self.config.enlarge;
        match self.config.bound.partition_options() {
            None => {
                let ellipsoid = Ellipsoid::fit_or_fallback(&positions, Some(min_volume))?;
                EllipsoidCover::single(ellipsoid.scaled(factor))
            }
            Some(opts) => {
                partition(&positions, min_volume, &opts, &mut self.cluster_rng)?.enlarged(factor)
            }
        }
    }

    fn draw_replacement(
        &mut self,
        bound: &EllipsoidCover,
        worst: &Point,
        iteration: usize,
    ) -> Result<(Point, usize), RunError<M::Error>> {
        let mut calls = 0;
        for _ in 0..self.config.max_attempts {
            let candidate = bound.sample(&mut self.rng)?;
            if !in_unit_cube(candidate.as_slice()) {
                continue;
            }
            let point = self.evaluate(candidate.as_slice().to_vec())?;
            calls += 1;
            if point.is_better_than(worst) {
                return Ok((point, calls));
            }
        }
        let centers: Vec<&[f64]> = bound
            .ellipsoids()
            .iter()
            .map(|ellipsoid| ellipsoid.center().as_slice())
            .collect();
        let longest_axis = bound
            .ellipsoids()
            .iter()
            .map(Ellipsoid::longest_semi_axis)
            .fold(0.0f64, f64::max);
        Err(NestError::SamplingStalled(
            ErrorInfo::new(
                "max-attempts",
                "no candidate improved on the worst live point",
            )
            .with_context("iteration", iteration.to_string())
            .with_context("worst_logl", worst.logl.to_string())
            .with_context("attempts", self.config.max_attempts.to_string())
            .with_context("likelihood_calls", calls.to_string())
            .with_context("bound_ellipsoids", bound.len().to_string())
            .with_context("bound_volume", bound.total_volume().to_string())
            .with_context("bound_centers", format!("{centers:?}"))
            .with_context("bound_longest_axis", longest_axis.to_string())
            .with_hint("raise max_attempts or check that the likelihood can improve"),
        )
        .into())
    }
}

fn in_unit_cube(point: &[f64]) -> bool {
    point.iter().all(|x| (0.0..1.0).contains(x))
}

/// Runs nested sampling on `model` with `npar` parameters.
///
/// Progress is reported through a [`TracingObserver`] labelled with
/// `config.label`.
pub fn run<M: Model>(
    model: M,
    npar: usize,
    config: &NestConfig,
) -> Result<RunResult, RunError<M::Error>> {
    let mut observer = TracingObserver::new();
    if let Some(label) = &config.label {
        observer = observer.with_label(label.clone());
    }
    Sampler::new(model, npar, config).observe(observer).run()
}

/// Runs nested sampling on an infallible likelihood and prior transform.
///
/// `prior` maps the unit cube `[0, 1)^npar` to parameter space and
/// `loglikelihood` evaluates the transformed parameters.
pub fn nest<L, P>(
    loglikelihood: L,
    prior: P,
    npar: usize,
    config: &NestConfig,
) -> Result<RunResult, NestError>
where
    L: Fn(&[f64]) -> f64,
    P: Fn(&[f64]) -> Vec<f64>,
{
    run(FnModel::new(loglikelihood, prior), npar, config).map_err(NestError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_is_half_open() {
        assert!(in_unit_cube(&[0.0, 0.999]));
        assert!(!in_unit_cube(&[1.0, 0.5]));
        assert!(!in_unit_cube(&[-1e-12, 0.5]));
    }

    #[test]
    fn clustering_draws_from_its_own_substream() {
        let model = FnModel::new(|_: &[f64]| 0.0, |u: &[f64]| u.to_vec());
        let mut sampler = Sampler::new(model, 2, &NestConfig::default()).with_seed(21);
        let mut expected = RngHandle::substream(21, CLUSTER_SUBSTREAM);
        let mut sampling = RngHandle::from_seed(21);
        let cluster_draw = sampler.cluster_rng.uniform();
        assert_eq!(cluster_draw, expected.uniform());
        assert_eq!(sampler.rng.uniform(), sampling.uniform());
        assert_ne!(cluster_draw, RngHandle::from_seed(21).uniform());
    }

    #[test]
    fn cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_cancelled());
        clone.cancel();
        assert!(flag.is_cancelled());
    }
}
