use serde::{Deserialize, Serialize};

use crate::result::RunResult;

/// Progress snapshot emitted once per iteration, after the worst point has
/// been replaced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationEvent {
    /// Zero-based iteration index.
    pub iteration: usize,
    /// Log-evidence after folding in the discarded point.
    pub logz: f64,
    /// Log prior width the discarded point was weighted with.
    pub logwidth: f64,
    /// Log-weight of the discarded point.
    pub logwt: f64,
    /// Log-likelihood of the discarded point.
    pub logl_worst: f64,
    /// Likelihood evaluations so far.
    pub ncalls: usize,
    /// Ellipsoids in the bound used for the replacement.
    pub nbound: usize,
}

/// Receives progress notifications from a running sampler.
pub trait Observer {
    /// Called after every iteration.
    fn on_iteration(&mut self, event: &IterationEvent);

    /// Called once with the final result.
    fn on_finish(&mut self, _result: &RunResult) {}
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn on_iteration(&mut self, event: &IterationEvent) {
        (**self).on_iteration(event)
    }

    fn on_finish(&mut self, result: &RunResult) {
        (**self).on_finish(result)
    }
}

impl<O: Observer + ?Sized> Observer for Box<O> {
    fn on_iteration(&mut self, event: &IterationEvent) {
        (**self).on_iteration(event)
    }

    fn on_finish(&mut self, result: &RunResult) {
        (**self).on_finish(result)
    }
}

/// Logs progress through `tracing` at debug level.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: Option<String>,
    every: usize,
}

impl TracingObserver {
    /// Observer logging every iteration without a label.
    pub fn new() -> Self {
        Self {
            label: None,
            every: 1,
        }
    }

    /// Prefixes every event with `label`.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Only logs every `every`-th iteration.
    pub fn every(mut self, every: usize) -> Self {
        self.every = every.max(1);
        self
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for TracingObserver {
    fn on_iteration(&mut self, event: &IterationEvent) {
        if event.iteration % self.every != 0 {
            return;
        }
        let label = self.label.as_deref().unwrap_or("");
        // logz stays near its -1e300 sentinel until the first weight lands.
        if event.logz > -1e6 {
            tracing::debug!(
                label,
                iter = event.iteration,
                logz = event.logz,
                ncalls = event.ncalls,
                nbound = event.nbound,
                "nested sampling progress"
            );
        } else {
            tracing::debug!(
                label,
                iter = event.iteration,
                ncalls = event.ncalls,
                "nested sampling progress"
            );
        }
    }

    fn on_finish(&mut self, result: &RunResult) {
        tracing::info!(
            label = self.label.as_deref().unwrap_or(""),
            calls = result.ncalls,
            time = result.time,
            "nested sampling finished"
        );
    }
}

/// Adapts a closure into an [`Observer`].
pub struct FnObserver<F>(pub F);

impl<F: FnMut(&IterationEvent)> Observer for FnObserver<F> {
    fn on_iteration(&mut self, event: &IterationEvent) {
        (self.0)(event)
    }
}
