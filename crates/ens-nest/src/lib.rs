#![deny(missing_docs)]

//! Ellipsoidal nested sampling: evidence, information and weighted posterior
//! samples for a user supplied likelihood and prior transform.

/// YAML configuration schema and defaults.
pub mod config;
/// Replace-the-worst-point loop and public `run`/`nest` entry points.
pub mod engine;
/// Evidence and information accumulators.
pub mod evidence;
/// Fixed-size live point population.
pub mod live;
/// Progress reporting hooks.
pub mod observer;
/// Run results, posterior summaries and JSON export.
pub mod result;

pub use config::{BoundConfig, NestConfig, SeedPolicy};
pub use engine::{nest, run, CancelFlag, RunError, Sampler};
pub use ens_core::{FnModel, Model, NestError, Point, RngHandle};
pub use evidence::{log_add_exp, EvidenceAccumulator};
pub use live::LivePointSet;
pub use observer::{FnObserver, IterationEvent, Observer, TracingObserver};
pub use result::{RunResult, SampleRecord};
