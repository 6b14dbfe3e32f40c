#![deny(missing_docs)]

//! Toy models and run manifests backing the `ens-sim` command line tool.

/// Run manifest written next to every result.
pub mod manifest;
/// Built-in toy problems with known evidence.
pub mod models;

pub use manifest::{config_hash, RunManifest};
pub use models::{ToyModel, ToyModelError, ToyProblem};
