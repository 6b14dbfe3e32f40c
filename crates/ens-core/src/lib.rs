#![deny(missing_docs)]
#![doc = "Core types shared by the ellipsoidal nested sampling crates: structured errors, seeded randomness, the live point record and the model callback contract."]

pub mod errors;
pub mod model;
pub mod point;
pub mod rng;

pub use errors::{ErrorInfo, NestError};
pub use model::{FnModel, Model};
pub use point::Point;
pub use rng::{derive_substream_seed, RngHandle};
