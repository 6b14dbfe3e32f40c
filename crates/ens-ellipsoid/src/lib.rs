#![deny(missing_docs)]
//! Ellipsoidal bounds for nested sampling: minimum-enclosing ellipsoid fits,
//! closed-form volumes, uniform sampling inside one ellipsoid or a union of
//! several, and the recursive multi-ellipsoid partitioner.

/// Uniform sampling inside the unit ball.
pub mod ball;
/// Ellipsoid covers and uniform sampling over their union.
pub mod cover;
/// Ellipsoid representation, fitting and volume.
pub mod ellipsoid;
/// Two-means clustering used by the partitioner.
pub mod kmeans;
mod linalg;
/// Recursive multi-ellipsoid decomposition of a point set.
pub mod partition;
/// Uniform sampling inside a single ellipsoid.
pub mod sample;

pub use ball::sample_ball;
pub use cover::EllipsoidCover;
pub use ellipsoid::{shape_volume, unit_ball_volume, Ellipsoid};
pub use kmeans::two_means;
pub use partition::{partition, PartitionOptions};
pub use sample::{sample_ellipsoid, sample_ellipsoid_n, EllipsoidSampler};
