//! Live point record.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A single sample: its unit-cube position, the prior-transformed parameters
/// and the log-likelihood evaluated there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Position in the unit hypercube.
    pub u: Vec<f64>,
    /// Position in parameter space, `prior(u)`.
    pub v: Vec<f64>,
    /// Log-likelihood at `v`.
    pub logl: f64,
    /// Uniform label in `[0, 1)` breaking ties between equal likelihoods.
    pub tiebreak: f64,
}

impl Point {
    /// Creates a new point record.
    pub fn new(u: Vec<f64>, v: Vec<f64>, logl: f64, tiebreak: f64) -> Self {
        Self {
            u,
            v,
            logl,
            tiebreak,
        }
    }

    /// Number of parameters carried by the point.
    pub fn ndim(&self) -> usize {
        self.u.len()
    }

    /// Orders points by log-likelihood, falling back to the tie-break label
    /// when likelihoods are equal. NaN likelihoods rank below everything.
    pub fn rank_cmp(&self, other: &Point) -> Ordering {
        rank_cmp(self.logl, self.tiebreak, other.logl, other.tiebreak)
    }

    /// Whether this point lies strictly inside the likelihood contour of `other`.
    pub fn is_better_than(&self, other: &Point) -> bool {
        self.rank_cmp(other) == Ordering::Greater
    }
}

/// Compares two `(logl, tiebreak)` pairs lexicographically.
pub fn rank_cmp(logl_a: f64, tie_a: f64, logl_b: f64, tie_b: f64) -> Ordering {
    match (logl_a.is_nan(), logl_b.is_nan()) {
        (true, true) => return tie_a.total_cmp(&tie_b),
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }
    match logl_a.partial_cmp(&logl_b) {
        Some(Ordering::Equal) | None => tie_a.total_cmp(&tie_b),
        Some(order) => order,
    }
}
