use ens_core::errors::ErrorInfo;
use ens_core::{NestError, Point};

/// Fixed-size population of live points.
///
/// The size never changes after construction; the engine swaps exactly one
/// point per iteration through [`LivePointSet::replace`].
#[derive(Debug, Clone)]
pub struct LivePointSet {
    points: Vec<Point>,
}

impl LivePointSet {
    /// Wraps an initial population. All points must share one dimension.
    pub fn new(points: Vec<Point>) -> Result<Self, NestError> {
        let Some(first) = points.first() else {
            return Err(NestError::Config(ErrorInfo::new(
                "empty-live-set",
                "the live set needs at least one point",
            )));
        };
        let ndim = first.ndim();
        if let Some(bad) = points.iter().position(|point| point.ndim() != ndim) {
            return Err(NestError::Geometry(
                ErrorInfo::new("dimension-mismatch", "live points differ in dimension")
                    .with_context("expected", ndim.to_string())
                    .with_context("index", bad.to_string()),
            ));
        }
        Ok(Self { points })
    }

    /// Number of live points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the lowest ranked point.
    pub fn worst_index(&self) -> usize {
        self.points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.rank_cmp(b))
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }

    /// Point at `index`.
    pub fn get(&self, index: usize) -> &Point {
        &self.points[index]
    }

    /// Replaces the point at `index`, returning the evicted one.
    pub fn replace(&mut self, index: usize, point: Point) -> Point {
        std::mem::replace(&mut self.points[index], point)
    }

    /// Unit-cube positions of every live point.
    pub fn positions(&self) -> Vec<&[f64]> {
        self.points.iter().map(|point| point.u.as_slice()).collect()
    }

    /// Iterates over the live points.
    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    /// Highest log-likelihood in the set.
    pub fn max_logl(&self) -> f64 {
        self.points
            .iter()
            .map(|point| point.logl)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}
