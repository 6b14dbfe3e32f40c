use ens_core::errors::ErrorInfo;
use ens_core::{NestError, RngHandle};
use nalgebra::DVector;

use crate::ellipsoid::Ellipsoid;
use crate::sample::EllipsoidSampler;

/// Ordered set of one or more ellipsoids whose union bounds a point set.
///
/// Sampling is uniform over the union: an ellipsoid is chosen with
/// probability proportional to its volume, a point is drawn inside it, and
/// the point is kept with probability `1 / q` where `q` is the number of
/// ellipsoids containing it.
#[derive(Debug, Clone)]
pub struct EllipsoidCover {
    ellipsoids: Vec<Ellipsoid>,
    volumes: Vec<f64>,
    samplers: Vec<EllipsoidSampler>,
}

impl EllipsoidCover {
    /// Builds a cover, repairing shapes that fail the eigendecomposition.
    pub fn new(ellipsoids: Vec<Ellipsoid>) -> Result<Self, NestError> {
        if ellipsoids.is_empty() {
            return Err(NestError::Geometry(ErrorInfo::new(
                "empty-cover",
                "a cover needs at least one ellipsoid",
            )));
        }
        let ndim = ellipsoids[0].ndim();
        if ellipsoids.iter().any(|ellipsoid| ellipsoid.ndim() != ndim) {
            return Err(NestError::Geometry(
                ErrorInfo::new("dimension-mismatch", "cover ellipsoids differ in dimension")
                    .with_context("ndim", ndim.to_string()),
            ));
        }

        let mut repaired = Vec::with_capacity(ellipsoids.len());
        let mut volumes = Vec::with_capacity(ellipsoids.len());
        let mut samplers = Vec::with_capacity(ellipsoids.len());
        for ellipsoid in ellipsoids {
            let (ellipsoid, sampler) = match EllipsoidSampler::new(&ellipsoid) {
                Ok(sampler) => (ellipsoid, sampler),
                Err(NestError::InvalidShape(info)) => {
                    tracing::warn!(code = %info.code, "regularizing ellipsoid shape");
                    let fixed = ellipsoid.regularized()?;
                    let sampler = EllipsoidSampler::new(&fixed)?;
                    (fixed, sampler)
                }
                Err(err) => return Err(err),
            };
            volumes.push(ellipsoid.volume()?);
            samplers.push(sampler);
            repaired.push(ellipsoid);
        }
        Ok(Self {
            ellipsoids: repaired,
            volumes,
            samplers,
        })
    }

    /// Cover made of a single ellipsoid.
    pub fn single(ellipsoid: Ellipsoid) -> Result<Self, NestError> {
        Self::new(vec![ellipsoid])
    }

    /// Number of ellipsoids.
    pub fn len(&self) -> usize {
        self.ellipsoids.len()
    }

    /// Whether the cover has no members; never true once constructed.
    pub fn is_empty(&self) -> bool {
        self.ellipsoids.is_empty()
    }

    /// Dimension of the covered space.
    pub fn ndim(&self) -> usize {
        self.ellipsoids[0].ndim()
    }

    /// Member ellipsoids in order.
    pub fn ellipsoids(&self) -> &[Ellipsoid] {
        &self.ellipsoids
    }

    /// Volumes of the member ellipsoids.
    pub fn volumes(&self) -> &[f64] {
        &self.volumes
    }

    /// Sum of the member volumes (overlaps counted repeatedly).
    pub fn total_volume(&self) -> f64 {
        self.volumes.iter().sum()
    }

    /// Number of member ellipsoids containing `point`.
    pub fn multiplicity(&self, point: &[f64]) -> usize {
        self.ellipsoids
            .iter()
            .filter(|ellipsoid| ellipsoid.contains(point))
            .count()
    }

    /// Whether any member contains `point`.
    pub fn contains(&self, point: &[f64]) -> bool {
        self.ellipsoids
            .iter()
            .any(|ellipsoid| ellipsoid.contains(point))
    }

    /// Returns the cover with every shape multiplied by `factor`.
    pub fn enlarged(&self, factor: f64) -> Result<Self, NestError> {
        Self::new(
            self.ellipsoids
                .iter()
                .map(|ellipsoid| ellipsoid.scaled(factor))
                .collect(),
        )
    }

    /// Draws one point uniformly from the union of the members.
    pub fn sample(&self, rng: &mut RngHandle) -> Result<DVector<f64>, NestError> {
        if self.samplers.len() == 1 {
            return self.samplers[0].draw(rng);
        }
        let total = self.total_volume();
        loop {
            let index = self.pick(rng.uniform() * total);
            let point = self.samplers[index].draw(rng)?;
            let overlap = self.multiplicity(point.as_slice());
            if overlap <= 1 || rng.uniform() * (overlap as f64) < 1.0 {
                return Ok(point);
            }
        }
    }

    fn pick(&self, target: f64) -> usize {
        let mut cumulative = 0.0;
        for (index, volume) in self.volumes.iter().enumerate() {
            cumulative += volume;
            if target < cumulative {
                return index;
            }
        }
        self.volumes.len() - 1
    }
}
