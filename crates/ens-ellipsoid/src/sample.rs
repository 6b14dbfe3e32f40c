use ens_core::errors::ErrorInfo;
use ens_core::{NestError, RngHandle};
use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::ball::sample_ball;
use crate::ellipsoid::Ellipsoid;
use crate::linalg;

/// Draws uniform points inside an ellipsoid through the affine map
/// `x = V sqrt(L) s + center`, where `shape = V L V^T` and `s` is uniform in
/// the unit ball.
#[derive(Debug, Clone)]
pub struct EllipsoidSampler {
    transform: DMatrix<f64>,
    center: DVector<f64>,
}

impl EllipsoidSampler {
    /// Eigendecomposes the ellipsoid shape once for repeated draws.
    pub fn new(ellipsoid: &Ellipsoid) -> Result<Self, NestError> {
        let eigen = SymmetricEigen::new(linalg::symmetrize(ellipsoid.shape()));
        if let Some((axis, value)) = eigen
            .eigenvalues
            .iter()
            .enumerate()
            .find(|(_, value)| **value < 0.0 || value.is_nan())
        {
            return Err(NestError::InvalidShape(
                ErrorInfo::new("negative-eigenvalue", "shape matrix is not positive semi-definite")
                    .with_context("axis", axis.to_string())
                    .with_context("eigenvalue", value.to_string())
                    .with_hint("symmetrize and clamp eigenvalues with Ellipsoid::regularized"),
            ));
        }
        let scales = eigen.eigenvalues.map(f64::sqrt);
        let transform = &eigen.eigenvectors * DMatrix::from_diagonal(&scales);
        Ok(Self {
            transform,
            center: ellipsoid.center().clone(),
        })
    }

    /// Dimension of the sampled space.
    pub fn ndim(&self) -> usize {
        self.center.len()
    }

    /// Draws one point.
    pub fn draw(&self, rng: &mut RngHandle) -> Result<DVector<f64>, NestError> {
        let ball = sample_ball(self.ndim(), rng)?;
        Ok(&self.transform * ball + &self.center)
    }

    /// Draws `count` points.
    pub fn draw_n(&self, count: usize, rng: &mut RngHandle) -> Result<Vec<DVector<f64>>, NestError> {
        (0..count).map(|_| self.draw(rng)).collect()
    }
}

/// Draws a single uniform point inside `ellipsoid`.
pub fn sample_ellipsoid(
    ellipsoid: &Ellipsoid,
    rng: &mut RngHandle,
) -> Result<DVector<f64>, NestError> {
    EllipsoidSampler::new(ellipsoid)?.draw(rng)
}

/// Draws `count` uniform points inside `ellipsoid`.
pub fn sample_ellipsoid_n(
    ellipsoid: &Ellipsoid,
    count: usize,
    rng: &mut RngHandle,
) -> Result<Vec<DVector<f64>>, NestError> {
    EllipsoidSampler::new(ellipsoid)?.draw_n(count, rng)
}
