use std::f64::consts::PI;

use ens_core::errors::ErrorInfo;
use ens_core::NestError;
use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::linalg;

/// Relative floor applied to eigenvalues by [`Ellipsoid::regularized`].
const EIGENVALUE_FLOOR: f64 = 1e-12;

/// Relative padding keeping the farthest fitted point inside after rounding.
const BOUNDARY_PAD: f64 = 1e-9;

/// Ellipsoid `{x : (x - center)^T shape^-1 (x - center) <= 1}`.
///
/// The inverse of the shape matrix is cached because Mahalanobis distances
/// are evaluated for every point during fitting and partitioning.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipsoid {
    shape: DMatrix<f64>,
    center: DVector<f64>,
    precision: DMatrix<f64>,
}

impl Ellipsoid {
    /// Creates an ellipsoid from a shape matrix and a center.
    pub fn new(shape: DMatrix<f64>, center: DVector<f64>) -> Result<Self, NestError> {
        let ndim = center.len();
        if ndim == 0 {
            return Err(NestError::Geometry(
                ErrorInfo::new("invalid-dimension", "ellipsoid requires at least one dimension")
                    .with_context("ndim", "0"),
            ));
        }
        if shape.nrows() != ndim || shape.ncols() != ndim {
            return Err(NestError::Geometry(
                ErrorInfo::new("shape-mismatch", "shape matrix must be ndim x ndim")
                    .with_context("ndim", ndim.to_string())
                    .with_context("rows", shape.nrows().to_string())
                    .with_context("cols", shape.ncols().to_string()),
            ));
        }
        let precision = shape.clone().try_inverse().ok_or_else(|| {
            NestError::InvalidShape(
                ErrorInfo::new("singular-shape", "shape matrix is not invertible")
                    .with_context("ndim", ndim.to_string())
                    .with_hint("regularize the shape before constructing the ellipsoid"),
            )
        })?;
        Ok(Self {
            shape,
            center,
            precision,
        })
    }

    /// Ball of the given radius around `center`.
    pub fn ball(center: DVector<f64>, radius: f64) -> Result<Self, NestError> {
        let ndim = center.len();
        let shape = DMatrix::<f64>::identity(ndim, ndim) * (radius * radius);
        Self::new(shape, center)
    }

    /// Fits the enclosing ellipsoid of `points`.
    ///
    /// The shape is the unbiased sample covariance scaled by the largest
    /// Mahalanobis distance squared of any point, so the farthest point lies
    /// on the boundary, padded by a relative `1e-9` against rounding. When
    /// `min_volume` is given the shape is then enlarged until the volume
    /// reaches it.
    pub fn fit<P: AsRef<[f64]>>(points: &[P], min_volume: Option<f64>) -> Result<Self, NestError> {
        let ndim = linalg::point_dimension(points)?;
        if points.len() < ndim + 1 {
            return Err(NestError::Degenerate(
                ErrorInfo::new(
                    "too-few-points",
                    "a covariance fit needs at least ndim + 1 points",
                )
                .with_context("ndim", ndim.to_string())
                .with_context("points", points.len().to_string()),
            ));
        }
        let mean = linalg::mean(points, ndim);
        let cov = linalg::covariance(points, &mean);
        let cov_inv = cov
            .clone()
            .cholesky()
            .map(|chol| chol.inverse())
            .ok_or_else(|| {
                NestError::Degenerate(
                    ErrorInfo::new("singular-covariance", "sample covariance is not invertible")
                        .with_context("ndim", ndim.to_string())
                        .with_context("points", points.len().to_string()),
                )
            })?;

        let enlargement = points
            .iter()
            .map(|point| {
                let delta = linalg::to_vector(point.as_ref()) - &mean;
                linalg::quadratic_form(&cov_inv, &delta)
            })
            .fold(0.0f64, f64::max);
        if !(enlargement > 0.0 && enlargement.is_finite()) {
            return Err(NestError::Degenerate(
                ErrorInfo::new("zero-extent", "points do not span a volume")
                    .with_context("enlargement", enlargement.to_string()),
            ));
        }

        let enlargement = enlargement * (1.0 + BOUNDARY_PAD);
        let mut ellipsoid = Self {
            shape: cov * enlargement,
            center: mean,
            precision: cov_inv / enlargement,
        };
        if let Some(min_volume) = min_volume {
            ellipsoid.enlarge_to_volume(min_volume)?;
        }
        Ok(ellipsoid)
    }

    /// Ball centred on the mean of `points` that contains every point and
    /// whose volume is at least `min_volume`.
    ///
    /// Used wherever a full covariance fit is impossible.
    pub fn isotropic_fallback<P: AsRef<[f64]>>(
        points: &[P],
        min_volume: Option<f64>,
    ) -> Result<Self, NestError> {
        let ndim = linalg::point_dimension(points)?;
        let center = linalg::mean(points, ndim);
        let reach = points
            .iter()
            .map(|point| (linalg::to_vector(point.as_ref()) - &center).norm())
            .fold(0.0f64, f64::max);
        let floor = min_volume
            .filter(|volume| *volume > 0.0)
            .map(|volume| (volume / unit_ball_volume(ndim)).powf(1.0 / ndim as f64))
            .unwrap_or(0.0);
        let mut radius = (reach * (1.0 + BOUNDARY_PAD)).max(floor);
        if radius <= 0.0 {
            radius = f64::EPSILON.sqrt();
        }
        Self::ball(center, radius)
    }

    /// [`Ellipsoid::fit`], substituting [`Ellipsoid::isotropic_fallback`]
    /// when the points are degenerate.
    pub fn fit_or_fallback<P: AsRef<[f64]>>(
        points: &[P],
        min_volume: Option<f64>,
    ) -> Result<Self, NestError> {
        match Self::fit(points, min_volume) {
            Err(NestError::Degenerate(info)) => {
                tracing::warn!(
                    code = %info.code,
                    points = points.len(),
                    "covariance fit degenerate, using isotropic ellipsoid"
                );
                Self::isotropic_fallback(points, min_volume)
            }
            other => other,
        }
    }

    /// Dimension of the ambient space.
    pub fn ndim(&self) -> usize {
        self.center.len()
    }

    /// Shape matrix.
    pub fn shape(&self) -> &DMatrix<f64> {
        &self.shape
    }

    /// Center of the ellipsoid.
    pub fn center(&self) -> &DVector<f64> {
        &self.center
    }

    /// Length of the longest semi-axis, `sqrt` of the largest shape eigenvalue.
    pub fn longest_semi_axis(&self) -> f64 {
        SymmetricEigen::new(linalg::symmetrize(&self.shape))
            .eigenvalues
            .iter()
            .fold(0.0f64, |acc, value| acc.max(*value))
            .sqrt()
    }

    /// Volume of the ellipsoid.
    pub fn volume(&self) -> Result<f64, NestError> {
        shape_volume(&self.shape)
    }

    /// Mahalanobis distance squared `(x - c)^T shape^-1 (x - c)`.
    pub fn mahalanobis_sq(&self, point: &[f64]) -> f64 {
        let delta = linalg::to_vector(point) - &self.center;
        linalg::quadratic_form(&self.precision, &delta)
    }

    /// Whether `point` lies on or inside the boundary.
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.ndim() && self.mahalanobis_sq(point) <= 1.0
    }

    /// Returns the ellipsoid with its shape matrix multiplied by `factor`.
    ///
    /// Axes grow by `sqrt(factor)` and the volume by `factor^(ndim / 2)`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            shape: &self.shape * factor,
            center: self.center.clone(),
            precision: &self.precision / factor,
        }
    }

    /// Enlarges the shape uniformly so that the volume is at least `min_volume`.
    ///
    /// Volume scales as `c^(ndim / 2)` when the shape is multiplied by `c`,
    /// so the multiplier is `(min_volume / volume)^(2 / ndim)`.
    pub fn enlarge_to_volume(&mut self, min_volume: f64) -> Result<(), NestError> {
        let volume = self.volume()?;
        if !(min_volume > 0.0) || volume >= min_volume {
            return Ok(());
        }
        if !(volume > 0.0) {
            return Err(NestError::InvalidShape(
                ErrorInfo::new("zero-volume", "cannot rescale an ellipsoid with zero volume")
                    .with_context("min_volume", min_volume.to_string()),
            ));
        }
        let factor = (min_volume / volume).powf(2.0 / self.ndim() as f64);
        self.shape *= factor;
        self.precision /= factor;
        Ok(())
    }

    /// Symmetrizes the shape and clamps its eigenvalues to a small positive
    /// floor relative to the largest one.
    pub fn regularized(&self) -> Result<Self, NestError> {
        let eigen = SymmetricEigen::new(linalg::symmetrize(&self.shape));
        let largest = eigen
            .eigenvalues
            .iter()
            .fold(0.0f64, |acc, value| acc.max(value.abs()));
        let floor = (largest * EIGENVALUE_FLOOR).max(f64::MIN_POSITIVE);
        let clamped = eigen.eigenvalues.map(|value| value.max(floor));
        let shape = &eigen.eigenvectors
            * DMatrix::from_diagonal(&clamped)
            * eigen.eigenvectors.transpose();
        Self::new(linalg::symmetrize(&shape), self.center.clone())
    }
}

/// Volume of the `ndim`-dimensional unit ball.
///
/// Even `ndim`: `prod_{k = 2, 4, .., ndim} 2 pi / k`.
/// Odd `ndim`: `2 prod_{k = 3, 5, .., ndim} 2 pi / k`.
pub fn unit_ball_volume(ndim: usize) -> f64 {
    let (mut volume, start) = if ndim % 2 == 0 { (1.0, 2) } else { (2.0, 3) };
    let mut k = start;
    while k <= ndim {
        volume *= 2.0 * PI / k as f64;
        k += 2;
    }
    volume
}

/// Volume `sqrt(det(shape)) * V_ndim` of the ellipsoid with the given shape.
pub fn shape_volume(shape: &DMatrix<f64>) -> Result<f64, NestError> {
    let ndim = shape.nrows();
    if ndim == 0 || shape.ncols() != ndim {
        return Err(NestError::Geometry(
            ErrorInfo::new("shape-mismatch", "shape matrix must be square and non-empty")
                .with_context("rows", ndim.to_string())
                .with_context("cols", shape.ncols().to_string()),
        ));
    }
    let det = shape.determinant();
    if det < 0.0 || det.is_nan() {
        return Err(NestError::InvalidShape(
            ErrorInfo::new("negative-determinant", "shape determinant is negative")
                .with_context("det", det.to_string())
                .with_hint("symmetrize and clamp eigenvalues with Ellipsoid::regularized"),
        ));
    }
    Ok(det.sqrt() * unit_ball_volume(ndim))
}
