use ens_core::errors::ErrorInfo;
use ens_core::NestError;
use nalgebra::{DMatrix, DVector};

/// Returns the shared dimension of a non-empty point set.
pub(crate) fn point_dimension<P: AsRef<[f64]>>(points: &[P]) -> Result<usize, NestError> {
    let Some(first) = points.first() else {
        return Err(NestError::Geometry(ErrorInfo::new(
            "empty-point-set",
            "at least one point is required",
        )));
    };
    let ndim = first.as_ref().len();
    if ndim == 0 {
        return Err(NestError::Geometry(
            ErrorInfo::new("invalid-dimension", "points must have at least one coordinate")
                .with_context("ndim", "0"),
        ));
    }
    if let Some((idx, point)) = points
        .iter()
        .enumerate()
        .find(|(_, point)| point.as_ref().len() != ndim)
    {
        return Err(NestError::Geometry(
            ErrorInfo::new("dimension-mismatch", "points have inconsistent lengths")
                .with_context("expected", ndim.to_string())
                .with_context("index", idx.to_string())
                .with_context("found", point.as_ref().len().to_string()),
        ));
    }
    Ok(ndim)
}

pub(crate) fn to_vector(point: &[f64]) -> DVector<f64> {
    DVector::from_column_slice(point)
}

pub(crate) fn mean<P: AsRef<[f64]>>(points: &[P], ndim: usize) -> DVector<f64> {
    let mut sum = DVector::<f64>::zeros(ndim);
    for point in points {
        for (slot, value) in sum.iter_mut().zip(point.as_ref()) {
            *slot += value;
        }
    }
    sum / points.len() as f64
}

/// Unbiased sample covariance (divides by `m - 1`).
pub(crate) fn covariance<P: AsRef<[f64]>>(points: &[P], mean: &DVector<f64>) -> DMatrix<f64> {
    let ndim = mean.len();
    let mut cov = DMatrix::<f64>::zeros(ndim, ndim);
    for point in points {
        let delta = to_vector(point.as_ref()) - mean;
        cov += &delta * delta.transpose();
    }
    let denom = (points.len().saturating_sub(1)).max(1) as f64;
    let cov = cov / denom;
    symmetrize(&cov)
}

pub(crate) fn symmetrize(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    0.5 * (matrix + matrix.transpose())
}

/// `delta^T precision delta`.
pub(crate) fn quadratic_form(precision: &DMatrix<f64>, delta: &DVector<f64>) -> f64 {
    delta.dot(&(precision * delta))
}
