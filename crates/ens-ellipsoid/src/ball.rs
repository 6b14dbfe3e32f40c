use ens_core::errors::ErrorInfo;
use ens_core::{NestError, RngHandle};
use nalgebra::DVector;
use rand_distr::{Distribution, StandardNormal};

/// Draws a point uniformly distributed inside the `ndim`-dimensional unit ball.
///
/// The direction comes from a normalised standard-normal vector and the
/// radius from `r^(1/ndim)` with `r ~ U[0, 1)`, which gives the radial
/// density proportional to `radius^(ndim - 1)`.
pub fn sample_ball(ndim: usize, rng: &mut RngHandle) -> Result<DVector<f64>, NestError> {
    if ndim == 0 {
        return Err(NestError::Geometry(
            ErrorInfo::new("invalid-dimension", "unit ball requires at least one dimension")
                .with_context("ndim", "0"),
        ));
    }
    let direction = loop {
        let z = DVector::<f64>::from_fn(ndim, |_, _| StandardNormal.sample(&mut *rng));
        let norm = z.norm();
        if norm > 0.0 && norm.is_finite() {
            break z / norm;
        }
    };
    let radius = rng.uniform().powf(1.0 / ndim as f64);
    Ok(direction * radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_stay_inside_unit_ball() {
        let mut rng = RngHandle::from_seed(3);
        for ndim in 1..6 {
            for _ in 0..500 {
                let x = sample_ball(ndim, &mut rng).unwrap();
                assert_eq!(x.len(), ndim);
                assert!(x.norm() <= 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let mut rng = RngHandle::from_seed(3);
        let err = sample_ball(0, &mut rng).unwrap_err();
        assert_eq!(err.info().code, "invalid-dimension");
    }

    #[test]
    fn radius_follows_volume_weighting() {
        // P(|x| < 1/2) = 2^-ndim for a uniform ball.
        let mut rng = RngHandle::from_seed(11);
        let draws = 20_000;
        let inner = (0..draws)
            .filter(|_| sample_ball(3, &mut rng).unwrap().norm() < 0.5)
            .count();
        let fraction = inner as f64 / draws as f64;
        assert!((fraction - 0.125).abs() < 0.01, "fraction {fraction}");
    }
}
