use ens_core::RngHandle;
use ens_ellipsoid::{sample_ellipsoid, sample_ellipsoid_n, Ellipsoid, EllipsoidSampler};
use nalgebra::{DMatrix, DVector};

fn empirical_covariance(points: &[DVector<f64>]) -> DMatrix<f64> {
    let ndim = points[0].len();
    let n = points.len() as f64;
    let mean = points.iter().fold(DVector::<f64>::zeros(ndim), |acc, p| acc + p) / n;
    let mut cov = DMatrix::<f64>::zeros(ndim, ndim);
    for p in points {
        let d = p - &mean;
        cov += &d * d.transpose();
    }
    cov / (n - 1.0)
}

fn check_moments(shape: DMatrix<f64>, center: DVector<f64>, seed: u64) {
    let ndim = center.len();
    let ellipsoid = Ellipsoid::new(shape.clone(), center.clone()).unwrap();
    let mut rng = RngHandle::from_seed(seed);
    let draws = sample_ellipsoid_n(&ellipsoid, 40_000, &mut rng).unwrap();

    for point in &draws {
        assert!(ellipsoid.mahalanobis_sq(point.as_slice()) <= 1.0 + 1e-9);
    }

    let expected = &shape / (ndim as f64 + 2.0);
    let observed = empirical_covariance(&draws);
    let scale = expected.amax();
    for i in 0..ndim {
        for j in 0..ndim {
            let diff = (observed[(i, j)] - expected[(i, j)]).abs();
            assert!(
                diff < 0.03 * scale,
                "entry ({i},{j}): observed {} expected {}",
                observed[(i, j)],
                expected[(i, j)]
            );
        }
    }

    let mean = draws.iter().fold(DVector::<f64>::zeros(ndim), |acc, p| acc + p) / draws.len() as f64;
    assert!((mean - center).amax() < 0.06 * scale.sqrt());
}

#[test]
fn rotated_ellipse_has_expected_covariance() {
    let shape = DMatrix::from_row_slice(2, 2, &[0.09, 0.05, 0.05, 0.04]);
    check_moments(shape, DVector::from_vec(vec![0.4, 0.6]), 21);
}

#[test]
fn ellipsoid_in_3d_has_expected_covariance() {
    let shape = DMatrix::from_row_slice(
        3,
        3,
        &[0.5, 0.1, 0.05, 0.1, 0.3, -0.08, 0.05, -0.08, 0.2],
    );
    check_moments(shape, DVector::from_vec(vec![1.0, -1.0, 0.0]), 34);
}

#[test]
fn single_draw_matches_sampler_dimension() {
    let ellipsoid = Ellipsoid::ball(DVector::from_vec(vec![0.0; 4]), 2.0).unwrap();
    let mut rng = RngHandle::from_seed(8);
    let point = sample_ellipsoid(&ellipsoid, &mut rng).unwrap();
    assert_eq!(point.len(), 4);
    assert!(point.norm() <= 2.0 + 1e-12);
    let sampler = EllipsoidSampler::new(&ellipsoid).unwrap();
    assert_eq!(sampler.ndim(), 4);
}

#[test]
fn indefinite_shape_is_rejected_by_sampler() {
    let shape = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
    let ellipsoid = Ellipsoid::new(shape, DVector::zeros(2)).unwrap();
    let err = EllipsoidSampler::new(&ellipsoid).unwrap_err();
    assert_eq!(err.info().code, "negative-eigenvalue");
}
