use ens_core::RngHandle;
use ens_ellipsoid::{partition, Ellipsoid, EllipsoidCover, PartitionOptions};
use nalgebra::{DMatrix, DVector};

fn interval(center: f64, half_width: f64) -> Ellipsoid {
    Ellipsoid::ball(DVector::from_vec(vec![center]), half_width).unwrap()
}

#[test]
fn overlapping_intervals_are_sampled_uniformly_over_union() {
    // [0, 2] and [1, 4]: union [0, 4], overlap [1, 2] holds a quarter of it.
    let cover = EllipsoidCover::new(vec![interval(1.0, 1.0), interval(2.5, 1.5)]).unwrap();
    assert_eq!(cover.len(), 2);
    assert!((cover.total_volume() - 5.0).abs() < 1e-12);

    let mut rng = RngHandle::from_seed(77);
    let draws = 40_000;
    let mut in_overlap = 0usize;
    let mut left_only = 0usize;
    for _ in 0..draws {
        let x = cover.sample(&mut rng).unwrap()[0];
        assert!((0.0..=4.0).contains(&x));
        if (1.0..=2.0).contains(&x) {
            in_overlap += 1;
        } else if x < 1.0 {
            left_only += 1;
        }
    }
    let overlap_fraction = in_overlap as f64 / draws as f64;
    let left_fraction = left_only as f64 / draws as f64;
    assert!((overlap_fraction - 0.25).abs() < 0.015, "overlap {overlap_fraction}");
    assert!((left_fraction - 0.25).abs() < 0.015, "left {left_fraction}");
}

#[test]
fn enlarged_cover_scales_every_member() {
    let cover = EllipsoidCover::new(vec![interval(0.0, 1.0), interval(5.0, 2.0)]).unwrap();
    let enlarged = cover.enlarged(4.0).unwrap();
    assert!((enlarged.total_volume() - 2.0 * cover.total_volume()).abs() < 1e-12);
    assert!(enlarged.contains(&[1.9]));
    assert!(!cover.contains(&[1.9]));
    assert_eq!(enlarged.multiplicity(&[2.5]), 1);
}

#[test]
fn empty_cover_is_rejected() {
    let err = EllipsoidCover::new(Vec::new()).unwrap_err();
    assert_eq!(err.info().code, "empty-cover");
}

#[test]
fn indefinite_member_is_regularized_into_a_usable_cover() {
    // Eigenvalues 3 and -1: invertible but not positive semi-definite.
    let shape = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
    let indefinite = Ellipsoid::new(shape, DVector::zeros(2)).unwrap();
    let side = Ellipsoid::ball(DVector::from_vec(vec![4.0, 0.0]), 0.5).unwrap();
    let cover = EllipsoidCover::new(vec![indefinite, side]).unwrap();
    assert_eq!(cover.len(), 2);
    assert!(cover.volumes().iter().all(|volume| *volume > 0.0));

    let repaired = &cover.ellipsoids()[0];
    let mut rng = RngHandle::from_seed(41);
    for _ in 0..2_000 {
        let x = cover.sample(&mut rng).unwrap();
        // The repaired member is needle-thin, so its precision loses digits.
        let inside_repaired = repaired.mahalanobis_sq(x.as_slice()) <= 1.0 + 1e-3;
        assert!(inside_repaired || cover.ellipsoids()[1].contains(x.as_slice()), "{x}");
    }
}

fn blob(rng: &mut RngHandle, center: [f64; 2], spread: f64, count: usize) -> Vec<Vec<f64>> {
    (0..count)
        .map(|_| {
            let u = rng.unit_cube(2);
            vec![
                center[0] + spread * (u[0] - 0.5),
                center[1] + spread * (u[1] - 0.5),
            ]
        })
        .collect()
}

#[test]
fn bimodal_points_are_split_into_separate_ellipsoids() {
    let mut rng = RngHandle::from_seed(2024);
    let mut points = blob(&mut rng, [0.2, 0.2], 0.1, 40);
    points.extend(blob(&mut rng, [0.8, 0.8], 0.1, 40));

    let single = Ellipsoid::fit(&points, None).unwrap();
    let cover = partition(&points, 0.01, &PartitionOptions::default(), &mut rng).unwrap();

    assert!(cover.len() >= 2, "expected a split, got {}", cover.len());
    assert!(cover.total_volume() < single.volume().unwrap());
    for ellipsoid in cover.ellipsoids() {
        assert!(!(ellipsoid.contains(&[0.2, 0.2]) && ellipsoid.contains(&[0.8, 0.8])));
    }
    for point in &points {
        assert!(cover
            .ellipsoids()
            .iter()
            .any(|e| e.mahalanobis_sq(point) <= 1.0 + 1e-9));
    }
}

#[test]
fn tight_unimodal_set_stays_single_when_split_does_not_pay() {
    let mut rng = RngHandle::from_seed(9);
    let points = blob(&mut rng, [0.5, 0.5], 0.2, 30);
    // Floor far above the fitted volume: parent is not oversized and the
    // children inherit the same floor, so no split is tighter.
    let cover = partition(&points, 1.0, &PartitionOptions::default(), &mut rng).unwrap();
    assert_eq!(cover.len(), 1);
    assert!((cover.total_volume() - 1.0).abs() < 1e-9);
}
