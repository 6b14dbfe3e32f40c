use ens_core::{NestError, RngHandle};
use rand::Rng;

use crate::linalg;

/// Splits `points` into two groups with Lloyd's algorithm.
///
/// Centroids are seeded from two distinct points chosen at random. Returns a
/// label (0 or 1) per point. Iteration stops once no label changes or after
/// `max_iterations` passes. A group may end up empty when the points
/// coincide; callers treat that as an unsplittable set.
pub fn two_means<P: AsRef<[f64]>>(
    points: &[P],
    max_iterations: usize,
    rng: &mut RngHandle,
) -> Result<Vec<usize>, NestError> {
    let ndim = linalg::point_dimension(points)?;
    if points.len() < 2 {
        return Ok(vec![0; points.len()]);
    }
    let mut centroids = initialise_centroids(points, rng);
    let mut assignments = vec![0usize; points.len()];

    for _ in 0..max_iterations.max(1) {
        let updated = assign_clusters(points, &centroids, &mut assignments);
        recompute_centroids(points, &assignments, ndim, &mut centroids);
        if !updated {
            break;
        }
    }
    Ok(assignments)
}

fn initialise_centroids<P: AsRef<[f64]>>(points: &[P], rng: &mut RngHandle) -> [Vec<f64>; 2] {
    let first = rng.gen_range(0..points.len());
    let mut second = rng.gen_range(0..points.len() - 1);
    if second >= first {
        second += 1;
    }
    [
        points[first].as_ref().to_vec(),
        points[second].as_ref().to_vec(),
    ]
}

fn assign_clusters<P: AsRef<[f64]>>(
    points: &[P],
    centroids: &[Vec<f64>; 2],
    assignments: &mut [usize],
) -> bool {
    let mut changed = false;
    for (idx, point) in points.iter().enumerate() {
        let to_first = squared_distance(point.as_ref(), &centroids[0]);
        let to_second = squared_distance(point.as_ref(), &centroids[1]);
        let best = usize::from(to_second < to_first);
        if assignments[idx] != best {
            assignments[idx] = best;
            changed = true;
        }
    }
    changed
}

fn recompute_centroids<P: AsRef<[f64]>>(
    points: &[P],
    assignments: &[usize],
    ndim: usize,
    centroids: &mut [Vec<f64>; 2],
) {
    let mut sums = [vec![0.0; ndim], vec![0.0; ndim]];
    let mut counts = [0usize; 2];
    for (point, &cluster) in points.iter().zip(assignments) {
        counts[cluster] += 1;
        for (slot, value) in sums[cluster].iter_mut().zip(point.as_ref()) {
            *slot += value;
        }
    }
    for cluster in 0..2 {
        // An emptied cluster keeps its previous centroid.
        if counts[cluster] > 0 {
            let denom = counts[cluster] as f64;
            centroids[cluster] = sums[cluster].iter().map(|sum| sum / denom).collect();
        }
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
