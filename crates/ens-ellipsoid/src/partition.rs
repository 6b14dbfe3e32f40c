use ens_core::{NestError, RngHandle};

use crate::cover::EllipsoidCover;
use crate::ellipsoid::Ellipsoid;
use crate::kmeans::two_means;
use crate::linalg;

/// Relative margin by which a split must beat the parent volume; volumes
/// pinned to the same floor differ only by rounding.
const SPLIT_VOLUME_RTOL: f64 = 1e-9;

/// Options controlling the recursive multi-ellipsoid decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionOptions {
    /// Maximum Lloyd passes of the initial 2-means split.
    pub kmeans_iterations: usize,
    /// Maximum volume-weighted reassignment passes per split.
    pub reassign_iterations: usize,
    /// Maximum recursion depth.
    pub max_depth: usize,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            kmeans_iterations: 10,
            reassign_iterations: 20,
            max_depth: 8,
        }
    }
}

/// Covers `points` with one or more ellipsoids whose total volume is at least
/// `min_volume`.
///
/// Each level fits a parent ellipsoid, splits the points with 2-means, refines
/// the split by moving every point to the cluster minimising
/// `h_k = (V_k / V_k_expected) * d_k`, and keeps the split when the two
/// children are tighter than the parent (`V_1 + V_2 < V`) or the parent is
/// more than twice the expected volume (`V > 2 * min_volume`). Accepted
/// splits recurse on each child with the child's share of `min_volume`.
pub fn partition<P: AsRef<[f64]>>(
    points: &[P],
    min_volume: f64,
    opts: &PartitionOptions,
    rng: &mut RngHandle,
) -> Result<EllipsoidCover, NestError> {
    linalg::point_dimension(points)?;
    let views: Vec<&[f64]> = points.iter().map(|point| point.as_ref()).collect();
    let mut leaves = Vec::new();
    split_recursive(&views, min_volume, opts, rng, 0, &mut leaves)?;
    tracing::trace!(ellipsoids = leaves.len(), points = points.len(), "partitioned live set");
    EllipsoidCover::new(leaves)
}

struct Cluster {
    ellipsoid: Ellipsoid,
    volume: f64,
    count: usize,
}

fn split_recursive(
    points: &[&[f64]],
    min_volume: f64,
    opts: &PartitionOptions,
    rng: &mut RngHandle,
    depth: usize,
    leaves: &mut Vec<Ellipsoid>,
) -> Result<(), NestError> {
    let ndim = linalg::point_dimension(points)?;
    let floor = ndim + 1;
    let parent = Ellipsoid::fit_or_fallback(points, Some(min_volume))?;
    if depth >= opts.max_depth || points.len() < 2 * floor {
        leaves.push(parent);
        return Ok(());
    }
    let parent_volume = parent.volume()?;

    let mut labels = two_means(points, opts.kmeans_iterations, rng)?;
    let Some(mut clusters) = fit_clusters(points, &labels, min_volume)? else {
        leaves.push(parent);
        return Ok(());
    };

    for _ in 0..opts.reassign_iterations {
        if !reassign(points, &mut labels, &clusters) {
            break;
        }
        match fit_clusters(points, &labels, min_volume)? {
            Some(refit) => clusters = refit,
            None => {
                leaves.push(parent);
                return Ok(());
            }
        }
    }

    let children_volume = clusters[0].volume + clusters[1].volume;
    let tighter = children_volume < parent_volume * (1.0 - SPLIT_VOLUME_RTOL);
    let oversized = parent_volume > 2.0 * min_volume;
    let supported = clusters.iter().all(|cluster| cluster.count >= floor);
    if !(supported && (tighter || oversized)) {
        leaves.push(parent);
        return Ok(());
    }

    let total = points.len() as f64;
    for label in 0..2 {
        let subset: Vec<&[f64]> = points
            .iter()
            .zip(&labels)
            .filter(|(_, assigned)| **assigned == label)
            .map(|(point, _)| *point)
            .collect();
        let share = min_volume * subset.len() as f64 / total;
        split_recursive(&subset, share, opts, rng, depth + 1, leaves)?;
    }
    Ok(())
}

/// Fits one ellipsoid per label; `None` when a cluster is empty.
fn fit_clusters(
    points: &[&[f64]],
    labels: &[usize],
    min_volume: f64,
) -> Result<Option<[Cluster; 2]>, NestError> {
    let total = points.len() as f64;
    let mut fitted = Vec::with_capacity(2);
    for label in 0..2 {
        let members: Vec<&[f64]> = points
            .iter()
            .zip(labels)
            .filter(|(_, assigned)| **assigned == label)
            .map(|(point, _)| *point)
            .collect();
        if members.is_empty() {
            return Ok(None);
        }
        let ndim = members[0].len();
        let share = min_volume * members.len() as f64 / total;
        let ellipsoid = if members.len() > ndim {
            Ellipsoid::fit_or_fallback(&members, Some(share))?
        } else {
            Ellipsoid::isotropic_fallback(&members, Some(share))?
        };
        fitted.push(Cluster {
            volume: ellipsoid.volume()?,
            ellipsoid,
            count: members.len(),
        });
    }
    let second = fitted.pop();
    let first = fitted.pop();
    Ok(first.zip(second).map(|(a, b)| [a, b]))
}

/// Moves each point to the cluster minimising `(V_k / V_k_expected) * d_k`.
///
/// `V_k_expected` is `min_volume * n_k / n`, where `min_volume` already
/// carries the outer-iteration discount `e^(-i / N)`. That discount and the
/// `1 / n` multiply both clusters equally and cancel in the argmin, so
/// `V_k / n_k` is used.
/// Returns whether any label changed.
fn reassign(points: &[&[f64]], labels: &mut [usize], clusters: &[Cluster; 2]) -> bool {
    let weights = [
        clusters[0].volume / clusters[0].count as f64,
        clusters[1].volume / clusters[1].count as f64,
    ];
    let mut changed = false;
    for (point, label) in points.iter().zip(labels.iter_mut()) {
        let h0 = weights[0] * clusters[0].ellipsoid.mahalanobis_sq(point);
        let h1 = weights[1] * clusters[1].ellipsoid.mahalanobis_sq(point);
        let best = usize::from(h1 < h0);
        if *label != best {
            *label = best;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    fn cluster(center: f64, radius: f64, count: usize, discount: f64) -> Cluster {
        let ellipsoid = Ellipsoid::ball(DVector::from_vec(vec![center]), radius).unwrap();
        let volume = ellipsoid.volume().unwrap() * discount;
        Cluster {
            ellipsoid,
            volume,
            count,
        }
    }

    #[test]
    fn reassignment_ignores_common_volume_discount() {
        let points: [&[f64]; 5] = [&[0.5], &[1.2], &[1.8], &[2.2], &[4.0]];
        for discount in [1.0, (-5.0f64 / 50.0).exp(), (-300.0f64 / 50.0).exp()] {
            let clusters = [cluster(0.0, 1.0, 2, discount), cluster(3.0, 2.0, 2, discount)];
            let mut labels = vec![1, 1, 0, 0, 0];
            assert!(reassign(&points, &mut labels, &clusters));
            // 1.2 is nearer the wide cluster in Mahalanobis terms but its
            // volume weight keeps it in the narrow one.
            assert_eq!(labels, vec![0, 0, 1, 1, 1], "discount {discount}");
        }
    }
}
