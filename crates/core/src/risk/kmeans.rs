//! Seeded k-means clustering over planar points
//!
//! Lloyd's algorithm with k-means++ initialisation and several restarts. The
//! random source is a `StdRng` seeded from [`ClusterParams::seed`], so identical
//! input always produces identical centroids and labels.

use crate::config::ClusterParams;
use crate::error::{EngineError, Result};
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Planar point used by the clusterer (x = latitude, y = longitude for epicenters)
pub type Point2 = Vector2<f64>;

/// Output of a clustering run
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// One centroid per requested cluster (index = cluster id − 1)
    pub centroids: Vec<Point2>,
    /// Cluster index assigned to each input point
    pub labels: Vec<usize>,
    /// Sum of squared distances from points to their centroid
    pub inertia: f64,
    /// Lloyd iterations used by the winning run
    pub iterations: usize,
}

impl Clustering {
    /// Number of points assigned to each cluster
    ///
    /// Labels with no matching centroid are not counted.
    pub fn member_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.centroids.len()];
        for &label in &self.labels {
            if let Some(count) = counts.get_mut(label) {
                *count += 1;
            }
        }
        counts
    }

    /// Check the result describes `points` points in at most `k` clusters
    ///
    /// # Errors
    ///
    /// `ModelTrainingFailure` for no centroids, more than `k` centroids, a label
    /// count different from `points`, or a label without a centroid.
    pub fn validate(&self, points: usize, k: usize) -> Result<()> {
        let clusters = self.centroids.len();
        if clusters == 0 || clusters > k {
            return Err(EngineError::ModelTrainingFailure(format!(
                "clusterer returned {clusters} centroids for k = {k}"
            )));
        }
        if self.labels.len() != points {
            return Err(EngineError::ModelTrainingFailure(format!(
                "clusterer labelled {} of {points} points",
                self.labels.len()
            )));
        }
        if let Some(&label) = self.labels.iter().find(|&&l| l >= clusters) {
            return Err(EngineError::ModelTrainingFailure(format!(
                "label {label} has no centroid ({clusters} clusters)"
            )));
        }
        Ok(())
    }
}

/// Partitions points into `k` groups
///
/// The seam exists so tests can substitute a fixed assignment.
pub trait Clusterer: Send + Sync {
    /// Cluster `points` into `k` groups
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `k == 0`, `InsufficientData` if there are fewer points than `k`.
    fn cluster(&self, points: &[Point2], k: usize) -> Result<Clustering>;
}

/// Seeded k-means with k-means++ initialisation
#[derive(Debug, Clone)]
pub struct KMeans {
    seed: u64,
    n_init: usize,
    max_iterations: usize,
    tolerance: f64,
}

impl KMeans {
    /// Build a clusterer from parameters (the `k` field is ignored; pass it to [`Clusterer::cluster`])
    pub fn new(params: &ClusterParams) -> Self {
        Self {
            seed: params.seed,
            n_init: params.n_init.max(1),
            max_iterations: params.max_iterations.max(1),
            tolerance: params.tolerance,
        }
    }
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new(&ClusterParams::default())
    }
}

impl Clusterer for KMeans {
    fn cluster(&self, points: &[Point2], k: usize) -> Result<Clustering> {
        if k == 0 {
            return Err(EngineError::invalid("k", "cluster count must be positive"));
        }
        if points.len() < k {
            return Err(EngineError::insufficient(
                "k-means clustering",
                k,
                points.len(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<Clustering> = None;

        for run in 0..self.n_init {
            let initial = kmeans_plus_plus(points, k, &mut rng);
            let result = lloyd(points, initial, self.max_iterations, self.tolerance);
            debug!(
                run,
                inertia = result.inertia,
                iterations = result.iterations,
                "k-means restart finished"
            );

            let better = match &best {
                None => true,
                Some(current) => result.inertia < current.inertia,
            };
            if better {
                best = Some(result);
            }
        }

        best.ok_or_else(|| EngineError::invalid("n_init", "must be at least 1"))
    }
}

/// Index of the closest centroid; ties go to the lowest index
fn nearest_centroid(point: &Point2, centroids: &[Point2]) -> (usize, f64) {
    let mut best_index = 0;
    let mut best_dist = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = (point - centroid).norm_squared();
        if dist < best_dist {
            best_dist = dist;
            best_index = i;
        }
    }
    (best_index, best_dist)
}

/// k-means++ seeding: each new centroid is drawn with probability proportional
/// to its squared distance from the nearest centroid chosen so far
fn kmeans_plus_plus(points: &[Point2], k: usize, rng: &mut StdRng) -> Vec<Point2> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    let first = points[rng.random_range(0..n)];
    centroids.push(first);

    let mut dist_sq: Vec<f64> = points.iter().map(|p| (p - first).norm_squared()).collect();

    while centroids.len() < k {
        let total: f64 = dist_sq.iter().sum();
        let chosen = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut acc = 0.0;
            let mut chosen = n - 1;
            for (i, d) in dist_sq.iter().enumerate() {
                acc += d;
                if acc > target {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            // Every point coincides with a centroid already
            rng.random_range(0..n)
        };

        let centroid = points[chosen];
        centroids.push(centroid);
        for (d, p) in dist_sq.iter_mut().zip(points) {
            *d = d.min((p - centroid).norm_squared());
        }
    }

    centroids
}

fn lloyd(
    points: &[Point2],
    mut centroids: Vec<Point2>,
    max_iterations: usize,
    tolerance: f64,
) -> Clustering {
    let k = centroids.len();
    let mut labels = vec![0; points.len()];
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;

        for (label, point) in labels.iter_mut().zip(points) {
            *label = nearest_centroid(point, &centroids).0;
        }

        let mut sums = vec![Point2::zeros(); k];
        let mut counts = vec![0usize; k];
        for (&label, point) in labels.iter().zip(points) {
            sums[label] += point;
            counts[label] += 1;
        }

        let mut max_shift: f64 = 0.0;
        for c in 0..k {
            if counts[c] == 0 {
                // Empty cluster keeps its previous position
                continue;
            }
            let updated = sums[c] / counts[c] as f64;
            max_shift = max_shift.max((updated - centroids[c]).norm());
            centroids[c] = updated;
        }

        if max_shift <= tolerance {
            break;
        }
    }

    let mut inertia = 0.0;
    for (label, point) in labels.iter_mut().zip(points) {
        let (index, dist) = nearest_centroid(point, &centroids);
        *label = index;
        inertia += dist;
    }

    Clustering {
        centroids,
        labels,
        inertia,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn three_groups() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.01, 0.0),
            Point2::new(0.0, 0.01),
            Point2::new(5.0, 5.0),
            Point2::new(5.01, 5.0),
            Point2::new(5.0, 5.01),
            Point2::new(-5.0, 5.0),
            Point2::new(-5.01, 5.0),
            Point2::new(-5.0, 5.01),
        ]
    }

    #[test]
    fn test_separates_tight_groups() {
        let points = three_groups();
        let clustering = KMeans::default().cluster(&points, 3).unwrap();

        assert_eq!(clustering.member_counts(), vec![3, 3, 3]);
        // Members of each group share a label
        for group in points.chunks(3).zip(clustering.labels.chunks(3)) {
            let labels = group.1;
            assert!(labels.iter().all(|&l| l == labels[0]));
        }
        assert!(clustering.inertia < 1e-3);
    }

    #[test]
    fn test_centroid_is_group_mean() {
        let points = vec![Point2::new(1.0, 1.0), Point2::new(3.0, 5.0)];
        let clustering = KMeans::default().cluster(&points, 1).unwrap();
        assert_relative_eq!(clustering.centroids[0].x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(clustering.centroids[0].y, 3.0, epsilon = 1e-12);
        assert_relative_eq!(clustering.inertia, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let points = three_groups();
        let a = KMeans::default().cluster(&points, 3).unwrap();
        let b = KMeans::default().cluster(&points, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_identical_points_do_not_panic() {
        let points = vec![Point2::new(2.0, 2.0); 4];
        let clustering = KMeans::default().cluster(&points, 2).unwrap();
        assert_eq!(clustering.labels.len(), 4);
        assert_eq!(clustering.member_counts().iter().sum::<usize>(), 4);
    }

    #[test]
    fn test_validate_shape() {
        let clustering = KMeans::default().cluster(&three_groups(), 3).unwrap();
        assert!(clustering.validate(9, 3).is_ok());
        assert!(clustering.validate(9, 2).is_err());
        assert!(clustering.validate(8, 3).is_err());

        let stray = Clustering {
            labels: vec![0, 5],
            centroids: vec![Point2::new(0.0, 0.0)],
            inertia: 0.0,
            iterations: 1,
        };
        assert_eq!(stray.member_counts(), vec![1]);
        assert!(matches!(
            stray.validate(2, 1),
            Err(EngineError::ModelTrainingFailure(_))
        ));
    }

    #[test]
    fn test_rejects_bad_k() {
        let points = three_groups();
        assert!(matches!(
            KMeans::default().cluster(&points, 0),
            Err(EngineError::InvalidInput { parameter: "k", .. })
        ));
        assert!(matches!(
            KMeans::default().cluster(&points[..2], 3),
            Err(EngineError::InsufficientData {
                required: 3,
                available: 2,
                ..
            })
        ));
    }
}
