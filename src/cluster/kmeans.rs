//! K-means clustering (Lloyd's algorithm).
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids (randomly or via k-means++)
//! 2. **Assign**: each point → nearest centroid under the chosen [`Metric`]
//! 3. **Update**: each centroid → feature-wise mean of its assigned points
//! 4. Repeat until no label changes, the centroids stop moving, or the
//!    iteration budget runs out
//!
//! Ties in the assignment step go to the lowest centroid index. A centroid
//! whose cluster loses every point keeps its previous position.
//!
//! With a non-Euclidean metric the mean update no longer minimizes the
//! objective exactly, but the procedure is the same and still terminates
//! within `max_iter` iterations.
//!
//! # State
//!
//! A [`Kmeans`] starts unfit. [`Kmeans::fit`] clears any previous result,
//! runs the iteration, and stores a [`KmeansFit`]. Fitting needs `&mut self`,
//! so one instance cannot be fitted from two threads at once; clone it instead.

use super::distance::Metric;
use super::init::{initialize, InitStrategy};
use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use rand::prelude::*;
use tracing::{debug, trace};

/// K-means estimator: configuration plus the most recent fit.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Distance used for assignment and seeding.
    metric: Metric,
    /// Seeding strategy.
    init: InitStrategy,
    /// Maximum Lloyd iterations.
    max_iter: usize,
    /// Random seed.
    seed: Option<u64>,
    fitted: Option<KmeansFit>,
}

/// Trained state of a [`Kmeans`] estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    centroids: Matrix,
    labels: Vec<usize>,
    metric: Metric,
    iterations: usize,
    converged: bool,
}

impl KmeansFit {
    #[cfg(test)]
    pub(crate) fn from_parts(centroids: Matrix, labels: Vec<usize>, metric: Metric) -> Self {
        Self {
            centroids,
            labels,
            metric,
            iterations: 0,
            converged: true,
        }
    }

    /// Centroid matrix, shape `(k, features)`.
    pub fn centroids(&self) -> &Matrix {
        &self.centroids
    }

    /// One cluster id per training sample.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Metric the model was trained with.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.centroids.rows()
    }

    /// Lloyd iterations performed.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the iteration stopped before exhausting `max_iter`.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Number of training samples in each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.n_clusters()];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }

    /// Label new samples by nearest centroid.
    pub fn predict(&self, data: &Matrix) -> Result<Vec<usize>> {
        if data.cols() != self.centroids.cols() {
            return Err(Error::DimensionMismatch {
                expected: self.centroids.cols(),
                found: data.cols(),
            });
        }
        Ok((0..data.rows())
            .map(|i| nearest(data.row_unchecked(i), &self.centroids, self.metric))
            .collect())
    }
}

impl Kmeans {
    /// Create a new, unfit K-means estimator with `k` clusters.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            metric: Metric::default(),
            init: InitStrategy::default(),
            max_iter: 100,
            seed: None,
            fitted: None,
        }
    }

    /// Set the number of clusters. Discards any previous fit.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self.fitted = None;
        self
    }

    /// Set the distance metric. Discards any previous fit.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self.fitted = None;
        self
    }

    /// Set the seeding strategy.
    pub fn with_init(mut self, init: InitStrategy) -> Self {
        self.init = init;
        self
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Configured metric.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Configured seeding strategy.
    pub fn init(&self) -> InitStrategy {
        self.init
    }

    /// Configured iteration budget.
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Configured seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Whether [`Kmeans::fit`] has completed since the last reset.
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Trained state, if fitted.
    pub fn fitted(&self) -> Option<&KmeansFit> {
        self.fitted.as_ref()
    }

    /// Centroids of the last fit.
    pub fn centroids(&self) -> Option<&Matrix> {
        self.fitted.as_ref().map(KmeansFit::centroids)
    }

    /// Labels of the last fit.
    pub fn labels(&self) -> Option<&[usize]> {
        self.fitted.as_ref().map(KmeansFit::labels)
    }

    /// Fit on `data`, seeding the generator from the configured seed (or
    /// from entropy when no seed is set).
    pub fn fit(&mut self, data: &Matrix) -> Result<&KmeansFit> {
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        self.fit_with_rng(data, &mut *rng)
    }

    /// Fit on `data` drawing randomness from `rng`.
    pub fn fit_with_rng<R: Rng + ?Sized>(
        &mut self,
        data: &Matrix,
        rng: &mut R,
    ) -> Result<&KmeansFit> {
        self.fitted = None;

        let n = data.rows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }

        let mut centroids = initialize(data, self.k, self.metric, self.init, rng)?;
        let mut labels = vec![0usize; n];
        let mut iterations = 0;
        let mut converged = false;

        for iter in 0..self.max_iter {
            iterations = iter + 1;

            let changed = assign(data, &centroids, self.metric, &mut labels);
            trace!(iter, changed, "assignment step");
            if iter > 0 && changed == 0 {
                converged = true;
                break;
            }

            let updated = update_centroids(data, &labels, &centroids);
            if updated == centroids {
                converged = true;
                break;
            }
            centroids = updated;
        }

        debug!(
            k = self.k,
            metric = %self.metric,
            iterations,
            converged,
            "k-means finished"
        );

        Ok(&*self.fitted.insert(KmeansFit {
            centroids,
            labels,
            metric: self.metric,
            iterations,
            converged,
        }))
    }
}

impl Default for Kmeans {
    fn default() -> Self {
        Self::new(8)
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &Matrix) -> Result<Vec<usize>> {
        let mut model = self.clone();
        let fit = model.fit(data)?;
        Ok(fit.labels.clone())
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

/// Index of the closest centroid, lowest index on ties.
#[inline]
fn nearest(point: &[f64], centroids: &Matrix, metric: Metric) -> usize {
    let mut best_cluster = 0;
    let mut best_dist = f64::INFINITY;
    for c in 0..centroids.rows() {
        let dist = metric.between(point, centroids.row_unchecked(c));
        if dist < best_dist {
            best_dist = dist;
            best_cluster = c;
        }
    }
    best_cluster
}

/// Assignment step. Returns how many labels changed.
fn assign(data: &Matrix, centroids: &Matrix, metric: Metric, labels: &mut [usize]) -> usize {
    let mut changed = 0;
    for (i, label) in labels.iter_mut().enumerate() {
        let best = nearest(data.row_unchecked(i), centroids, metric);
        if *label != best {
            *label = best;
            changed += 1;
        }
    }
    changed
}

/// Update step. Empty clusters keep their previous centroid.
fn update_centroids(data: &Matrix, labels: &[usize], previous: &Matrix) -> Matrix {
    let k = previous.rows();
    let mut sums = Matrix::zeros(k, data.cols());
    let mut counts = vec![0usize; k];

    for (i, &label) in labels.iter().enumerate() {
        for (s, x) in sums
            .row_mut_unchecked(label)
            .iter_mut()
            .zip(data.row_unchecked(i))
        {
            *s += x;
        }
        counts[label] += 1;
    }

    for (c, &count) in counts.iter().enumerate() {
        let row = sums.row_mut_unchecked(c);
        if count == 0 {
            trace!(cluster = c, "empty cluster keeps previous centroid");
            row.copy_from_slice(previous.row_unchecked(c));
        } else {
            for s in row.iter_mut() {
                *s /= count as f64;
            }
        }
    }
    sums
}
