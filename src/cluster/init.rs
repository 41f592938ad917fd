//! Centroid initialization.
//!
//! Both strategies copy existing data rows into the centroid matrix, so every
//! initial centroid is a sample.
//!
//! - **Random**: a partial Fisher–Yates shuffle picks `k` distinct row indices.
//! - **k-means++** (Arthur & Vassilvitskii, 2007): the first centroid is
//!   uniform; each next one is drawn with probability proportional to `D(x)²`,
//!   the squared distance from `x` to its nearest already-placed centroid.

use super::distance::{min_distance, Metric};
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// How the first centroids are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum InitStrategy {
    /// `k` distinct samples chosen uniformly.
    Random,
    /// Distance-weighted seeding.
    #[default]
    KMeansPlusPlus,
}

impl InitStrategy {
    /// Canonical name, accepted back by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            InitStrategy::Random => "random",
            InitStrategy::KMeansPlusPlus => "k++",
        }
    }
}

impl fmt::Display for InitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InitStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(InitStrategy::Random),
            "k++" | "kmeans++" | "k-means++" => Ok(InitStrategy::KMeansPlusPlus),
            _ => Err(Error::UnknownInitStrategy(s.to_string())),
        }
    }
}

/// Build a `(k, features)` centroid matrix from rows of `data`.
pub fn initialize<R: Rng + ?Sized>(
    data: &Matrix,
    k: usize,
    metric: Metric,
    strategy: InitStrategy,
    rng: &mut R,
) -> Result<Matrix> {
    let n = data.rows();
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    if k == 0 || k > n {
        return Err(Error::InvalidClusterCount {
            requested: k,
            n_items: n,
        });
    }

    match strategy {
        InitStrategy::Random => Ok(random_init(data, k, rng)),
        InitStrategy::KMeansPlusPlus => kmeans_plus_plus(data, k, metric, rng),
    }
}

/// Shuffle only the first `k` slots of `0..n`; slot `i` swaps with a uniform
/// slot in `i..n`.
fn fisher_yates<R: Rng + ?Sized>(n: usize, k: usize, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.random_range(i..n);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

fn random_init<R: Rng + ?Sized>(data: &Matrix, k: usize, rng: &mut R) -> Matrix {
    let mut centroids = Matrix::zeros(k, data.cols());
    for (slot, idx) in fisher_yates(data.rows(), k, rng).into_iter().enumerate() {
        centroids
            .row_mut_unchecked(slot)
            .copy_from_slice(data.row_unchecked(idx));
    }
    centroids
}

fn kmeans_plus_plus<R: Rng + ?Sized>(
    data: &Matrix,
    k: usize,
    metric: Metric,
    rng: &mut R,
) -> Result<Matrix> {
    let n = data.rows();
    let mut centroids = Matrix::zeros(k, data.cols());

    let first = rng.random_range(0..n);
    centroids
        .row_mut_unchecked(0)
        .copy_from_slice(data.row_unchecked(first));

    let mut weights = vec![0.0f64; n];
    for slot in 1..k {
        for (j, w) in weights.iter_mut().enumerate() {
            let d = min_distance(data, j, &centroids, slot, metric)?;
            *w = d * d;
        }

        let total: f64 = weights.iter().sum();
        let idx = if total > 0.0 && total.is_finite() {
            for w in &mut weights {
                *w /= total;
            }
            weighted_index(&weights, rng.random::<f64>())
        } else {
            // Every sample coincides with a placed centroid.
            rng.random_range(0..n)
        };

        centroids
            .row_mut_unchecked(slot)
            .copy_from_slice(data.row_unchecked(idx));
    }

    Ok(centroids)
}

/// Roulette-wheel draw over normalized `weights` with `u ∈ [0, 1)`.
///
/// Returns the first index whose running sum exceeds `u`. Rounding can leave
/// the final running sum slightly below 1, so the last positively weighted
/// index is the fallback.
fn weighted_index(weights: &[f64], u: f64) -> usize {
    let mut acc = 0.0;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w > 0.0 {
            last_positive = i;
        }
        acc += w;
        if u < acc {
            return i;
        }
    }
    last_positive
}
