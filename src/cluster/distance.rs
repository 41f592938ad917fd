//! Distance metrics between matrix rows.
//!
//! Every function here is pure: it reads two rows and returns a number.
//!
//! | Metric | Definition |
//! |--------|------------|
//! | Euclidean | `sqrt(Σ (a_i - b_i)²)` |
//! | Cityblock | `Σ |a_i - b_i|` |
//! | Correlation | `1 - u·v / (‖u‖‖v‖)`, `u`, `v` centered on their own means |
//! | Standardized correlation | `1 - a·b / (‖a‖‖b‖)` on the raw rows |
//!
//! The correlation distances lie in `[0, 2]`. When either row has zero norm
//! (after centering, for `Correlation`) the cosine is undefined and the
//! distance is taken as `1.0`, the value for uncorrelated rows.

use crate::error::{Error, Result};
use crate::matrix::{dot, norm, Matrix};
use std::fmt;
use std::str::FromStr;

/// Distance metric used for assignment, initialization, and validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Metric {
    /// Straight-line distance.
    #[default]
    Euclidean,
    /// Manhattan (L1) distance.
    Cityblock,
    /// Pearson-correlation distance.
    Correlation,
    /// Uncentered (cosine) correlation distance.
    StandardizedCorrelation,
}

impl Metric {
    /// Distance between two equally sized slices.
    ///
    /// Slice lengths are not checked; see [`distance`] for the checked form.
    #[inline]
    pub fn between(self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            Metric::Euclidean => euclidean(a, b),
            Metric::Cityblock => cityblock(a, b),
            Metric::Correlation => correlation(a, b),
            Metric::StandardizedCorrelation => standardized_correlation(a, b),
        }
    }

    /// Canonical name, accepted back by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::Cityblock => "cityblock",
            Metric::Correlation => "correlation",
            Metric::StandardizedCorrelation => "standardized-correlation",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euclidean" => Ok(Metric::Euclidean),
            "cityblock" | "manhattan" => Ok(Metric::Cityblock),
            "correlation" => Ok(Metric::Correlation),
            "standardized-correlation" | "standardized_correlation" => {
                Ok(Metric::StandardizedCorrelation)
            }
            _ => Err(Error::UnknownMetric(s.to_string())),
        }
    }
}

/// Distance between `a[row1]` and `b[row2]`.
pub fn distance(a: &Matrix, b: &Matrix, row1: usize, row2: usize, metric: Metric) -> Result<f64> {
    if a.cols() != b.cols() {
        return Err(Error::DimensionMismatch {
            expected: a.cols(),
            found: b.cols(),
        });
    }
    Ok(metric.between(a.row(row1)?, b.row(row2)?))
}

/// Smallest distance from `data[row]` to any of `centroids[0..up_to)`.
///
/// Used while centroids are placed one at a time, when only a prefix of the
/// centroid matrix is meaningful.
pub fn min_distance(
    data: &Matrix,
    row: usize,
    centroids: &Matrix,
    up_to: usize,
    metric: Metric,
) -> Result<f64> {
    if data.cols() != centroids.cols() {
        return Err(Error::DimensionMismatch {
            expected: data.cols(),
            found: centroids.cols(),
        });
    }
    if up_to == 0 || up_to > centroids.rows() {
        return Err(Error::IndexOutOfRange {
            index: up_to,
            bound: centroids.rows() + 1,
        });
    }
    let sample = data.row(row)?;
    Ok((0..up_to)
        .map(|c| metric.between(sample, centroids.row_unchecked(c)))
        .fold(f64::INFINITY, f64::min))
}

#[inline]
fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[inline]
fn cityblock(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let u: Vec<f64> = a.iter().map(|x| x - mean_a).collect();
    let v: Vec<f64> = b.iter().map(|x| x - mean_b).collect();
    cosine_distance(&u, &v)
}

#[inline]
fn standardized_correlation(a: &[f64], b: &[f64]) -> f64 {
    cosine_distance(a, b)
}

#[inline]
fn cosine_distance(u: &[f64], v: &[f64]) -> f64 {
    let denom = norm(u) * norm(v);
    if denom == 0.0 {
        return 1.0;
    }
    1.0 - dot(u, v) / denom
}
