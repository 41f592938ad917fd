//! Cluster validity: linkage distances and the Dunn index.
//!
//! # Dunn Index (Dunn, 1974)
//!
//! ```text
//! D = min_{i≠j} δ(C_i, C_j) / max_k Δ(C_k)
//! ```
//!
//! where `δ` is an inter-cluster distance and `Δ` an intra-cluster one. Large
//! values mean compact, well-separated clusters.
//!
//! ## Inter-cluster distance ([`InterCluster`])
//!
//! - `Centroid`: distance between centroids (default)
//! - `Single`: closest pair of samples across the two clusters
//! - `Complete`: furthest pair
//! - `Average`: mean over all cross pairs
//!
//! ## Intra-cluster distance ([`IntraCluster`])
//!
//! - `Centroid`: mean distance from members to their centroid
//! - `Complete`: furthest pair within the cluster
//! - `Average`: mean over all pairs within the cluster (default)
//!
//! A cluster measured against itself with fewer than two members has no
//! pairs; the linkage functions then return [`UNDEFINED_LINKAGE`], and the
//! aggregations skip that value.

use super::distance::Metric;
use super::kmeans::{Kmeans, KmeansFit};
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Linkage value when no sample pair qualifies.
pub const UNDEFINED_LINKAGE: f64 = -1.0;

/// Reduction from pairwise sample distances to one cluster distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Linkage {
    /// Minimum pairwise distance.
    Single,
    /// Maximum pairwise distance.
    Complete,
    /// Mean pairwise distance.
    Average,
}

/// Inter-cluster distance used in the numerator of the Dunn index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum InterCluster {
    /// Distance between centroids.
    #[default]
    Centroid,
    /// Single linkage (closest samples).
    Single,
    /// Complete linkage (furthest samples).
    Complete,
    /// Average linkage.
    Average,
}

/// Intra-cluster distance used in the denominator of the Dunn index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum IntraCluster {
    /// Mean distance from members to their centroid.
    Centroid,
    /// Complete linkage of the cluster with itself (its diameter).
    Complete,
    /// Average linkage of the cluster with itself.
    #[default]
    Average,
}

impl InterCluster {
    /// The sample linkage behind this mode, `None` for `Centroid`.
    pub fn linkage(self) -> Option<Linkage> {
        match self {
            InterCluster::Centroid => None,
            InterCluster::Single => Some(Linkage::Single),
            InterCluster::Complete => Some(Linkage::Complete),
            InterCluster::Average => Some(Linkage::Average),
        }
    }

    /// Canonical name, accepted back by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            InterCluster::Centroid => "centroid",
            InterCluster::Single => "single",
            InterCluster::Complete => "complete",
            InterCluster::Average => "average",
        }
    }
}

impl IntraCluster {
    /// Canonical name, accepted back by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            IntraCluster::Centroid => "centroid",
            IntraCluster::Complete => "complete",
            IntraCluster::Average => "average",
        }
    }
}

impl fmt::Display for InterCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for IntraCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InterCluster {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "centroid" => Ok(InterCluster::Centroid),
            "single" | "closest" => Ok(InterCluster::Single),
            "complete" | "furthest" => Ok(InterCluster::Complete),
            "average" | "avg" => Ok(InterCluster::Average),
            _ => Err(Error::UnknownLinkageMode(s.to_string())),
        }
    }
}

impl FromStr for IntraCluster {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "centroid" => Ok(IntraCluster::Centroid),
            "complete" | "furthest" => Ok(IntraCluster::Complete),
            "average" | "avg" => Ok(IntraCluster::Average),
            _ => Err(Error::UnknownLinkageMode(s.to_string())),
        }
    }
}

/// Pairwise distance summary over the sample pairs linking two clusters.
#[derive(Debug, Clone, Copy)]
struct PairStats {
    count: usize,
    min: f64,
    max: f64,
    sum: f64,
}

fn check_labels(data: &Matrix, labels: &[usize]) -> Result<()> {
    if labels.len() != data.rows() {
        return Err(Error::DimensionMismatch {
            expected: data.rows(),
            found: labels.len(),
        });
    }
    Ok(())
}

/// Visit every pair `i < j` with one sample in `c1` and the other in `c2`.
fn pair_stats(
    data: &Matrix,
    labels: &[usize],
    c1: usize,
    c2: usize,
    metric: Metric,
) -> PairStats {
    let mut stats = PairStats {
        count: 0,
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
        sum: 0.0,
    };
    let n = labels.len();
    for i in 0..n {
        let li = labels[i];
        if li != c1 && li != c2 {
            continue;
        }
        // The partner of `i` must sit in the other cluster.
        let want = if li == c1 { c2 } else { c1 };
        let a = data.row_unchecked(i);
        for j in (i + 1)..n {
            if labels[j] != want {
                continue;
            }
            let d = metric.between(a, data.row_unchecked(j));
            stats.count += 1;
            stats.sum += d;
            stats.min = stats.min.min(d);
            stats.max = stats.max.max(d);
        }
    }
    stats
}

/// Distance between clusters `c1` and `c2` (or a cluster and itself) under `linkage`.
///
/// Returns [`UNDEFINED_LINKAGE`] when no sample pair links the two. Cluster
/// ids must be below `max(labels) + 1`.
pub fn linkage_distance(
    data: &Matrix,
    labels: &[usize],
    c1: usize,
    c2: usize,
    metric: Metric,
    linkage: Linkage,
) -> Result<f64> {
    check_labels(data, labels)?;
    let bound = labels.iter().max().map_or(0, |&m| m + 1);
    for index in [c1, c2] {
        if index >= bound {
            return Err(Error::IndexOutOfRange { index, bound });
        }
    }
    let stats = pair_stats(data, labels, c1, c2, metric);
    if stats.count == 0 {
        return Ok(UNDEFINED_LINKAGE);
    }
    Ok(match linkage {
        Linkage::Single => stats.min,
        Linkage::Complete => stats.max,
        Linkage::Average => stats.sum / stats.count as f64,
    })
}

/// Closest pair distance between two clusters.
pub fn single_linkage(
    data: &Matrix,
    labels: &[usize],
    c1: usize,
    c2: usize,
    metric: Metric,
) -> Result<f64> {
    linkage_distance(data, labels, c1, c2, metric, Linkage::Single)
}

/// Furthest pair distance between two clusters.
pub fn complete_linkage(
    data: &Matrix,
    labels: &[usize],
    c1: usize,
    c2: usize,
    metric: Metric,
) -> Result<f64> {
    linkage_distance(data, labels, c1, c2, metric, Linkage::Complete)
}

/// Mean pair distance between two clusters.
pub fn average_linkage(
    data: &Matrix,
    labels: &[usize],
    c1: usize,
    c2: usize,
    metric: Metric,
) -> Result<f64> {
    linkage_distance(data, labels, c1, c2, metric, Linkage::Average)
}

fn check_fit(fit: &KmeansFit, data: &Matrix) -> Result<()> {
    check_labels(data, fit.labels())?;
    if fit.centroids().cols() != data.cols() {
        return Err(Error::DimensionMismatch {
            expected: fit.centroids().cols(),
            found: data.cols(),
        });
    }
    if fit.n_clusters() < 2 {
        return Err(Error::UndefinedValidity("fewer than two clusters"));
    }
    Ok(())
}

fn first_empty(fit: &KmeansFit) -> Result<()> {
    match fit.cluster_sizes().iter().position(|&s| s == 0) {
        Some(cluster) => Err(Error::EmptyCluster { cluster }),
        None => Ok(()),
    }
}

/// Smallest inter-cluster distance over all cluster pairs.
pub fn inter_distance(fit: &KmeansFit, data: &Matrix, mode: InterCluster) -> Result<f64> {
    check_fit(fit, data)?;
    let k = fit.n_clusters();
    let metric = fit.metric();

    let linkage = match mode.linkage() {
        None => {
            let centroids = fit.centroids();
            let mut best = f64::INFINITY;
            for i in 0..k {
                for j in (i + 1)..k {
                    let d = metric.between(centroids.row_unchecked(i), centroids.row_unchecked(j));
                    best = best.min(d);
                }
            }
            return Ok(best);
        }
        Some(linkage) => linkage,
    };

    first_empty(fit)?;
    let mut best: Option<f64> = None;
    for i in 0..k {
        for j in (i + 1)..k {
            let d = linkage_distance(data, fit.labels(), i, j, metric, linkage)?;
            if d == UNDEFINED_LINKAGE {
                continue;
            }
            best = Some(best.map_or(d, |b| b.min(d)));
        }
    }
    best.ok_or(Error::UndefinedValidity("no cluster pair has a defined distance"))
}

/// Mean distance from the members of cluster `c` to its centroid.
fn intra_centroid(fit: &KmeansFit, data: &Matrix, c: usize) -> Result<f64> {
    let centroid = fit.centroids().row(c)?;
    let metric = fit.metric();
    let mut sum = 0.0;
    let mut count = 0usize;
    for (i, &label) in fit.labels().iter().enumerate() {
        if label == c {
            sum += metric.between(data.row_unchecked(i), centroid);
            count += 1;
        }
    }
    if count == 0 {
        return Err(Error::EmptyCluster { cluster: c });
    }
    Ok(sum / count as f64)
}

/// Largest intra-cluster distance over all clusters.
///
/// Clusters whose value is [`UNDEFINED_LINKAGE`] (singletons under the
/// linkage modes) are skipped.
pub fn intra_distance(fit: &KmeansFit, data: &Matrix, mode: IntraCluster) -> Result<f64> {
    check_fit(fit, data)?;
    first_empty(fit)?;
    let metric = fit.metric();

    let mut worst: Option<f64> = None;
    for c in 0..fit.n_clusters() {
        let d = match mode {
            IntraCluster::Centroid => intra_centroid(fit, data, c)?,
            IntraCluster::Complete => complete_linkage(data, fit.labels(), c, c, metric)?,
            IntraCluster::Average => average_linkage(data, fit.labels(), c, c, metric)?,
        };
        if d == UNDEFINED_LINKAGE {
            trace!(cluster = c, "intra-cluster distance undefined, skipped");
            continue;
        }
        worst = Some(worst.map_or(d, |w| w.max(d)));
    }
    worst.ok_or(Error::UndefinedValidity(
        "no cluster has a defined intra-cluster distance",
    ))
}

/// Choice of inter/intra distances for the Dunn index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Validity {
    /// Numerator.
    pub inter: InterCluster,
    /// Denominator.
    pub intra: IntraCluster,
}

impl Validity {
    /// Create a validity configuration.
    pub fn new(inter: InterCluster, intra: IntraCluster) -> Self {
        Self { inter, intra }
    }

    /// Dunn index of an existing fit.
    pub fn index(&self, fit: &KmeansFit, data: &Matrix) -> Result<f64> {
        let inter = inter_distance(fit, data, self.inter)?;
        let intra = intra_distance(fit, data, self.intra)?;
        if intra == 0.0 {
            return Err(Error::UndefinedValidity("intra-cluster distance is zero"));
        }
        Ok(inter / intra)
    }
}

/// Dunn index of `estimator` on `data`.
///
/// An unfit estimator is fitted on `data` first, so the estimator may be
/// mutated by this call.
pub fn dunn_index(estimator: &mut Kmeans, data: &Matrix, validity: Validity) -> Result<f64> {
    if !estimator.is_fitted() {
        estimator.fit(data)?;
    }
    let fit = estimator
        .fitted()
        .ok_or(Error::UndefinedValidity("estimator is not fitted"))?;
    validity.index(fit, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_points() -> Matrix {
        Matrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![10.0, 0.0],
            vec![10.0, 1.0],
        ])
        .unwrap()
    }

    fn two_cluster_fit() -> KmeansFit {
        let centroids = Matrix::from_rows(&[vec![0.0, 0.5], vec![10.0, 0.5]]).unwrap();
        KmeansFit::from_parts(centroids, vec![0, 0, 1, 1], Metric::Euclidean)
    }

    #[test]
    fn linkages_between_pairs() {
        let data = four_points();
        let labels = [0, 0, 1, 1];
        let far = 101.0f64.sqrt();

        assert_eq!(single_linkage(&data, &labels, 0, 1, Metric::Euclidean).unwrap(), 10.0);
        assert_eq!(complete_linkage(&data, &labels, 0, 1, Metric::Euclidean).unwrap(), far);
        let avg = average_linkage(&data, &labels, 0, 1, Metric::Euclidean).unwrap();
        assert!((avg - (20.0 + 2.0 * far) / 4.0).abs() < 1e-12);

        // Argument order does not matter.
        assert_eq!(
            single_linkage(&data, &labels, 1, 0, Metric::Euclidean).unwrap(),
            10.0
        );
        assert_eq!(average_linkage(&data, &labels, 0, 0, Metric::Euclidean).unwrap(), 1.0);
    }

    #[test]
    fn singleton_average_linkage_is_sentinel() {
        let data = four_points();
        let labels = [0, 0, 1, 2];
        assert_eq!(
            average_linkage(&data, &labels, 1, 1, Metric::Euclidean).unwrap(),
            UNDEFINED_LINKAGE
        );
        assert_eq!(
            complete_linkage(&data, &labels, 2, 2, Metric::Euclidean).unwrap(),
            UNDEFINED_LINKAGE
        );
    }

    #[test]
    fn unknown_cluster_id_is_out_of_range() {
        let data = four_points();
        let labels = [0, 0, 1, 1];
        assert!(matches!(
            single_linkage(&data, &labels, 0, 2, Metric::Euclidean),
            Err(Error::IndexOutOfRange { index: 2, bound: 2 })
        ));
        assert!(matches!(
            complete_linkage(&data, &labels, 5, 5, Metric::Euclidean),
            Err(Error::IndexOutOfRange { index: 5, bound: 2 })
        ));
    }

    #[test]
    fn sentinel_is_excluded_from_intra_max() {
        let data = four_points();
        let centroids =
            Matrix::from_rows(&[vec![0.0, 0.5], vec![10.0, 0.0], vec![10.0, 1.0]]).unwrap();
        let fit = KmeansFit::from_parts(centroids, vec![0, 0, 1, 2], Metric::Euclidean);
        assert_eq!(intra_distance(&fit, &data, IntraCluster::Average).unwrap(), 1.0);
        assert_eq!(intra_distance(&fit, &data, IntraCluster::Complete).unwrap(), 1.0);
        assert_eq!(intra_distance(&fit, &data, IntraCluster::Centroid).unwrap(), 0.5);
    }

    #[test]
    fn all_singletons_have_no_intra_distance() {
        let data = four_points();
        let fit = KmeansFit::from_parts(data.clone(), vec![0, 1, 2, 3], Metric::Euclidean);
        assert!(matches!(
            intra_distance(&fit, &data, IntraCluster::Average),
            Err(Error::UndefinedValidity(_))
        ));
        // Every member sits on its centroid.
        assert!(matches!(
            Validity::new(InterCluster::Centroid, IntraCluster::Centroid).index(&fit, &data),
            Err(Error::UndefinedValidity(_))
        ));
    }

    #[test]
    fn inter_modes() {
        let data = four_points();
        let fit = two_cluster_fit();
        let far = 101.0f64.sqrt();
        assert_eq!(inter_distance(&fit, &data, InterCluster::Centroid).unwrap(), 10.0);
        assert_eq!(inter_distance(&fit, &data, InterCluster::Single).unwrap(), 10.0);
        assert_eq!(inter_distance(&fit, &data, InterCluster::Complete).unwrap(), far);
        let avg = inter_distance(&fit, &data, InterCluster::Average).unwrap();
        assert!((avg - (20.0 + 2.0 * far) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn inter_takes_the_closest_pair_of_clusters() {
        let data = four_points();
        let centroids =
            Matrix::from_rows(&[vec![0.0, 0.5], vec![10.0, 0.0], vec![10.0, 1.0]]).unwrap();
        let fit = KmeansFit::from_parts(centroids, vec![0, 0, 1, 2], Metric::Euclidean);
        assert_eq!(inter_distance(&fit, &data, InterCluster::Centroid).unwrap(), 1.0);
        assert_eq!(inter_distance(&fit, &data, InterCluster::Single).unwrap(), 1.0);
    }

    #[test]
    fn dunn_of_four_point_example() {
        let data = four_points();
        let index = Validity::default().index(&two_cluster_fit(), &data).unwrap();
        assert_eq!(index, 10.0);
        assert!(index > 1.0);
    }

    #[test]
    fn empty_cluster_is_an_error() {
        let data = four_points();
        let centroids =
            Matrix::from_rows(&[vec![0.0, 0.5], vec![10.0, 0.5], vec![50.0, 50.0]]).unwrap();
        let fit = KmeansFit::from_parts(centroids, vec![0, 0, 1, 1], Metric::Euclidean);
        for mode in [IntraCluster::Centroid, IntraCluster::Complete, IntraCluster::Average] {
            assert!(matches!(
                intra_distance(&fit, &data, mode),
                Err(Error::EmptyCluster { cluster: 2 })
            ));
        }
        assert!(matches!(
            inter_distance(&fit, &data, InterCluster::Single),
            Err(Error::EmptyCluster { cluster: 2 })
        ));
        // Centroid separation is still defined.
        assert!(inter_distance(&fit, &data, InterCluster::Centroid).is_ok());
    }

    #[test]
    fn single_cluster_is_undefined() {
        let data = four_points();
        let centroids = Matrix::from_rows(&[vec![5.0, 0.5]]).unwrap();
        let fit = KmeansFit::from_parts(centroids, vec![0; 4], Metric::Euclidean);
        assert!(matches!(
            inter_distance(&fit, &data, InterCluster::Centroid),
            Err(Error::UndefinedValidity(_))
        ));
    }

    #[test]
    fn label_count_must_match_rows() {
        let data = four_points();
        assert!(matches!(
            average_linkage(&data, &[0, 1], 0, 1, Metric::Euclidean),
            Err(Error::DimensionMismatch { expected: 4, found: 2 })
        ));
    }

    #[test]
    fn dunn_index_fits_unfit_estimator() {
        let data = Matrix::from_rows(&[
            vec![0.0, 0.0],
            vec![2.0, 2.0],
            vec![10.0, 10.0],
            vec![12.0, 12.0],
        ])
        .unwrap();
        let mut kmeans = Kmeans::new(2).with_seed(11);
        assert!(!kmeans.is_fitted());
        let index = dunn_index(&mut kmeans, &data, Validity::default()).unwrap();
        assert!(kmeans.is_fitted());
        // Centroids (1,1) and (11,11); both clusters have diameter sqrt(8).
        let expected = 200.0f64.sqrt() / 8.0f64.sqrt();
        assert!((index - expected).abs() < 1e-12);
    }

    #[test]
    fn parse_names() {
        for mode in [
            InterCluster::Centroid,
            InterCluster::Single,
            InterCluster::Complete,
            InterCluster::Average,
        ] {
            assert_eq!(mode.name().parse::<InterCluster>().unwrap(), mode);
        }
        assert_eq!("avg".parse::<IntraCluster>().unwrap(), IntraCluster::Average);
        assert_eq!("furthest".parse::<IntraCluster>().unwrap(), IntraCluster::Complete);
        assert_eq!("closest".parse::<InterCluster>().unwrap(), InterCluster::Single);
        assert!(matches!(
            "single".parse::<IntraCluster>(),
            Err(Error::UnknownLinkageMode(_))
        ));
        assert!(matches!(
            "ward".parse::<InterCluster>(),
            Err(Error::UnknownLinkageMode(_))
        ));
    }
}
