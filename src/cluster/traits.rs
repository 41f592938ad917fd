use crate::error::Result;
use crate::matrix::Matrix;

/// Common interface for hard clustering algorithms (one label per sample row).
pub trait Clustering {
    /// Fit a fresh model on `data` and return one cluster label per row.
    ///
    /// The receiver is left untouched; stateful estimators fit a copy.
    fn fit_predict(&self, data: &Matrix) -> Result<Vec<usize>>;

    /// The configured number of clusters.
    fn n_clusters(&self) -> usize;
}
