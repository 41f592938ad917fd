//! Choosing `k` by maximizing the Dunn index.
//!
//! [`DunnSearch`] fits one clone of a baseline [`Kmeans`] per candidate `k`
//! in `[min_k, max_k]` and keeps the clone with the highest Dunn index. Each
//! trial owns its estimator and its generator (seeded from the baseline seed),
//! so trials are independent of each other and of the order they run in.
//!
//! With the `parallel` feature the trials run on the rayon thread pool. The
//! reduction still walks candidates in ascending `k`, keeping the first
//! strictly greater index, so the result matches a sequential run.
//!
//! ```rust
//! use kselect::{DunnSearch, Kmeans, Matrix};
//!
//! let data = Matrix::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![2.0, 2.0],
//!     vec![10.0, 10.0],
//!     vec![12.0, 12.0],
//! ])
//! .unwrap();
//!
//! let best = DunnSearch::new(Kmeans::default().with_seed(7))
//!     .with_range(2, 4)
//!     .search(&data)
//!     .unwrap();
//! assert_eq!(best.k(), 2);
//! ```

use super::kmeans::Kmeans;
use super::validity::Validity;
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Sweep over cluster counts, scored by the Dunn index.
#[derive(Debug, Clone)]
pub struct DunnSearch {
    /// Estimator cloned for every trial.
    estimator: Kmeans,
    /// Inter/intra distance choice.
    validity: Validity,
    /// Smallest candidate `k`.
    min_k: usize,
    /// Largest candidate `k` (inclusive).
    max_k: usize,
    cancel: Option<Arc<AtomicBool>>,
}

/// Winner of a [`DunnSearch`].
#[derive(Debug, Clone)]
pub struct DunnSearchResult {
    estimator: Kmeans,
    index: f64,
    k: usize,
}

impl DunnSearchResult {
    /// The fitted winning estimator.
    pub fn estimator(&self) -> &Kmeans {
        &self.estimator
    }

    /// Take ownership of the winning estimator.
    pub fn into_estimator(self) -> Kmeans {
        self.estimator
    }

    /// Its Dunn index.
    pub fn index(&self) -> f64 {
        self.index
    }

    /// Its cluster count.
    pub fn k(&self) -> usize {
        self.k
    }
}

/// Outcome of one candidate.
enum Trial {
    Scored(Kmeans, f64),
    Skipped,
    Cancelled,
}

impl DunnSearch {
    /// Search `k ∈ [2, 20]` with the default validity modes.
    pub fn new(estimator: Kmeans) -> Self {
        Self {
            estimator,
            validity: Validity::default(),
            min_k: 2,
            max_k: 20,
            cancel: None,
        }
    }

    /// Set the inclusive candidate range.
    pub fn with_range(mut self, min_k: usize, max_k: usize) -> Self {
        self.min_k = min_k;
        self.max_k = max_k;
        self
    }

    /// Set the inter/intra distance modes.
    pub fn with_validity(mut self, validity: Validity) -> Self {
        self.validity = validity;
        self
    }

    /// Stop starting new trials once `flag` is set.
    ///
    /// Trials already running finish; the best result so far is returned.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Baseline estimator.
    pub fn estimator(&self) -> &Kmeans {
        &self.estimator
    }

    /// Configured validity modes.
    pub fn validity(&self) -> Validity {
        self.validity
    }

    /// Inclusive candidate range.
    pub fn range(&self) -> (usize, usize) {
        (self.min_k, self.max_k)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn validate(&self, data: &Matrix) -> Result<()> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        if self.min_k < 2 {
            return Err(Error::InvalidParameter {
                name: "min_k",
                message: "must be at least 2",
            });
        }
        if self.min_k > self.max_k {
            return Err(Error::InvalidParameter {
                name: "max_k",
                message: "must not be smaller than min_k",
            });
        }
        if self.max_k > data.rows() {
            return Err(Error::InvalidClusterCount {
                requested: self.max_k,
                n_items: data.rows(),
            });
        }
        Ok(())
    }

    /// Fit and score one candidate on its own clone of the baseline.
    fn trial(&self, data: &Matrix, k: usize) -> Result<Trial> {
        if self.is_cancelled() {
            return Ok(Trial::Cancelled);
        }
        let mut estimator = self.estimator.clone().with_k(k);
        let fit = estimator.fit(data)?;
        match self.validity.index(fit, data) {
            Ok(index) => {
                debug!(k, index, "scored candidate");
                Ok(Trial::Scored(estimator, index))
            }
            Err(e @ (Error::EmptyCluster { .. } | Error::UndefinedValidity(_))) => {
                warn!(k, error = %e, "skipping candidate with undefined Dunn index");
                Ok(Trial::Skipped)
            }
            Err(e) => Err(e),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run_trials(&self, data: &Matrix) -> Vec<(usize, Result<Trial>)> {
        let mut out = Vec::with_capacity(self.max_k - self.min_k + 1);
        for k in self.min_k..=self.max_k {
            let trial = self.trial(data, k);
            let stop = matches!(trial, Ok(Trial::Cancelled) | Err(_));
            out.push((k, trial));
            if stop {
                break;
            }
        }
        out
    }

    #[cfg(feature = "parallel")]
    fn run_trials(&self, data: &Matrix) -> Vec<(usize, Result<Trial>)> {
        (self.min_k..=self.max_k)
            .into_par_iter()
            .map(|k| (k, self.trial(data, k)))
            .collect()
    }

    /// Run the sweep and return the candidate with the highest Dunn index.
    ///
    /// Ties keep the smaller `k`. Candidates whose index is undefined are
    /// skipped; any other error aborts the search.
    pub fn search(&self, data: &Matrix) -> Result<DunnSearchResult> {
        self.validate(data)?;
        reduce(self.run_trials(data))
    }
}

/// Pick the winner from trials ordered by ascending `k`.
fn reduce(trials: Vec<(usize, Result<Trial>)>) -> Result<DunnSearchResult> {
    let mut best: Option<DunnSearchResult> = None;
    let mut cancelled = false;
    for (k, trial) in trials {
        match trial? {
            Trial::Scored(_, index) if !index.is_finite() => {
                warn!(k, index, "skipping candidate with non-finite Dunn index");
            }
            Trial::Scored(estimator, index) => {
                if best.as_ref().is_none_or(|b| index > b.index) {
                    best = Some(DunnSearchResult { estimator, index, k });
                }
            }
            Trial::Skipped => {}
            Trial::Cancelled => cancelled = true,
        }
    }

    match best {
        Some(best) => {
            debug!(k = best.k, index = best.index, cancelled, "search finished");
            Ok(best)
        }
        None if cancelled => Err(Error::Cancelled),
        None => Err(Error::UndefinedValidity(
            "no candidate produced a defined Dunn index",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::validity::{InterCluster, IntraCluster};

    fn four_points() -> Matrix {
        Matrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![10.0, 0.0],
            vec![10.0, 1.0],
        ])
        .unwrap()
    }

    fn three_blobs() -> Matrix {
        let mut rows = Vec::new();
        for (cx, cy) in [(0.0, 0.0), (20.0, 0.0), (0.0, 20.0)] {
            for i in 0..5 {
                let dx = (i % 3) as f64 * 0.3;
                let dy = (i / 3) as f64 * 0.3;
                rows.push(vec![cx + dx, cy + dy]);
            }
        }
        Matrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn picks_two_for_four_point_example() {
        let search = DunnSearch::new(Kmeans::default().with_seed(42)).with_range(2, 4);
        let best = search.search(&four_points()).unwrap();
        assert_eq!(best.k(), 2);
        assert_eq!(best.index(), 10.0);

        let labels = best.estimator().labels().unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn picks_three_for_three_blobs() {
        let data = three_blobs();
        for validity in [
            Validity::default(),
            Validity::new(InterCluster::Single, IntraCluster::Complete),
        ] {
            let best = DunnSearch::new(Kmeans::default().with_seed(3))
                .with_range(2, 6)
                .with_validity(validity)
                .search(&data)
                .unwrap();
            assert_eq!(best.k(), 3, "{validity:?}");
            assert!(best.estimator().is_fitted());
        }
    }

    #[test]
    fn baseline_is_not_mutated() {
        let search = DunnSearch::new(Kmeans::new(7).with_seed(1)).with_range(2, 3);
        search.search(&four_points()).unwrap();
        assert!(!search.estimator().is_fitted());
        assert_eq!(search.range(), (2, 3));
    }

    #[test]
    fn invalid_ranges() {
        let data = four_points();
        let base = Kmeans::default();
        assert!(matches!(
            DunnSearch::new(base.clone()).with_range(1, 3).search(&data),
            Err(Error::InvalidParameter { name: "min_k", .. })
        ));
        assert!(matches!(
            DunnSearch::new(base.clone()).with_range(3, 2).search(&data),
            Err(Error::InvalidParameter { name: "max_k", .. })
        ));
        assert!(matches!(
            DunnSearch::new(base).with_range(2, 5).search(&data),
            Err(Error::InvalidClusterCount { requested: 5, n_items: 4 })
        ));
    }

    #[test]
    fn all_candidates_undefined() {
        // k = n gives singleton clusters with no intra-cluster pairs.
        let search = DunnSearch::new(Kmeans::default().with_seed(5)).with_range(4, 4);
        assert!(matches!(
            search.search(&four_points()),
            Err(Error::UndefinedValidity(_))
        ));
    }

    #[test]
    fn cancelled_before_start() {
        let flag = Arc::new(AtomicBool::new(true));
        let search = DunnSearch::new(Kmeans::default().with_seed(5))
            .with_range(2, 4)
            .with_cancel(flag);
        assert!(matches!(search.search(&four_points()), Err(Error::Cancelled)));
    }

    fn scored(k: usize, index: f64) -> (usize, Result<Trial>) {
        (k, Ok(Trial::Scored(Kmeans::new(k), index)))
    }

    #[test]
    fn cancellation_keeps_best_so_far() {
        let best = reduce(vec![scored(2, 1.0), (3, Ok(Trial::Cancelled))]).unwrap();
        assert_eq!(best.k(), 2);
        assert_eq!(best.index(), 1.0);
    }

    #[test]
    fn ties_keep_smaller_k() {
        let best = reduce(vec![scored(2, 3.0), scored(3, 3.0)]).unwrap();
        assert_eq!(best.k(), 2);

        let best = reduce(vec![scored(2, 3.0), (3, Ok(Trial::Skipped)), scored(4, 3.5)]).unwrap();
        assert_eq!(best.k(), 4);
    }

    #[test]
    fn non_finite_indices_are_skipped() {
        let best = reduce(vec![scored(2, f64::NAN), scored(3, f64::INFINITY), scored(4, 0.5)])
            .unwrap();
        assert_eq!(best.k(), 4);

        assert!(matches!(
            reduce(vec![scored(2, f64::NAN)]),
            Err(Error::UndefinedValidity(_))
        ));
    }

    #[test]
    fn error_aborts_reduction() {
        let err = reduce(vec![scored(2, 1.0), (3, Err(Error::EmptyInput))]).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn cancel_flag_set_during_sweep_stops_later_trials() {
        // Pairs on one line: every start converges to the two pairs.
        let data = Matrix::from_rows(&[
            vec![0.0, 0.0],
            vec![2.0, 2.0],
            vec![10.0, 10.0],
            vec![12.0, 12.0],
        ])
        .unwrap();
        let flag = Arc::new(AtomicBool::new(false));
        let search = DunnSearch::new(Kmeans::default().with_seed(42))
            .with_range(2, 4)
            .with_cancel(Arc::clone(&flag));

        let k2 = search.trial(&data, 2).unwrap();
        assert!(matches!(k2, Trial::Scored(..)));
        flag.store(true, Ordering::Relaxed);
        let k3 = search.trial(&data, 3).unwrap();
        assert!(matches!(k3, Trial::Cancelled));

        let best = reduce(vec![(2, Ok(k2)), (3, Ok(k3))]).unwrap();
        assert_eq!(best.k(), 2);
        assert!(best.estimator().is_fitted());
    }
}
