//! K-means clustering and Dunn-index model selection.
//!
//! ## Pipeline
//!
//! 1. [`distance`]: four metrics between matrix rows (Euclidean, cityblock,
//!    correlation, standardized correlation).
//! 2. [`init`]: initial centroids, either `k` random samples or k-means++.
//! 3. [`kmeans`]: Lloyd iterations until labels or centroids stop changing.
//! 4. [`validity`]: single/complete/average linkage and the Dunn index.
//! 5. [`search`]: refit for every `k` in a range and keep the best Dunn index.
//!
//! ## K-means
//!
//! The classic algorithm: assign each point to the nearest centroid, then
//! update centroids to the mean of their points. Repeat.
//!
//! **Objective** (Euclidean metric): minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! **Assumptions**:
//! - Clusters are roughly spherical
//! - Clusters have similar sizes
//! - You know k in advance, or can search for it
//!
//! ## Choosing k
//!
//! The Dunn index is the ratio of the smallest between-cluster distance to
//! the largest within-cluster distance. It rewards compact, well-separated
//! clusters and needs no ground truth, which makes it a usable criterion for
//! picking `k` when nothing else is known.
//!
//! ## Usage
//!
//! ```rust
//! use kselect::cluster::{Clustering, DunnSearch, Kmeans, Metric};
//! use kselect::Matrix;
//!
//! let data = Matrix::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ])
//! .unwrap();
//!
//! // Fixed k
//! let labels = Kmeans::new(2).with_seed(42).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);  // First two together
//! assert_ne!(labels[0], labels[2]);  // Separate from last two
//!
//! // Search k in [2, 3]
//! let best = DunnSearch::new(Kmeans::default().with_metric(Metric::Cityblock).with_seed(42))
//!     .with_range(2, 3)
//!     .search(&data)
//!     .unwrap();
//! assert_eq!(best.k(), 2);
//! ```

pub mod distance;
pub mod init;
mod kmeans;
mod search;
mod traits;
pub mod validity;

pub use distance::{distance, min_distance, Metric};
pub use init::{initialize, InitStrategy};
pub use kmeans::{Kmeans, KmeansFit};
pub use search::{DunnSearch, DunnSearchResult};
pub use traits::Clustering;
pub use validity::{
    dunn_index, inter_distance, intra_distance, InterCluster, IntraCluster, Linkage, Validity,
    UNDEFINED_LINKAGE,
};
