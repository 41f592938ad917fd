//! Dense k-means with automatic choice of k.
//!
//! `kselect` partitions the rows of a dense [`Matrix`] into clusters with
//! Lloyd's algorithm and picks the number of clusters by maximizing the Dunn
//! validity index.
//!
//! - [`matrix`]: owned row-major `f64` matrix and its row/column algebra
//! - [`io`]: the plain-text matrix format (one sample per line)
//! - [`cluster`]: metrics, seeding, k-means, validity, and the `k` search

#![forbid(unsafe_code)]

pub mod cluster;
pub mod error;
pub mod io;
pub mod matrix;

pub use cluster::{
    Clustering, DunnSearch, DunnSearchResult, InitStrategy, InterCluster, IntraCluster, Kmeans,
    KmeansFit, Metric, Validity,
};
pub use error::{Error, Result};
pub use matrix::Matrix;
