use thiserror::Error;

/// Errors returned by matrix algebra, clustering, and model selection in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Input matrix has no rows.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Requested cluster count is incompatible with the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_items} items")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of items in the dataset.
        n_items: usize,
    },

    /// Operand shapes disagree.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// A row, column, or cluster index lies outside its valid range.
    #[error("index {index} out of range (bound {bound})")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Exclusive upper bound.
        bound: usize,
    },

    /// Scalar divisor is zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Distance metric name not recognized.
    #[error("unknown distance metric: {0:?}")]
    UnknownMetric(String),

    /// Initialization strategy name not recognized.
    #[error("unknown initialization strategy: {0:?}")]
    UnknownInitStrategy(String),

    /// Linkage mode name not recognized.
    #[error("unknown linkage mode: {0:?}")]
    UnknownLinkageMode(String),

    /// A cluster with no members was found where the validity mode needs members.
    #[error("cluster {cluster} has no members")]
    EmptyCluster {
        /// Cluster id.
        cluster: usize,
    },

    /// The validity index has no defined value for this partition.
    #[error("validity index undefined: {0}")]
    UndefinedValidity(&'static str),

    /// A search was cancelled before any candidate finished.
    #[error("cancelled")]
    Cancelled,

    /// Malformed matrix text.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Human-readable explanation.
        message: String,
    },

    /// I/O failure while reading a matrix.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
