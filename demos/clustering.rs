//! K-means with a fixed k, then a Dunn-index search over k, on a simple 2D dataset.
//!
//! Pass a matrix file (one sample per line, space-separated) to cluster your
//! own data instead. Set `RUST_LOG=kselect=debug` to see fit and search progress.

use kselect::{DunnSearch, InitStrategy, Kmeans, Matrix, Metric, Validity};
use tracing_subscriber::EnvFilter;

fn main() -> kselect::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let data = match std::env::args().nth(1) {
        Some(path) => Matrix::from_path(path)?,
        None => Matrix::from_rows(&[
            // Cluster A (near origin)
            vec![0.0, 0.0],
            vec![0.1, 0.2],
            vec![0.2, 0.1],
            vec![-0.1, 0.1],
            // Cluster B (near (5, 5))
            vec![5.0, 5.0],
            vec![5.1, 4.9],
            vec![4.9, 5.1],
            vec![5.2, 5.2],
            // Cluster C (near (10, 0))
            vec![10.0, 0.0],
            vec![10.1, 0.1],
            vec![9.9, -0.1],
            vec![10.2, 0.2],
        ])?,
    };
    let (n, d) = data.shape();
    println!("data: {n} samples x {d} features");

    // --- K-means (k=3) ---
    let mut kmeans = Kmeans::new(3usize.min(n))
        .with_metric(Metric::Euclidean)
        .with_init(InitStrategy::KMeansPlusPlus)
        .with_seed(42);
    let fit = kmeans.fit(&data)?;
    println!("\n=== K-means (k={}) ===", fit.n_clusters());
    for (i, label) in fit.labels().iter().enumerate() {
        println!("  sample {:2} => cluster {}", i, label);
    }
    println!("centroids:\n{}", fit.centroids());

    // --- Dunn search ---
    let max_k = 6usize.min(n);
    if max_k < 2 {
        return Ok(());
    }
    let best = DunnSearch::new(Kmeans::default().with_seed(42))
        .with_range(2, max_k)
        .with_validity(Validity::default())
        .search(&data)?;
    println!(
        "=== Dunn search over k in [2, {}] ===\n  best k = {}, Dunn index = {:.3}",
        max_k,
        best.k(),
        best.index()
    );

    Ok(())
}
