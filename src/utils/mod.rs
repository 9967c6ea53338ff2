use std::cmp::Ordering;

pub mod metrics;
pub mod validation;

/// A sparse vector: `(dimension, value)` pairs sorted by dimension.
pub type SparseVector = [(usize, f64)];

/// Dot product of two sparse vectors. Dimensions missing from either side
/// contribute nothing.
pub fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;

    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }

    dot
}

pub fn sparse_norm(a: &SparseVector) -> f64 {
    a.iter().map(|(_, x)| x * x).sum::<f64>().sqrt()
}

/// Cosine similarity with precomputed norms. A zero-magnitude side yields 0.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        sparse_dot(a, b) / (norm_a * norm_b)
    }
}

/// Sorts by score descending, breaking ties on the key ascending, and keeps
/// the first `k`.
pub fn top_k_by_score<K: Ord + Copy>(mut scored: Vec<(K, f64)>, k: usize) -> Vec<(K, f64)> {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored.truncate(k);
    scored
}

/// Weighted mean `Σ w·x / Σ |w|`; `None` when there is no weight.
pub fn weighted_average(pairs: impl IntoIterator<Item = (f64, f64)>) -> Option<f64> {
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (weight, value) in pairs {
        numerator += weight * value;
        denominator += weight.abs();
    }

    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}
