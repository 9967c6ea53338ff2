use crate::algorithms::interaction::InteractionMatrix;
use crate::error::{RecommenderError, Result};
use crate::utils::{cosine_similarity, sparse_norm};
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::time::Instant;
use tracing::debug;

/// Square, symmetric cosine similarity matrix over users or items.
///
/// Indices match the row (users) or column (items) order of the
/// [`InteractionMatrix`] it was computed from. The diagonal is 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    values: DMatrix<f64>,
}

impl SimilarityMatrix {
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.values[(a, b)]
    }

    /// Other entities with positive similarity to `a`, strongest first.
    /// Ties go to the lower index, i.e. the lower identifier.
    pub fn neighbors(&self, a: usize, limit: Option<usize>) -> Vec<(usize, f64)> {
        let mut neighbors: Vec<(usize, f64)> = self
            .values
            .row(a)
            .iter()
            .enumerate()
            .filter(|&(b, &s)| b != a && s > 0.0)
            .map(|(b, &s)| (b, s))
            .collect();

        neighbors.sort_by(|x, y| y.1.total_cmp(&x.1).then_with(|| x.0.cmp(&y.0)));
        if let Some(limit) = limit {
            neighbors.truncate(limit);
        }
        neighbors
    }

    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        let n = self.len();
        (0..n).all(|a| (a + 1..n).all(|b| (self.get(a, b) - self.get(b, a)).abs() <= tolerance))
    }
}

pub fn compute_user_similarity(matrix: &InteractionMatrix) -> Result<SimilarityMatrix> {
    let start = Instant::now();
    let similarity = pairwise_cosine(matrix.rows(), "user")?;
    debug!("Computed {0}x{0} user similarity in {1:?}", similarity.len(), start.elapsed());
    Ok(similarity)
}

pub fn compute_item_similarity(matrix: &InteractionMatrix) -> Result<SimilarityMatrix> {
    let start = Instant::now();
    let similarity = pairwise_cosine(matrix.columns(), "item")?;
    debug!("Computed {0}x{0} item similarity in {1:?}", similarity.len(), start.elapsed());
    Ok(similarity)
}

/// Cosine similarity between every pair of sparse vectors. Only the upper
/// triangle is computed; the lower one is its mirror.
fn pairwise_cosine(vectors: &[Vec<(usize, f64)>], kind: &str) -> Result<SimilarityMatrix> {
    let n = vectors.len();
    if n == 0 {
        return Err(RecommenderError::SimilarityCompute(format!("no {} vectors to compare", kind)));
    }

    let norms: Vec<f64> = vectors.par_iter().map(|v| sparse_norm(v)).collect();
    if let Some(bad) = norms.iter().position(|n| !n.is_finite()) {
        return Err(RecommenderError::SimilarityCompute(format!(
            "{} vector {} has a non-finite magnitude",
            kind, bad
        )));
    }

    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|a| {
            (a + 1..n)
                .map(|b| cosine_similarity(&vectors[a], &vectors[b], norms[a], norms[b]))
                .collect()
        })
        .collect();

    let mut values = DMatrix::<f64>::identity(n, n);
    for (a, row) in upper.into_iter().enumerate() {
        for (offset, s) in row.into_iter().enumerate() {
            if !s.is_finite() {
                return Err(RecommenderError::SimilarityCompute(format!(
                    "non-finite {} similarity between {} and {}",
                    kind,
                    a,
                    a + 1 + offset
                )));
            }
            let b = a + 1 + offset;
            values[(a, b)] = s;
            values[(b, a)] = s;
        }
    }

    Ok(SimilarityMatrix { values })
}
