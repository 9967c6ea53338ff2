use super::{Model, RecommendationAlgorithm};
use crate::utils::weighted_average;
use rayon::prelude::*;

/// Scores an item by how similar users rated it.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserBased;

/// Scores an item by the user's own ratings of similar items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemBased;

impl RecommendationAlgorithm for UserBased {
    fn name(&self) -> &'static str {
        "user_based"
    }

    fn score_candidates(&self, model: &Model, user_idx: usize, max_neighbors: Option<usize>) -> Vec<(usize, f64)> {
        let matrix = &model.matrix;
        let rated = rated_mask(model, user_idx);

        // (Σ sim·rating, Σ |sim|) per item
        let mut sums = vec![(0.0f64, 0.0f64); matrix.num_items()];
        for (neighbor, sim) in model.user_similarity.neighbors(user_idx, max_neighbors) {
            for &(item, rating) in matrix.user_row(neighbor) {
                if rated[item] {
                    continue;
                }
                sums[item].0 += sim * rating;
                sums[item].1 += sim.abs();
            }
        }

        sums.into_iter()
            .enumerate()
            .filter(|&(_, (_, weight))| weight > 0.0)
            .map(|(item, (weighted, weight))| (item, weighted / weight))
            .collect()
    }
}

impl RecommendationAlgorithm for ItemBased {
    fn name(&self) -> &'static str {
        "item_based"
    }

    fn score_candidates(&self, model: &Model, user_idx: usize, max_neighbors: Option<usize>) -> Vec<(usize, f64)> {
        let rated = rated_mask(model, user_idx);
        let history = model.matrix.user_row(user_idx);

        (0..model.matrix.num_items())
            .into_par_iter()
            .filter(|&item| !rated[item])
            .filter_map(|item| {
                let mut support: Vec<(usize, f64, f64)> = history
                    .iter()
                    .map(|&(other, rating)| (other, model.item_similarity.get(item, other), rating))
                    .filter(|&(_, sim, _)| sim > 0.0)
                    .collect();

                if let Some(limit) = max_neighbors {
                    support.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                    support.truncate(limit);
                }

                weighted_average(support.into_iter().map(|(_, sim, rating)| (sim, rating)))
                    .map(|score| (item, score))
            })
            .collect()
    }
}

fn rated_mask(model: &Model, user_idx: usize) -> Vec<bool> {
    let mut rated = vec![false; model.matrix.num_items()];
    for &(item, _) in model.matrix.user_row(user_idx) {
        rated[item] = true;
    }
    rated
}
