pub mod interaction;
pub mod neighborhood;
pub mod similarity;

pub use interaction::InteractionMatrix;
pub use neighborhood::{ItemBased, UserBased};
pub use similarity::{compute_item_similarity, compute_user_similarity, SimilarityMatrix};

use crate::error::{RecommenderError, Result};
use crate::models::*;
use crate::store::RatingStore;
use crate::utils::top_k_by_score;

/// A neighbourhood scoring strategy over a built [`Model`].
pub trait RecommendationAlgorithm: Send + Sync {
    fn name(&self) -> &'static str;

    /// Predicted scores for the items `user_idx` has not rated, as
    /// `(item index, score)`. Items without any supporting neighbour are
    /// left out rather than scored 0.
    fn score_candidates(&self, model: &Model, user_idx: usize, max_neighbors: Option<usize>) -> Vec<(usize, f64)>;
}

static USER_BASED: UserBased = UserBased;
static ITEM_BASED: ItemBased = ItemBased;

pub fn algorithm_for(method: Method) -> &'static dyn RecommendationAlgorithm {
    match method {
        Method::UserBased => &USER_BASED,
        Method::ItemBased => &ITEM_BASED,
    }
}

/// Interaction matrix plus both similarity matrices, built together.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub matrix: InteractionMatrix,
    pub user_similarity: SimilarityMatrix,
    pub item_similarity: SimilarityMatrix,
}

impl Model {
    pub fn build(store: &RatingStore) -> Result<Self> {
        let matrix = InteractionMatrix::build(store)?;
        let user_similarity = compute_user_similarity(&matrix)?;
        let item_similarity = compute_item_similarity(&matrix)?;

        Ok(Self {
            matrix,
            user_similarity,
            item_similarity,
        })
    }

    /// Ranks the unrated items of `user_id`: score descending, then item id
    /// ascending, at most `count` entries.
    pub fn recommend(
        &self,
        user_id: UserId,
        method: Method,
        count: usize,
        max_neighbors: Option<usize>,
    ) -> Result<Vec<Recommendation>> {
        if count == 0 {
            return Err(RecommenderError::invalid_request(
                "Number of recommendations must be greater than 0",
            ));
        }

        let user_idx = self
            .matrix
            .user_index(user_id)
            .ok_or(RecommenderError::UnknownUser(user_id))?;

        let scored: Vec<(ItemId, f64)> = algorithm_for(method)
            .score_candidates(self, user_idx, max_neighbors)
            .into_iter()
            .map(|(item_idx, score)| (self.matrix.item_id(item_idx), score))
            .collect();

        Ok(top_k_by_score(scored, count)
            .into_iter()
            .map(|(item_id, score)| Recommendation { item_id, score })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LoadOptions;

    fn model() -> Model {
        let store = RatingStore::from_records(
            vec![
                RatingRecord::new(1, 10, 5, "a"),
                RatingRecord::new(2, 10, 5, "a"),
                RatingRecord::new(2, 30, 4, "c"),
                RatingRecord::new(2, 20, 4, "b"),
                RatingRecord::new(2, 40, 2, "d"),
            ],
            LoadOptions::default(),
        )
        .unwrap();
        Model::build(&store).unwrap()
    }

    #[test]
    fn test_ties_break_on_item_id() {
        let recs = model().recommend(1, Method::UserBased, 10, None).unwrap();
        let ids: Vec<ItemId> = recs.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![20, 30, 40]);
    }

    #[test]
    fn test_truncates_to_count() {
        let recs = model().recommend(1, Method::UserBased, 2, None).unwrap();
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn test_rejects_bad_requests() {
        let m = model();
        assert!(matches!(
            m.recommend(1, Method::ItemBased, 0, None),
            Err(RecommenderError::InvalidRequest(_))
        ));
        assert_eq!(
            m.recommend(99, Method::ItemBased, 3, None),
            Err(RecommenderError::UnknownUser(99))
        );
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(algorithm_for(Method::UserBased).name(), "user_based");
        assert_eq!(algorithm_for(Method::ItemBased).name(), "item_based");
    }
}
