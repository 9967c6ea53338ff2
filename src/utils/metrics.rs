use crate::error::{RecommenderError, Result};
use crate::models::*;
use crate::store::RatingStore;
use std::collections::BTreeMap;

pub fn dataset_stats(store: &RatingStore) -> DatasetStats {
    let total_ratings = store.len();
    let sum: u64 = store.records().iter().map(|r| r.rating as u64).sum();

    DatasetStats {
        total_ratings,
        total_users: store.user_count(),
        total_items: store.all_items().len(),
        mean_rating: if total_ratings > 0 {
            sum as f64 / total_ratings as f64
        } else {
            0.0
        },
    }
}

/// Count of ratings for every value on the scale, zeros included.
pub fn rating_distribution(store: &RatingStore) -> Vec<RatingCount> {
    let scale = store.scale();
    let mut counts: BTreeMap<u8, usize> = scale.values().map(|v| (v, 0)).collect();

    for record in store.records() {
        *counts.entry(record.rating).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(rating, count)| RatingCount { rating, count })
        .collect()
}

/// Histogram of ratings-per-user, ascending by number of ratings.
pub fn user_activity(store: &RatingStore) -> Vec<ActivityBucket> {
    let mut per_user: BTreeMap<UserId, usize> = BTreeMap::new();
    for record in store.records() {
        *per_user.entry(record.user_id).or_insert(0) += 1;
    }

    let mut buckets: BTreeMap<usize, usize> = BTreeMap::new();
    for count in per_user.into_values() {
        *buckets.entry(count).or_insert(0) += 1;
    }

    buckets
        .into_iter()
        .map(|(num_ratings, num_users)| ActivityBucket { num_ratings, num_users })
        .collect()
}

pub fn user_summary(store: &RatingStore, user_id: UserId) -> Result<UserSummary> {
    let ratings = store.ratings_for(user_id)?;
    let highest_rating = ratings
        .iter()
        .map(|r| r.rating)
        .max()
        .ok_or(RecommenderError::UnknownUser(user_id))?;
    let sum: u64 = ratings.iter().map(|r| r.rating as u64).sum();

    Ok(UserSummary {
        user_id,
        movies_rated: ratings.len(),
        mean_rating: sum as f64 / ratings.len() as f64,
        highest_rating,
    })
}
