use crate::models::*;
use anyhow::{Result, anyhow};

pub fn validate_rating_record(record: &RatingRecord, scale: &RatingScale) -> Result<()> {
    if !scale.contains(record.rating) {
        return Err(anyhow!(
            "Rating {} for user {} and item {} is outside the scale {}..={}",
            record.rating,
            record.user_id,
            record.item_id,
            scale.min,
            scale.max
        ));
    }

    if record.title.trim().is_empty() {
        return Err(anyhow!("Item {} has an empty title", record.item_id));
    }

    Ok(())
}

pub fn validate_rating_scale(scale: &RatingScale) -> Result<()> {
    if scale.min > scale.max {
        return Err(anyhow!(
            "Rating scale minimum {} exceeds maximum {}",
            scale.min,
            scale.max
        ));
    }

    Ok(())
}

pub fn validate_recommendation_count(count: usize, max_count: usize) -> Result<()> {
    if count == 0 {
        return Err(anyhow!("Number of recommendations must be greater than 0"));
    }

    if count > max_count {
        return Err(anyhow!(
            "Number of recommendations too large: {} (max {})",
            count,
            max_count
        ));
    }

    Ok(())
}

pub fn validate_max_neighbors(max_neighbors: Option<usize>) -> Result<()> {
    if max_neighbors == Some(0) {
        return Err(anyhow!("max_neighbors must be greater than 0 when set"));
    }

    Ok(())
}

pub fn validate_recommendation_request(request: &RecommendationRequest, max_count: usize) -> Result<()> {
    validate_recommendation_count(request.num_recommendations, max_count)
}
