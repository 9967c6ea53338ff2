use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::RecommenderError;

pub type UserId = u32;
pub type ItemId = u32;

/// One (user, item, rating) observation plus the item's display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub rating: u8,
    pub title: String,
}

impl RatingRecord {
    pub fn new(user_id: UserId, item_id: ItemId, rating: u8, title: impl Into<String>) -> Self {
        Self {
            user_id,
            item_id,
            rating,
            title: title.into(),
        }
    }
}

/// Inclusive bounds of the discrete rating scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingScale {
    pub min: u8,
    pub max: u8,
}

impl RatingScale {
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, rating: u8) -> bool {
        rating >= self.min && rating <= self.max
    }

    pub fn values(&self) -> impl Iterator<Item = u8> {
        self.min..=self.max
    }
}

impl Default for RatingScale {
    fn default() -> Self {
        Self { min: 1, max: 5 }
    }
}

/// What to do when the same (user, item) pair is rated more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    KeepLatest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    UserBased,
    ItemBased,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::UserBased => "user_based",
            Method::ItemBased => "item_based",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RecommenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user_based" => Ok(Method::UserBased),
            "item_based" => Ok(Method::ItemBased),
            other => Err(RecommenderError::invalid_request(format!(
                "unknown recommendation method '{}' (expected user_based or item_based)",
                other
            ))),
        }
    }
}

/// A predicted score for an item the user has not rated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub score: f64,
}

/// A rating the user has already given, joined with the item title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatedItem {
    pub item_id: ItemId,
    pub rating: u8,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: UserId,
    pub method: Method,
    pub num_recommendations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: UserId,
    pub method: Method,
    pub recommendations: Vec<RecommendationItem>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub rank: usize,
    pub item_id: ItemId,
    pub title: String,
    pub score: f64,
}

/// Dataset-wide aggregates over the rating table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_ratings: usize,
    pub total_users: usize,
    pub total_items: usize,
    pub mean_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub movies_rated: usize,
    pub mean_rating: f64,
    pub highest_rating: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingCount {
    pub rating: u8,
    pub count: usize,
}

/// How many users gave exactly `num_ratings` ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityBucket {
    pub num_ratings: usize,
    pub num_users: usize,
}
