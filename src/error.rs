use crate::models::{ItemId, UserId};

/// Errors surfaced by the recommendation engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RecommenderError {
    #[error("Failed to load rating data: {0}")]
    DataLoad(String),

    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    #[error("Unknown item: {0}")]
    UnknownItem(ItemId),

    #[error("Similarity computation failed: {0}")]
    SimilarityCompute(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Recommendation engine is not initialized")]
    NotInitialized,
}

impl RecommenderError {
    pub fn data_load(message: impl Into<String>) -> Self {
        Self::DataLoad(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Lookup failures the caller can recover from by picking another id.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownUser(_) | Self::UnknownItem(_))
    }
}

pub type Result<T> = std::result::Result<T, RecommenderError>;
