pub mod algorithms;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{RecommenderError, Result};
pub use models::*;
pub use services::recommendation::RecommendationService;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub recommendation_service: Arc<RecommendationService>,
    pub serving_service: Arc<services::serving::ServingService>,
}

impl AppState {
    /// Builds the engine from `config` and initializes it once.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let recommendation_service = Arc::new(RecommendationService::from_config(&config)?);
        recommendation_service.initialize()?;

        let serving_service = Arc::new(services::serving::ServingService::new(
            recommendation_service.clone(),
        ));

        Ok(Self {
            config,
            recommendation_service,
            serving_service,
        })
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
