use crate::error::Result;
use crate::models::*;
use crate::services::recommendation::RecommendationService;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Request accounting around the engine for a serving process.
pub struct ServingService {
    recommendation_service: Arc<RecommendationService>,
    serving_stats: DashMap<String, u64>,
}

impl ServingService {
    pub fn new(recommendation_service: Arc<RecommendationService>) -> Self {
        Self {
            recommendation_service,
            serving_stats: DashMap::new(),
        }
    }

    pub fn serve_recommendations(&self, request: &RecommendationRequest) -> Result<RecommendationResponse> {
        self.increment_stat("total_requests");
        let start_time = Instant::now();

        let response = match self.recommendation_service.recommend_request(request) {
            Ok(response) => response,
            Err(e) => {
                warn!("Recommendation request for user {} failed: {}", request.user_id, e);
                self.increment_stat("failed_requests");
                return Err(e);
            }
        };

        let latency = start_time.elapsed().as_millis() as u64;
        self.increment_stat("successful_requests");
        if response.recommendations.is_empty() {
            self.increment_stat("empty_responses");
        }
        self.update_latency_stat(latency);

        info!(
            "Served {} {} recommendations for user {} in {}ms",
            response.recommendations.len(),
            request.method,
            request.user_id,
            latency
        );
        Ok(response)
    }

    /// Counters plus `avg_latency_ms`, derived from the latency total.
    pub fn get_serving_stats(&self) -> HashMap<String, u64> {
        let mut stats: HashMap<String, u64> = self
            .serving_stats
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();

        let served = stats.get("successful_requests").copied().unwrap_or(0);
        if served > 0 {
            let total = stats.get("total_latency_ms").copied().unwrap_or(0);
            stats.insert("avg_latency_ms".to_string(), total / served);
        }
        stats
    }

    fn increment_stat(&self, key: &str) {
        *self.serving_stats.entry(key.to_string()).or_insert(0) += 1;
    }

    // Each key is updated under its own entry guard, so parallel requests
    // never lose an update.
    fn update_latency_stat(&self, latency_ms: u64) {
        *self
            .serving_stats
            .entry("total_latency_ms".to_string())
            .or_insert(0) += latency_ms;

        let mut max = self
            .serving_stats
            .entry("max_latency_ms".to_string())
            .or_insert(0);
        if latency_ms > *max {
            *max = latency_ms;
        }
    }
}
