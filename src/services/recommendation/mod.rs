use crate::algorithms::Model;
use crate::config::{Config, RecommendationConfig};
use crate::error::{RecommenderError, Result};
use crate::models::*;
use crate::store::{open_source, LoadOptions, RatingSource, RatingStore};
use crate::utils::{metrics, validation};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Everything derived from one load of the dataset. Never mutated.
#[derive(Debug)]
pub struct Snapshot {
    pub store: RatingStore,
    pub model: Model,
    pub stats: DatasetStats,
}

impl Snapshot {
    pub fn build(source: &dyn RatingSource, options: LoadOptions) -> Result<Self> {
        let start = Instant::now();

        let store = RatingStore::load(source, options)?;
        let model = Model::build(&store)?;
        let stats = metrics::dataset_stats(&store);

        info!(
            "Built recommendation snapshot: {} users, {} items, {} ratings in {:?}",
            stats.total_users,
            stats.total_items,
            stats.total_ratings,
            start.elapsed()
        );

        Ok(Self { store, model, stats })
    }
}

/// Owned recommendation engine.
///
/// `initialize` builds the snapshot at most once, however many callers race
/// on it. Queries take a cheap clone of the current snapshot and run without
/// holding any lock.
pub struct RecommendationService {
    source: Box<dyn RatingSource>,
    load_options: LoadOptions,
    settings: RecommendationConfig,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    init_lock: Mutex<()>,
}

impl RecommendationService {
    pub fn new(source: Box<dyn RatingSource>, load_options: LoadOptions, settings: RecommendationConfig) -> Self {
        Self {
            source,
            load_options,
            settings,
            snapshot: RwLock::new(None),
            init_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        validation::validate_rating_scale(&config.dataset.load_options().scale)
            .map_err(|e| RecommenderError::data_load(e.to_string()))?;
        validation::validate_max_neighbors(config.recommendation.max_neighbors)
            .map_err(|e| RecommenderError::invalid_request(e.to_string()))?;

        Ok(Self::new(
            open_source(config.dataset.format, config.dataset.path.clone()),
            config.dataset.load_options(),
            config.recommendation.clone(),
        ))
    }

    /// Builds the engine if it has not been built yet. Idempotent.
    pub fn initialize(&self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let _guard = self.init_lock.lock();
        if self.is_initialized() {
            debug!("Recommendation engine already initialized by another caller");
            return Ok(());
        }

        self.rebuild()
    }

    /// Rebuilds from the source. On failure the previous snapshot, if any,
    /// keeps serving.
    pub fn reinitialize(&self) -> Result<()> {
        let _guard = self.init_lock.lock();
        self.rebuild()
    }

    fn rebuild(&self) -> Result<()> {
        info!("Initializing recommendation engine from {}", self.source.describe());

        match Snapshot::build(self.source.as_ref(), self.load_options) {
            Ok(snapshot) => {
                *self.snapshot.write() = Some(Arc::new(snapshot));
                Ok(())
            }
            Err(e) => {
                error!("Failed to initialize recommendation engine: {}", e);
                Err(e)
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.snapshot.read().is_some()
    }

    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.snapshot
            .read()
            .as_ref()
            .cloned()
            .ok_or(RecommenderError::NotInitialized)
    }

    pub fn list_users(&self) -> Result<Vec<UserId>> {
        Ok(self.snapshot()?.store.all_users())
    }

    pub fn list_items(&self) -> Result<Vec<ItemId>> {
        Ok(self.snapshot()?.store.all_items().to_vec())
    }

    pub fn title_of(&self, item_id: ItemId) -> Result<String> {
        Ok(self.snapshot()?.store.title_of(item_id)?.to_string())
    }

    pub fn ratings_of(&self, user_id: UserId) -> Result<Vec<RatedItem>> {
        let snapshot = self.snapshot()?;
        let ratings = snapshot.store.ratings_for(user_id)?;

        Ok(ratings
            .into_iter()
            .map(|r| RatedItem {
                item_id: r.item_id,
                rating: r.rating,
                title: r.title.clone(),
            })
            .collect())
    }

    /// The raw rating table.
    pub fn records(&self) -> Result<Vec<RatingRecord>> {
        Ok(self.snapshot()?.store.records().to_vec())
    }

    pub fn recommend(&self, user_id: UserId, method: Method, count: usize) -> Result<Vec<Recommendation>> {
        validation::validate_recommendation_count(count, self.settings.max_count)
            .map_err(|e| RecommenderError::invalid_request(e.to_string()))?;

        let snapshot = self.snapshot()?;
        let start = Instant::now();
        let recommendations = snapshot
            .model
            .recommend(user_id, method, count, self.settings.max_neighbors)?;

        debug!(
            "Produced {} {} recommendations for user {} in {:?}",
            recommendations.len(),
            method,
            user_id,
            start.elapsed()
        );
        Ok(recommendations)
    }

    pub fn recommend_request(&self, request: &RecommendationRequest) -> Result<RecommendationResponse> {
        validation::validate_recommendation_request(request, self.settings.max_count)
            .map_err(|e| RecommenderError::invalid_request(e.to_string()))?;

        let snapshot = self.snapshot()?;
        let recommendations = snapshot.model.recommend(
            request.user_id,
            request.method,
            request.num_recommendations,
            self.settings.max_neighbors,
        )?;

        let items = recommendations
            .into_iter()
            .enumerate()
            .map(|(i, rec)| {
                Ok(RecommendationItem {
                    rank: i + 1,
                    item_id: rec.item_id,
                    title: snapshot.store.title_of(rec.item_id)?.to_string(),
                    score: rec.score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RecommendationResponse {
            user_id: request.user_id,
            method: request.method,
            recommendations: items,
            generated_at: Utc::now(),
        })
    }

    pub fn user_similarity(&self, a: UserId, b: UserId) -> Result<f64> {
        let snapshot = self.snapshot()?;
        let matrix = &snapshot.model.matrix;
        let ia = matrix.user_index(a).ok_or(RecommenderError::UnknownUser(a))?;
        let ib = matrix.user_index(b).ok_or(RecommenderError::UnknownUser(b))?;
        Ok(snapshot.model.user_similarity.get(ia, ib))
    }

    pub fn item_similarity(&self, a: ItemId, b: ItemId) -> Result<f64> {
        let snapshot = self.snapshot()?;
        let matrix = &snapshot.model.matrix;
        let ia = matrix.item_index(a).ok_or(RecommenderError::UnknownItem(a))?;
        let ib = matrix.item_index(b).ok_or(RecommenderError::UnknownItem(b))?;
        Ok(snapshot.model.item_similarity.get(ia, ib))
    }

    pub fn stats(&self) -> Result<DatasetStats> {
        Ok(self.snapshot()?.stats.clone())
    }

    pub fn rating_distribution(&self) -> Result<Vec<RatingCount>> {
        Ok(metrics::rating_distribution(&self.snapshot()?.store))
    }

    pub fn user_activity(&self) -> Result<Vec<ActivityBucket>> {
        Ok(metrics::user_activity(&self.snapshot()?.store))
    }

    pub fn user_summary(&self, user_id: UserId) -> Result<UserSummary> {
        metrics::user_summary(&self.snapshot()?.store, user_id)
    }
}
