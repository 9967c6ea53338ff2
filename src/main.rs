use cinerec::{init_tracing, AppState, Config, RecommenderError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    method: Option<String>,
    count: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: String,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<T>>)>;

fn respond<T>(result: cinerec::Result<T>) -> ApiResult<T> {
    match result {
        Ok(data) => Ok(Json(ApiResponse::success(data))),
        Err(e) => {
            let status = match e {
                RecommenderError::UnknownUser(_) | RecommenderError::UnknownItem(_) => StatusCode::NOT_FOUND,
                RecommenderError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                RecommenderError::NotInitialized => StatusCode::SERVICE_UNAVAILABLE,
                RecommenderError::DataLoad(_) | RecommenderError::SimilarityCompute(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            if status.is_server_error() {
                tracing::error!("Request failed: {}", e);
            } else {
                tracing::debug!("Request rejected: {}", e);
            }
            Err((status, Json(ApiResponse::error(e.to_string()))))
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HashMap<String, String>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".to_string());
    status.insert("service".to_string(), "cinerec".to_string());
    status.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());
    status.insert(
        "initialized".to_string(),
        state.recommendation_service.is_initialized().to_string(),
    );

    Json(ApiResponse::success(status))
}

async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<cinerec::UserId>> {
    respond(state.recommendation_service.list_users())
}

async fn list_items(State(state): State<AppState>) -> ApiResult<Vec<cinerec::ItemId>> {
    respond(state.recommendation_service.list_items())
}

async fn get_user_ratings(
    State(state): State<AppState>,
    Path(user_id): Path<cinerec::UserId>,
) -> ApiResult<Vec<cinerec::RatedItem>> {
    respond(state.recommendation_service.ratings_of(user_id))
}

async fn get_user_summary(
    State(state): State<AppState>,
    Path(user_id): Path<cinerec::UserId>,
) -> ApiResult<cinerec::UserSummary> {
    respond(state.recommendation_service.user_summary(user_id))
}

async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<cinerec::ItemId>,
) -> ApiResult<HashMap<String, String>> {
    respond(state.recommendation_service.title_of(item_id).map(|title| {
        let mut item = HashMap::new();
        item.insert("item_id".to_string(), item_id.to_string());
        item.insert("title".to_string(), title);
        item
    }))
}

async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<cinerec::UserId>,
    Query(params): Query<RecommendationQuery>,
) -> ApiResult<cinerec::RecommendationResponse> {
    let method = match params.method.as_deref().unwrap_or("user_based").parse::<cinerec::Method>() {
        Ok(method) => method,
        Err(e) => return respond(Err(e)),
    };

    let request = cinerec::RecommendationRequest {
        user_id,
        method,
        num_recommendations: params
            .count
            .unwrap_or(state.config.recommendation.default_count),
    };

    respond(state.serving_service.serve_recommendations(&request))
}

async fn get_stats(State(state): State<AppState>) -> ApiResult<cinerec::DatasetStats> {
    respond(state.recommendation_service.stats())
}

async fn get_rating_distribution(State(state): State<AppState>) -> ApiResult<Vec<cinerec::RatingCount>> {
    respond(state.recommendation_service.rating_distribution())
}

async fn get_user_activity(State(state): State<AppState>) -> ApiResult<Vec<cinerec::ActivityBucket>> {
    respond(state.recommendation_service.user_activity())
}

async fn get_serving_stats(State(state): State<AppState>) -> Json<ApiResponse<HashMap<String, u64>>> {
    Json(ApiResponse::success(state.serving_service.get_serving_stats()))
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/users", get(list_users))
        .route("/users/:user_id/ratings", get(get_user_ratings))
        .route("/users/:user_id/summary", get(get_user_summary))
        .route("/items", get(list_items))
        .route("/items/:item_id", get(get_item))
        .route("/recommendations/:user_id", get(get_recommendations))
        .route("/stats", get(get_stats))
        .route("/stats/ratings", get(get_rating_distribution))
        .route("/stats/activity", get(get_user_activity))
        .route("/stats/serving", get(get_serving_stats))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
        )
        .with_state(state)
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match std::env::var("CINEREC_CONFIG") {
        Ok(path) => Config::from_file(&path)?,
        Err(_) => Config::default(),
    };
    info!("Starting cinerec server with config: {:?}", config.server);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers.max(1))
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let addr = config.server.socket_addr()?;
        let state = tokio::task::spawn_blocking(move || AppState::new(config)).await??;
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Server listening on {}", addr);

        axum::serve(listener, app).await?;
        Ok::<(), anyhow::Error>(())
    })
}
