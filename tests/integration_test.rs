use cinerec::algorithms::{compute_item_similarity, compute_user_similarity, InteractionMatrix, Model};
use cinerec::config::RecommendationConfig;
use cinerec::store::{InMemorySource, JsonFileSource, LoadOptions, MovieLensSource, RatingSource, RatingStore};
use cinerec::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn scenario_records() -> Vec<RatingRecord> {
    vec![
        RatingRecord::new(1, 1, 5, "i1"),
        RatingRecord::new(1, 2, 3, "i2"),
        RatingRecord::new(2, 1, 4, "i1"),
        RatingRecord::new(2, 3, 5, "i3"),
        RatingRecord::new(3, 2, 4, "i2"),
    ]
}

fn engine(records: Vec<RatingRecord>) -> RecommendationService {
    let engine = RecommendationService::new(
        Box::new(InMemorySource::new(records)),
        LoadOptions::default(),
        RecommendationConfig::default(),
    );
    engine.initialize().unwrap();
    engine
}

fn sample_engine() -> RecommendationService {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/sample_ratings.json");
    let engine = RecommendationService::new(
        Box::new(JsonFileSource::new(path)),
        LoadOptions::default(),
        RecommendationConfig::default(),
    );
    engine.initialize().unwrap();
    engine
}

#[test]
fn test_item_based_scenario() {
    let engine = engine(scenario_records());

    let sim_31 = engine.item_similarity(3, 1).unwrap();
    let sim_32 = engine.item_similarity(3, 2).unwrap();
    assert!((sim_31 - 4.0 / 41f64.sqrt()).abs() < 1e-12);
    assert_eq!(sim_32, 0.0);

    let recs = engine.recommend(1, Method::ItemBased, 2).unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].item_id, 3);

    let expected = (sim_31 * 5.0) / sim_31;
    assert!((recs[0].score - expected).abs() < 1e-12);
    assert!((recs[0].score - 5.0).abs() < 1e-12);
}

#[test]
fn test_recommendations_exclude_rated_items() {
    let engine = sample_engine();

    for user_id in engine.list_users().unwrap() {
        let rated: HashSet<ItemId> = engine
            .ratings_of(user_id)
            .unwrap()
            .into_iter()
            .map(|r| r.item_id)
            .collect();

        for method in [Method::UserBased, Method::ItemBased] {
            for rec in engine.recommend(user_id, method, 100).unwrap() {
                assert!(!rated.contains(&rec.item_id), "user {} got rated item {}", user_id, rec.item_id);
            }
        }
    }
}

#[test]
fn test_recommendations_sorted_and_deterministic() {
    let engine = sample_engine();

    for user_id in engine.list_users().unwrap() {
        for method in [Method::UserBased, Method::ItemBased] {
            let first = engine.recommend(user_id, method, 100).unwrap();
            let second = engine.recommend(user_id, method, 100).unwrap();
            assert_eq!(first, second);

            for pair in first.windows(2) {
                assert!(
                    pair[0].score > pair[1].score
                        || (pair[0].score == pair[1].score && pair[0].item_id < pair[1].item_id)
                );
            }
        }
    }
}

#[test]
fn test_count_bounds() {
    let engine = sample_engine();

    for user_id in engine.list_users().unwrap() {
        for method in [Method::UserBased, Method::ItemBased] {
            let all = engine.recommend(user_id, method, 100).unwrap();
            for k in 1..=all.len() + 2 {
                let top = engine.recommend(user_id, method, k).unwrap();
                assert_eq!(top.len(), k.min(all.len()));
                assert_eq!(top[..], all[..top.len()]);
            }
        }
    }
}

#[test]
fn test_single_rating_without_overlap_is_empty() {
    let engine = engine(vec![
        RatingRecord::new(1, 1, 4, "a"),
        RatingRecord::new(2, 2, 5, "b"),
        RatingRecord::new(3, 2, 3, "b"),
        RatingRecord::new(3, 3, 4, "c"),
    ]);

    assert_eq!(engine.recommend(1, Method::UserBased, 5).unwrap(), Vec::new());
}

#[test]
fn test_unknown_identifiers() {
    let engine = engine(scenario_records());

    assert_eq!(
        engine.recommend(404, Method::UserBased, 3),
        Err(RecommenderError::UnknownUser(404))
    );
    assert_eq!(engine.ratings_of(404), Err(RecommenderError::UnknownUser(404)));
    assert_eq!(engine.title_of(404), Err(RecommenderError::UnknownItem(404)));
    assert!(engine.title_of(404).unwrap_err().is_not_found());
}

#[test]
fn test_similarity_rebuild_is_identical() {
    let store = RatingStore::from_records(scenario_records(), LoadOptions::default()).unwrap();
    let matrix = InteractionMatrix::build(&store).unwrap();

    let users = compute_user_similarity(&matrix).unwrap();
    let items = compute_item_similarity(&matrix).unwrap();
    assert!(users.is_symmetric(1e-12));
    assert!(items.is_symmetric(1e-12));

    assert_eq!(Model::build(&store).unwrap(), Model::build(&store).unwrap());
    assert_eq!(users, compute_user_similarity(&InteractionMatrix::build(&store).unwrap()).unwrap());
}

#[test]
fn test_ratings_of_order_and_titles() {
    let engine = sample_engine();

    let ratings = engine.ratings_of(1).unwrap();
    let ordered: Vec<(ItemId, u8)> = ratings.iter().map(|r| (r.item_id, r.rating)).collect();
    assert_eq!(ordered, vec![(1, 5), (6, 5), (4, 4), (2, 3)]);
    assert_eq!(ratings[0].title, "Toy Story (1995)");
    assert_eq!(engine.title_of(6).unwrap(), "Twelve Monkeys (1995)");
}

#[test]
fn test_dataset_statistics() {
    let engine = engine(scenario_records());

    let stats = engine.stats().unwrap();
    assert_eq!(stats.total_ratings, 5);
    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.total_items, 3);
    assert!((stats.mean_rating - 4.2).abs() < 1e-12);

    let total: usize = engine.rating_distribution().unwrap().iter().map(|c| c.count).sum();
    assert_eq!(total, 5);

    let users: usize = engine.user_activity().unwrap().iter().map(|b| b.num_users).sum();
    assert_eq!(users, 3);

    assert_eq!(engine.records().unwrap().len(), 5);
}

#[test]
fn test_duplicates_rejected_by_default() {
    let mut records = scenario_records();
    records.push(RatingRecord::new(1, 1, 2, "i1"));

    let engine = RecommendationService::new(
        Box::new(InMemorySource::new(records)),
        LoadOptions::default(),
        RecommendationConfig::default(),
    );
    assert!(matches!(engine.initialize(), Err(RecommenderError::DataLoad(_))));
    assert_eq!(engine.list_users(), Err(RecommenderError::NotInitialized));
}

struct SlowCountingSource {
    loads: Arc<AtomicUsize>,
}

impl RatingSource for SlowCountingSource {
    fn describe(&self) -> String {
        "slow".to_string()
    }

    fn load(&self) -> cinerec::Result<Vec<RatingRecord>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(50));
        Ok(scenario_records())
    }
}

#[test]
fn test_concurrent_initialize_builds_once() {
    let loads = Arc::new(AtomicUsize::new(0));
    let engine = RecommendationService::new(
        Box::new(SlowCountingSource { loads: loads.clone() }),
        LoadOptions::default(),
        RecommendationConfig::default(),
    );

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| engine.initialize().unwrap());
        }
    });

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(engine.is_initialized());
}

#[tokio::test]
async fn test_parallel_requests() {
    let engine = Arc::new(sample_engine());
    let expected = engine.recommend(2, Method::ItemBased, 5).unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let engine = engine.clone();
            tokio::task::spawn_blocking(move || engine.recommend(2, Method::ItemBased, 5))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), expected);
    }
}

#[test]
fn test_movielens_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("u.item"),
        "1|Toy Story (1995)|01-Jan-1995\n2|GoldenEye (1995)|01-Jan-1995\n3|Four Rooms (1995)|01-Jan-1995\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("u.data"),
        "1\t1\t5\t874965758\n1\t2\t3\t876893171\n2\t1\t4\t878542960\n2\t3\t5\t876893119\n3\t2\t4\t889751712\n",
    )
    .unwrap();

    let engine = RecommendationService::new(
        Box::new(MovieLensSource::new(dir.path())),
        LoadOptions::default(),
        RecommendationConfig::default(),
    );
    engine.initialize().unwrap();

    let recs = engine.recommend(1, Method::ItemBased, 2).unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(engine.title_of(recs[0].item_id).unwrap(), "Four Rooms (1995)");
}

#[test]
fn test_app_state_from_config() {
    let mut config = Config::default();
    config.dataset.path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/sample_ratings.json");

    let state = AppState::new(config).unwrap();
    let response = state
        .serving_service
        .serve_recommendations(&RecommendationRequest {
            user_id: 5,
            method: Method::UserBased,
            num_recommendations: 3,
        })
        .unwrap();

    assert!(response.recommendations.len() <= 3);
    assert_eq!(state.serving_service.get_serving_stats().get("total_requests"), Some(&1));
}
