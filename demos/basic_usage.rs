use cinerec::config::RecommendationConfig;
use cinerec::store::{InMemorySource, LoadOptions};
use cinerec::*;

fn main() -> anyhow::Result<()> {
    init_tracing();

    println!("cinerec basic usage");

    // 1. A tiny in-memory rating table
    let titles = ["Alien", "Brazil", "Casablanca", "Dune", "Eraserhead"];
    let ratings = [
        (1, 0, 5), (1, 1, 4), (1, 3, 2),
        (2, 0, 4), (2, 2, 5), (2, 3, 3),
        (3, 1, 5), (3, 2, 4), (3, 4, 4),
        (4, 0, 2), (4, 3, 5), (4, 4, 3),
    ];
    let records: Vec<RatingRecord> = ratings
        .iter()
        .map(|&(user, item, rating)| RatingRecord::new(user, item as u32 + 1, rating, titles[item]))
        .collect();

    // 2. Build the engine once
    let engine = RecommendationService::new(
        Box::new(InMemorySource::new(records)),
        LoadOptions::default(),
        RecommendationConfig::default(),
    );
    engine.initialize()?;

    let stats = engine.stats()?;
    println!(
        "Loaded {} ratings from {} users over {} movies (mean {:.2})",
        stats.total_ratings, stats.total_users, stats.total_items, stats.mean_rating
    );

    // 3. Recommend for every user with both methods
    for user_id in engine.list_users()? {
        let summary = engine.user_summary(user_id)?;
        println!("\nUser {} rated {} movies", user_id, summary.movies_rated);

        for method in [Method::UserBased, Method::ItemBased] {
            let recommendations = engine.recommend(user_id, method, 3)?;
            if recommendations.is_empty() {
                println!("  {}: nothing to recommend", method);
                continue;
            }

            for (rank, rec) in recommendations.iter().enumerate() {
                println!(
                    "  {} #{} {} ({:.3})",
                    method,
                    rank + 1,
                    engine.title_of(rec.item_id)?,
                    rec.score
                );
            }
        }
    }

    Ok(())
}
