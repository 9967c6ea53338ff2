use cinerec::{init_tracing, Config, Method, RecommendationService};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Overrides the dataset path from the config file
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every user id in the dataset
    Users,
    /// Show the ratings a user has given, best first
    Ratings { user_id: u32 },
    /// Rating count, average and best rating for a user
    Summary { user_id: u32 },
    /// Recommend unseen movies for a user
    Recommend {
        user_id: u32,
        #[arg(short, long, default_value = "user_based")]
        method: Method,
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Dataset-wide statistics
    Stats,
}

fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let mut config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };
    if let Some(dataset) = args.dataset {
        config.dataset.path = dataset;
    }

    let engine = RecommendationService::from_config(&config)?;
    engine.initialize()?;

    match args.command {
        Command::Users => {
            for user_id in engine.list_users()? {
                println!("{}", user_id);
            }
        }
        Command::Ratings { user_id } => {
            for rated in engine.ratings_of(user_id)? {
                println!("{}\t{}\t{}", rated.item_id, rated.rating, rated.title);
            }
        }
        Command::Summary { user_id } => {
            let summary = engine.user_summary(user_id)?;
            println!("Movies rated:   {}", summary.movies_rated);
            println!("Average rating: {:.2}/{}", summary.mean_rating, config.dataset.max_rating);
            println!("Highest rating: {}/{}", summary.highest_rating, config.dataset.max_rating);
        }
        Command::Recommend { user_id, method, count } => {
            let count = count.unwrap_or(config.recommendation.default_count);
            let recommendations = engine.recommend(user_id, method, count)?;

            if recommendations.is_empty() {
                println!("No recommendations available for user {}", user_id);
            }
            for (rank, rec) in recommendations.iter().enumerate() {
                println!("#{} {} ({:.3})", rank + 1, engine.title_of(rec.item_id)?, rec.score);
            }
        }
        Command::Stats => {
            let stats = engine.stats()?;
            println!("Total ratings:  {}", stats.total_ratings);
            println!("Total users:    {}", stats.total_users);
            println!("Total movies:   {}", stats.total_items);
            println!("Average rating: {:.2}/{}", stats.mean_rating, config.dataset.max_rating);
            for bucket in engine.rating_distribution()? {
                println!("  {} stars: {}", bucket.rating, bucket.count);
            }
        }
    }

    Ok(())
}
