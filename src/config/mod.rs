use crate::models::{DuplicatePolicy, RatingScale};
use crate::store::{DatasetFormat, LoadOptions};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub dataset: DatasetConfig,
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub path: PathBuf,
    pub format: DatasetFormat,
    pub min_rating: u8,
    pub max_rating: u8,
    pub duplicate_policy: DuplicatePolicy,
}

impl DatasetConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            scale: RatingScale::new(self.min_rating, self.max_rating),
            duplicate_policy: self.duplicate_policy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub default_count: usize,
    pub max_count: usize,
    /// Strongest neighbours to blend per prediction; all positive ones when unset.
    pub max_neighbors: Option<usize>,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            default_count: 5,
            max_count: 100,
            max_neighbors: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                workers: num_cpus::get(),
            },
            dataset: DatasetConfig {
                path: PathBuf::from("data/sample_ratings.json"),
                format: DatasetFormat::Json,
                min_rating: 1,
                max_rating: 5,
                duplicate_policy: DuplicatePolicy::Reject,
            },
            recommendation: RecommendationConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CINEREC").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.socket_addr().unwrap().port(), 8080);
        assert_eq!(config.dataset.load_options().scale, RatingScale::new(1, 5));
        assert_eq!(config.recommendation.max_neighbors, None);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[server]
host = "127.0.0.1"
port = 9000
workers = 2

[dataset]
path = "data/ml-100k"
format = "movielens"
min_rating = 1
max_rating = 5
duplicate_policy = "keep_latest"

[recommendation]
default_count = 10
max_count = 50
max_neighbors = 20
"#
        )
        .unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.dataset.format, DatasetFormat::MovieLens);
        assert_eq!(config.dataset.duplicate_policy, DuplicatePolicy::KeepLatest);
        assert_eq!(config.recommendation.max_neighbors, Some(20));
    }
}
