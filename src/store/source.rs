use crate::error::{RecommenderError, Result};
use crate::models::{ItemId, RatingRecord, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where raw rating records come from.
pub trait RatingSource: Send + Sync {
    fn describe(&self) -> String;
    fn load(&self) -> Result<Vec<RatingRecord>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFormat {
    /// A JSON array of rating records.
    #[default]
    Json,
    /// A MovieLens-100k directory holding `u.data` and `u.item`.
    #[serde(rename = "movielens", alias = "movie_lens")]
    MovieLens,
}

pub fn open_source(format: DatasetFormat, path: impl Into<PathBuf>) -> Box<dyn RatingSource> {
    match format {
        DatasetFormat::Json => Box::new(JsonFileSource::new(path)),
        DatasetFormat::MovieLens => Box::new(MovieLensSource::new(path)),
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RatingSource for JsonFileSource {
    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }

    fn load(&self) -> Result<Vec<RatingRecord>> {
        let raw = read_bytes(&self.path)?;
        let records: Vec<RatingRecord> = serde_json::from_slice(&raw).map_err(|e| {
            RecommenderError::data_load(format!("malformed JSON in {}: {}", self.path.display(), e))
        })?;

        debug!("Read {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}

#[derive(Debug, Clone)]
pub struct MovieLensSource {
    dir: PathBuf,
}

impl MovieLensSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_titles(&self) -> Result<HashMap<ItemId, String>> {
        let path = self.dir.join("u.item");
        let raw = read_bytes(&path)?;
        let text = decode_latin1(&raw);

        let mut titles = HashMap::new();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.split('|');
            let (Some(id), Some(title)) = (fields.next(), fields.next()) else {
                return Err(malformed(&path, line_no, "expected 'id|title|...'"));
            };

            let id: ItemId = id
                .trim()
                .parse()
                .map_err(|_| malformed(&path, line_no, "item id is not an integer"))?;
            titles.insert(id, title.trim().to_string());
        }

        Ok(titles)
    }
}

impl RatingSource for MovieLensSource {
    fn describe(&self) -> String {
        format!("movielens:{}", self.dir.display())
    }

    fn load(&self) -> Result<Vec<RatingRecord>> {
        let titles = self.read_titles()?;

        let path = self.dir.join("u.data");
        let raw = read_bytes(&path)?;
        let text = String::from_utf8_lossy(&raw);

        let mut records = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(malformed(&path, line_no, "expected 'user item rating [timestamp]'"));
            }

            let user_id: UserId = fields[0]
                .parse()
                .map_err(|_| malformed(&path, line_no, "user id is not an integer"))?;
            let item_id: ItemId = fields[1]
                .parse()
                .map_err(|_| malformed(&path, line_no, "item id is not an integer"))?;
            let rating: u8 = fields[2]
                .parse()
                .map_err(|_| malformed(&path, line_no, "rating is not a small integer"))?;

            let title = titles.get(&item_id).ok_or_else(|| {
                RecommenderError::data_load(format!(
                    "{}:{}: item {} has no entry in u.item",
                    path.display(),
                    line_no + 1,
                    item_id
                ))
            })?;

            records.push(RatingRecord::new(user_id, item_id, rating, title.clone()));
        }

        debug!("Read {} records from {}", records.len(), self.dir.display());
        Ok(records)
    }
}

/// Fixed records, mostly for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<RatingRecord>,
}

impl InMemorySource {
    pub fn new(records: Vec<RatingRecord>) -> Self {
        Self { records }
    }
}

impl RatingSource for InMemorySource {
    fn describe(&self) -> String {
        format!("memory:{} records", self.records.len())
    }

    fn load(&self) -> Result<Vec<RatingRecord>> {
        Ok(self.records.clone())
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| RecommenderError::data_load(format!("cannot read {}: {}", path.display(), e)))
}

/// `u.item` ships as Latin-1: every byte is its own code point.
fn decode_latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| b as char).collect()
}

fn malformed(path: &Path, line_no: usize, what: &str) -> RecommenderError {
    RecommenderError::data_load(format!("{}:{}: {}", path.display(), line_no + 1, what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_json_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ratings.json");
        fs::write(
            &path,
            r#"[{"user_id": 1, "item_id": 10, "rating": 4, "title": "Heat (1995)"}]"#,
        )
        .unwrap();

        let records = JsonFileSource::new(&path).load().unwrap();
        assert_eq!(records, vec![RatingRecord::new(1, 10, 4, "Heat (1995)")]);
    }

    #[test]
    fn test_json_source_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = JsonFileSource::new(dir.path().join("nope.json")).load();
        assert!(matches!(missing, Err(RecommenderError::DataLoad(_))));

        let path = dir.path().join("bad.json");
        fs::write(&path, r#"[{"user_id": 1}]"#).unwrap();
        let malformed = JsonFileSource::new(&path).load();
        assert!(matches!(malformed, Err(RecommenderError::DataLoad(_))));
    }

    #[test]
    fn test_movielens_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("u.item"),
            "1|Toy Story (1995)|01-Jan-1995||http://example|0|0\n2|GoldenEye (1995)|01-Jan-1995||x|0|1\n",
        )
        .unwrap();
        fs::write(dir.path().join("u.data"), "196\t1\t3\t881250949\n186\t2\t5\t891717742\n").unwrap();

        let records = MovieLensSource::new(dir.path()).load().unwrap();
        assert_eq!(
            records,
            vec![
                RatingRecord::new(196, 1, 3, "Toy Story (1995)"),
                RatingRecord::new(186, 2, 5, "GoldenEye (1995)"),
            ]
        );
    }

    #[test]
    fn test_movielens_titles_are_latin1() {
        let dir = tempfile::tempdir().unwrap();
        let mut item = b"1|Mis".to_vec();
        item.push(0xE9);
        item.extend_from_slice(b"rables, Les (1995)|01-Jan-1995||x|0|1\n");
        fs::write(dir.path().join("u.item"), item).unwrap();
        fs::write(dir.path().join("u.data"), "196\t1\t4\t881250949\n").unwrap();

        let records = MovieLensSource::new(dir.path()).load().unwrap();
        assert_eq!(records[0].title, "Misérables, Les (1995)");
    }

    #[test]
    fn test_dataset_format_tags() {
        let format: DatasetFormat = serde_json::from_str("\"movielens\"").unwrap();
        assert_eq!(format, DatasetFormat::MovieLens);
        let legacy: DatasetFormat = serde_json::from_str("\"movie_lens\"").unwrap();
        assert_eq!(legacy, DatasetFormat::MovieLens);
        assert_eq!(serde_json::to_string(&DatasetFormat::MovieLens).unwrap(), "\"movielens\"");
        assert_eq!(serde_json::to_string(&DatasetFormat::Json).unwrap(), "\"json\"");
    }

    #[test]
    fn test_movielens_source_unknown_title() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("u.item"), "1|Toy Story (1995)\n").unwrap();
        fs::write(dir.path().join("u.data"), "196\t7\t3\t881250949\n").unwrap();

        let err = MovieLensSource::new(dir.path()).load().unwrap_err();
        assert!(err.to_string().contains("item 7"));
    }

    #[test]
    fn test_movielens_source_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("u.item"), "1|Toy Story (1995)\n").unwrap();
        fs::write(dir.path().join("u.data"), "196\tone\t3\n").unwrap();

        let err = MovieLensSource::new(dir.path()).load().unwrap_err();
        assert!(err.to_string().contains("u.data:1"));
    }
}
