pub mod source;

pub use source::{open_source, DatasetFormat, InMemorySource, JsonFileSource, MovieLensSource, RatingSource};

use crate::error::{RecommenderError, Result};
use crate::models::*;
use crate::utils::validation::validate_rating_record;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub scale: RatingScale,
    pub duplicate_policy: DuplicatePolicy,
}

/// The loaded rating table. Immutable once built.
#[derive(Debug, Clone)]
pub struct RatingStore {
    records: Vec<RatingRecord>,
    titles: HashMap<ItemId, String>,
    // record indices per user, rating desc then item id asc
    by_user: BTreeMap<UserId, Vec<usize>>,
    items: Vec<ItemId>,
    scale: RatingScale,
}

impl RatingStore {
    pub fn load(source: &dyn RatingSource, options: LoadOptions) -> Result<Self> {
        let records = source.load()?;
        let store = Self::from_records(records, options)?;

        info!(
            "Loaded {} ratings from {} ({} users, {} items)",
            store.len(),
            source.describe(),
            store.by_user.len(),
            store.items.len()
        );
        Ok(store)
    }

    pub fn from_records(raw: Vec<RatingRecord>, options: LoadOptions) -> Result<Self> {
        if raw.is_empty() {
            return Err(RecommenderError::data_load("dataset contains no rating records"));
        }

        let mut records: Vec<RatingRecord> = Vec::with_capacity(raw.len());
        let mut seen: HashMap<(UserId, ItemId), usize> = HashMap::with_capacity(raw.len());
        let mut titles: HashMap<ItemId, String> = HashMap::new();

        for (position, mut record) in raw.into_iter().enumerate() {
            validate_rating_record(&record, &options.scale)
                .map_err(|e| RecommenderError::data_load(format!("record {}: {}", position, e)))?;

            let title = titles
                .entry(record.item_id)
                .or_insert_with(|| record.title.clone());
            if *title != record.title {
                warn!(
                    "Item {} has conflicting titles '{}' and '{}', keeping the first",
                    record.item_id, title, record.title
                );
                record.title = title.clone();
            }

            let key = (record.user_id, record.item_id);
            if let Some(&earlier) = seen.get(&key) {
                match options.duplicate_policy {
                    DuplicatePolicy::Reject => {
                        return Err(RecommenderError::data_load(format!(
                            "duplicate rating for user {} and item {} (record {})",
                            record.user_id, record.item_id, position
                        )));
                    }
                    DuplicatePolicy::KeepLatest => {
                        warn!(
                            "Duplicate rating for user {} and item {}, keeping the latest",
                            record.user_id, record.item_id
                        );
                        records[earlier] = record;
                        continue;
                    }
                }
            }

            seen.insert(key, records.len());
            records.push(record);
        }

        let mut by_user: BTreeMap<UserId, Vec<usize>> = BTreeMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_user.entry(record.user_id).or_default().push(idx);
        }
        for indices in by_user.values_mut() {
            indices.sort_by(|&a, &b| {
                records[b]
                    .rating
                    .cmp(&records[a].rating)
                    .then_with(|| records[a].item_id.cmp(&records[b].item_id))
            });
        }

        let mut items: Vec<ItemId> = titles.keys().copied().collect();
        items.sort_unstable();

        Ok(Self {
            records,
            titles,
            by_user,
            items,
            scale: options.scale,
        })
    }

    /// Users in ascending id order.
    pub fn all_users(&self) -> Vec<UserId> {
        self.by_user.keys().copied().collect()
    }

    /// Items in ascending id order.
    pub fn all_items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn ratings_for(&self, user_id: UserId) -> Result<Vec<&RatingRecord>> {
        let indices = self
            .by_user
            .get(&user_id)
            .ok_or(RecommenderError::UnknownUser(user_id))?;

        Ok(indices.iter().map(|&idx| &self.records[idx]).collect())
    }

    pub fn title_of(&self, item_id: ItemId) -> Result<&str> {
        self.titles
            .get(&item_id)
            .map(String::as_str)
            .ok_or(RecommenderError::UnknownItem(item_id))
    }

    /// The raw rating table in load order.
    pub fn records(&self) -> &[RatingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    pub fn scale(&self) -> RatingScale {
        self.scale
    }
}
