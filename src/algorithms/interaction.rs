use crate::error::{RecommenderError, Result};
use crate::models::{ItemId, UserId};
use crate::store::RatingStore;
use std::collections::HashMap;
use tracing::debug;

/// Sparse user × item rating matrix.
///
/// Rows are users and columns are items, both indexed by ascending
/// identifier. Pairs without a rating are unknown (`None`), never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionMatrix {
    users: Vec<UserId>,
    items: Vec<ItemId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<ItemId, usize>,
    rows: Vec<Vec<(usize, f64)>>,
    columns: Vec<Vec<(usize, f64)>>,
}

impl InteractionMatrix {
    pub fn build(store: &RatingStore) -> Result<Self> {
        let users = store.all_users();
        let items = store.all_items().to_vec();

        if users.is_empty() || items.is_empty() {
            return Err(RecommenderError::data_load(format!(
                "cannot build an interaction matrix from {} users and {} items",
                users.len(),
                items.len()
            )));
        }

        let user_index: HashMap<UserId, usize> =
            users.iter().enumerate().map(|(idx, &id)| (id, idx)).collect();
        let item_index: HashMap<ItemId, usize> =
            items.iter().enumerate().map(|(idx, &id)| (id, idx)).collect();

        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); users.len()];
        let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); items.len()];

        for record in store.records() {
            let (Some(&u), Some(&i)) = (
                user_index.get(&record.user_id),
                item_index.get(&record.item_id),
            ) else {
                return Err(RecommenderError::data_load(format!(
                    "record for user {} and item {} is missing from the store index",
                    record.user_id, record.item_id
                )));
            };

            let rating = record.rating as f64;
            rows[u].push((i, rating));
            columns[i].push((u, rating));
        }

        for row in &mut rows {
            row.sort_unstable_by_key(|&(i, _)| i);
        }
        for column in &mut columns {
            column.sort_unstable_by_key(|&(u, _)| u);
        }

        debug!(
            "Built {}x{} interaction matrix with {} known ratings",
            users.len(),
            items.len(),
            store.len()
        );

        Ok(Self {
            users,
            items,
            user_index,
            item_index,
            rows,
            columns,
        })
    }

    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    pub fn user_index(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn item_index(&self, item_id: ItemId) -> Option<usize> {
        self.item_index.get(&item_id).copied()
    }

    pub fn item_id(&self, idx: usize) -> ItemId {
        self.items[idx]
    }

    /// Known ratings of a user as `(item index, rating)`, by item index.
    pub fn user_row(&self, user_idx: usize) -> &[(usize, f64)] {
        &self.rows[user_idx]
    }

    /// Known ratings of an item as `(user index, rating)`, by user index.
    pub fn item_column(&self, item_idx: usize) -> &[(usize, f64)] {
        &self.columns[item_idx]
    }

    pub fn rows(&self) -> &[Vec<(usize, f64)>] {
        &self.rows
    }

    pub fn columns(&self) -> &[Vec<(usize, f64)>] {
        &self.columns
    }

    pub fn rating(&self, user_idx: usize, item_idx: usize) -> Option<f64> {
        let row = &self.rows[user_idx];
        row.binary_search_by_key(&item_idx, |&(i, _)| i)
            .ok()
            .map(|pos| row[pos].1)
    }

    pub fn has_rated(&self, user_idx: usize, item_idx: usize) -> bool {
        self.rating(user_idx, item_idx).is_some()
    }
}
