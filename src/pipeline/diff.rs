//! Diff between two catalog snapshots.
//!
//! Documents are matched by `primary_url`. Used to log what a write
//! actually changed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::Document;

/// Primary URLs that appeared, disappeared or changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDiff {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

impl CatalogDiff {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.updated.is_empty() || !self.removed.is_empty()
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }
}

/// Compare two document lists.
///
/// `added` and `updated` follow the order of `current`, `removed` the order
/// of `previous`.
pub fn diff_catalogs(previous: &[Document], current: &[Document]) -> CatalogDiff {
    let prev_map: HashMap<&str, &Document> = previous
        .iter()
        .map(|d| (d.primary_url.as_str(), d))
        .collect();
    let curr_map: HashMap<&str, &Document> = current
        .iter()
        .map(|d| (d.primary_url.as_str(), d))
        .collect();

    let mut diff = CatalogDiff::default();
    for doc in current {
        match prev_map.get(doc.primary_url.as_str()) {
            None => diff.added.push(doc.primary_url.clone()),
            Some(prev) if *prev != doc => diff.updated.push(doc.primary_url.clone()),
            Some(_) => {}
        }
    }
    diff.removed = previous
        .iter()
        .filter(|d| !curr_map.contains_key(d.primary_url.as_str()))
        .map(|d| d.primary_url.clone())
        .collect();
    diff
}
