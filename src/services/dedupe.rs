// src/services/dedupe.rs

//! Deduplication by primary URL.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::Document;

/// Keep one document per `primary_url`.
///
/// A later duplicate replaces the kept one only if its date is strictly
/// newer (the unknown-date sentinel is oldest). Output order is the order in
/// which each URL was first seen.
pub fn dedupe(documents: Vec<Document>) -> Vec<Document> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(documents.len());
    let mut kept: Vec<Document> = Vec::with_capacity(documents.len());

    for doc in documents {
        match index.get(&doc.primary_url) {
            Some(&slot) => {
                if doc.cmp_date(&kept[slot]) == Ordering::Greater {
                    kept[slot] = doc;
                }
            }
            None => {
                index.insert(doc.primary_url.clone(), kept.len());
                kept.push(doc);
            }
        }
    }
    kept
}
