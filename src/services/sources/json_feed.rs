// src/services/sources/json_feed.rs

//! JSON metadata feeds.

use async_trait::async_trait;
use serde_json::Value;

use super::SourceAdapter;
use crate::error::{AppError, Result};
use crate::models::{ProvisionalRecord, SourceConfig};
use crate::utils::http::Fetcher;

/// Keys of a wrapper object holding the record array.
const COLLECTION_KEYS: &[&str] = &["documents", "items", "data"];

pub struct JsonFeedAdapter {
    name: String,
    feed_urls: Vec<String>,
}

impl JsonFeedAdapter {
    pub fn new(source: &SourceConfig) -> Self {
        Self {
            name: source.name.clone(),
            feed_urls: source.listing_urls(),
        }
    }
}

#[async_trait]
impl SourceAdapter for JsonFeedAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn page_urls(&self, _fetcher: &Fetcher) -> Result<Vec<String>> {
        Ok(self.feed_urls.clone())
    }

    fn extract_records(&self, page_url: &str, body: &str) -> Result<Vec<ProvisionalRecord>> {
        let value: Value = serde_json::from_str(body).map_err(|e| AppError::parse(page_url, e))?;
        records_from_value(value)
            .ok_or_else(|| AppError::parse(page_url, "expected a JSON object or array"))
    }
}

/// Array of objects, wrapper object, or a single metadata object.
fn records_from_value(value: Value) -> Option<Vec<ProvisionalRecord>> {
    match value {
        Value::Array(items) => Some(objects(items)),
        Value::Object(mut map) => {
            let wrapped = COLLECTION_KEYS
                .iter()
                .find(|key| map.get(**key).is_some_and(Value::is_array))
                .and_then(|key| map.remove(*key));
            match wrapped {
                Some(Value::Array(items)) => Some(objects(items)),
                _ => Some(vec![ProvisionalRecord::from(map)]),
            }
        }
        _ => None,
    }
}

fn objects(items: Vec<Value>) -> Vec<ProvisionalRecord> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(ProvisionalRecord::from(map)),
            _ => None,
        })
        .collect()
}
