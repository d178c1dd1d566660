//! Merged `all` view across sources.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{Document, sort_newest_first};
use crate::pipeline::catalog::{WriteOutcome, write_catalog_and_latest};
use crate::storage::CatalogStorage;

/// Merge the newest documents of every bucket and write them under `dir`.
///
/// Each bucket is expected newest first (a `latest.json` view); at most
/// `per_bucket_n` entries are taken from each, in bucket name order. The
/// union is sorted and cut to `merged_n`, which is also the size of the
/// merged latest view.
pub async fn merge_latest(
    storage: &dyn CatalogStorage,
    buckets: &BTreeMap<String, Vec<Document>>,
    dir: &str,
    per_bucket_n: usize,
    merged_n: usize,
) -> Result<WriteOutcome> {
    let mut merged: Vec<Document> = buckets
        .values()
        .flat_map(|docs| docs.iter().take(per_bucket_n).cloned())
        .collect();
    sort_newest_first(&mut merged);
    merged.truncate(merged_n);

    log::info!(
        "Merging {} buckets into {} ({} documents)",
        buckets.len(),
        dir,
        merged.len()
    );
    write_catalog_and_latest(storage, dir, merged, merged_n).await
}
