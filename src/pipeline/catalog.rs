//! Hash-gated catalog writer.
//!
//! Produces `<dir>/catalog.json` (every document) and `<dir>/latest.json`
//! (the newest N). Each file is only rewritten when its bytes would change,
//! and an unchanged document list keeps its previous `updated_at`, so a
//! repeated run leaves both files byte-identical.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Catalog, Document, sort_newest_first};
use crate::pipeline::diff::{CatalogDiff, diff_catalogs};
use crate::storage::CatalogStorage;

pub const CATALOG_FILE: &str = "catalog.json";
pub const LATEST_FILE: &str = "latest.json";

/// Result of one [`write_catalog_and_latest`] call.
#[derive(Debug, Clone, Default)]
pub struct WriteOutcome {
    /// Whether either file was written
    pub changed: bool,
    pub catalog_count: usize,
    pub latest_count: usize,
    /// Changes relative to the previous catalog.json
    pub diff: CatalogDiff,
}

pub fn catalog_key(dir: &str) -> String {
    format!("{dir}/{CATALOG_FILE}")
}

pub fn latest_key(dir: &str) -> String {
    format!("{dir}/{LATEST_FILE}")
}

/// Sort, then write the full catalog and its latest view under `dir`.
pub async fn write_catalog_and_latest(
    storage: &dyn CatalogStorage,
    dir: &str,
    mut documents: Vec<Document>,
    latest_n: usize,
) -> Result<WriteOutcome> {
    sort_newest_first(&mut documents);

    let catalog_path = catalog_key(dir);
    let latest_path = latest_key(dir);
    let previous_catalog = read_previous(storage, &catalog_path).await?;
    let previous_latest = read_previous(storage, &latest_path).await?;

    let now = Utc::now();
    let catalog = stamp(Catalog::new(documents, now), previous_catalog.as_ref(), now);
    let latest = stamp(catalog.latest(latest_n), previous_latest.as_ref(), now);

    let diff = diff_catalogs(
        previous_catalog
            .as_ref()
            .map(|c| c.documents.as_slice())
            .unwrap_or_default(),
        &catalog.documents,
    );

    let catalog_written = storage
        .write_if_changed(&catalog_path, &serde_json::to_vec(&catalog)?)
        .await?;
    let latest_written = storage
        .write_if_changed(&latest_path, &serde_json::to_vec(&latest)?)
        .await?;

    if catalog_written || latest_written {
        log::info!(
            "{}: wrote {} documents ({} latest); {} added, {} updated, {} removed",
            dir,
            catalog.count,
            latest.count,
            diff.added.len(),
            diff.updated.len(),
            diff.removed.len()
        );
    } else {
        log::info!("{}: unchanged ({} documents)", dir, catalog.count);
    }

    Ok(WriteOutcome {
        changed: catalog_written || latest_written,
        catalog_count: catalog.count,
        latest_count: latest.count,
        diff,
    })
}

/// Existing catalog at `key`. A corrupt file counts as absent.
async fn read_previous(storage: &dyn CatalogStorage, key: &str) -> Result<Option<Catalog>> {
    match storage.read_catalog(key).await {
        Ok(previous) => Ok(previous),
        Err(AppError::Json(e)) => {
            log::warn!("{} is not a valid catalog, replacing it: {}", key, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Keep the previous timestamp when the documents did not change.
fn stamp(candidate: Catalog, previous: Option<&Catalog>, now: DateTime<Utc>) -> Catalog {
    match previous {
        Some(prev) if prev.documents == candidate.documents => {
            Catalog::new(candidate.documents, prev.updated_at)
        }
        _ => Catalog::new(candidate.documents, now),
    }
}
