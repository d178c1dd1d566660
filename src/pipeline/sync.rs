// src/pipeline/sync.rs

//! Synchronization pipeline.
//!
//! Per source: collect pages → normalize → dedupe → write. Sources run
//! concurrently; the merged view is rebuilt once all of them finished.

use std::collections::BTreeMap;

use chrono::Utc;
use futures::future::join_all;

use crate::error::{AppError, Result};
use crate::models::{Config, Document, SourceConfig};
use crate::pipeline::catalog::{WriteOutcome, latest_key, write_catalog_and_latest};
use crate::pipeline::merge::merge_latest;
use crate::services::{Normalizer, SourceCollector, SourceHint, build_adapter, dedupe};
use crate::storage::CatalogStorage;
use crate::utils::http::Fetcher;

/// Counters for one source run.
#[derive(Debug, Clone, Default)]
pub struct SourceReport {
    pub name: String,
    pub pages: usize,
    pub fetch_failures: usize,
    pub parse_failures: usize,
    pub records: usize,
    /// Records the normalizer dropped
    pub skipped: usize,
    /// Normalized documents collapsed by deduplication
    pub duplicates: usize,
    pub documents: usize,
    /// Whether catalog.json or latest.json was rewritten
    pub changed: bool,
    /// Why the source produced no output, if it did not
    pub error: Option<String>,
}

impl SourceReport {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Which sources to run and whether to rebuild the merged view.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Source names; empty means every enabled source
    pub sources: Vec<String>,
    pub merge: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            merge: true,
        }
    }
}

/// Outcome of a full sync.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub sources: Vec<SourceReport>,
    /// Merge result, `None` when the merge was skipped
    pub merge: Option<WriteOutcome>,
}

impl SyncReport {
    pub fn changed(&self) -> bool {
        self.sources.iter().any(|s| s.changed) || self.merge.as_ref().is_some_and(|m| m.changed)
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| s.error.is_some())
    }
}

/// Run one source end to end.
///
/// Recoverable failures (unreachable listing, bad selector) end up in
/// [`SourceReport::error`]; storage and serialization failures are returned.
pub async fn run_source(
    config: &Config,
    source: &SourceConfig,
    fetcher: &Fetcher,
    storage: &dyn CatalogStorage,
) -> Result<SourceReport> {
    let mut report = SourceReport::new(&source.name);
    let start_time = Utc::now();
    log::info!("[{}] Starting ({})", source.name, source.adapter.kind());

    let documents = match collect_documents(source, fetcher, &mut report).await {
        Ok(documents) => documents,
        Err(e) if e.is_recoverable() => {
            log::warn!("[{}] Skipped: {}", source.name, e);
            report.error = Some(e.to_string());
            return Ok(report);
        }
        Err(e) => return Err(e),
    };

    if documents.is_empty() {
        log::warn!(
            "[{}] No usable documents ({} records, {} skipped); keeping existing catalog",
            source.name,
            report.records,
            report.skipped
        );
        report.error = Some("no usable documents".to_string());
        return Ok(report);
    }

    let outcome = write_catalog_and_latest(
        storage,
        &source.name,
        documents,
        source.latest_n(&config.output),
    )
    .await?;
    report.changed = outcome.changed;

    log::info!(
        "[{}] {} documents from {} pages in {}s ({} fetch failures, {} parse failures, {} skipped, {} duplicates)",
        source.name,
        report.documents,
        report.pages,
        (Utc::now() - start_time).num_seconds(),
        report.fetch_failures,
        report.parse_failures,
        report.skipped,
        report.duplicates
    );
    Ok(report)
}

async fn collect_documents(
    source: &SourceConfig,
    fetcher: &Fetcher,
    report: &mut SourceReport,
) -> Result<Vec<Document>> {
    let adapter = build_adapter(source)?;
    let normalizer = Normalizer::new(SourceHint::from_config(source)?);

    let outcome = SourceCollector::new(fetcher).collect(adapter.as_ref()).await?;
    report.pages = outcome.page_total;
    report.fetch_failures = outcome.fetch_failures;
    report.parse_failures = outcome.parse_failures;
    report.records = outcome.records.len();

    let normalized: Vec<Document> = outcome
        .records
        .iter()
        .filter_map(|record| normalizer.normalize(record))
        .collect();
    report.skipped = report.records - normalized.len();
    if report.records > 0 && normalized.is_empty() {
        log::warn!("[{}] Every record was skipped", source.name);
    }

    let documents = dedupe(normalized);
    report.duplicates = report.records - report.skipped - documents.len();
    report.documents = documents.len();
    Ok(documents)
}

/// Run the selected sources concurrently, then the merge.
pub async fn run_sync(
    config: &Config,
    options: &SyncOptions,
    fetcher: &Fetcher,
    storage: &dyn CatalogStorage,
) -> Result<SyncReport> {
    let selected = select_sources(config, &options.sources)?;
    log::info!("Syncing {} sources", selected.len());

    let results = join_all(
        selected
            .iter()
            .map(|source| run_source(config, source, fetcher, storage)),
    )
    .await;

    let mut report = SyncReport::default();
    for result in results {
        report.sources.push(result?);
    }

    if options.merge {
        report.merge = Some(run_merge(config, storage).await?);
    }

    let failed = report.failed_sources().count();
    if failed > 0 {
        log::warn!("{} of {} sources produced no output", failed, report.sources.len());
    }
    Ok(report)
}

fn select_sources<'a>(config: &'a Config, names: &[String]) -> Result<Vec<&'a SourceConfig>> {
    if names.is_empty() {
        return Ok(config.enabled_sources().collect());
    }
    names
        .iter()
        .map(|name| {
            config
                .source(name)
                .ok_or_else(|| AppError::config(format!("unknown source '{name}'")))
        })
        .collect()
}

/// Rebuild the merged view from every configured source's `latest.json`.
///
/// Sources without a readable `latest.json` are left out.
pub async fn run_merge(config: &Config, storage: &dyn CatalogStorage) -> Result<WriteOutcome> {
    let mut buckets: BTreeMap<String, Vec<Document>> = BTreeMap::new();
    for source in &config.sources {
        let key = latest_key(&source.name);
        match storage.read_catalog(&key).await {
            Ok(Some(latest)) => {
                buckets.insert(source.name.clone(), latest.documents);
            }
            Ok(None) => log::warn!("[{}] No {} yet, not merged", source.name, key),
            Err(e) => log::warn!("[{}] Unreadable {}, not merged: {}", source.name, key, e),
        }
    }

    merge_latest(
        storage,
        &buckets,
        &config.output.merged_dir,
        config.output.latest_n,
        config.output.merged_latest_n,
    )
    .await
}
