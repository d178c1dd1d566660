// src/services/collector.rs

//! Page walker shared by all adapters.

use crate::error::Result;
use crate::models::ProvisionalRecord;
use crate::services::sources::SourceAdapter;
use crate::utils::http::Fetcher;

/// Summary of one source's collection pass.
#[derive(Debug, Default)]
pub struct CollectOutcome {
    pub records: Vec<ProvisionalRecord>,
    pub page_total: usize,
    pub fetch_failures: usize,
    pub parse_failures: usize,
}

impl CollectOutcome {
    /// Whether no page could be fetched and parsed.
    pub fn all_pages_failed(&self) -> bool {
        self.page_total > 0 && self.fetch_failures + self.parse_failures == self.page_total
    }
}

/// Fetches a source's pages one at a time and gathers their records.
pub struct SourceCollector<'a> {
    fetcher: &'a Fetcher,
}

impl<'a> SourceCollector<'a> {
    pub fn new(fetcher: &'a Fetcher) -> Self {
        Self { fetcher }
    }

    /// Walk every page of `adapter`, pausing between requests.
    ///
    /// Adapters that fetched index pages get a pause before the first page
    /// as well. Page-level fetch and parse failures are counted and skipped.
    pub async fn collect(&self, adapter: &dyn SourceAdapter) -> Result<CollectOutcome> {
        let pages = adapter.page_urls(self.fetcher).await?;
        let mut outcome = CollectOutcome {
            page_total: pages.len(),
            ..CollectOutcome::default()
        };

        for (i, page_url) in pages.iter().enumerate() {
            if i > 0 || adapter.discovers_pages() {
                self.fetcher.pause().await;
            }

            let body = match adapter.fetch_page(self.fetcher, page_url).await {
                Ok(body) => body,
                Err(error) => {
                    outcome.fetch_failures += 1;
                    log::warn!("[{}] Failed to fetch {}: {}", adapter.name(), page_url, error);
                    continue;
                }
            };

            match adapter.extract_records(page_url, &body) {
                Ok(records) => {
                    log::debug!(
                        "[{}] {} records from {}",
                        adapter.name(),
                        records.len(),
                        page_url
                    );
                    outcome.records.extend(records);
                }
                Err(error) => {
                    outcome.parse_failures += 1;
                    log::warn!("[{}] Failed to parse {}: {}", adapter.name(), page_url, error);
                }
            }
        }

        if outcome.all_pages_failed() {
            log::warn!(
                "[{}] All {} pages failed",
                adapter.name(),
                outcome.page_total
            );
        }
        Ok(outcome)
    }
}
