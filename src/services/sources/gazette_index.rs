// src/services/sources/gazette_index.rs

//! Two-level gazette listings.
//!
//! Each year page links to one page per publication date
//! (`/view/gazettes/2025-01-02.html`); each date page links the PDFs
//! published that day.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::html_links::pdf_links;
use super::{SourceAdapter, parse_selector};
use crate::error::Result;
use crate::models::{ProvisionalRecord, SourceConfig};
use crate::utils::http::Fetcher;
use crate::utils::resolve_url;
use crate::utils::url::language_from_filename;

static DATE_PAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d{4}-\d{2}-\d{2})\.html$").expect("valid regex"));

pub struct GazetteIndexAdapter {
    name: String,
    year_urls: Vec<String>,
    anchor_selector: Selector,
    link_selector: Selector,
}

impl GazetteIndexAdapter {
    pub fn new(source: &SourceConfig, link_selector: &str) -> Result<Self> {
        Ok(Self {
            name: source.name.clone(),
            year_urls: source.listing_urls(),
            anchor_selector: parse_selector("a[href]")?,
            link_selector: parse_selector(link_selector)?,
        })
    }

    /// Date-page links on one year page, sorted and unique.
    fn date_pages(&self, year_url: &str, body: &str) -> Result<BTreeSet<String>> {
        let base = Url::parse(year_url)?;
        let document = Html::parse_document(body);
        Ok(document
            .select(&self.anchor_selector)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| DATE_PAGE.is_match(href))
            .map(|href| resolve_url(&base, href))
            .collect())
    }
}

#[async_trait]
impl SourceAdapter for GazetteIndexAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn page_urls(&self, fetcher: &Fetcher) -> Result<Vec<String>> {
        let mut pages = Vec::new();
        for (i, year_url) in self.year_urls.iter().enumerate() {
            if i > 0 {
                fetcher.pause().await;
            }
            let body = match fetcher.fetch_text(year_url).await {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("[{}] Skipping year page {}: {}", self.name, year_url, e);
                    continue;
                }
            };
            let found = self.date_pages(year_url, &body)?;
            log::debug!("[{}] {} date pages on {}", self.name, found.len(), year_url);
            pages.extend(found);
        }
        Ok(pages)
    }

    fn discovers_pages(&self) -> bool {
        true
    }

    fn extract_records(&self, page_url: &str, body: &str) -> Result<Vec<ProvisionalRecord>> {
        let base = Url::parse(page_url)?;
        let date = DATE_PAGE
            .captures(base.path())
            .map(|caps| caps[1].to_string());

        Ok(pdf_links(&Html::parse_document(body), &self.link_selector, &base)
            .into_iter()
            .map(|(url, title)| {
                let language = language_from_filename(&url).unwrap_or("en");
                let mut record = ProvisionalRecord::new()
                    .with("url", url)
                    .with("title", title)
                    .with("languages", vec![language])
                    .with("page_url", page_url);
                if let Some(date) = &date {
                    record.insert("date", date.as_str());
                }
                record
            })
            .collect())
    }
}
