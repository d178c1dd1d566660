// src/services/sources/html_links.rs

//! Listing pages where every PDF anchor is a document.

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use super::{SourceAdapter, element_text, is_pdf_link, parse_selector};
use crate::error::Result;
use crate::models::{ProvisionalRecord, SourceConfig};
use crate::utils::http::Fetcher;
use crate::utils::resolve_url;
use crate::utils::url::file_name;

pub struct HtmlLinksAdapter {
    name: String,
    listing_urls: Vec<String>,
    link_selector: Selector,
}

impl HtmlLinksAdapter {
    pub fn new(source: &SourceConfig, link_selector: &str) -> Result<Self> {
        Ok(Self {
            name: source.name.clone(),
            listing_urls: source.listing_urls(),
            link_selector: parse_selector(link_selector)?,
        })
    }
}

#[async_trait]
impl SourceAdapter for HtmlLinksAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn page_urls(&self, _fetcher: &Fetcher) -> Result<Vec<String>> {
        Ok(self.listing_urls.clone())
    }

    fn extract_records(&self, page_url: &str, body: &str) -> Result<Vec<ProvisionalRecord>> {
        let base = Url::parse(page_url)?;
        Ok(pdf_links(&Html::parse_document(body), &self.link_selector, &base)
            .into_iter()
            .map(|(url, title)| {
                ProvisionalRecord::new()
                    .with("url", url)
                    .with("title", title)
            })
            .collect())
    }
}

/// `(resolved url, title)` of every PDF anchor matched by `selector`.
///
/// The title is the anchor text, or the filename when the anchor is empty.
pub(super) fn pdf_links(document: &Html, selector: &Selector, base: &Url) -> Vec<(String, String)> {
    document
        .select(selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            if !is_pdf_link(href) {
                return None;
            }
            let url = resolve_url(base, href);
            let text = element_text(&anchor);
            let title = if text.is_empty() {
                file_name(&url).unwrap_or_else(|| url.clone())
            } else {
                text
            };
            Some((url, title))
        })
        .collect()
}
