//! Source adapters.
//!
//! An adapter knows where a source's listing pages are and how to turn one
//! page body into provisional records. It does not normalize anything.

mod gazette_index;
mod html_links;
mod html_table;
mod json_feed;

use async_trait::async_trait;
use scraper::{ElementRef, Selector};

use crate::error::{AppError, Result};
use crate::models::{AdapterConfig, ProvisionalRecord, SourceConfig};
use crate::utils::http::Fetcher;

pub use gazette_index::GazetteIndexAdapter;
pub use html_links::HtmlLinksAdapter;
pub use html_table::HtmlTableAdapter;
pub use json_feed::JsonFeedAdapter;

/// A configured document source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Source name, used for logging and the output directory.
    fn name(&self) -> &str;

    /// Pages to fetch, in order. May fetch index pages to discover them.
    async fn page_urls(&self, fetcher: &Fetcher) -> Result<Vec<String>>;

    /// Whether [`page_urls`](Self::page_urls) makes requests of its own.
    fn discovers_pages(&self) -> bool {
        false
    }

    /// Fetch one page body.
    async fn fetch_page(&self, fetcher: &Fetcher, url: &str) -> Result<String> {
        fetcher.fetch_text(url).await
    }

    /// Extract provisional records from a fetched page.
    fn extract_records(&self, page_url: &str, body: &str) -> Result<Vec<ProvisionalRecord>>;
}

/// Build the adapter selected by the source's `kind`.
pub fn build_adapter(source: &SourceConfig) -> Result<Box<dyn SourceAdapter>> {
    let adapter: Box<dyn SourceAdapter> = match &source.adapter {
        AdapterConfig::HtmlLinks { link_selector } => {
            Box::new(HtmlLinksAdapter::new(source, link_selector)?)
        }
        AdapterConfig::HtmlTable {
            row_selector,
            columns,
        } => Box::new(HtmlTableAdapter::new(source, row_selector, columns.clone())?),
        AdapterConfig::GazetteIndex { link_selector } => {
            Box::new(GazetteIndexAdapter::new(source, link_selector)?)
        }
        AdapterConfig::JsonFeed => Box::new(JsonFeedAdapter::new(source)),
    };
    Ok(adapter)
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Whitespace-collapsed text content of an element.
pub(crate) fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_pdf_link(href: &str) -> bool {
    href.split(['?', '#'])
        .next()
        .is_some_and(|path| path.to_ascii_lowercase().ends_with(".pdf"))
}
