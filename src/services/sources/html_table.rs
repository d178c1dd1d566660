// src/services/sources/html_table.rs

//! Tabular listings: one row per document, one download link per language.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use url::Url;

use super::{SourceAdapter, element_text, parse_selector};
use crate::error::Result;
use crate::models::{ProvisionalRecord, SourceConfig, TableColumns};
use crate::utils::http::Fetcher;
use crate::utils::resolve_url;
use crate::utils::url::{language_code, language_from_filename};

pub struct HtmlTableAdapter {
    name: String,
    listing_urls: Vec<String>,
    row_selector: Selector,
    cell_selector: Selector,
    anchor_selector: Selector,
    columns: TableColumns,
}

impl HtmlTableAdapter {
    pub fn new(source: &SourceConfig, row_selector: &str, columns: TableColumns) -> Result<Self> {
        Ok(Self {
            name: source.name.clone(),
            listing_urls: source.listing_urls(),
            row_selector: parse_selector(row_selector)?,
            cell_selector: parse_selector("td")?,
            anchor_selector: parse_selector("a[href]")?,
            columns,
        })
    }

    /// Highest cell index a row must have.
    fn last_column(&self) -> usize {
        [
            self.columns.number.unwrap_or(0),
            self.columns.date,
            self.columns.description,
            self.columns.downloads,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    fn parse_row(&self, row: &ElementRef, base: &Url) -> Option<ProvisionalRecord> {
        let cells: Vec<ElementRef> = row.select(&self.cell_selector).collect();
        if cells.len() <= self.last_column() {
            return None;
        }

        let mut record = ProvisionalRecord::new();
        if let Some(index) = self.columns.number {
            let number = element_text(&cells[index]);
            if !number.is_empty() {
                record.insert("number", number);
            }
        }
        record.insert("date", element_text(&cells[self.columns.date]));
        record.insert("text", element_text(&cells[self.columns.description]));

        let (downloads, unlabelled) = self.download_links(&cells[self.columns.downloads], base);
        if !downloads.is_empty() {
            record.insert("language_urls", Value::Object(downloads));
        } else if let Some(url) = unlabelled {
            record.insert("url", url);
        }
        Some(record)
    }

    /// Language → URL for each anchor in the downloads cell, plus the first
    /// link whose language cannot be told.
    fn download_links(&self, cell: &ElementRef, base: &Url) -> (Map<String, Value>, Option<String>) {
        let mut links = Map::new();
        let mut unlabelled = None;
        for anchor in cell.select(&self.anchor_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let url = resolve_url(base, href);
            let lang = language_code(&element_text(&anchor))
                .or_else(|| language_from_filename(&url).map(str::to_string));
            match lang {
                Some(lang) if !links.contains_key(&lang) => {
                    links.insert(lang, Value::String(url));
                }
                Some(_) => {}
                None if unlabelled.is_none() => unlabelled = Some(url),
                None => {}
            }
        }
        (links, unlabelled)
    }
}

#[async_trait]
impl SourceAdapter for HtmlTableAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn page_urls(&self, _fetcher: &Fetcher) -> Result<Vec<String>> {
        Ok(self.listing_urls.clone())
    }

    fn extract_records(&self, page_url: &str, body: &str) -> Result<Vec<ProvisionalRecord>> {
        let base = Url::parse(page_url)?;
        let document = Html::parse_document(body);
        Ok(document
            .select(&self.row_selector)
            .filter_map(|row| self.parse_row(&row, &base))
            .collect())
    }
}
