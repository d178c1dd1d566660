// src/services/normalizer.rs

//! Provisional record normalization.
//!
//! Maps adapter output, whatever its key names, onto [`Document`]. Each
//! concept is looked up through a fixed list of aliases (first non-empty
//! wins), then falls back to what can be inferred from the URL or title.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::Result;
use crate::models::{Document, DocumentType, ProvisionalRecord, SourceConfig, UNKNOWN_DATE};
use crate::utils::resolve_url;
use crate::utils::url::{file_name, find_date, language_code, language_from_filename};

const ID_KEYS: &[&str] = &["id", "doc_id"];
const TYPE_KEYS: &[&str] = &["type", "doc_type"];
const TITLE_KEYS: &[&str] = &["title", "description", "name"];
const NUMBER_KEYS: &[&str] = &["doc_num", "act_number", "number"];
const TEXT_KEYS: &[&str] = &["text", "description"];
const SUMMARY_KEYS: &[&str] = &["summary"];
const DATE_KEYS: &[&str] = &["date", "published", "gazette_date", "date_text"];
const LANGUAGE_KEYS: &[&str] = &["languages", "language"];
const LANGUAGE_MAP_KEYS: &[&str] = &["lang_to_source_url", "language_urls"];
const PRIMARY_URL_KEYS: &[&str] = &["primaryUrl", "pdf_url", "url", "pdf", "href"];
const DETAIL_URL_KEYS: &[&str] = &["detailUrl", "detail_url", "page_url"];
const RAW_TYPE_KEYS: &[&str] = &["rawTypeName", "raw_type", "doc_type_name"];
const SOURCE_KEYS: &[&str] = &["source"];

/// Four-digit year, then month and day, at the start of a date field.
static LEADING_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})[-./](\d{1,2})[-./](\d{1,2})(?:[^0-9]|$)").expect("valid regex")
});

/// Per-source defaults applied during normalization.
#[derive(Debug, Clone)]
pub struct SourceHint {
    /// Base for relative links and id-only records
    pub base_url: Url,
    /// Category configured for the adapter
    pub document_type: Option<DocumentType>,
    pub raw_type_name: String,
    pub label: String,
}

impl SourceHint {
    pub fn from_config(source: &SourceConfig) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(&source.base_url)?,
            document_type: source.document_type,
            raw_type_name: source.raw_type_name(),
            label: source.label(),
        })
    }
}

/// Converts provisional records of one source into documents.
#[derive(Debug, Clone)]
pub struct Normalizer {
    hint: SourceHint,
}

impl Normalizer {
    pub fn new(hint: SourceHint) -> Self {
        Self { hint }
    }

    /// Normalize one record.
    ///
    /// Returns `None` only when the record yields neither a locator nor a
    /// title. A titled record without any locator gets a synthetic one: the
    /// source base URL with a fragment derived from the title.
    pub fn normalize(&self, record: &ProvisionalRecord) -> Option<Document> {
        let native_id = record.first_str(ID_KEYS);
        let language_urls = self.language_urls(record);
        let detail_url = record
            .first_str(DETAIL_URL_KEYS)
            .map(|href| resolve_url(&self.hint.base_url, &href));

        let explicit_title = record.first_str(TITLE_KEYS);
        let doc_type = self.classify(record, explicit_title.as_deref(), native_id.as_deref());
        let named_title = explicit_title.or_else(|| synthesize_title(record, doc_type));

        let primary_url = record
            .first_str(PRIMARY_URL_KEYS)
            .map(|href| resolve_url(&self.hint.base_url, &href))
            .or_else(|| preferred_language_url(&language_urls))
            .or_else(|| detail_url.clone())
            .or_else(|| {
                native_id
                    .as_deref()
                    .and_then(|id| self.hint.base_url.join(id).ok())
                    .map(|u| u.to_string())
            })
            .or_else(|| {
                named_title
                    .as_deref()
                    .map(|title| title_locator(&self.hint.base_url, title))
            });

        let Some(primary_url) = primary_url else {
            log::debug!("Dropping record with neither locator nor title");
            return None;
        };

        let title = named_title
            .or_else(|| file_name(&primary_url))
            .unwrap_or_else(|| primary_url.clone());

        let date = record
            .first_str(DATE_KEYS)
            .and_then(|raw| parse_date(&raw))
            .or_else(|| date_in(&primary_url))
            .or_else(|| detail_url.as_deref().and_then(date_in))
            .or_else(|| date_in(&title))
            .unwrap_or_else(|| UNKNOWN_DATE.to_string());

        let languages = languages(record, &language_urls, &primary_url);

        let text = record.first_str(TEXT_KEYS);
        let summary = record
            .first_str(SUMMARY_KEYS)
            .or_else(|| text.filter(|t| *t != title))
            .unwrap_or_else(|| title.clone());

        let id = native_id.unwrap_or_else(|| derive_id(&date, &primary_url));

        Some(Document {
            id,
            doc_type,
            title,
            date,
            languages,
            primary_url,
            detail_url,
            summary,
            source: record
                .first_str(SOURCE_KEYS)
                .unwrap_or_else(|| self.hint.label.clone()),
            raw_type_name: record
                .first_str(RAW_TYPE_KEYS)
                .unwrap_or_else(|| self.hint.raw_type_name.clone()),
        })
    }

    /// Explicit record type > adapter type > keyword match > Gazette.
    fn classify(
        &self,
        record: &ProvisionalRecord,
        title: Option<&str>,
        native_id: Option<&str>,
    ) -> DocumentType {
        record
            .first_str(TYPE_KEYS)
            .and_then(|label| DocumentType::from_label(&label))
            .or(self.hint.document_type)
            .or_else(|| title.and_then(DocumentType::classify))
            .or_else(|| {
                record
                    .first_str(TEXT_KEYS)
                    .and_then(|text| DocumentType::classify(&text))
            })
            .or_else(|| native_id.and_then(DocumentType::classify))
            .unwrap_or_default()
    }

    /// Language → URL pairs in the record's order, links resolved.
    fn language_urls(&self, record: &ProvisionalRecord) -> Vec<(String, String)> {
        record
            .first_object(LANGUAGE_MAP_KEYS)
            .map(|map| language_pairs(map, &self.hint.base_url))
            .unwrap_or_default()
    }
}

fn language_pairs(map: &Map<String, Value>, base: &Url) -> Vec<(String, String)> {
    map.iter()
        .filter_map(|(lang, value)| {
            let href = value.as_str()?.trim();
            if href.is_empty() {
                return None;
            }
            let url = resolve_url(base, href);
            let code = language_code(lang)
                .or_else(|| language_from_filename(&url).map(str::to_string))?;
            Some((code, url))
        })
        .collect()
}

/// English if present, otherwise the first entry.
fn preferred_language_url(pairs: &[(String, String)]) -> Option<String> {
    pairs
        .iter()
        .find(|(lang, _)| lang == "en")
        .or_else(|| pairs.first())
        .map(|(_, url)| url.clone())
}

/// Explicit list > language map keys > filename suffix > `en`.
fn languages(
    record: &ProvisionalRecord,
    language_urls: &[(String, String)],
    primary_url: &str,
) -> BTreeSet<String> {
    if let Some(explicit) = record.first_list(LANGUAGE_KEYS) {
        let codes: BTreeSet<String> = explicit.iter().filter_map(|l| language_code(l)).collect();
        if !codes.is_empty() {
            return codes;
        }
    }
    if !language_urls.is_empty() {
        return language_urls.iter().map(|(lang, _)| lang.clone()).collect();
    }
    let inferred = language_from_filename(primary_url).unwrap_or("en");
    BTreeSet::from([inferred.to_string()])
}

/// `{Type} {number}: {text}` when a number exists, else the bare text.
fn synthesize_title(record: &ProvisionalRecord, doc_type: DocumentType) -> Option<String> {
    let text = record.first_str(TEXT_KEYS);
    match (record.first_str(NUMBER_KEYS), text) {
        (Some(number), Some(text)) => Some(format!("{} {}: {}", doc_type.label(), number, text)),
        (Some(number), None) => Some(format!("{} {}", doc_type.label(), number)),
        (None, text) => text,
    }
}

/// Normalize a date field to `YYYY-MM-DD`.
///
/// Accepts `YYYY-MM-DD`, `YYYY.MM.DD`, `YYYY/MM/DD` and ISO timestamps.
/// The year must have four digits. Returns `None` for anything that is
/// not a real calendar date.
pub fn parse_date(raw: &str) -> Option<String> {
    leading_date(raw.trim()).or_else(|| date_in(raw))
}

fn leading_date(raw: &str) -> Option<String> {
    let caps = LEADING_DATE.captures(raw)?;
    NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
    .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Like [`parse_date`], but never fails.
pub fn normalize_date(raw: &str) -> String {
    parse_date(raw).unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

fn date_in(text: &str) -> Option<String> {
    find_date(text).and_then(|d| valid_date(&d))
}

fn valid_date(candidate: &str) -> Option<String> {
    NaiveDate::parse_from_str(candidate, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Locator for a record that only has a title.
fn title_locator(base: &Url, title: &str) -> String {
    let digest = hex::encode(Sha256::digest(title.as_bytes()));
    let mut url = base.clone();
    url.set_fragment(Some(&format!("title-{}", &digest[..8])));
    url.to_string()
}

/// Stable id from the date and the identity key.
pub fn derive_id(date: &str, primary_url: &str) -> String {
    let digest = hex::encode(Sha256::digest(primary_url.as_bytes()));
    format!("{}-{}", date, &digest[..8])
}
