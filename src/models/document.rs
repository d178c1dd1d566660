//! Canonical document structure.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Date used when a source gives no usable date.
pub const UNKNOWN_DATE: &str = "1970-01-01";

/// Document category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DocumentType {
    #[default]
    Gazette,
    #[serde(rename = "Extraordinary Gazette")]
    ExtraordinaryGazette,
    Act,
    Bill,
    Form,
    Notice,
}

impl DocumentType {
    pub const ALL: [DocumentType; 6] = [
        DocumentType::Gazette,
        DocumentType::ExtraordinaryGazette,
        DocumentType::Act,
        DocumentType::Bill,
        DocumentType::Form,
        DocumentType::Notice,
    ];

    /// Display label, identical to the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Gazette => "Gazette",
            DocumentType::ExtraordinaryGazette => "Extraordinary Gazette",
            DocumentType::Act => "Act",
            DocumentType::Bill => "Bill",
            DocumentType::Form => "Form",
            DocumentType::Notice => "Notice",
        }
    }

    /// Map a source category label to the closest variant.
    ///
    /// Handles exact labels, plurals, slugs (`extra-gazettes`,
    /// `data_lk_acts`) and free text containing a category keyword.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
            .collect();

        // `egz` is the portal's own abbreviation for extraordinary gazettes
        if normalized
            .split_whitespace()
            .any(|w| w == "egz" || w == "extra")
        {
            return Some(DocumentType::ExtraordinaryGazette);
        }
        Self::classify(&normalized)
    }

    /// Keyword classification of free text (titles, ids).
    pub fn classify(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let has = |keys: &[&str]| words.iter().any(|w| keys.contains(w));

        if has(&["extraordinary"]) {
            Some(DocumentType::ExtraordinaryGazette)
        } else if has(&["gazette", "gazettes"]) {
            Some(DocumentType::Gazette)
        } else if has(&["bill", "bills"]) {
            Some(DocumentType::Bill)
        } else if has(&["act", "acts"]) {
            Some(DocumentType::Act)
        } else if has(&["form", "forms"]) {
            Some(DocumentType::Form)
        } else if has(&["notice", "notices"]) {
            Some(DocumentType::Notice)
        } else {
            None
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A normalized document entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Stable identifier
    pub id: String,

    /// Document category
    #[serde(rename = "type")]
    pub doc_type: DocumentType,

    /// Display title
    pub title: String,

    /// `YYYY-MM-DD`, or [`UNKNOWN_DATE`]
    pub date: String,

    /// Language codes available for this document
    #[serde(default)]
    pub languages: BTreeSet<String>,

    /// Canonical resource locator, the deduplication key
    #[serde(rename = "pdf_url")]
    pub primary_url: String,

    /// Optional landing page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,

    /// Free text summary
    #[serde(default)]
    pub summary: String,

    /// Origin label
    #[serde(default)]
    pub source: String,

    /// The source's own category label
    #[serde(rename = "rawTypeName", default)]
    pub raw_type_name: String,
}

impl Document {
    /// Whether the date is the unknown sentinel.
    pub fn has_known_date(&self) -> bool {
        self.date != UNKNOWN_DATE
    }

    /// Compare by date where any known date ranks above the sentinel.
    pub fn cmp_date(&self, other: &Self) -> Ordering {
        (self.has_known_date(), self.date.as_str())
            .cmp(&(other.has_known_date(), other.date.as_str()))
    }
}

/// Stable sort, newest first. The sentinel date sorts last.
pub fn sort_newest_first(documents: &mut [Document]) {
    documents.sort_by(|a, b| b.cmp_date(a));
}
