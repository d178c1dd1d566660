//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::DocumentType;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP fetch behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Output layout and view sizes
    #[serde(default)]
    pub output: OutputConfig,

    /// Source definitions
    #[serde(default = "defaults::default_sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Find a source by name.
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Sources that take part in a default sync.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_retries == 0 {
            return Err(AppError::validation("fetch.max_retries must be > 0"));
        }
        if self.fetch.backoff_base.is_nan() || self.fetch.backoff_base < 0.0 {
            return Err(AppError::validation("fetch.backoff_base must be >= 0"));
        }
        if self.output.latest_n == 0 {
            return Err(AppError::validation("output.latest_n must be > 0"));
        }
        if self.output.merged_latest_n == 0 {
            return Err(AppError::validation("output.merged_latest_n must be > 0"));
        }
        if !is_safe_dir_name(&self.output.merged_dir) {
            return Err(AppError::validation(format!(
                "output.merged_dir '{}' is not a plain directory name",
                self.output.merged_dir
            )));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if !is_safe_dir_name(&source.name) {
                return Err(AppError::validation(format!(
                    "source name '{}' is not a plain directory name",
                    source.name
                )));
            }
            if source.name == self.output.merged_dir {
                return Err(AppError::validation(format!(
                    "source name '{}' collides with output.merged_dir",
                    source.name
                )));
            }
            if !names.insert(source.name.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
            source.validate()?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            output: OutputConfig::default(),
            sources: defaults::default_sources(),
        }
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Total attempts per request
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Backoff after failed attempt `n` is `backoff_base^n` seconds
    #[serde(default = "defaults::backoff_base")]
    pub backoff_base: f64,

    /// Delay between successive page requests of one source, in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_retries: defaults::max_retries(),
            backoff_base: defaults::backoff_base(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Output layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory holding one subdirectory per source
    #[serde(default = "defaults::root_dir")]
    pub root_dir: PathBuf,

    /// Size of each per-source latest view
    #[serde(default = "defaults::latest_n")]
    pub latest_n: usize,

    /// Size of the merged cross-source view
    #[serde(default = "defaults::merged_latest_n")]
    pub merged_latest_n: usize,

    /// Subdirectory for the merged view
    #[serde(default = "defaults::merged_dir")]
    pub merged_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: defaults::root_dir(),
            latest_n: defaults::latest_n(),
            merged_latest_n: defaults::merged_latest_n(),
            merged_dir: defaults::merged_dir(),
        }
    }
}

/// A single document source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique name, also the output subdirectory
    pub name: String,

    /// Whether a plain `sync` includes this source
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Category assigned to records that carry no type of their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,

    /// Category label recorded as `rawTypeName` (defaults to `name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_type_name: Option<String>,

    /// Provenance label (defaults to the host of `base_url`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Base for resolving relative links
    pub base_url: String,

    /// Overrides `output.latest_n` for this source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_n: Option<usize>,

    /// Fixed listing URLs
    #[serde(default)]
    pub seed_urls: Vec<String>,

    /// Listing URL with a `{year}` placeholder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_year: Option<i32>,

    /// Defaults to the current year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_year: Option<i32>,

    /// Extraction rules
    #[serde(flatten)]
    pub adapter: AdapterConfig,
}

impl SourceConfig {
    /// Listing URLs: seeds first, then the template for each year.
    pub fn listing_urls(&self) -> Vec<String> {
        let mut urls = self.seed_urls.clone();
        if let Some(template) = &self.url_template {
            for year in self.years() {
                urls.push(template.replace("{year}", &year.to_string()));
            }
        }
        urls
    }

    /// Inclusive year range for templated listings.
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        let to = self.to_year.unwrap_or_else(|| Utc::now().year());
        let from = self.from_year.unwrap_or(to);
        from..=to
    }

    /// Provenance label written to each document.
    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            crate::utils::get_domain(&self.base_url).unwrap_or_else(|| self.name.clone())
        })
    }

    pub fn raw_type_name(&self) -> String {
        self.raw_type_name
            .clone()
            .unwrap_or_else(|| self.name.clone())
    }

    pub fn latest_n(&self, output: &OutputConfig) -> usize {
        self.latest_n.unwrap_or(output.latest_n)
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url).map_err(|e| {
            AppError::validation(format!("source '{}': bad base_url: {e}", self.name))
        })?;
        if let (Some(from), Some(to)) = (self.from_year, self.to_year) {
            if from > to {
                return Err(AppError::validation(format!(
                    "source '{}': from_year {from} > to_year {to}",
                    self.name
                )));
            }
        }
        if self.latest_n == Some(0) {
            return Err(AppError::validation(format!(
                "source '{}': latest_n must be > 0",
                self.name
            )));
        }
        if self.seed_urls.is_empty() && self.url_template.is_none() {
            return Err(AppError::validation(format!(
                "source '{}': needs seed_urls or url_template",
                self.name
            )));
        }
        if let Some(template) = &self.url_template {
            if !template.contains("{year}") {
                return Err(AppError::validation(format!(
                    "source '{}': url_template lacks a {{year}} placeholder",
                    self.name
                )));
            }
        }
        for selector in self.adapter.selectors() {
            scraper::Selector::parse(selector)
                .map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        Ok(())
    }
}

/// Extraction rules, selected by the `kind` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterConfig {
    /// Every matching PDF anchor on a listing page is a document.
    HtmlLinks {
        #[serde(default = "defaults::pdf_link_selector")]
        link_selector: String,
    },

    /// One document per table row with per-language download links.
    HtmlTable {
        #[serde(default = "defaults::table_row_selector")]
        row_selector: String,
        #[serde(default)]
        columns: TableColumns,
    },

    /// Year pages linking to one page per publication date.
    GazetteIndex {
        #[serde(default = "defaults::pdf_link_selector")]
        link_selector: String,
    },

    /// JSON documents holding metadata objects.
    JsonFeed,
}

impl AdapterConfig {
    /// CSS selectors used by this adapter.
    pub fn selectors(&self) -> Vec<&str> {
        match self {
            AdapterConfig::HtmlLinks { link_selector }
            | AdapterConfig::GazetteIndex { link_selector } => vec![link_selector.as_str()],
            AdapterConfig::HtmlTable { row_selector, .. } => vec![row_selector.as_str(), "td"],
            AdapterConfig::JsonFeed => Vec::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AdapterConfig::HtmlLinks { .. } => "html_links",
            AdapterConfig::HtmlTable { .. } => "html_table",
            AdapterConfig::GazetteIndex { .. } => "gazette_index",
            AdapterConfig::JsonFeed => "json_feed",
        }
    }
}

/// Zero-based cell positions for table sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumns {
    #[serde(default)]
    pub number: Option<usize>,
    #[serde(default = "defaults::date_column")]
    pub date: usize,
    #[serde(default = "defaults::description_column")]
    pub description: usize,
    #[serde(default = "defaults::downloads_column")]
    pub downloads: usize,
}

impl Default for TableColumns {
    fn default() -> Self {
        Self {
            number: Some(0),
            date: defaults::date_column(),
            description: defaults::description_column(),
            downloads: defaults::downloads_column(),
        }
    }
}

fn is_safe_dir_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

mod defaults {
    use std::path::PathBuf;

    use super::{AdapterConfig, SourceConfig};
    use crate::models::DocumentType;

    const PORTAL: &str = "https://documents.gov.lk";

    // Fetch defaults
    pub fn user_agent() -> String {
        "LegalHubLK/1.0 (+https://legalhub.example)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_retries() -> u32 {
        4
    }
    pub fn backoff_base() -> f64 {
        1.5
    }
    pub fn request_delay() -> u64 {
        1000
    }

    // Output defaults
    pub fn root_dir() -> PathBuf {
        PathBuf::from("public/data")
    }
    pub fn latest_n() -> usize {
        100
    }
    pub fn merged_latest_n() -> usize {
        300
    }
    pub fn merged_dir() -> String {
        "all".into()
    }

    // Source defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn pdf_link_selector() -> String {
        "a[href$='.pdf']".into()
    }
    pub fn table_row_selector() -> String {
        "table tr".into()
    }
    pub fn date_column() -> usize {
        1
    }
    pub fn description_column() -> usize {
        2
    }
    pub fn downloads_column() -> usize {
        3
    }

    fn listing(name: &str, document_type: DocumentType, page: &str) -> SourceConfig {
        SourceConfig {
            name: name.to_string(),
            enabled: true,
            document_type: Some(document_type),
            raw_type_name: None,
            label: None,
            base_url: PORTAL.to_string(),
            latest_n: None,
            seed_urls: vec![format!("{PORTAL}{page}")],
            url_template: None,
            from_year: None,
            to_year: None,
            adapter: AdapterConfig::HtmlLinks {
                link_selector: pdf_link_selector(),
            },
        }
    }

    pub fn default_sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig {
                seed_urls: Vec::new(),
                url_template: Some(format!("{PORTAL}/view/gazettes/{{year}}.html")),
                from_year: Some(2024),
                adapter: AdapterConfig::GazetteIndex {
                    link_selector: pdf_link_selector(),
                },
                ..listing("gazettes", DocumentType::Gazette, "")
            },
            SourceConfig {
                seed_urls: Vec::new(),
                url_template: Some(format!("{PORTAL}/view/extra-gazettes/egz_{{year}}.html")),
                from_year: Some(2024),
                ..listing("extra-gazettes", DocumentType::ExtraordinaryGazette, "")
            },
            listing("acts", DocumentType::Act, "/view/acts/acts.html"),
            listing("bills", DocumentType::Bill, "/view/bills/bl.html"),
            listing("forms", DocumentType::Form, "/view/general-forms/forms.html"),
            listing("notices", DocumentType::Notice, "/view/notices/notices.html"),
        ]
    }
}
