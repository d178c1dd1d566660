// src/models/mod.rs

//! Domain models for the catalog synchronizer.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod catalog;
mod config;
pub(crate) mod document;
mod record;

// Re-export all public types
pub use catalog::Catalog;
pub use config::{AdapterConfig, Config, FetchConfig, OutputConfig, SourceConfig, TableColumns};
pub use document::{Document, DocumentType, UNKNOWN_DATE, sort_newest_first};
pub use record::ProvisionalRecord;
