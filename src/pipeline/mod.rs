//! Pipeline entry points.
//!
//! - `write_catalog_and_latest`: hash-gated per-directory writer
//! - `merge_latest`: merged view across sources
//! - `run_sync` / `run_source` / `run_merge`: end-to-end runs

pub mod catalog;
pub mod diff;
pub mod merge;
pub mod sync;

pub use catalog::{WriteOutcome, write_catalog_and_latest};
pub use diff::{CatalogDiff, diff_catalogs};
pub use merge::merge_latest;
pub use sync::{SourceReport, SyncOptions, SyncReport, run_merge, run_source, run_sync};
