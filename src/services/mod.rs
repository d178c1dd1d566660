//! Service layer for catalog synchronization.
//!
//! - Page collection (`SourceCollector`) over pluggable adapters (`sources`)
//! - Record normalization (`Normalizer`)
//! - Deduplication by primary URL (`dedupe`)

mod collector;
mod dedupe;
mod normalizer;
pub mod sources;

pub use collector::{CollectOutcome, SourceCollector};
pub use dedupe::dedupe;
pub use normalizer::{Normalizer, SourceHint, derive_id, normalize_date, parse_date};
pub use sources::{SourceAdapter, build_adapter};
