// src/lib.rs

//! Legal document catalog synchronizer.
//!
//! Collects document listings from heterogeneous sources, normalizes them
//! into one [`models::Document`] shape, and writes deduplicated, date-sorted
//! JSON catalogs plus a merged view across sources.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
