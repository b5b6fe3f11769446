//! geosearch-index
//!
//! Tantivy-backed document index with text and geo-distance search. See
//! `index` for the lifecycle and write path, `search` for query execution.

pub mod index;
pub mod search;
pub mod tantivy_utils;

pub use geosearch_core::traits::DocumentIndex;
pub use index::GeoIndex;
