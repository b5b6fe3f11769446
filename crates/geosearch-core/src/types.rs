//! Domain types shared by the index and the demo driver.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type DocId = String;

/// A named point of interest.
///
/// - `id`: document key, unique within an index
/// - `name`: free-text label, analyzed and stored
/// - `amenity`/`city`: carried in the stored source, not mapped
/// - `location`: `[longitude, latitude]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: DocId,
    pub name: String,
    pub amenity: String,
    pub city: String,
    pub location: [f64; 2],
}

/// One search result.
///
/// `score` is engine-specific but higher is always better. `fields` holds
/// the stored values of the fields the request asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: DocId,
    pub score: f32,
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Number of matching documents before `from`/`size` are applied.
    pub total_hits: usize,
    pub hits: Vec<SearchHit>,
}

impl SearchResult {
    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
