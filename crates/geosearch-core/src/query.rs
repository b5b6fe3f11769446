//! Backend-neutral query model.
//!
//! Queries are plain values; an index implementation compiles them into
//! whatever its engine understands.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geo::{parse_distance, Distance, GeoPoint};

/// Requesting this field name returns every stored field.
pub const ALL_FIELDS: &str = "*";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SearchQuery {
    /// Every document.
    MatchAll,
    /// Query-parser syntax over every indexed text field.
    QueryString(String),
    /// Analyzed text where any resulting term may match. Without a field,
    /// every indexed text field is searched.
    Match { text: String, field: Option<String> },
    /// Documents whose geo point lies within `distance` of `center`.
    GeoDistance { center: GeoPoint, distance: Distance, field: Option<String> },
    /// Documents matching all sub-queries.
    Conjunction(Vec<SearchQuery>),
}

impl SearchQuery {
    pub fn query_string(text: impl Into<String>) -> Self {
        Self::QueryString(text.into())
    }

    pub fn matching(text: impl Into<String>) -> Self {
        Self::Match { text: text.into(), field: None }
    }

    /// `distance` uses the syntax of [`parse_distance`], e.g. `"1km"`.
    pub fn geo_distance(lon: f64, lat: f64, distance: &str) -> Result<Self> {
        Ok(Self::GeoDistance {
            center: GeoPoint::new(lon, lat)?,
            distance: parse_distance(distance)?,
            field: None,
        })
    }

    /// Restricts a match or geo-distance query to one field. Other queries
    /// are returned unchanged.
    pub fn with_field(self, name: impl Into<String>) -> Self {
        match self {
            Self::Match { text, .. } => Self::Match { text, field: Some(name.into()) },
            Self::GeoDistance { center, distance, .. } => {
                Self::GeoDistance { center, distance, field: Some(name.into()) }
            }
            other => other,
        }
    }

    pub fn and(queries: impl IntoIterator<Item = SearchQuery>) -> Self {
        Self::Conjunction(queries.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: SearchQuery,
    /// Stored fields to return with each hit; `["*"]` means all of them.
    pub fields: Vec<String>,
    pub size: usize,
    pub from: usize,
}

impl SearchRequest {
    pub const DEFAULT_SIZE: usize = 10;

    pub fn new(query: SearchQuery) -> Self {
        Self { query, fields: Vec::new(), size: Self::DEFAULT_SIZE, from: 0 }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn all_fields(self) -> Self {
        self.with_fields([ALL_FIELDS])
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_from(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    pub fn wants_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == ALL_FIELDS || f == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_field_targets_match_and_geo_only() {
        let q = SearchQuery::matching("school").with_field("name");
        assert_eq!(q, SearchQuery::Match { text: "school".into(), field: Some("name".into()) });

        let geo = SearchQuery::geo_distance(-71.26, 46.79, "1km").unwrap().with_field("location");
        match geo {
            SearchQuery::GeoDistance { distance, field, .. } => {
                assert_eq!(distance.meters(), 1000.0);
                assert_eq!(field.as_deref(), Some("location"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let qs = SearchQuery::query_string("school").with_field("name");
        assert_eq!(qs, SearchQuery::QueryString("school".into()));
    }

    #[test]
    fn geo_distance_rejects_bad_input() {
        assert!(SearchQuery::geo_distance(-200.0, 0.0, "1km").is_err());
        assert!(SearchQuery::geo_distance(0.0, 0.0, "far").is_err());
    }

    #[test]
    fn field_selection() {
        let req = SearchRequest::new(SearchQuery::MatchAll);
        assert!(!req.wants_field("name"));
        assert_eq!(req.size, SearchRequest::DEFAULT_SIZE);

        let req = req.with_fields(["name"]);
        assert!(req.wants_field("name"));
        assert!(!req.wants_field("location"));

        let req = req.all_fields();
        assert!(req.wants_field("location"));
    }
}
