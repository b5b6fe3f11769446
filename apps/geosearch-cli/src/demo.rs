//! The demo driver: write two places, close, reopen, search twice.
//!
//! Failing to build the mapping, open the index or write a place aborts the
//! run. A failing search is logged and the run carries on.

use anyhow::Context;

use geosearch_core::geo::extract_geo_point;
use geosearch_core::mapping::{DocumentMapping, FieldMapping, IndexMapping};
use geosearch_core::query::{SearchQuery, SearchRequest};
use geosearch_core::types::{Place, SearchResult};
use geosearch_index::{DocumentIndex, GeoIndex};

use crate::cli::DemoConfig;

/// `place` documents: analyzed, stored `name` and a stored `location` geo
/// point. Also the default for untyped documents.
pub fn place_mapping() -> IndexMapping {
    let place = DocumentMapping::new()
        .with_field("name", FieldMapping::text().stored())
        .with_field("location", FieldMapping::geo_point().stored());
    let mut mapping = IndexMapping::new();
    mapping.add_document_mapping("place", place.clone());
    mapping.set_default_mapping(place);
    mapping
}

pub fn sample_places() -> Vec<Place> {
    vec![
        Place {
            id: "1".to_string(),
            name: "School Secondary Les Etchemins".to_string(),
            amenity: "school".to_string(),
            city: "levis".to_string(),
            location: [-71.26917, 46.72009],
        },
        Place {
            id: "2".to_string(),
            name: "Quebec High School".to_string(),
            amenity: "school".to_string(),
            city: "quebec".to_string(),
            location: [-71.23966, 46.79775],
        },
    ]
}

/// Results of the two searches; `None` where the search failed.
#[derive(Debug, Default)]
pub struct DemoReport {
    pub term: Option<SearchResult>,
    pub nearby: Option<SearchResult>,
}

pub fn term_request(config: &DemoConfig) -> SearchRequest {
    SearchRequest::new(SearchQuery::query_string(&config.search)).all_fields()
}

pub fn nearby_request(config: &DemoConfig) -> SearchRequest {
    let geo = SearchQuery::GeoDistance {
        center: config.center,
        distance: config.distance,
        field: None,
    }
    .with_field("location");
    SearchRequest::new(SearchQuery::and([SearchQuery::matching(&config.search), geo])).all_fields()
}

pub fn run(config: &DemoConfig) -> anyhow::Result<DemoReport> {
    let mapping = place_mapping();
    mapping.validate().context("invalid index mapping")?;

    write_places(config, &mapping, &sample_places())?;
    tracing::info!("write completed");

    let index = GeoIndex::open(&config.index_path)
        .with_context(|| format!("reopening index at {}", config.index_path.display()))?;

    tracing::info!("--------------------- searching for term ---------------------");
    let term = run_search(&index, &term_request(config), None);

    tracing::info!("--------------------- searching for term and distance ---------------------");
    let nearby = run_search(&index, &nearby_request(config), Some(&config.distance_label));

    Ok(DemoReport { term, nearby })
}

fn write_places(config: &DemoConfig, mapping: &IndexMapping, places: &[Place]) -> anyhow::Result<()> {
    let path = &config.index_path;
    let mut index = if config.fresh {
        GeoIndex::create_fresh(path, mapping)
    } else {
        GeoIndex::open_or_create(path, mapping)
    }
    .with_context(|| format!("opening index at {}", path.display()))?;

    if config.debug {
        if let Some(first) = places.first() {
            match extract_geo_point(&serde_json::json!(first.location)) {
                Some(point) => tracing::info!(id = %first.id, %point, "decoded location"),
                None => tracing::warn!(id = %first.id, "location does not decode as a geo point"),
            }
        }
    }

    for place in places {
        index
            .put(&place.id, place)
            .with_context(|| format!("indexing place {}", place.id))?;
    }
    index.close().context("closing index")?;
    Ok(())
}

fn run_search(index: &impl DocumentIndex, request: &SearchRequest, distance: Option<&str>) -> Option<SearchResult> {
    let result = match index.search(request) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "search failed");
            return None;
        }
    };
    let prefix = distance.map(|d| format!("distance {d} - ")).unwrap_or_default();
    for hit in &result.hits {
        tracing::info!("{prefix}ID: {}. Score {}.", hit.id, hit.score);
        for (name, value) in &hit.fields {
            tracing::info!("{prefix}Field {}. Value {}.", name, value);
        }
    }
    if result.is_empty() {
        tracing::info!("{prefix}no hits");
    }
    Some(result)
}
