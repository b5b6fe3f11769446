use std::path::Path;

use geosearch_cli::demo::{place_mapping, run, sample_places};
use geosearch_cli::DemoConfig;
use geosearch_core::geo::{parse_distance, GeoPoint};
use geosearch_index::{DocumentIndex, GeoIndex};
use tempfile::TempDir;

fn config(path: &Path, search: &str, distance: &str, fresh: bool) -> DemoConfig {
    DemoConfig {
        index_path: path.to_path_buf(),
        distance_label: distance.to_string(),
        distance: parse_distance(distance).unwrap(),
        search: search.to_string(),
        center: GeoPoint::new(-71.26050, 46.79049).unwrap(),
        fresh,
        debug: true,
    }
}

fn sorted(ids: Vec<&str>) -> Vec<&str> {
    let mut ids = ids;
    ids.sort();
    ids
}

#[test]
fn demo_with_school_query() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("index.bleve");

    let report = run(&config(&path, "school", "1km", true)).expect("demo run");
    let term = report.term.expect("term search");
    assert_eq!(sorted(term.ids()), vec!["1", "2"]);
    assert!(term.hits[0].score >= term.hits[1].score);
    assert!(term.hits.iter().all(|h| h.fields.contains_key("name") && h.fields.contains_key("location")));

    // neither sample lies within 1 km of the center
    let nearby = report.nearby.expect("distance search");
    assert!(nearby.is_empty());

    let report = run(&config(&path, "school", "2km", true)).expect("demo run");
    assert_eq!(report.nearby.expect("distance search").ids(), vec!["2"]);
}

#[test]
fn default_query_finds_nothing() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("index.bleve");
    let report = run(&config(&path, "cafe", "1km", true)).expect("demo run");
    assert!(report.term.expect("term search").is_empty());
    assert!(report.nearby.expect("distance search").is_empty());
}

#[test]
fn rerun_without_fresh_upserts() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("index.bleve");
    run(&config(&path, "school", "1km", false)).expect("first run");
    run(&config(&path, "school", "1km", false)).expect("second run");

    let index = GeoIndex::open(&path).unwrap();
    assert_eq!(index.doc_count().unwrap(), sample_places().len() as u64);
    assert_eq!(index.mapping(), &place_mapping());
    let stored = index.document("1").unwrap().expect("place 1");
    assert_eq!(stored["city"], serde_json::json!("levis"));
}

#[test]
fn fresh_run_discards_foreign_documents() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("index.bleve");
    {
        let mut index = GeoIndex::create(&path, &place_mapping()).unwrap();
        index
            .put("99", &serde_json::json!({"name": "Old School House", "location": [-71.26, 46.79]}))
            .unwrap();
        index.close().unwrap();
    }

    let report = run(&config(&path, "school", "10km", true)).expect("demo run");
    assert_eq!(sorted(report.term.expect("term search").ids()), vec!["1", "2"]);
}

#[test]
fn failed_search_is_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("index.bleve");
    let report = run(&config(&path, "nosuchfield:school", "1km", true)).expect("demo run");
    assert!(report.term.is_none());
    // the match query analyzes the text instead of parsing it
    assert!(report.nearby.is_some());
}

#[test]
fn unwritable_index_path_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("not-a-dir");
    std::fs::write(&file, b"occupied").unwrap();
    assert!(run(&config(&file.join("index"), "school", "1km", false)).is_err());
}
