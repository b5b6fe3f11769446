use std::fs;
use tempfile::TempDir;

use geosearch_core::geo::{extract_geo_point, haversine_meters, parse_distance, GeoPoint};
use geosearch_core::mapping::{DocumentMapping, FieldKind, FieldMapping, IndexMapping};
use geosearch_core::types::Place;

fn place_mapping() -> IndexMapping {
    let place = DocumentMapping::new()
        .with_field("name", FieldMapping::text().stored())
        .with_field("location", FieldMapping::geo_point().stored());
    let mut mapping = IndexMapping::new();
    mapping.add_document_mapping("place", place.clone());
    mapping.set_default_mapping(place);
    mapping
}

#[test]
fn mapping_written_to_disk_reads_back_identical() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("mapping.json");
    let mapping = place_mapping();
    fs::write(&path, serde_json::to_vec_pretty(&mapping).unwrap()).unwrap();

    let back: IndexMapping = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(back, mapping);
    assert_eq!(back.all_fields()["location"].kind, FieldKind::GeoPoint);
    assert!(back.validate().is_ok());
}

#[test]
fn place_location_decodes_as_lon_lat() {
    let place = Place {
        id: "1".to_string(),
        name: "School Secondary Les Etchemins".to_string(),
        amenity: "school".to_string(),
        city: "levis".to_string(),
        location: [-71.26917, 46.72009],
    };
    let doc = serde_json::to_value(&place).unwrap();
    let point = extract_geo_point(&doc["location"]).expect("geo point");
    assert_eq!(point, GeoPoint { lon: -71.26917, lat: 46.72009 });
}

#[test]
fn sample_places_against_demo_center() {
    let center = GeoPoint::new(-71.26050, 46.79049).unwrap();
    let one_km = parse_distance("1km").unwrap().meters();
    let two_km = parse_distance("2km").unwrap().meters();

    let etchemins = GeoPoint::new(-71.26917, 46.72009).unwrap();
    let quebec_high = GeoPoint::new(-71.23966, 46.79775).unwrap();

    // neither sample is within 1 km; only Quebec High is within 2 km
    assert!(haversine_meters(&center, &etchemins) > two_km);
    assert!(haversine_meters(&center, &quebec_high) > one_km);
    assert!(haversine_meters(&center, &quebec_high) < two_km);
}
