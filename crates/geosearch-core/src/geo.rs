//! Geo points, distance strings and great-circle distance.
//!
//! Points are always (longitude, latitude) in degrees. Distances are kept in
//! meters internally; `parse_distance` accepts a number followed by an
//! optional unit suffix (`"1km"`, `"500m"`, `"2.5mi"`, `"300"`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};

/// Mean earth radius in meters.
pub const EARTH_MEAN_RADIUS_METERS: f64 = 6_371_008.771_4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Builds a point, rejecting coordinates outside the valid degree ranges.
    pub fn new(lon: f64, lat: f64) -> Result<Self> {
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(Error::GeoPoint(format!("longitude {lon} out of range")));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(Error::GeoPoint(format!("latitude {lat} out of range")));
        }
        Ok(Self { lon, lat })
    }

    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_meters(self, other)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lon={} lat={}", self.lon, self.lat)
    }
}

/// Decodes a geo point from a JSON value.
///
/// Accepted shapes:
/// - `[lon, lat]`
/// - `{"lon": .., "lat": ..}` (`lng` is accepted for `lon`)
/// - `"lat,lon"`
///
/// Returns `None` when the value has none of these shapes or the
/// coordinates are out of range.
pub fn extract_geo_point(value: &Value) -> Option<GeoPoint> {
    match value {
        Value::Array(items) if items.len() == 2 => {
            let lon = items[0].as_f64()?;
            let lat = items[1].as_f64()?;
            GeoPoint::new(lon, lat).ok()
        }
        Value::Object(map) => {
            let lon = map.get("lon").or_else(|| map.get("lng"))?.as_f64()?;
            let lat = map.get("lat")?.as_f64()?;
            GeoPoint::new(lon, lat).ok()
        }
        Value::String(s) => {
            let (lat, lon) = s.split_once(',')?;
            let lat = lat.trim().parse::<f64>().ok()?;
            let lon = lon.trim().parse::<f64>().ok()?;
            GeoPoint::new(lon, lat).ok()
        }
        _ => None,
    }
}

/// Great-circle distance between two points, in meters.
pub fn haversine_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_MEAN_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// A radius, normalized to meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    meters: f64,
}

impl Distance {
    pub fn from_meters(meters: f64) -> Result<Self> {
        if !meters.is_finite() || meters < 0.0 {
            return Err(Error::Distance(format!("{meters} is not a valid distance")));
        }
        Ok(Self { meters })
    }

    pub fn meters(&self) -> f64 {
        self.meters
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.meters)
    }
}

// unit suffixes and their size in meters
const UNITS: &[(&[&str], f64)] = &[
    (&["mm", "millimeters"], 0.001),
    (&["cm", "centimeters"], 0.01),
    (&["km", "kilometers"], 1000.0),
    (&["nm", "nauticalmiles"], 1852.0),
    (&["mi", "miles"], 1609.344),
    (&["yd", "yards"], 0.9144),
    (&["ft", "feet"], 0.3048),
    (&["in", "inch"], 0.0254),
    (&["m", "meters"], 1.0),
];

/// Parses a distance such as `"1km"`, `"500 m"` or `"1e3m"`. A bare number is
/// meters.
pub fn parse_distance(input: &str) -> Result<Distance> {
    let s = input.trim().to_ascii_lowercase();
    let mut suffixes: Vec<(&str, f64)> = UNITS
        .iter()
        .flat_map(|(names, factor)| names.iter().map(move |name| (*name, *factor)))
        .collect();
    // "kilometers" must be tried before "meters", "mm" before "m"
    suffixes.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));

    let (number, factor) = suffixes
        .iter()
        .find_map(|(name, factor)| s.strip_suffix(name).map(|rest| (rest, *factor)))
        .unwrap_or((s.as_str(), 1.0));
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| Error::Distance(format!("'{input}' is not a number with a known unit")))?;
    Distance::from_meters(value * factor)
}
