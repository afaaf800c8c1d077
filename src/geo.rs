use bson::Document as BsonDocument;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Earth's mean radius in miles; distances divide by this to get the
/// angular radius of the spherical cap.
pub const EARTH_RADIUS_MILES: f64 = 3958.0;

/// A point as stored on resources: longitude first, latitude second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("postal code not found: {0}")]
    UnknownPostalCode(String),

    #[error("geocoder table unavailable: {0}")]
    Table(String),
}

/// Resolves a postal code to coordinates. Every call re-resolves; results
/// are never cached.
pub trait Geocoder: Send + Sync {
    fn resolve(&self, postal_code: &str) -> Result<GeoPoint, GeocodeError>;
}

/// Production geocoder backed by a static postal-code table loaded from a
/// JSON file of `{"02115": {"longitude": -71.1, "latitude": 42.3}, ...}`.
pub struct TableGeocoder {
    entries: HashMap<String, GeoPoint>,
}

impl TableGeocoder {
    #[must_use]
    pub fn new(entries: HashMap<String, GeoPoint>) -> Self {
        Self { entries }
    }

    pub fn from_file(path: &Path) -> Result<Self, GeocodeError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GeocodeError::Table(format!("{}: {e}", path.display())))?;
        let entries: HashMap<String, GeoPoint> =
            serde_json::from_str(&raw).map_err(|e| GeocodeError::Table(e.to_string()))?;
        Ok(Self { entries })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl Geocoder for TableGeocoder {
    fn resolve(&self, postal_code: &str) -> Result<GeoPoint, GeocodeError> {
        self.entries
            .get(postal_code.trim())
            .copied()
            .ok_or_else(|| GeocodeError::UnknownPostalCode(postal_code.to_string()))
    }
}

/// Great-circle (haversine) distance between two points, in radians.
#[must_use]
pub fn angular_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * h.sqrt().asin()
}

/// Spherical-cap containment check against an angular radius.
#[must_use]
pub fn within_radius(point: GeoPoint, center: GeoPoint, radius_radians: f64) -> bool {
    angular_distance(point, center) <= radius_radians
}

/// Extracts the stored `location.coordinates` `[longitude, latitude]` pair
/// from a resource payload.
#[must_use]
pub fn point_from_document(data: &BsonDocument) -> Option<GeoPoint> {
    let location = data.get_document("location").ok()?;
    let coords = location.get_array("coordinates").ok()?;
    if coords.len() != 2 {
        return None;
    }
    let longitude = coords[0].as_f64().or_else(|| coords[0].as_i64().map(|v| v as f64))?;
    let latitude = coords[1].as_f64().or_else(|| coords[1].as_i64().map(|v| v as f64))?;
    Some(GeoPoint { longitude, latitude })
}
