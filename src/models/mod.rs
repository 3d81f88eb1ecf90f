use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PickerError, Result};

/// Identifier the places API assigns to a place
pub type PlaceId = i64;

/// A geographic point with validated latitude and longitude
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = PickerError;

    fn try_from(raw: RawPoint) -> Result<Self> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl GeoPoint {
    /// Default screen location (Kathmandu)
    pub const KATHMANDU: GeoPoint = GeoPoint {
        latitude: 27.7172,
        longitude: 85.3240,
    };

    /// Build a point, rejecting non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(PickerError::InvalidCoordinateInput(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(PickerError::InvalidCoordinateInput(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse a point from the two manual-entry text fields
    pub fn parse(lat_text: &str, lon_text: &str) -> Result<Self> {
        let latitude = parse_decimal("latitude", lat_text)?;
        let longitude = parse_decimal("longitude", lon_text)?;
        Self::new(latitude, longitude)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

fn parse_decimal(field: &str, text: &str) -> Result<f64> {
    text.trim().parse::<f64>().map_err(|_| {
        PickerError::InvalidCoordinateInput(format!("{field} {:?} is not a decimal number", text))
    })
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// One row of a search response, shown as a suggestion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResultEntry {
    pub place_id: PlaceId,
    pub name: String,
    pub address: String,
}

/// Geometry attached to a place record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: serde_json::Value,
}

/// Full place record returned by the detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceDetail {
    pub place_id: PlaceId,
    pub name: String,
    pub address: String,
    pub centroid: GeoPoint,
    pub score: Option<f64>,
    pub license: Option<String>,
    pub osm_id: Option<i64>,
    pub geometry: Option<Geometry>,
    pub place_type: Option<String>,
    pub tags: Vec<String>,
}

/// Camera target and zoom last requested from the map surface
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CameraPosition {
    pub target: GeoPoint,
    pub zoom: f64,
}

/// The result of a confirmed pick
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmedLocation {
    pub point: GeoPoint,
    pub confirmed_at: DateTime<Utc>,
}
