use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PickerError, Result};
use crate::models::{GeoPoint, Geometry, PlaceDetail, PlaceId, SearchResultEntry};

/// Envelope wrapping every places API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Vec<T>,
}

/// One row of the `search` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRow {
    pub place_id: PlaceId,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CentroidRow {
    pub lat: f64,
    pub lon: f64,
}

/// One row of the `places` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRow {
    #[serde(default)]
    pub place_id: Option<PlaceId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub centroid: CentroidRow,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub osm_id: Option<i64>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, rename = "type")]
    pub place_type: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Convert a search response into a suggestion batch.
///
/// Server order is kept. A place id repeated within the batch keeps only its
/// first row.
pub fn search_entries(envelope: ApiEnvelope<SearchRow>) -> Vec<SearchResultEntry> {
    let mut seen = HashSet::new();
    let total = envelope.data.len();
    let entries: Vec<SearchResultEntry> = envelope
        .data
        .into_iter()
        .filter(|row| seen.insert(row.place_id))
        .map(|row| SearchResultEntry {
            place_id: row.place_id,
            name: row.name,
            address: row.address,
        })
        .collect();

    if entries.len() < total {
        debug!(
            "Dropped {} duplicate rows from search batch",
            total - entries.len()
        );
    }
    entries
}

/// Convert a detail response into the first place record it carries
pub fn place_detail(place_id: PlaceId, envelope: ApiEnvelope<PlaceRow>) -> Result<PlaceDetail> {
    let row = envelope
        .data
        .into_iter()
        .next()
        .ok_or(PickerError::DetailNotFound(place_id))?;

    // Only the centroid is guaranteed; fall back to the id that was asked for
    let place_id = row.place_id.unwrap_or(place_id);
    let centroid = GeoPoint::new(row.centroid.lat, row.centroid.lon).map_err(|e| {
        PickerError::DetailFetchFailed(format!("place {place_id} has an invalid centroid: {e}"))
    })?;

    Ok(PlaceDetail {
        place_id,
        name: row.name,
        address: row.address,
        centroid,
        score: row.score,
        license: row.license,
        osm_id: row.osm_id,
        geometry: row.geometry,
        place_type: row.place_type,
        tags: row.tags.unwrap_or_default(),
    })
}
