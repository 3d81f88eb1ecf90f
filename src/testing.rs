use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::PlacesApi;
use crate::error::{PickerError, Result};
use crate::models::{GeoPoint, PlaceDetail, PlaceId, SearchResultEntry};

#[derive(Default)]
pub struct FakePlaces {
    searches: HashMap<String, Result<Vec<SearchResultEntry>>>,
    details: HashMap<PlaceId, Result<PlaceDetail>>,
    delays: HashMap<String, Duration>,
    detail_delays: HashMap<PlaceId, Duration>,
    pub search_calls: Mutex<Vec<String>>,
    pub detail_calls: Mutex<Vec<PlaceId>>,
}

impl FakePlaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: &str, entries: Vec<SearchResultEntry>) -> Self {
        self.searches.insert(query.to_string(), Ok(entries));
        self
    }

    pub fn with_failing_search(mut self, query: &str) -> Self {
        self.searches.insert(
            query.to_string(),
            Err(PickerError::SearchFailed("503 Service Unavailable".to_string())),
        );
        self
    }

    pub fn with_search_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub fn with_detail(mut self, detail: PlaceDetail) -> Self {
        self.details.insert(detail.place_id, Ok(detail));
        self
    }

    pub fn with_detail_delay(mut self, place_id: PlaceId, delay: Duration) -> Self {
        self.detail_delays.insert(place_id, delay);
        self
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn detail_calls(&self) -> Vec<PlaceId> {
        self.detail_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlacesApi for FakePlaces {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResultEntry>> {
        self.search_calls.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        match self.searches.get(query) {
            Some(Ok(entries)) => Ok(entries.iter().take(limit).cloned().collect()),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_detail(&self, place_id: PlaceId) -> Result<PlaceDetail> {
        self.detail_calls.lock().unwrap().push(place_id);
        if let Some(delay) = self.detail_delays.get(&place_id) {
            tokio::time::sleep(*delay).await;
        }
        self.details
            .get(&place_id)
            .cloned()
            .unwrap_or(Err(PickerError::DetailNotFound(place_id)))
    }

    fn provider_name(&self) -> &'static str {
        "Fake"
    }
}

pub fn entry(place_id: PlaceId, name: &str) -> SearchResultEntry {
    SearchResultEntry {
        place_id,
        name: name.to_string(),
        address: format!("{name}, Kathmandu"),
    }
}

pub fn detail(place_id: PlaceId, name: &str, lat: f64, lon: f64) -> PlaceDetail {
    PlaceDetail {
        place_id,
        name: name.to_string(),
        address: format!("{name}, Kathmandu"),
        centroid: GeoPoint::new(lat, lon).unwrap(),
        score: Some(1.0),
        license: None,
        osm_id: None,
        geometry: None,
        place_type: Some("neighbourhood".to_string()),
        tags: vec![],
    }
}
