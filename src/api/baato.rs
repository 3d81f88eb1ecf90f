use crate::api::traits::PlacesApi;
use crate::api::types::{place_detail, search_entries, ApiEnvelope, PlaceRow, SearchRow};
use crate::config::ApiConfig;
use crate::error::{PickerError, Result};
use crate::models::{PlaceDetail, PlaceId, SearchResultEntry};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Baato places API client
pub struct BaatoClient {
    client: Client,
    config: ApiConfig,
}

impl BaatoClient {
    /// Create a new client for the configured endpoint
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// URL of the map style resource, consumed by the map surface
    pub fn style_url(&self) -> String {
        format!(
            "{}/styles/{}?key={}",
            self.base_url(),
            self.config.map_style,
            self.config.api_key
        )
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// GET an endpoint with the API key appended and decode its envelope
    async fn get_envelope<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> anyhow::Result<ApiEnvelope<T>> {
        let url = format!("{}/{}", self.base_url(), endpoint);
        debug!("Fetching {} with {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .query(params)
            .send()
            .await
            .with_context(|| format!("Failed to reach {endpoint} endpoint"))?;

        if !response.status().is_success() {
            warn!("{} returned status: {}", endpoint, response.status());
            anyhow::bail!("{} endpoint returned {}", endpoint, response.status());
        }

        response
            .json::<ApiEnvelope<T>>()
            .await
            .with_context(|| format!("Failed to decode {endpoint} response"))
    }
}

#[async_trait]
impl PlacesApi for BaatoClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResultEntry>> {
        if query.trim().is_empty() || limit == 0 {
            return Err(PickerError::SearchFailed(
                "query must be non-empty and limit positive".to_string(),
            ));
        }

        let envelope = self
            .get_envelope::<SearchRow>(
                "search",
                &[("q", query.to_string()), ("limit", limit.to_string())],
            )
            .await
            .map_err(|e| PickerError::SearchFailed(format!("{e:#}")))?;

        let entries = search_entries(envelope);
        info!("Search for {:?} returned {} places", query, entries.len());
        Ok(entries)
    }

    async fn fetch_detail(&self, place_id: PlaceId) -> Result<PlaceDetail> {
        let envelope = self
            .get_envelope::<PlaceRow>("places", &[("placeId", place_id.to_string())])
            .await
            .map_err(|e| PickerError::DetailFetchFailed(format!("{e:#}")))?;

        let detail = place_detail(place_id, envelope)?;
        info!("Fetched place {} ({}) at {}", detail.place_id, detail.name, detail.centroid);
        Ok(detail)
    }

    fn provider_name(&self) -> &'static str {
        "Baato"
    }
}
