use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{PickerError, Result};
use crate::models::GeoPoint;

pub const DEFAULT_BASE_URL: &str = "https://api.baato.io/api/v1";

/// Connection settings for the places API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    /// Maximum number of suggestions requested per search
    pub search_limit: usize,
    /// Request timeout; the HTTP client default applies when unset
    pub timeout_secs: Option<u64>,
    pub map_style: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            search_limit: 8,
            timeout_secs: None,
            map_style: "breeze_cdn".to_string(),
        }
    }
}

/// Optional behaviours of the picker screen
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PickerCapabilities {
    /// Accept typed latitude/longitude submissions
    pub manual_entry: bool,
    /// Re-centre on the first location fix of the screen's lifetime
    pub gps_autocenter: bool,
}

impl Default for PickerCapabilities {
    fn default() -> Self {
        Self {
            manual_entry: true,
            gps_autocenter: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub api: ApiConfig,
    pub debounce_ms: u64,
    pub initial_zoom: f64,
    /// Zoom used when centring on manually entered coordinates
    pub center_zoom: f64,
    /// Zoom used when focusing a picked place
    pub focus_zoom: f64,
    pub gps_zoom: f64,
    pub default_location: GeoPoint,
    pub capabilities: PickerCapabilities,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            debounce_ms: 500,
            initial_zoom: 12.0,
            center_zoom: 12.0,
            focus_zoom: 14.0,
            gps_zoom: 15.0,
            default_location: GeoPoint::KATHMANDU,
            capabilities: PickerCapabilities::default(),
        }
    }
}

impl PickerConfig {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub async fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.trim().is_empty() {
            return Err(PickerError::Config("API key is empty".to_string()));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(PickerError::Config("base URL is empty".to_string()));
        }
        if self.api.search_limit == 0 {
            return Err(PickerError::Config(
                "search limit must be positive".to_string(),
            ));
        }
        for (name, zoom) in [
            ("initial_zoom", self.initial_zoom),
            ("center_zoom", self.center_zoom),
            ("focus_zoom", self.focus_zoom),
            ("gps_zoom", self.gps_zoom),
        ] {
            if !zoom.is_finite() || zoom <= 0.0 {
                return Err(PickerError::Config(format!(
                    "{name} must be a positive number, got {zoom}"
                )));
            }
        }
        Ok(())
    }
}
