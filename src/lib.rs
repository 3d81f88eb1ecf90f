pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod picker;
pub mod surface;

#[cfg(test)]
mod testing;

pub use api::{BaatoClient, PlacesApi};
pub use config::{ApiConfig, PickerCapabilities, PickerConfig};
pub use error::{PickerError, Result};
pub use models::{CameraPosition, ConfirmedLocation, GeoPoint, PlaceDetail, PlaceId, SearchResultEntry};
pub use picker::{PickerEvent, PickerHandle, PickerScreen};
pub use surface::{ChannelSurface, LifecycleEvent, MapSurface, SurfaceCall};
