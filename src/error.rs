use thiserror::Error;

use crate::models::PlaceId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PickerError {
    #[error("Search failed: {0}")]
    SearchFailed(String),
    #[error("Place {0} not found")]
    DetailNotFound(PlaceId),
    #[error("Failed to fetch place detail: {0}")]
    DetailFetchFailed(String),
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinateInput(String),
    #[error("Picker screen is closed")]
    ScreenClosed,
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PickerError>;
