use crate::error::Result;
use crate::models::{PlaceDetail, PlaceId, SearchResultEntry};
use async_trait::async_trait;

/// Remote places service used by the picker
/// Implemented by the Baato client and by in-memory fakes in tests
#[async_trait]
pub trait PlacesApi: Send + Sync {
    /// Find places matching free text, in server relevance order
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResultEntry>>;

    /// Fetch the full record of one place
    async fn fetch_detail(&self, place_id: PlaceId) -> Result<PlaceDetail>;

    /// Get the name of the places provider
    fn provider_name(&self) -> &'static str;
}
