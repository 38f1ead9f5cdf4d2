//! Provider seam for the refresh scheduler.

use async_trait::async_trait;

use dinesync_places::{PlaceDetails, PlacesClient, PlacesError};

/// The two provider operations the scheduler performs. Implemented by
/// [`PlacesClient`] in production and by scripted fakes in tests.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Resolves a restaurant's name and address to a provider place id.
    /// `Ok(None)` means the provider found no match.
    async fn search(&self, name: &str, address: &str) -> Result<Option<String>, PlacesError>;

    /// Fetches the place details for a known provider id.
    async fn fetch_details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError>;
}

#[async_trait]
impl UpstreamSource for PlacesClient {
    async fn search(&self, name: &str, address: &str) -> Result<Option<String>, PlacesError> {
        PlacesClient::search(self, name, address).await
    }

    async fn fetch_details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError> {
        PlacesClient::fetch_details(self, place_id).await
    }
}
