//! HTTP client for the upstream places provider.
//!
//! Wraps the provider's text-search and place-details endpoints with typed
//! responses and immediate error classification. Retry timing lives in the
//! refresh scheduler, not here — the client only reports what happened.

pub mod client;
pub mod error;
pub mod types;

pub use client::PlacesClient;
pub use error::PlacesError;
pub use types::{OpeningHours, PlaceDetails, SearchCandidate};
