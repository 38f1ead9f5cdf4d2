//! Typed response shapes for the places provider.
//!
//! Only the fields this system consumes are modeled; everything else in the
//! provider's payload is ignored. Every detail field is independently
//! optional — absence means "provider did not supply it", which the sync
//! layer must not confuse with an instruction to blank the cached value.

use serde::Deserialize;

/// Envelope for the text-search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub status: String,
    #[serde(default)]
    pub candidates: Vec<SearchCandidate>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// One search candidate; only the identifier is requested.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchCandidate {
    pub place_id: String,
}

/// Envelope for the place-details endpoint.
#[derive(Debug, Deserialize)]
pub struct DetailsResponse {
    pub status: String,
    #[serde(default)]
    pub result: Option<PlaceDetails>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// The detail fields this system tracks for a place.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub formatted_phone_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
}

/// The provider's hours block; `weekday_text` is its human-readable form,
/// one line per day, which feeds the hours parser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

impl PlaceDetails {
    /// Raw hours text for the parser: the weekday lines joined with
    /// newlines, or `None` when the provider sent no usable hours block.
    #[must_use]
    pub fn hours_text(&self) -> Option<String> {
        let lines = &self.opening_hours.as_ref()?.weekday_text;
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}
