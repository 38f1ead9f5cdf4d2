use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::PlacesError;
use crate::types::{DetailsResponse, PlaceDetails, SearchResponse};

/// Detail fields requested from the provider; keeps the per-call billing
/// tier predictable.
const DETAIL_FIELDS: &str = "formatted_address,formatted_phone_number,website,rating,opening_hours";

/// Client for the places provider's text-search and details endpoints.
///
/// Manages the HTTP client, API key, and base URL. Use
/// [`PlacesClient::with_base_url`] to point at a mock server in tests.
/// Every call carries the configured timeout; no retries happen here.
pub struct PlacesClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl PlacesClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`PlacesError::Api`] if `base_url` is not a
    /// valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, PlacesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("dinesync/0.1 (restaurant-directory)")
            .build()?;

        let normalised = base_url.trim_end_matches('/').to_owned();
        let base_url = Url::parse(&normalised).map_err(|e| PlacesError::Api {
            status: "INVALID_BASE_URL".to_owned(),
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Looks up a place by restaurant name and address.
    ///
    /// Returns `Ok(None)` when the provider finds no candidate — the caller
    /// treats that as a terminal not-found, so it is not an error here.
    /// When several candidates match, the first (best-ranked) one wins.
    ///
    /// # Errors
    ///
    /// - [`PlacesError::RateLimited`] when the key is over its daily limit.
    /// - [`PlacesError::Api`] for any other provider error status.
    /// - [`PlacesError::Http`] / [`PlacesError::UnexpectedStatus`] on
    ///   transport failure.
    /// - [`PlacesError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn search(&self, name: &str, address: &str) -> Result<Option<String>, PlacesError> {
        let input = format!("{name} {address}");
        let url = self.build_url(
            "findplacefromtext/json",
            &[
                ("input", input.as_str()),
                ("inputtype", "textquery"),
                ("fields", "place_id"),
            ],
        )?;

        let body = self.request_json(&url).await?;
        let envelope: SearchResponse =
            serde_json::from_value(body).map_err(|e| PlacesError::Deserialize {
                context: format!("search(name={name})"),
                source: e,
            })?;

        match envelope.status.as_str() {
            "OK" => Ok(envelope.candidates.first().map(|c| c.place_id.clone())),
            "ZERO_RESULTS" => Ok(None),
            status => Err(Self::status_error(
                status,
                envelope.error_message,
                &format!("search(name={name})"),
            )),
        }
    }

    /// Fetches the tracked detail fields for a place identifier.
    ///
    /// # Errors
    ///
    /// - [`PlacesError::NotFound`] when the identifier no longer resolves.
    /// - [`PlacesError::RateLimited`] when the key is over its daily limit.
    /// - [`PlacesError::Api`] for any other provider error status.
    /// - [`PlacesError::Http`] / [`PlacesError::UnexpectedStatus`] on
    ///   transport failure.
    /// - [`PlacesError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn fetch_details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError> {
        let url = self.build_url(
            "details/json",
            &[("place_id", place_id), ("fields", DETAIL_FIELDS)],
        )?;

        let body = self.request_json(&url).await?;
        let context = format!("details(place_id={place_id})");
        let envelope: DetailsResponse =
            serde_json::from_value(body).map_err(|e| PlacesError::Deserialize {
                context: context.clone(),
                source: e,
            })?;

        match envelope.status.as_str() {
            "OK" => envelope.result.ok_or_else(|| PlacesError::Api {
                status: "OK".to_owned(),
                message: format!("{context}: missing result payload"),
            }),
            "NOT_FOUND" | "ZERO_RESULTS" => Err(PlacesError::NotFound { context }),
            status => Err(Self::status_error(status, envelope.error_message, &context)),
        }
    }

    /// Maps a provider error status onto the client taxonomy.
    fn status_error(status: &str, message: Option<String>, context: &str) -> PlacesError {
        let message = message.unwrap_or_else(|| context.to_owned());
        match status {
            "OVER_QUERY_LIMIT" => PlacesError::RateLimited { message },
            _ => PlacesError::Api {
                status: status.to_owned(),
                message,
            },
        }
    }

    /// Builds the full request URL with percent-encoded query parameters.
    fn build_url(&self, endpoint: &str, extra: &[(&str, &str)]) -> Result<Url, PlacesError> {
        // `Url` renders a host-only base with a trailing slash, so trim the
        // rendered form rather than the stored one.
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url =
            Url::parse(&format!("{base}/{endpoint}")).map_err(|e| PlacesError::Api {
                status: "INVALID_URL".to_owned(),
                message: format!("cannot build URL for {endpoint}: {e}"),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        Ok(url)
    }

    /// Sends a GET request and parses the body as JSON.
    ///
    /// HTTP 429 is classified as [`PlacesError::RateLimited`] here since some
    /// deployments signal quota at the transport layer rather than in the
    /// JSON envelope.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, PlacesError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        tracing::debug!(url = %redacted(url), status = status.as_u16(), "places request completed");

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PlacesError::RateLimited {
                message: "HTTP 429".to_owned(),
            });
        }
        if !status.is_success() {
            return Err(PlacesError::UnexpectedStatus {
                status: status.as_u16(),
                url: redacted(url),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| PlacesError::Deserialize {
            context: redacted(url),
            source: e,
        })
    }
}

/// URL without its query string, safe for error messages and logs (the
/// query carries the API key).
fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
