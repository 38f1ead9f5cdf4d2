use dinesync_core::RefreshErrorKind;
use thiserror::Error;

/// Errors returned by the places API client, classified at the HTTP boundary.
#[derive(Debug, Error)]
pub enum PlacesError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider reported that the place does not exist.
    #[error("place not found upstream: {context}")]
    NotFound { context: String },

    /// The provider refused the call because the key is over its limit.
    #[error("rate limited by places API: {message}")]
    RateLimited { message: String },

    /// Any other application-level error status from the provider.
    #[error("places API status {status}: {message}")]
    Api { status: String, message: String },

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A non-2xx HTTP status that is not a rate limit.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}

impl PlacesError {
    /// Maps the client error onto the scheduler's refresh taxonomy.
    ///
    /// Timeouts are split out of the generic transport bucket because the
    /// backoff policy treats them as provider-side transients; malformed
    /// responses and unexpected API statuses are grouped under `Transport`
    /// since retrying after a window is the only recovery either way.
    #[must_use]
    pub fn kind(&self) -> RefreshErrorKind {
        match self {
            PlacesError::Http(e) if e.is_timeout() => RefreshErrorKind::Timeout,
            PlacesError::Http(_)
            | PlacesError::Api { .. }
            | PlacesError::Deserialize { .. }
            | PlacesError::UnexpectedStatus { .. } => RefreshErrorKind::Transport,
            PlacesError::NotFound { .. } => RefreshErrorKind::NotFound,
            PlacesError::RateLimited { .. } => RefreshErrorKind::RateLimited,
        }
    }
}
