use thiserror::Error;

use locus_core::RemoteSourceFailure;

/// Errors returned by the HTTP provider adapters.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or TLS failure from the underlying HTTP client. The request
    /// URL is stripped, since query strings carry API keys.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The provider answered with an application-level error status.
    #[error("{provider} API error: {message}")]
    ApiError {
        provider: &'static str,
        message: String,
    },

    /// The provider answered successfully but had nothing for the request.
    #[error("{provider} returned no results for {context}")]
    NoResults {
        provider: &'static str,
        context: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {provider}")]
    RateLimited { provider: &'static str },

    /// `url` has its query string removed.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

impl ProviderError {
    /// Collapse into the port-level failure type, tagged with the source name.
    #[must_use]
    pub fn into_remote(self, source_name: &'static str) -> RemoteSourceFailure {
        RemoteSourceFailure::Request {
            source_name,
            reason: self.to_string(),
        }
    }
}
