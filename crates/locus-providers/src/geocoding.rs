//! HTTP client for a Google-Geocoding-shaped JSON API.
//!
//! Covers both directions: coordinates to formatted address (`latlng=`) and
//! free text to candidate addresses (`address=`). The `"status"` field of the
//! envelope is checked on every call; `ZERO_RESULTS` is not an error for
//! text search.

use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, Url};
use serde::Deserialize;

use locus_core::{Coordinates, GeocodeHit, RemoteSourceFailure, ReverseGeocoder, TextGeocoder};

use crate::error::ProviderError;
use crate::http::{build_client, join, parse_base_url, read_json, HttpSettings};
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const PROVIDER: &str = "geocoder";

#[derive(Debug, Deserialize)]
struct GeocodeEnvelope {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeRecord>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeRecord {
    formatted_address: String,
    #[serde(default)]
    place_id: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Client for the external geocoding provider.
pub struct GeocodingClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl GeocodingClient {
    /// Creates a client pointed at the production geocoding API.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, settings: &HttpSettings) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, settings)
    }

    /// Creates a client with a custom base URL (self-hosted proxy, wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`ProviderError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        base_url: &str,
        settings: &HttpSettings,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(settings)?,
            api_key: api_key.to_owned(),
            base_url: parse_base_url(base_url)?,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
        })
    }

    /// Formatted address of the best match for `coordinates`.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::NoResults`] if the provider has no address there.
    /// - [`ProviderError::ApiError`] for any non-`OK` status.
    /// - [`ProviderError::Http`] / [`ProviderError::UnexpectedStatus`] on transport failure.
    /// - [`ProviderError::Deserialize`] if the body has an unexpected shape.
    pub async fn reverse(&self, coordinates: Coordinates) -> Result<String, ProviderError> {
        let latlng = format!("{},{}", coordinates.lat, coordinates.lng);
        let url = self.build_url(&[("latlng", latlng.as_str())])?;
        let envelope = self.request(&url, &format!("reverse({latlng})")).await?;
        let records = Self::check_status(envelope, true)?;
        records
            .into_iter()
            .next()
            .map(|r| r.formatted_address)
            .ok_or(ProviderError::NoResults {
                provider: PROVIDER,
                context: format!("latlng={latlng}"),
            })
    }

    /// Candidate addresses for free text, biased toward `region` (ccTLD code).
    ///
    /// # Errors
    ///
    /// - [`ProviderError::ApiError`] for any status other than `OK` / `ZERO_RESULTS`.
    /// - [`ProviderError::Http`] / [`ProviderError::UnexpectedStatus`] on transport failure.
    /// - [`ProviderError::Deserialize`] if the body has an unexpected shape.
    pub async fn search_text(
        &self,
        text: &str,
        region: Option<&str>,
    ) -> Result<Vec<GeocodeHit>, ProviderError> {
        let mut params = vec![("address", text)];
        // Bind the lowered string outside the if block so the borrow lives long enough.
        let region_lower;
        if let Some(r) = region {
            region_lower = r.to_lowercase();
            params.push(("region", region_lower.as_str()));
        }
        let url = self.build_url(&params)?;
        let envelope = self.request(&url, &format!("search({text})")).await?;
        let records = Self::check_status(envelope, false)?;
        Ok(records
            .into_iter()
            .map(|r| GeocodeHit {
                formatted_address: r.formatted_address,
                lat: r.geometry.location.lat,
                lng: r.geometry.location.lng,
                place_id: r.place_id,
            })
            .collect())
    }

    /// Builds `{base}/geocode/json?…&key=…` with percent-encoded parameters.
    fn build_url(&self, extra: &[(&str, &str)]) -> Result<Url, ProviderError> {
        let mut url = join(&self.base_url, "geocode/json")?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        Ok(url)
    }

    async fn request(&self, url: &Url, context: &str) -> Result<GeocodeEnvelope, ProviderError> {
        let client = &self.client;
        retry_with_backoff(self.max_retries, self.backoff_base_ms, move || async move {
            let response = client.get(url.clone()).send().await?;
            read_json::<GeocodeEnvelope>(response, PROVIDER, context).await
        })
        .await
    }

    /// `OK` passes records through; `ZERO_RESULTS` becomes an empty list
    /// (or `NoResults` when `strict`); anything else is an API error.
    fn check_status(
        envelope: GeocodeEnvelope,
        strict: bool,
    ) -> Result<Vec<GeocodeRecord>, ProviderError> {
        match envelope.status.as_str() {
            "OK" => Ok(envelope.results),
            "ZERO_RESULTS" if !strict => Ok(Vec::new()),
            "ZERO_RESULTS" => Err(ProviderError::NoResults {
                provider: PROVIDER,
                context: "ZERO_RESULTS".to_string(),
            }),
            "OVER_QUERY_LIMIT" => Err(ProviderError::RateLimited { provider: PROVIDER }),
            other => Err(ProviderError::ApiError {
                provider: PROVIDER,
                message: envelope
                    .error_message
                    .unwrap_or_else(|| other.to_string()),
            }),
        }
    }
}

impl ReverseGeocoder for GeocodingClient {
    fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> BoxFuture<'_, Result<String, RemoteSourceFailure>> {
        async move {
            self.reverse(coordinates)
                .await
                .map_err(|e| e.into_remote(PROVIDER))
        }
        .boxed()
    }
}

impl TextGeocoder for GeocodingClient {
    fn search<'a>(
        &'a self,
        text: &'a str,
        region_hint: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<GeocodeHit>, RemoteSourceFailure>> {
        async move {
            self.search_text(text, region_hint)
                .await
                .map_err(|e| e.into_remote(PROVIDER))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> GeocodingClient {
        GeocodingClient::with_base_url("test-key", base_url, &HttpSettings::default())
            .expect("client construction should not fail")
    }

    #[test]
    fn build_url_constructs_reverse_query() {
        let client = test_client("https://maps.example.com/maps/api");
        let url = client.build_url(&[("latlng", "-4.305,15.31")]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://maps.example.com/maps/api/geocode/json?latlng=-4.305%2C15.31&key=test-key"
        );
    }

    #[test]
    fn build_url_encodes_special_characters() {
        let client = test_client("https://maps.example.com/maps/api/");
        let url = client
            .build_url(&[("address", "Aéroport N'djili & co")])
            .unwrap();
        assert!(
            !url.as_str().contains(' ') && url.as_str().contains("%26"),
            "query param should be percent-encoded: {url}"
        );
    }

    #[test]
    fn check_status_handles_zero_results() {
        let envelope = GeocodeEnvelope {
            status: "ZERO_RESULTS".to_string(),
            results: vec![],
            error_message: None,
        };
        assert!(GeocodingClient::check_status(envelope, false).unwrap().is_empty());

        let envelope = GeocodeEnvelope {
            status: "ZERO_RESULTS".to_string(),
            results: vec![],
            error_message: None,
        };
        assert!(matches!(
            GeocodingClient::check_status(envelope, true),
            Err(ProviderError::NoResults { .. })
        ));
    }

    #[test]
    fn check_status_surfaces_error_message() {
        let envelope = GeocodeEnvelope {
            status: "REQUEST_DENIED".to_string(),
            results: vec![],
            error_message: Some("The provided API key is invalid.".to_string()),
        };
        let err = GeocodingClient::check_status(envelope, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "geocoder API error: The provided API key is invalid."
        );
    }
}
