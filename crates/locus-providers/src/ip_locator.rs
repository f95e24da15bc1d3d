//! Coarse IP geolocation client (`ip-api.com`-shaped JSON).

use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, Url};
use serde::Deserialize;

use locus_core::{Coordinates, NetworkFix, NetworkLocator, RemoteSourceFailure};

use crate::error::ProviderError;
use crate::http::{build_client, join, parse_base_url, read_json, HttpSettings};
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "http://ip-api.com";
const PROVIDER: &str = "ip_locator";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpLocation {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
}

pub struct IpLocatorClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl IpLocatorClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(settings: &HttpSettings) -> Result<Self, ProviderError> {
        Self::with_base_url(DEFAULT_BASE_URL, settings)
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`ProviderError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(base_url: &str, settings: &HttpSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: parse_base_url(base_url)?,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
        })
    }

    /// Locate the caller's public IP address.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::ApiError`] when `status` is not `"success"`.
    /// - [`ProviderError::NoResults`] when the answer carries no coordinates
    ///   or the coordinates are out of range.
    /// - [`ProviderError::Http`] / [`ProviderError::UnexpectedStatus`] on transport failure.
    pub async fn lookup(&self) -> Result<NetworkFix, ProviderError> {
        let url = join(&self.base_url, "json")?;
        let client = &self.client;
        let url = &url;
        let body: IpLocation =
            retry_with_backoff(self.max_retries, self.backoff_base_ms, move || async move {
                let response = client.get(url.clone()).send().await?;
                read_json::<IpLocation>(response, PROVIDER, "ip lookup").await
            })
            .await?;
        into_fix(body)
    }
}

fn into_fix(body: IpLocation) -> Result<NetworkFix, ProviderError> {
    if body.status != "success" {
        return Err(ProviderError::ApiError {
            provider: PROVIDER,
            message: body.message.unwrap_or(body.status),
        });
    }
    let (Some(lat), Some(lon)) = (body.lat, body.lon) else {
        return Err(ProviderError::NoResults {
            provider: PROVIDER,
            context: "response without lat/lon".to_string(),
        });
    };
    let coordinates = Coordinates::new(lat, lon);
    if !coordinates.is_valid() {
        return Err(ProviderError::NoResults {
            provider: PROVIDER,
            context: format!("out-of-range coordinates {coordinates}"),
        });
    }
    Ok(NetworkFix {
        coordinates,
        city: body.city.filter(|c| !c.trim().is_empty()),
        country_code: body.country_code.filter(|c| !c.trim().is_empty()),
    })
}

impl NetworkLocator for IpLocatorClient {
    fn locate(&self) -> BoxFuture<'_, Result<NetworkFix, RemoteSourceFailure>> {
        async move { self.lookup().await.map_err(|e| e.into_remote(PROVIDER)) }.boxed()
    }
}
