//! Client for the structured places store's `search_places` RPC.
//!
//! The store is a PostgREST-style endpoint: `POST {base}/rest/v1/rpc/search_places`
//! with a JSON argument object, authenticated with an `apikey` header plus a
//! bearer token carrying the same key. The response is a bare JSON array of rows.

use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, Url};
use serde::Serialize;

use locus_core::{PlaceRow, PlacesQuery, PlacesStore, RemoteSourceFailure};

use crate::error::ProviderError;
use crate::http::{build_client, join, parse_base_url, read_json, HttpSettings};
use crate::retry::retry_with_backoff;

const PROVIDER: &str = "places_store";
const RPC_PATH: &str = "rest/v1/rpc/search_places";

/// Wire shape of the RPC arguments.
#[derive(Debug, Serialize)]
struct SearchPlacesArgs<'a> {
    search_text: &'a str,
    city_filter: Option<&'a str>,
    country_filter: Option<&'a str>,
    user_lat: Option<f64>,
    user_lng: Option<f64>,
    max_results: usize,
    min_hierarchy_level: u8,
}

impl<'a> From<&'a PlacesQuery> for SearchPlacesArgs<'a> {
    fn from(query: &'a PlacesQuery) -> Self {
        Self {
            search_text: query.text.as_str(),
            city_filter: query.city.as_deref(),
            country_filter: query.country_code.as_deref(),
            user_lat: query.user_lat,
            user_lng: query.user_lng,
            max_results: query.max_results,
            min_hierarchy_level: query.min_hierarchy_level,
        }
    }
}

pub struct PlacesStoreClient {
    client: Client,
    api_key: String,
    rpc_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl PlacesStoreClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`ProviderError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, api_key: &str, settings: &HttpSettings) -> Result<Self, ProviderError> {
        let base = parse_base_url(base_url)?;
        Ok(Self {
            client: build_client(settings)?,
            api_key: api_key.to_owned(),
            rpc_url: join(&base, RPC_PATH)?,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
        })
    }

    /// Run the `search_places` RPC.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::RateLimited`] / [`ProviderError::UnexpectedStatus`] for non-2xx answers.
    /// - [`ProviderError::Http`] on transport failure.
    /// - [`ProviderError::Deserialize`] if the body is not an array of rows.
    pub async fn search_places(&self, query: &PlacesQuery) -> Result<Vec<PlaceRow>, ProviderError> {
        let args = SearchPlacesArgs::from(query);
        let context = format!("search_places({})", query.text);
        let (client, url, key, args, context) =
            (&self.client, &self.rpc_url, self.api_key.as_str(), &args, context.as_str());
        let rows: Vec<PlaceRow> =
            retry_with_backoff(self.max_retries, self.backoff_base_ms, move || async move {
                let response = client
                    .post(url.clone())
                    .header("apikey", key)
                    .bearer_auth(key)
                    .json(args)
                    .send()
                    .await?;
                read_json::<Vec<PlaceRow>>(response, PROVIDER, context).await
            })
            .await?;
        tracing::debug!(query = %query.text, rows = rows.len(), "places store answered");
        Ok(rows)
    }
}

impl PlacesStore for PlacesStoreClient {
    fn query<'a>(
        &'a self,
        query: &'a PlacesQuery,
    ) -> BoxFuture<'a, Result<Vec<PlaceRow>, RemoteSourceFailure>> {
        async move {
            self.search_places(query)
                .await
                .map_err(|e| e.into_remote(PROVIDER))
        }
        .boxed()
    }
}
