//! Wires configuration into the cache, provider clients and search sources.

use std::sync::Arc;

use locus_cache::{CacheSettings, FileStorage, ResultCache};
use locus_core::{
    AppConfig, Clock, NetworkLocator, PlacesStore, ReverseGeocoder, SystemClock, TextGeocoder,
};
use locus_providers::{GeocodingClient, HttpSettings, IpLocatorClient, PlacesStoreClient};
use locus_search::{CuratedTable, SearchAggregator, SearchSettings, SearchSources};

pub(crate) struct Services {
    pub(crate) cache: Arc<ResultCache>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) geocoder: Option<Arc<GeocodingClient>>,
    pub(crate) ip_locator: Arc<IpLocatorClient>,
    pub(crate) search: SearchAggregator,
}

impl Services {
    /// Build every collaborator from config. Remote sources without
    /// credentials are left out rather than failing.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed, a base URL
    /// is invalid, or the curated places file fails to load.
    pub(crate) fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let storage = Arc::new(FileStorage::new(config.cache_dir.clone()));
        let cache = Arc::new(ResultCache::load(
            storage,
            Arc::clone(&clock),
            CacheSettings::default(),
        ));

        let http = HttpSettings::from_app_config(config);

        let geocoder = match &config.geocoder_api_key {
            Some(key) => Some(Arc::new(
                GeocodingClient::with_base_url(key, &config.geocoder_base_url, &http)
                    .map_err(|e| anyhow::anyhow!("failed to build geocoding client: {e}"))?,
            )),
            None => {
                tracing::info!("LOCUS_GEOCODER_API_KEY not set; geocoder disabled");
                None
            }
        };

        let store: Option<Arc<dyn PlacesStore>> =
            match (&config.places_store_url, &config.places_store_api_key) {
                (Some(url), Some(key)) => {
                    let client = PlacesStoreClient::new(url, key, &http)
                        .map_err(|e| anyhow::anyhow!("failed to build places store client: {e}"))?;
                    Some(Arc::new(client) as Arc<dyn PlacesStore>)
                }
                _ => {
                    tracing::info!("places store URL or key not set; store disabled");
                    None
                }
            };

        let ip_locator = Arc::new(
            IpLocatorClient::with_base_url(&config.ip_locator_url, &http)
                .map_err(|e| anyhow::anyhow!("failed to build IP locator client: {e}"))?,
        );

        let curated = match &config.curated_places_path {
            Some(path) => CuratedTable::from_yaml_file(path)?,
            None => CuratedTable::builtin(),
        };

        let search = SearchAggregator::new(
            SearchSources {
                curated,
                store,
                geocoder: geocoder.clone().map(|g| g as Arc<dyn TextGeocoder>),
                cache: Arc::clone(&cache),
            },
            SearchSettings::from_app_config(config),
        );

        Ok(Self {
            cache,
            clock,
            geocoder,
            ip_locator,
            search,
        })
    }

    pub(crate) fn reverse_geocoder(&self) -> Option<Arc<dyn ReverseGeocoder>> {
        self.geocoder
            .clone()
            .map(|g| g as Arc<dyn ReverseGeocoder>)
    }

    pub(crate) fn network_locator(&self) -> Arc<dyn NetworkLocator> {
        Arc::clone(&self.ip_locator) as Arc<dyn NetworkLocator>
    }
}
